// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus sensorlink-core auf echter Hardware.
// Die Logik dahinter (Encoder, Protokoll, Session) bleibt hardwarefrei.

pub mod climate;
pub mod onewire;
pub mod signal_pin;

pub use climate::Bme280Sensor;
pub use onewire::{Ds18b20Probe, OneWireBus, OneWireError};
pub use signal_pin::EspSignalPin;
