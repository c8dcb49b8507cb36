//! Sensorlink Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Session-Zustandsautomat, Zeilenprotokoll und Signal-Encoder sind
//! reine Logik und laufen in den Tests auf dem Host.

#![no_std]

pub mod config;
pub mod device;
pub mod encoder;
pub mod format;
pub mod line;
pub mod onewire;
pub mod protocol;
pub mod session;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use device::{Device, EmitOutcome, Thermometer, Transmitter, WeatherStation};
pub use encoder::{EmissionStep, PulseTiming, SignalEncoder};
pub use format::format_fixed_point;
pub use line::LineAssembler;
pub use protocol::{BitPattern, Command, Reply, Response};
pub use session::{Action, Session, SessionConfig, SessionEvent, SessionPolicy, SessionState};
pub use traits::{ClimateSensor, SensorError, SignalPin, TemperatureProbe, WifiStation};
pub use types::{Connection, DeviceIdentity, Line, Reading, WifiStatus};
