//! Hardware Abstraction Traits
//!
//! Diese Traits definieren die schmalen Schnittstellen zu GPIO, Sensoren
//! und WiFi-Station ohne konkrete Implementierung.
//!
//! # Implementierungen
//! - **Production:** `sensorlink-firmware` (esp-hal, embassy-net)
//! - **Testing:** Mocks in `sensorlink-tests`

use core::net::Ipv4Addr;

use crate::types::{Reading, WifiStatus};

/// Fehler-Typ für Sensor-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor hat bei der Initialisierung nicht geantwortet
    NotInitialized,
    /// Bus-Transfer fehlgeschlagen
    Bus,
    /// Prüfsumme der Rohdaten stimmt nicht
    Checksum,
    /// Diese Variante hat keinen Sensor
    Unsupported,
}

/// Ausgangspin für den Funksender inkl. Busy-Delay
///
/// Die Pulsbreiten liegen im Bereich einiger hundert Mikrosekunden,
/// daher wird blockierend gewartet statt async.
pub trait SignalPin {
    fn set_level(&mut self, high: bool);

    fn delay_us(&mut self, us: u32);

    /// Eine Pulszelle: `high_us` High, danach `low_us` Low
    ///
    /// Implementierungen dürfen die Zelle atomar (ohne Interrupts) ausgeben.
    fn pulse(&mut self, high_us: u32, low_us: u32) {
        self.set_level(true);
        self.delay_us(high_us);
        self.set_level(false);
        self.delay_us(low_us);
    }
}

/// Single-Wire Temperaturfühler (DS18B20)
pub trait TemperatureProbe {
    /// Ergebnis der letzten abgeschlossenen Wandlung in Hundertstel Grad Celsius
    fn read(&mut self) -> Result<i32, SensorError>;

    /// Neue Wandlung anstoßen, ohne auf das Ergebnis zu warten
    fn start_conversion(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}

/// Kombinierter Temperatur-/Druck-/Feuchtesensor (BME280)
pub trait ClimateSensor {
    /// Liefert immer `Reading::Climate`
    fn read_all(&mut self) -> Result<Reading, SensorError>;

    /// Sensor in den Sleep-Modus versetzen (vor Deep Sleep)
    fn sleep(&mut self) -> Result<(), SensorError>;
}

/// WiFi-Station: liefert Verbindungsstatus und lokale Adresse
pub trait WifiStation {
    fn status(&self) -> WifiStatus;

    fn ip_info(&self) -> Option<Ipv4Addr>;
}
