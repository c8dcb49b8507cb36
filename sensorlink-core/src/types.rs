//! Core Types für die Sensor-/Sender-Knoten
//!
//! Datenstrukturen ohne Hardware-Dependencies

use core::net::{Ipv4Addr, SocketAddrV4};

/// Maximale Länge einer Protokollzeile inkl. `\n`
pub const LINE_CAPACITY: usize = 64;

/// Maximale Anzahl Symbole eines Bitmusters (`>`-Kommando)
pub const MAX_PATTERN_LEN: usize = 39;

/// Eine einzelne Protokollzeile (Antwort oder Begrüßung)
pub type Line = heapless::String<LINE_CAPACITY>;

/// Identität eines Knotens, wird als `<TYPE>;<GUID>\n` gesendet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity {
    pub kind: &'static str,
    pub guid: &'static str,
}

impl DeviceIdentity {
    pub const fn new(kind: &'static str, guid: &'static str) -> Self {
        Self { kind, guid }
    }
}

/// Ein Messwert-Snapshot, wird sofort formatiert und nicht aufbewahrt
///
/// Alle Werte liegen im Festkomma-Format der jeweiligen Sensor-Register vor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// Temperatur in Hundertstel Grad Celsius
    Temperature { centi: i32 },
    /// BME280-Messung
    Climate {
        /// Hundertstel Grad Celsius
        temperature_centi: i32,
        /// Pascal im Q24.8 Format
        pressure_q24_8: u32,
        /// Prozent relative Feuchte im Q22.10 Format
        humidity_q22_10: u32,
    },
}

/// Verbindungsstatus der WiFi-Station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiStatus {
    Joining,
    /// Mit dem Access Point verbunden, aber noch keine IP
    Associated,
    Failed,
    GotIp,
}

/// Die eine logische TCP-Verbindung zum Collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub local_ip: Ipv4Addr,
    pub remote: SocketAddrV4,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Connection {
    fn format(&self, fmt: defmt::Formatter) {
        let local = self.local_ip.octets();
        let remote = self.remote.ip().octets();
        defmt::write!(
            fmt,
            "{}.{}.{}.{} -> {}.{}.{}.{}:{}",
            local[0],
            local[1],
            local[2],
            local[3],
            remote[0],
            remote[1],
            remote[2],
            remote[3],
            self.remote.port()
        )
    }
}
