//! Auswertung der Compile-Zeit-Konfiguration
//!
//! Zieladresse und Port kommen als Strings aus `.env` (siehe Firmware
//! `build.rs`) und werden beim Boot einmal geprüft.

use core::net::{Ipv4Addr, SocketAddrV4};

/// Fehler beim Parsen der Zieladresse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointError {
    InvalidAddress,
    InvalidPort,
}

/// `"a.b.c.d"` + `"port"` → `SocketAddrV4`
pub fn parse_endpoint(ip: &str, port: &str) -> Result<SocketAddrV4, EndpointError> {
    let ip: Ipv4Addr = ip.trim().parse().map_err(|_| EndpointError::InvalidAddress)?;
    let port: u16 = port.trim().parse().map_err(|_| EndpointError::InvalidPort)?;
    if port == 0 {
        return Err(EndpointError::InvalidPort);
    }
    Ok(SocketAddrV4::new(ip, port))
}
