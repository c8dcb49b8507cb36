//! DS18B20 Scratchpad-Auswertung
//!
//! Das Bit-Timing des Single-Wire-Busses liegt in der Firmware, hier nur
//! die reine Auswertung der 9 Scratchpad-Bytes.

use crc::{CRC_8_MAXIM_DOW, Crc};

use crate::traits::SensorError;

/// Länge des DS18B20 Scratchpads inkl. CRC
pub const SCRATCHPAD_LEN: usize = 9;

/// Dallas/Maxim CRC-8 (Polynom x⁸ + x⁵ + x⁴ + 1)
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Rohwert in 1/16 °C → Hundertstel Grad
pub fn raw_to_centi(raw: i16) -> i32 {
    i32::from(raw) * 100 / 16
}

/// Prüft die CRC und liefert die Temperatur in Hundertstel Grad
pub fn decode_scratchpad(scratchpad: &[u8; SCRATCHPAD_LEN]) -> Result<i32, SensorError> {
    if crc8(&scratchpad[..8]) != scratchpad[8] {
        return Err(SensorError::Checksum);
    }
    // Bus ohne Fühler liest nur 0xFF, das besteht keine CRC. Alles 0 schon.
    if scratchpad.iter().all(|&b| b == 0) {
        return Err(SensorError::Bus);
    }
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
    Ok(raw_to_centi(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_crc(mut scratchpad: [u8; SCRATCHPAD_LEN]) -> [u8; SCRATCHPAD_LEN] {
        scratchpad[8] = crc8(&scratchpad[..8]);
        scratchpad
    }

    #[test]
    fn test_crc8_known_rom_code() {
        // ROM-Code aus dem Maxim Application Note 27
        let rom = [0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(crc8(&rom), 0xA2);
    }

    #[test]
    fn test_power_on_value() {
        // 0x0550 = 85 °C (Power-On-Reset Wert)
        let scratchpad = with_crc([0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00]);
        assert_eq!(decode_scratchpad(&scratchpad), Ok(8500));
    }

    #[test]
    fn test_negative_temperature() {
        // 0xFFC8 = -3.5 °C
        let scratchpad = with_crc([0xC8, 0xFF, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00]);
        assert_eq!(decode_scratchpad(&scratchpad), Ok(-350));
    }

    #[test]
    fn test_sixteenth_resolution_is_truncated() {
        // 0x0191 = 25.0625 °C
        assert_eq!(raw_to_centi(0x0191), 2506);
    }

    #[test]
    fn test_crc_mismatch() {
        let mut scratchpad = with_crc([0x91, 0x01, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00]);
        scratchpad[0] ^= 0x01;
        assert_eq!(decode_scratchpad(&scratchpad), Err(SensorError::Checksum));
    }

    #[test]
    fn test_all_zero_bus() {
        assert_eq!(decode_scratchpad(&[0; SCRATCHPAD_LEN]), Err(SensorError::Bus));
    }
}
