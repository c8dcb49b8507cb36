//! Festkomma-Formatierung für Messwerte
//!
//! Ganzzahlteil, Punkt, zweistelliger Nachkommateil. Keine Locale,
//! keine Floats.

use core::fmt::{self, Write};

use crate::types::Reading;

/// Puffer für einen einzelnen formatierten Wert
pub type Fixed = heapless::String<16>;

/// Schreibt `value / scale` als `<int>.<2 Ziffern>`
///
/// Der Nachkommateil wird abgeschnitten, nicht gerundet:
/// `(value % scale) * 100 / scale`.
pub fn write_fixed_point<W: Write>(out: &mut W, value: i64, scale: u32) -> fmt::Result {
    let scale = u64::from(scale.max(1));
    let magnitude = value.unsigned_abs();
    let whole = magnitude / scale;
    let hundredths = (magnitude % scale) * 100 / scale;

    if value < 0 {
        out.write_char('-')?;
    }
    write!(out, "{}.{:02}", whole, hundredths)
}

/// Formatiert `value / scale` in einen eigenen Puffer
///
/// ```
/// # use sensorlink_core::format::format_fixed_point;
/// assert_eq!(format_fixed_point(2345, 100).as_str(), "23.45");
/// ```
pub fn format_fixed_point(value: i64, scale: u32) -> Fixed {
    let mut text = Fixed::new();
    // i64 mit Vorzeichen und zwei Nachkommastellen passt nicht immer in 16 Zeichen,
    // Sensorwerte aber schon
    let _ = write_fixed_point(&mut text, value, scale);
    text
}

/// Temperatur liegt bereits in Hundertstel Grad vor
pub fn write_temperature<W: Write>(out: &mut W, centi: i32) -> fmt::Result {
    write_fixed_point(out, i64::from(centi), 100)
}

/// Druck in Pa (Q24.8) → hPa
pub fn write_pressure<W: Write>(out: &mut W, q24_8: u32) -> fmt::Result {
    write_fixed_point(out, i64::from(q24_8 >> 8), 100)
}

/// Feuchte in %RH (Q22.10)
pub fn write_humidity<W: Write>(out: &mut W, q22_10: u32) -> fmt::Result {
    write_fixed_point(out, i64::from(q22_10), 1024)
}

/// Schreibt eine Messung als `;`-getrennte Werte (ohne Zeilenende)
pub fn write_reading<W: Write>(out: &mut W, reading: &Reading) -> fmt::Result {
    match *reading {
        Reading::Temperature { centi } => write_temperature(out, centi),
        Reading::Climate {
            temperature_centi,
            pressure_q24_8,
            humidity_q22_10,
        } => {
            write_temperature(out, temperature_centi)?;
            out.write_char(';')?;
            write_pressure(out, pressure_q24_8)?;
            out.write_char(';')?;
            write_humidity(out, humidity_q22_10)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humidity(q22_10: u32) -> Fixed {
        let mut text = Fixed::new();
        write_humidity(&mut text, q22_10).unwrap();
        text
    }

    #[test]
    fn test_temperature_hundredths() {
        assert_eq!(format_fixed_point(2345, 100).as_str(), "23.45");
    }

    #[test]
    fn test_single_digit_fraction_is_zero_padded() {
        assert_eq!(format_fixed_point(2305, 100).as_str(), "23.05");
        assert_eq!(format_fixed_point(2300, 100).as_str(), "23.00");
    }

    #[test]
    fn test_negative_values_keep_sign_on_whole_part() {
        assert_eq!(format_fixed_point(-350, 100).as_str(), "-3.50");
        assert_eq!(format_fixed_point(-5, 100).as_str(), "-0.05");
    }

    #[test]
    fn test_pressure_q24_8() {
        // 101325.5 Pa → 1013.25 hPa
        let raw = 101_325 * 256 + 128;
        let mut text = Fixed::new();
        write_pressure(&mut text, raw).unwrap();
        assert_eq!(text.as_str(), "1013.25");
    }

    #[test]
    fn test_humidity_q22_10_truncates() {
        // 45 + 512/1024 = 45.50
        assert_eq!(humidity((45 << 10) | 512).as_str(), "45.50");
        // 1023/1024 * 100 = 99.9 → 99
        assert_eq!(humidity((12 << 10) | 0x3FF).as_str(), "12.99");
    }

    #[test]
    fn test_humidity_is_idempotent() {
        let raw = (57 << 10) | 301;
        assert_eq!(humidity(raw), humidity(raw));
    }

    #[test]
    fn test_climate_reading() {
        let reading = Reading::Climate {
            temperature_centi: 2145,
            pressure_q24_8: 98_765 << 8,
            humidity_q22_10: 40 << 10,
        };
        let mut text = heapless::String::<32>::new();
        write_reading(&mut text, &reading).unwrap();
        assert_eq!(text.as_str(), "21.45;987.65;40.00");
    }
}
