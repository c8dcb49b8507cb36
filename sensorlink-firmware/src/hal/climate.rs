// Klimasensor-Adapter (BME280)
//
// Verbindet den `bme280` Treiber (I2C, Forced Mode) mit dem
// `ClimateSensor` Trait aus sensorlink-core.

use bme280::i2c::BME280;
use bme280::{Configuration, IIRFilter, Oversampling};
use defmt::{Debug2Format, error, info, warn};
use esp_hal::Blocking;
use esp_hal::delay::Delay;
use esp_hal::i2c::master::I2c;

use sensorlink_core::{ClimateSensor, Reading, SensorError};

/// Real Hardware Klimasensor
///
/// Schlägt die Initialisierung fehl, bleibt der Adapter benutzbar und
/// liefert bei jeder Messung `SensorError::NotInitialized`.
pub struct Bme280Sensor<'a> {
    driver: BME280<I2c<'a, Blocking>>,
    delay: Delay,
    ready: bool,
}

impl<'a> Bme280Sensor<'a> {
    /// Initialisiert den Sensor an der primären Adresse (0x76)
    ///
    /// 16x Oversampling für alle Kanäle, IIR-Filter 16.
    pub fn new(i2c: I2c<'a, Blocking>) -> Self {
        let mut driver = BME280::new_primary(i2c);
        let mut delay = Delay::new();

        let config = Configuration::default()
            .with_temperature_oversampling(Oversampling::Oversampling16X)
            .with_pressure_oversampling(Oversampling::Oversampling16X)
            .with_humidity_oversampling(Oversampling::Oversampling16X)
            .with_iir_filter(IIRFilter::Coefficient16);

        let ready = match driver.init_with_config(&mut delay, config) {
            Ok(()) => {
                info!("BME280: Initialized");
                true
            }
            Err(e) => {
                error!("BME280: Init failed: {}", Debug2Format(&e));
                false
            }
        };

        Self {
            driver,
            delay,
            ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

impl ClimateSensor for Bme280Sensor<'_> {
    fn read_all(&mut self) -> Result<Reading, SensorError> {
        if !self.ready {
            return Err(SensorError::NotInitialized);
        }

        let measurements = self.driver.measure(&mut self.delay).map_err(|e| {
            warn!("BME280: Measurement failed: {}", Debug2Format(&e));
            SensorError::Bus
        })?;

        Ok(Reading::Climate {
            temperature_centi: centi(measurements.temperature),
            pressure_q24_8: fixed(measurements.pressure, 8),
            humidity_q22_10: fixed(measurements.humidity, 10),
        })
    }

    /// Im Forced Mode geht der Sensor nach jeder Messung selbst in den
    /// Sleep-Modus, es bleibt nur die Prüfung auf einen gültigen Sensor.
    fn sleep(&mut self) -> Result<(), SensorError> {
        if self.ready {
            Ok(())
        } else {
            Err(SensorError::NotInitialized)
        }
    }
}

/// °C → Hundertstel, kaufmännisch gerundet
fn centi(celsius: f32) -> i32 {
    let scaled = celsius * 100.0;
    if scaled < 0.0 {
        (scaled - 0.5) as i32
    } else {
        (scaled + 0.5) as i32
    }
}

/// Wert → Festkomma mit `frac_bits` Nachkommabits (negativ → 0)
fn fixed(value: f32, frac_bits: u32) -> u32 {
    (value * (1u32 << frac_bits) as f32) as u32
}
