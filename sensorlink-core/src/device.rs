//! Varianten-spezifisches Verhalten hinter einer gemeinsamen Schnittstelle
//!
//! Die Session kennt nur [`Device`]. Jede Firmware-Variante liefert eine
//! Implementierung mit ihrem Hardware-Kollaborateur:
//!
//! - [`Transmitter`]: 433 MHz Sender (`>`-Kommando)
//! - [`Thermometer`]: DS18B20 Fühler (`READ`-Kommando)
//! - [`WeatherStation`]: BME280, sendet Messwerte direkt beim Verbinden

use crate::encoder::{EmissionStep, SignalEncoder};
use crate::protocol::{BitPattern, Response};
use crate::traits::{ClimateSensor, SensorError, SignalPin, TemperatureProbe};
use crate::types::{DeviceIdentity, Reading};

/// Ergebnis eines `>`-Kommandos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmitOutcome {
    Armed,
    Busy,
    Unsupported,
}

pub trait Device {
    /// Erste Zeile nach dem Verbindungsaufbau
    fn greeting(&mut self, identity: &DeviceIdentity) -> Response {
        Response::Identify(*identity)
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        Err(SensorError::Unsupported)
    }

    fn emit(&mut self, _pattern: BitPattern) -> EmitOutcome {
        EmitOutcome::Unsupported
    }

    /// Eine Einheit Hintergrundarbeit pro Poll-Tick
    ///
    /// Liefert eine Antwort, wenn eine zurückgestellte Antwort fällig ist.
    fn poll(&mut self) -> Option<Response> {
        None
    }

    /// Hintergrundarbeit steht an, der nächste Poll soll ohne Pause folgen
    fn is_busy(&self) -> bool {
        false
    }

    /// Hardware vor dem Deep Sleep abschalten
    fn power_down(&mut self) {}
}

// ============================================================================
// Sender
// ============================================================================

pub struct Transmitter<P: SignalPin> {
    encoder: SignalEncoder<P>,
}

impl<P: SignalPin> Transmitter<P> {
    pub fn new(encoder: SignalEncoder<P>) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &SignalEncoder<P> {
        &self.encoder
    }
}

impl<P: SignalPin> Device for Transmitter<P> {
    fn emit(&mut self, pattern: BitPattern) -> EmitOutcome {
        match self.encoder.arm(pattern) {
            Ok(()) => EmitOutcome::Armed,
            Err(_) => EmitOutcome::Busy,
        }
    }

    fn poll(&mut self) -> Option<Response> {
        match self.encoder.step() {
            EmissionStep::Finished => Some(Response::Ok),
            EmissionStep::Idle | EmissionStep::Repeating { .. } => None,
        }
    }

    /// Die Pause zwischen zwei Durchläufen liegt bereits im Encoder
    fn is_busy(&self) -> bool {
        self.encoder.is_busy()
    }
}

// ============================================================================
// Thermometer
// ============================================================================

/// Poll-Ticks zwischen zwei Wandlungen (1 s bei 10 ms Tick)
///
/// Eine Wandlung dauert bis zu 750 ms, ein READ liefert also einen
/// Messwert, der höchstens zwei Sekunden alt ist.
pub const CONVERSION_INTERVAL_TICKS: u32 = 100;

pub struct Thermometer<S: TemperatureProbe> {
    probe: S,
    ticks_since_conversion: u32,
}

impl<S: TemperatureProbe> Thermometer<S> {
    pub fn new(probe: S) -> Self {
        Self {
            probe,
            ticks_since_conversion: 0,
        }
    }

    pub fn probe(&self) -> &S {
        &self.probe
    }
}

impl<S: TemperatureProbe> Device for Thermometer<S> {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let centi = self.probe.read()?;
        Ok(Reading::Temperature { centi })
    }

    fn poll(&mut self) -> Option<Response> {
        self.ticks_since_conversion += 1;
        if self.ticks_since_conversion >= CONVERSION_INTERVAL_TICKS {
            self.ticks_since_conversion = 0;
            // Fehler zeigt sich beim nächsten READ als ERROR
            let _ = self.probe.start_conversion();
        }
        None
    }
}

// ============================================================================
// Wetterstation (Single-Shot)
// ============================================================================

pub struct WeatherStation<S: ClimateSensor> {
    sensor: S,
}

impl<S: ClimateSensor> WeatherStation<S> {
    pub fn new(sensor: S) -> Self {
        Self { sensor }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}

impl<S: ClimateSensor> Device for WeatherStation<S> {
    /// Keine Identifikation: Messwerte oder `ERROR` direkt beim Verbinden
    fn greeting(&mut self, _identity: &DeviceIdentity) -> Response {
        match self.read() {
            Ok(reading) => Response::Reading(reading),
            Err(_) => Response::Error,
        }
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        self.sensor.read_all()
    }

    fn power_down(&mut self) {
        // Fehler ignoriert, Deep Sleep folgt
        let _ = self.sensor.sleep();
    }
}
