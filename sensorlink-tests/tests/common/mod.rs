//! Mock-Kollaborateure für die Host-Tests
//!
//! Alle Mocks zeichnen Aufrufe in öffentlichen Feldern auf,
//! damit die Tests direkt darauf prüfen können.

#![allow(dead_code)]

use std::net::Ipv4Addr;

use sensorlink_core::{
    ClimateSensor, Reading, SensorError, SignalPin, TemperatureProbe, WifiStation, WifiStatus,
};

// ============================================================================
// Mock Signal Pin
// ============================================================================

/// Ein Eintrag im Pin-Protokoll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Level(bool),
    Delay(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Cell(u32, u32),
    Gap(u32),
}

#[derive(Default)]
pub struct MockSignalPin {
    pub events: Vec<PinEvent>,
}

impl MockSignalPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zerlegt das Pin-Protokoll in Pulszellen und freie Pausen
    pub fn timeline(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut iter = self.events.iter();
        while let Some(event) = iter.next() {
            match event {
                PinEvent::Level(true) => {
                    let high = match iter.next() {
                        Some(PinEvent::Delay(us)) => *us,
                        other => panic!("Expected delay after high, got {:?}", other),
                    };
                    assert_eq!(iter.next(), Some(&PinEvent::Level(false)));
                    let low = match iter.next() {
                        Some(PinEvent::Delay(us)) => *us,
                        other => panic!("Expected delay after low, got {:?}", other),
                    };
                    segments.push(Segment::Cell(high, low));
                }
                PinEvent::Delay(us) => segments.push(Segment::Gap(*us)),
                // Ruhepegel beim Initialisieren
                PinEvent::Level(false) => {}
            }
        }
        segments
    }

    /// Pulszellen als (High µs, Low µs)
    pub fn cells(&self) -> Vec<(u32, u32)> {
        self.timeline()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Cell(high, low) => Some((high, low)),
                Segment::Gap(_) => None,
            })
            .collect()
    }

    pub fn gaps(&self) -> Vec<u32> {
        self.timeline()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Gap(us) => Some(us),
                Segment::Cell(..) => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SignalPin for MockSignalPin {
    fn set_level(&mut self, high: bool) {
        self.events.push(PinEvent::Level(high));
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(PinEvent::Delay(us));
    }
}

// ============================================================================
// Mock Temperature Probe
// ============================================================================

#[derive(Default)]
pub struct MockProbe {
    pub centi: i32,
    pub read_count: usize,
    pub conversions: usize,
    pub fail_next_read: bool,
}

impl MockProbe {
    pub fn new(centi: i32) -> Self {
        Self {
            centi,
            ..Self::default()
        }
    }
}

impl TemperatureProbe for MockProbe {
    fn read(&mut self) -> Result<i32, SensorError> {
        self.read_count += 1;
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(SensorError::Checksum);
        }
        Ok(self.centi)
    }

    fn start_conversion(&mut self) -> Result<(), SensorError> {
        self.conversions += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Climate Sensor
// ============================================================================

#[derive(Default)]
pub struct MockClimateSensor {
    pub reading: Option<Reading>,
    pub read_count: usize,
    pub asleep: bool,
}

impl MockClimateSensor {
    pub fn new(temperature_centi: i32, pressure_q24_8: u32, humidity_q22_10: u32) -> Self {
        Self {
            reading: Some(Reading::Climate {
                temperature_centi,
                pressure_q24_8,
                humidity_q22_10,
            }),
            ..Self::default()
        }
    }

    /// Sensor, dessen Initialisierung fehlgeschlagen ist
    pub fn broken() -> Self {
        Self::default()
    }
}

impl ClimateSensor for MockClimateSensor {
    fn read_all(&mut self) -> Result<Reading, SensorError> {
        self.read_count += 1;
        self.reading.ok_or(SensorError::NotInitialized)
    }

    fn sleep(&mut self) -> Result<(), SensorError> {
        self.asleep = true;
        Ok(())
    }
}

// ============================================================================
// Mock WiFi Station
// ============================================================================

pub struct MockWifi {
    pub status: WifiStatus,
    pub ip: Option<Ipv4Addr>,
}

impl MockWifi {
    pub fn joining() -> Self {
        Self {
            status: WifiStatus::Joining,
            ip: None,
        }
    }

    pub fn got_ip() -> Self {
        Self {
            status: WifiStatus::GotIp,
            ip: Some(Ipv4Addr::new(10, 0, 1, 42)),
        }
    }
}

impl WifiStation for MockWifi {
    fn status(&self) -> WifiStatus {
        self.status
    }

    fn ip_info(&self) -> Option<Ipv4Addr> {
        self.ip
    }
}
