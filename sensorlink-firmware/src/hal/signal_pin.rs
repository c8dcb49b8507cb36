// Ausgangspin für den 433-MHz-Sender
//
// Implementiert `SignalPin` aus sensorlink-core auf einem esp-hal Output.
// Die Pulsbreiten werden per Busy-Delay erzeugt.

use esp_hal::delay::Delay;
use esp_hal::gpio::{Level, Output, OutputConfig, OutputPin};

use sensorlink_core::SignalPin;

/// Real Hardware Signal-Pin
pub struct EspSignalPin<'a> {
    pin: Output<'a>,
    delay: Delay,
}

impl<'a> EspSignalPin<'a> {
    /// Erstellt den Pin mit Ruhepegel Low
    pub fn new(pin: impl OutputPin + 'a) -> Self {
        Self {
            pin: Output::new(pin, Level::Low, OutputConfig::default()),
            delay: Delay::new(),
        }
    }
}

impl SignalPin for EspSignalPin<'_> {
    fn set_level(&mut self, high: bool) {
        self.pin.set_level(Level::from(high));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_micros(us);
    }

    /// Pulszelle ohne Interrupts, sonst verschieben WiFi-Interrupts die Flanken
    fn pulse(&mut self, high_us: u32, low_us: u32) {
        critical_section::with(|_| {
            self.pin.set_high();
            self.delay.delay_micros(high_us);
            self.pin.set_low();
            self.delay.delay_micros(low_us);
        });
    }
}
