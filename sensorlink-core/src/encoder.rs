//! Signal-Encoder für den 433 MHz Sender
//!
//! Jedes Symbol des Bitmusters wird als eine Pulszelle ausgegeben:
//!
//! ```text
//! '1':  ‾‾‾‾‾‾‾‾‾|___      820 µs High, 280 µs Low
//! '0':  ‾‾‾|_________      280 µs High, 820 µs Low
//! ```
//!
//! Pro Poll-Tick wird das Muster genau einmal komplett ausgegeben, danach
//! wird der Wiederholungszähler verringert.

use crate::protocol::BitPattern;
use crate::traits::SignalPin;

/// Standard-Anzahl Wiederholungen pro Aussendung
pub const DEFAULT_REPEAT_COUNT: u8 = 17;

/// Pulsbreiten und Pausen in Mikrosekunden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseTiming {
    pub long_us: u32,
    pub short_us: u32,
    /// Pause zwischen zwei Durchläufen (nicht nach dem letzten)
    pub frame_gap_us: u32,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            long_us: 820,
            short_us: 280,
            frame_gap_us: 9000,
        }
    }
}

impl PulseTiming {
    /// (High, Low) Dauer für ein Symbol
    pub fn cell(&self, bit: bool) -> (u32, u32) {
        if bit {
            (self.long_us, self.short_us)
        } else {
            (self.short_us, self.long_us)
        }
    }
}

/// Eine laufende Aussendung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionJob {
    pub pattern: BitPattern,
    pub remaining: u8,
}

/// Neuer Auftrag abgelehnt, Aussendung läuft noch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderBusy;

/// Ergebnis eines Poll-Schritts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmissionStep {
    /// Kein Auftrag aktiv
    Idle,
    /// Ein Durchlauf fertig, `remaining` weitere folgen
    Repeating { remaining: u8 },
    /// Letzter Durchlauf fertig, `OK` senden
    Finished,
}

pub struct SignalEncoder<P: SignalPin> {
    pin: P,
    timing: PulseTiming,
    repeat_count: u8,
    job: Option<EmissionJob>,
}

impl<P: SignalPin> SignalEncoder<P> {
    pub fn new(pin: P) -> Self {
        Self::with_timing(pin, PulseTiming::default(), DEFAULT_REPEAT_COUNT)
    }

    pub fn with_timing(mut pin: P, timing: PulseTiming, repeat_count: u8) -> Self {
        pin.set_level(false);
        Self {
            pin,
            timing,
            repeat_count: repeat_count.max(1),
            job: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.remaining > 0)
    }

    pub fn job(&self) -> Option<&EmissionJob> {
        self.job.as_ref()
    }

    /// Übernimmt ein neues Muster, solange kein Auftrag läuft
    pub fn arm(&mut self, pattern: BitPattern) -> Result<(), EncoderBusy> {
        if self.is_busy() {
            return Err(EncoderBusy);
        }
        self.job = Some(EmissionJob {
            pattern,
            remaining: self.repeat_count,
        });
        Ok(())
    }

    /// Gibt das Muster einmal komplett aus (blockierend)
    pub fn step(&mut self) -> EmissionStep {
        let Some(job) = self.job.as_mut() else {
            return EmissionStep::Idle;
        };

        for &bit in job.pattern.bits() {
            let (high_us, low_us) = self.timing.cell(bit);
            self.pin.pulse(high_us, low_us);
        }

        job.remaining -= 1;
        if job.remaining > 0 {
            let remaining = job.remaining;
            self.pin.delay_us(self.timing.frame_gap_us);
            EmissionStep::Repeating { remaining }
        } else {
            self.job = None;
            EmissionStep::Finished
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
