//! Zeilenprotokoll zum Collector
//!
//! Jede eingehende Zeile ist genau ein Kommando, jedes Kommando erzeugt genau
//! eine Antwortzeile. Die Dispatch-Tabelle wird in fester Reihenfolge geprüft:
//!
//! | Eingang   | Antwort                              |
//! |-----------|--------------------------------------|
//! | `PING`    | `PONG`                               |
//! | `READ`    | Messwerte oder `ERROR`               |
//! | `>0101…`  | `OK` nach der Aussendung, oder `BUSY` |
//! | sonst     | `ERROR`                              |

use core::fmt::Write;

use crate::device::{Device, EmitOutcome};
use crate::format::write_reading;
use crate::types::{DeviceIdentity, Line, MAX_PATTERN_LEN, Reading};

/// Bitmuster aus `0`/`1`, höchstens [`MAX_PATTERN_LEN`] Symbole
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitPattern {
    bits: heapless::Vec<bool, MAX_PATTERN_LEN>,
}

/// Bitmuster länger als [`MAX_PATTERN_LEN`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatternTooLong;

impl BitPattern {
    /// Übernimmt `0`/`1` bis zum ersten anderen Zeichen
    pub fn from_prefix(text: &[u8]) -> Result<Self, PatternTooLong> {
        let mut bits = heapless::Vec::new();
        for &symbol in text.iter().take_while(|&&c| c == b'0' || c == b'1') {
            bits.push(symbol == b'1').map_err(|_| PatternTooLong)?;
        }
        Ok(Self { bits })
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BitPattern {
    fn format(&self, fmt: defmt::Formatter) {
        for &bit in self.bits.iter() {
            defmt::write!(fmt, "{}", if bit { "1" } else { "0" });
        }
    }
}

/// Ein dekodiertes Kommando
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Read,
    Emit(BitPattern),
    Unknown,
}

impl Command {
    /// Dekodiert eine Zeile; ein abschließendes `\n` bzw. `\r\n` wird ignoriert
    pub fn parse(line: &[u8]) -> Self {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        match line {
            b"PING" => Command::Ping,
            b"READ" => Command::Read,
            [b'>', pattern @ ..] => match BitPattern::from_prefix(pattern) {
                Ok(pattern) => Command::Emit(pattern),
                Err(PatternTooLong) => Command::Unknown,
            },
            _ => Command::Unknown,
        }
    }
}

/// Antwortzeilen des Knotens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Pong,
    Ok,
    Busy,
    Error,
    Identify(DeviceIdentity),
    Reading(Reading),
}

/// Antwort passt nicht in [`crate::types::LINE_CAPACITY`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineOverflow;

impl Response {
    /// Rendert die Antwort inkl. `\n`
    pub fn render(&self) -> Result<Line, LineOverflow> {
        let mut line = Line::new();
        let written = match self {
            Response::Pong => line.write_str("PONG"),
            Response::Ok => line.write_str("OK"),
            Response::Busy => line.write_str("BUSY"),
            Response::Error => line.write_str("ERROR"),
            Response::Identify(identity) => write!(line, "{};{}", identity.kind, identity.guid),
            Response::Reading(reading) => write_reading(&mut line, reading),
        };
        written
            .and_then(|()| line.write_char('\n'))
            .map_err(|_| LineOverflow)?;
        Ok(line)
    }

    /// Wie [`Response::render`], fällt bei Überlauf auf `ERROR` zurück
    pub fn render_or_error(&self) -> Line {
        self.render().unwrap_or_else(|LineOverflow| error_line())
    }
}

fn error_line() -> Line {
    let mut line = Line::new();
    // "ERROR\n" passt immer in LINE_CAPACITY
    let _ = line.write_str("ERROR\n");
    line
}

#[cfg(feature = "defmt")]
impl defmt::Format for Response {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Response::Pong => defmt::write!(fmt, "PONG"),
            Response::Ok => defmt::write!(fmt, "OK"),
            Response::Busy => defmt::write!(fmt, "BUSY"),
            Response::Error => defmt::write!(fmt, "ERROR"),
            Response::Identify(identity) => {
                defmt::write!(fmt, "Identify({};{})", identity.kind, identity.guid)
            }
            Response::Reading(reading) => defmt::write!(fmt, "Reading({})", reading),
        }
    }
}

/// Ergebnis des Dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Antwort sofort senden
    Send(Response),
    /// Antwort folgt später über den Poll-Loop (Aussendung läuft)
    Deferred,
}

/// Dispatch-Tabelle: Kommando → Antwort
pub fn dispatch<D: Device + ?Sized>(device: &mut D, command: Command) -> Reply {
    match command {
        Command::Ping => Reply::Send(Response::Pong),
        Command::Read => match device.read() {
            Ok(reading) => Reply::Send(Response::Reading(reading)),
            Err(_) => Reply::Send(Response::Error),
        },
        Command::Emit(pattern) => match device.emit(pattern) {
            EmitOutcome::Armed => Reply::Deferred,
            EmitOutcome::Busy => Reply::Send(Response::Busy),
            EmitOutcome::Unsupported => Reply::Send(Response::Error),
        },
        Command::Unknown => Reply::Send(Response::Error),
    }
}

/// Dekodiert eine Zeile und dispatcht sie
pub fn handle_line<D: Device + ?Sized>(device: &mut D, line: &[u8]) -> Reply {
    dispatch(device, Command::parse(line))
}
