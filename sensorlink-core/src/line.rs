//! Zeilen-Puffer für eingehende TCP-Daten
//!
//! TCP liefert Bytes, nicht Zeilen. Der Assembler sammelt bis zum `\n`,
//! Teilzeilen bleiben bis zur nächsten Lieferung liegen, mehrere Zeilen in
//! einer Lieferung werden nacheinander zurückgegeben.

use crate::types::LINE_CAPACITY;

/// Zeile war länger als [`LINE_CAPACITY`]; der Rest bis `\n` wurde verworfen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineTooLong;

#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: heapless::Vec<u8, LINE_CAPACITY>,
    overflowed: bool,
    complete: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nimmt ein Byte entgegen
    ///
    /// Liefert bei `\n` die komplette Zeile (ohne `\n`). Die Zeile bleibt gültig
    /// bis zum nächsten Aufruf.
    pub fn push(&mut self, byte: u8) -> Option<Result<&[u8], LineTooLong>> {
        if self.complete {
            self.buf.clear();
            self.complete = false;
        }

        if byte == b'\n' {
            if self.overflowed {
                self.buf.clear();
                self.overflowed = false;
                return Some(Err(LineTooLong));
            }
            self.complete = true;
            return Some(Ok(&self.buf));
        }

        if !self.overflowed && self.buf.push(byte).is_err() {
            self.overflowed = true;
        }
        None
    }

    /// Verwirft eine angefangene Zeile (z.B. nach Verbindungsabbruch)
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
        self.complete = false;
    }

    pub fn pending(&self) -> usize {
        if self.complete { 0 } else { self.buf.len() }
    }
}
