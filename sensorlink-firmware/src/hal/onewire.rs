// Single-Wire-Bus (Bit-Banging) und DS18B20 Temperaturfühler
//
// Der Bus läuft auf einem Open-Drain-Pin mit externem Pull-up.
// Jeder Zeitschlitz wird ohne Interrupts ausgegeben.

use defmt::{info, warn};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use sensorlink_core::onewire::{SCRATCHPAD_LEN, decode_scratchpad};
use sensorlink_core::{SensorError, TemperatureProbe};

/// Fehler-Typ für Bus-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum OneWireError {
    /// Kein Gerät hat auf den Reset geantwortet
    NoPresence,
    /// GPIO-Zugriff fehlgeschlagen
    Pin,
}

// ROM- und Funktionskommandos
const SKIP_ROM: u8 = 0xCC;
const CONVERT_T: u8 = 0x44;
const READ_SCRATCHPAD: u8 = 0xBE;

/// Single-Wire-Bus Master
pub struct OneWireBus<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OneWireBus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Bus freigeben (High via Pull-up)
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high();
        Self { pin, delay }
    }

    /// Reset-Puls und Presence-Erkennung
    pub fn reset(&mut self) -> Result<(), OneWireError> {
        let presence = critical_section::with(|_| {
            self.pin.set_low().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(480);
            self.pin.set_high().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(70);
            self.pin.is_low().map_err(|_| OneWireError::Pin)
        })?;
        self.delay.delay_us(410);

        if presence {
            Ok(())
        } else {
            Err(OneWireError::NoPresence)
        }
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), OneWireError> {
        let (low_us, release_us) = if bit { (6, 64) } else { (60, 10) };
        critical_section::with(|_| {
            self.pin.set_low().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(low_us);
            self.pin.set_high().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(release_us);
            Ok(())
        })
    }

    fn read_bit(&mut self) -> Result<bool, OneWireError> {
        let bit = critical_section::with(|_| {
            self.pin.set_low().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(6);
            self.pin.set_high().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(9);
            self.pin.is_high().map_err(|_| OneWireError::Pin)
        })?;
        self.delay.delay_us(55);
        Ok(bit)
    }

    /// LSB zuerst
    pub fn write_byte(&mut self, byte: u8) -> Result<(), OneWireError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8, OneWireError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

/// DS18B20 als einziges Gerät am Bus (Skip ROM)
///
/// `read()` liest das Scratchpad der letzten abgeschlossenen Wandlung.
/// Neue Wandlungen stößt der Thermometer-Poll jede Sekunde an, damit READ
/// nicht 750 ms blockiert. Die erste Wandlung startet
/// [`Ds18b20Probe::prime`] beim Boot.
pub struct Ds18b20Probe<P, D> {
    bus: OneWireBus<P, D>,
}

impl<P, D> Ds18b20Probe<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(bus: OneWireBus<P, D>) -> Self {
        Self { bus }
    }

    /// Wegwerf-Messung beim Boot: der Power-On-Wert (85 °C) wird verworfen
    pub fn prime(&mut self) {
        match self.convert() {
            Ok(()) => info!("DS18B20: First conversion started"),
            Err(e) => warn!("DS18B20: No sensor on bus: {}", e),
        }
    }

    fn convert(&mut self) -> Result<(), OneWireError> {
        self.bus.reset()?;
        self.bus.write_byte(SKIP_ROM)?;
        self.bus.write_byte(CONVERT_T)
    }

    pub fn read_scratchpad(&mut self) -> Result<[u8; SCRATCHPAD_LEN], OneWireError> {
        self.bus.reset()?;
        self.bus.write_byte(SKIP_ROM)?;
        self.bus.write_byte(READ_SCRATCHPAD)?;

        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        for byte in scratchpad.iter_mut() {
            *byte = self.bus.read_byte()?;
        }
        Ok(scratchpad)
    }
}

impl<P, D> TemperatureProbe for Ds18b20Probe<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<i32, SensorError> {
        let scratchpad = self.read_scratchpad().map_err(|e| {
            warn!("DS18B20: Read failed: {}", e);
            SensorError::Bus
        })?;
        decode_scratchpad(&scratchpad)
    }

    fn start_conversion(&mut self) -> Result<(), SensorError> {
        self.convert().map_err(|e| {
            warn!("DS18B20: Conversion not started: {}", e);
            SensorError::Bus
        })
    }
}
