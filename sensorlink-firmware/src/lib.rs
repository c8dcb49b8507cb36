// Library-Root: Hardware-Anbindung und Tasks der drei Gerätevarianten
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod boot;
pub mod config;
pub mod hal;
pub mod tasks;

use esp_hal::delay::Delay;
use esp_hal::gpio::Flex;

use sensorlink_core::{Thermometer, Transmitter, WeatherStation};

use crate::hal::{Bme280Sensor, Ds18b20Probe, EspSignalPin};

// ============================================================================
// Type-Aliase für die Gerätevarianten
// ============================================================================
//
// Die Logik (Protokoll, Encoder, Session) ist generisch über die Traits aus
// sensorlink-core und wird auf dem Host mit Mocks getestet (sensorlink-tests).
// Hier werden die echten Hardware-Typen eingesetzt.

/// 433-MHz-Sender auf einem GPIO-Ausgang
pub type TransmitterDevice = Transmitter<EspSignalPin<'static>>;

/// DS18B20 am Single-Wire-Bus (Open-Drain Flex-Pin)
pub type ThermometerDevice = Thermometer<Ds18b20Probe<Flex<'static>, Delay>>;

/// BME280 am I2C-Bus
pub type WeatherDevice = WeatherStation<Bme280Sensor<'static>>;
