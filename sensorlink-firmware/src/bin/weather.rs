// BME280 Wetterstation: eine Messung pro Aufwachen, danach Deep Sleep
#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

extern crate alloc;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::Pin;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rtc_cntl::Rtc;
use esp_hal::time::Rate;

use {esp_backtrace as _, esp_println as _};

use esp_sensorlink::boot;
use esp_sensorlink::config::{
    BME280_IDENTITY, BOOT_SETTLE_MS, I2C_FREQUENCY_KHZ, SENSOR_SETTLE_MS, WEATHER_POLICY,
    weather_endpoint,
};
use esp_sensorlink::hal::Bme280Sensor;
use esp_sensorlink::tasks::weather_session_task;
use sensorlink_core::{Session, SessionConfig, WeatherStation};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    let delay = Delay::new();
    delay.delay_millis(BOOT_SETTLE_MS);

    boot::init_heap();
    boot::start_runtime(peripherals.TIMG0, peripherals.SW_INTERRUPT);

    let (sda, scl) = (peripherals.GPIO6, peripherals.GPIO7);
    info!("BME280: I2C on SDA GPIO{} / SCL GPIO{}", sda.number(), scl.number());

    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ)),
    )
    .expect("Failed to initialize I2C")
    .with_sda(sda)
    .with_scl(scl);

    let sensor = Bme280Sensor::new(i2c);
    if !sensor.is_ready() {
        warn!("BME280: Sensor unavailable, collector will receive ERROR");
    }
    delay.delay_millis(SENSOR_SETTLE_MS);

    let remote = boot::collector_endpoint(weather_endpoint());
    let session = Session::new(
        SessionConfig::new(BME280_IDENTITY, remote, WEATHER_POLICY),
        WeatherStation::new(sensor),
    );

    let stack = boot::start_network(spawner, peripherals.WIFI);
    let rtc = Rtc::new(peripherals.LPWR);
    spawner
        .spawn(weather_session_task(stack, session, rtc))
        .unwrap();

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
