// DS18B20 Thermometer: beantwortet READ mit der Temperatur
#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

extern crate alloc;

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, OutputConfig, Pin, Pull};
use esp_hal::rtc_cntl::Rtc;

use {esp_backtrace as _, esp_println as _};

use esp_sensorlink::boot;
use esp_sensorlink::config::{BOOT_SETTLE_MS, TEMP_IDENTITY, device_endpoint};
use esp_sensorlink::hal::{Ds18b20Probe, OneWireBus};
use esp_sensorlink::tasks::thermometer_session_task;
use sensorlink_core::{Session, SessionConfig, SessionPolicy, Thermometer};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    Delay::new().delay_millis(BOOT_SETTLE_MS);

    boot::init_heap();
    boot::start_runtime(peripherals.TIMG0, peripherals.SW_INTERRUPT);

    // Single-Wire-Bus: Open-Drain, High = Bus freigegeben
    let bus_gpio = peripherals.GPIO4;
    info!("TEMP: Single-wire bus on GPIO{}", bus_gpio.number());
    let mut bus_pin = Flex::new(bus_gpio);
    bus_pin.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    bus_pin.set_input_enable(true);
    bus_pin.set_output_enable(true);

    let mut probe = Ds18b20Probe::new(OneWireBus::new(bus_pin, Delay::new()));
    probe.prime();

    let remote = boot::collector_endpoint(device_endpoint());
    let session = Session::new(
        SessionConfig::new(TEMP_IDENTITY, remote, SessionPolicy::Persistent),
        Thermometer::new(probe),
    );

    let stack = boot::start_network(spawner, peripherals.WIFI);
    let rtc = Rtc::new(peripherals.LPWR);
    spawner
        .spawn(thermometer_session_task(stack, session, rtc))
        .unwrap();

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
