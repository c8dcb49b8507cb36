// 433-MHz-Sender: sendet Bitmuster im Auftrag des Collectors
// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::Pin;
use esp_hal::rtc_cntl::Rtc;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

use esp_sensorlink::boot;
use esp_sensorlink::config::{
    BOOT_SETTLE_MS, SIGNAL_REPEAT_COUNT, SIGNAL_TIMING, TX433_IDENTITY,
    device_endpoint,
};
use esp_sensorlink::hal::EspSignalPin;
use esp_sensorlink::tasks::transmitter_session_task;
use sensorlink_core::{Session, SessionConfig, SessionPolicy, SignalEncoder, Transmitter};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    Delay::new().delay_millis(BOOT_SETTLE_MS);

    boot::init_heap();
    boot::start_runtime(peripherals.TIMG0, peripherals.SW_INTERRUPT);

    // Sender zuerst: Ausgang liegt ab hier auf Low
    let signal_gpio = peripherals.GPIO3;
    info!("433TX: Signal output on GPIO{}", signal_gpio.number());
    let pin = EspSignalPin::new(signal_gpio);
    let encoder = SignalEncoder::with_timing(pin, SIGNAL_TIMING, SIGNAL_REPEAT_COUNT);

    let remote = boot::collector_endpoint(device_endpoint());
    let session = Session::new(
        SessionConfig::new(TX433_IDENTITY, remote, SessionPolicy::Persistent),
        Transmitter::new(encoder),
    );

    let stack = boot::start_network(spawner, peripherals.WIFI);
    let rtc = Rtc::new(peripherals.LPWR);
    spawner
        .spawn(transmitter_session_task(stack, session, rtc))
        .unwrap();

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
