// Boot: Gemeinsame Initialisierung aller Gerätevarianten
//
// Heap, Embassy Runtime, WiFi-Controller und embassy-net Stack.
// Fehler hier sind nicht behebbar und enden im Panic-Handler (Backtrace).

use core::net::SocketAddrV4;

use defmt::info;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::peripherals::{SW_INTERRUPT, TIMG0, WIFI};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use sensorlink_core::config::EndpointError;

use crate::config::{EXTRA_HEAP_SIZE, NET_SOCKETS, WIFI_HEAP_SIZE};
use crate::tasks::{connection_task, net_task};

/// Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
///
/// Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB)
pub fn init_heap() {
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);
}

/// Embassy Runtime initialisieren (Timer + Software Interrupt)
pub fn start_runtime(timg0: TIMG0<'static>, sw_interrupt: SW_INTERRUPT<'static>) {
    let timg0 = TimerGroup::new(timg0);
    let sw_interrupt = SoftwareInterruptControl::new(sw_interrupt);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);
}

/// WiFi Station starten und den Netzwerk-Stack zurückgeben
///
/// Spawnt Connection- und Net-Task. DHCP läuft im Stack, die Session
/// erkennt die IP-Adresse über den Readiness-Poll.
pub fn start_network(spawner: Spawner, wifi: WIFI<'static>) -> Stack<'static> {
    static RADIO_INIT: StaticCell<esp_radio::Controller> = StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, wifi, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    static RESOURCES: StaticCell<StackResources<NET_SOCKETS>> = StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    spawner.spawn(connection_task(wifi_controller)).unwrap();
    spawner.spawn(net_task(runner)).unwrap();

    stack
}

/// Zieladresse aus `.env` prüfen, ungültige Konfiguration ist fatal
pub fn collector_endpoint(endpoint: Result<SocketAddrV4, EndpointError>) -> SocketAddrV4 {
    match endpoint {
        Ok(remote) => {
            info!(
                "Boot: Collector at {}:{}",
                defmt::Debug2Format(remote.ip()),
                remote.port()
            );
            remote
        }
        Err(e) => defmt::panic!("Invalid collector address in .env: {}", e),
    }
}
