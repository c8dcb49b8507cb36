// WiFi Task - Verbindet mit WLAN und managed Connection
use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};

use sensorlink_core::{WifiStation, WifiStatus};

use crate::config::{WIFI_PASSWORD, WIFI_RETRY_DELAY_SECS, WIFI_SSID};

/// Letzter Verbindungsversuch zum AP ist fehlgeschlagen
static JOIN_FAILED: AtomicBool = AtomicBool::new(false);

/// WiFi Connection Task
///
/// Managed die WiFi-Verbindung:
/// - Konfiguriert den Station-Modus mit SSID/Passwort aus `.env`
/// - Verbindet mit Access Point (DHCP läuft im embassy-net Stack)
/// - Überwacht Verbindung und reconnected bei Bedarf
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("WiFi: Starting connection task");

    loop {
        if matches!(controller.is_started(), Ok(false)) {
            info!("WiFi: Configuring and starting...");

            let client_config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(WIFI_SSID.into())
                    .with_password(WIFI_PASSWORD.into()),
            );

            if let Err(e) = controller.set_config(&client_config) {
                error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
                continue;
            }

            if let Err(e) = controller.start_async().await {
                error!("WiFi: Failed to start: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
                continue;
            }

            info!("WiFi: Started successfully");
        }

        info!("WiFi: Connecting to '{}'...", WIFI_SSID);
        match controller.connect_async().await {
            Ok(_) => {
                JOIN_FAILED.store(false, Ordering::Relaxed);
                info!("WiFi: Connected successfully!");
            }
            Err(e) => {
                JOIN_FAILED.store(true, Ordering::Relaxed);
                error!("WiFi: Connection failed: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
                continue;
            }
        }

        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("WiFi: Disconnected from AP, will retry...");

        Timer::after(Duration::from_secs(2)).await;
    }
}

/// Network Task
///
/// Prozessiert Netzwerk-Pakete des embassy-net Stacks (inkl. DHCP)
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// WiFi-Station Sicht auf den embassy-net Stack
///
/// Wird vom Readiness-Poll der Session abgefragt.
#[derive(Clone, Copy)]
pub struct StackWifiStation {
    stack: Stack<'static>,
}

impl StackWifiStation {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl WifiStation for StackWifiStation {
    fn status(&self) -> WifiStatus {
        if self.stack.config_v4().is_some() {
            WifiStatus::GotIp
        } else if self.stack.is_link_up() {
            WifiStatus::Associated
        } else if JOIN_FAILED.load(Ordering::Relaxed) {
            WifiStatus::Failed
        } else {
            WifiStatus::Joining
        }
    }

    fn ip_info(&self) -> Option<Ipv4Addr> {
        self.stack
            .config_v4()
            .map(|config| config.address.address())
    }
}
