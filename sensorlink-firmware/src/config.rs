// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen

use core::net::SocketAddrV4;
use core::time::Duration;

use sensorlink_core::config::{EndpointError, parse_endpoint};
use sensorlink_core::encoder::{DEFAULT_REPEAT_COUNT, PulseTiming};
use sensorlink_core::{DeviceIdentity, SessionPolicy};

// ============================================================================
// Bus-Konfiguration
// ============================================================================
//
// Die GPIOs selbst wählen die Bins (tx433: GPIO3, temp: GPIO4 mit externem
// 4.7 kΩ Pull-up, weather: SDA GPIO6 / SCL GPIO7) und loggen die Nummer
// direkt vom Peripheral.

/// I2C Taktfrequenz in kHz
pub const I2C_FREQUENCY_KHZ: u32 = 100;

// ============================================================================
// Timing
// ============================================================================

/// Wartezeit nach dem Boot bevor Peripherie initialisiert wird
pub const BOOT_SETTLE_MS: u32 = 10;

/// Wartezeit nach der Sensor-Initialisierung
pub const SENSOR_SETTLE_MS: u32 = 100;

/// Pulsbreiten des 433-MHz-Protokolls
pub const SIGNAL_TIMING: PulseTiming = PulseTiming {
    long_us: 820,
    short_us: 280,
    frame_gap_us: 9000,
};

/// Anzahl der Durchläufe pro Aussendung
pub const SIGNAL_REPEAT_COUNT: u8 = DEFAULT_REPEAT_COUNT;

/// Wetterstation: nach dieser Zeit ab Boot wird immer geschlafen
pub const AWAKE_WINDOW: Duration = Duration::from_secs(5);

/// Wetterstation: Dauer des Deep Sleep
pub const DEEP_SLEEP: Duration = Duration::from_secs(5 * 60);

/// TCP Timeout für Connect und Senden in Sekunden
pub const TCP_TIMEOUT_SECS: u64 = 10;

/// TCP RX/TX Buffer-Größen in Bytes
/// Kommandos und Antworten sind kurze Zeilen
pub const TCP_RX_BUFFER_SIZE: usize = 256;
pub const TCP_TX_BUFFER_SIZE: usize = 256;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wartezeit nach WiFi-Fehlern in Sekunden
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

/// Sockets im embassy-net Stack (DHCP + eine TCP-Verbindung)
pub const NET_SOCKETS: usize = 3;

// ============================================================================
// Collector
// ============================================================================

/// IPv4 des Collectors
/// Wird zur Build-Zeit aus der Environment Variable DEVICE_TARGET_IP geladen
pub const DEVICE_TARGET_IP: &str = env!(
    "DEVICE_TARGET_IP",
    "Collector-IP nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Port des Collectors (Sender, Thermometer)
pub const DEVICE_TARGET_PORT: &str = match option_env!("DEVICE_TARGET_PORT") {
    Some(port) => port,
    None => "37201",
};

/// Port für die Wetterstation
pub const WEATHER_TARGET_PORT: &str = match option_env!("WEATHER_TARGET_PORT") {
    Some(port) => port,
    None => "38000",
};

/// Überschreibt die GUID der gebauten Variante
pub const DEVICE_GUID: Option<&str> = option_env!("DEVICE_GUID");

// ============================================================================
// Gerätevarianten
// ============================================================================

pub const TX433_IDENTITY: DeviceIdentity =
    identity("433TX", "0ac1d020-7cd4-4ae4-9da3-241b4398bb8c");

pub const TEMP_IDENTITY: DeviceIdentity =
    identity("TEMP", "375433ac-c371-4d15-816b-1bbbb4b4f1d4");

pub const BME280_IDENTITY: DeviceIdentity =
    identity("BME280", "97c8b991-4c85-4a90-8cfc-e3cfa4a732f1");

const fn identity(kind: &'static str, default_guid: &'static str) -> DeviceIdentity {
    match DEVICE_GUID {
        Some(guid) => DeviceIdentity::new(kind, guid),
        None => DeviceIdentity::new(kind, default_guid),
    }
}

/// Zieladresse für Sender und Thermometer
pub fn device_endpoint() -> Result<SocketAddrV4, EndpointError> {
    parse_endpoint(DEVICE_TARGET_IP, DEVICE_TARGET_PORT)
}

/// Zieladresse für die Wetterstation
pub fn weather_endpoint() -> Result<SocketAddrV4, EndpointError> {
    parse_endpoint(DEVICE_TARGET_IP, WEATHER_TARGET_PORT)
}

/// Single-Shot mit Deep Sleep
pub const WEATHER_POLICY: SessionPolicy = SessionPolicy::OneShot {
    sleep_for: DEEP_SLEEP,
    awake_window: AWAKE_WINDOW,
};
