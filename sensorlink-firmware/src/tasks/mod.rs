// Task-Modul: Enthält alle Embassy Tasks
//
// WiFi-Tasks halten die Station verbunden, der Session-Task führt das
// Zeilenprotokoll zum Collector aus.

pub mod session;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use session::{thermometer_session_task, transmitter_session_task, weather_session_task};
pub use wifi::{StackWifiStation, connection_task, net_task};
