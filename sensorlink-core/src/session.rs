//! Session-Zustandsautomat
//!
//! Besitzt die eine Verbindung zum Collector und entscheidet über
//! Readiness-Polling, Verbindungsaufbau, Antworten und Reconnect.
//! Der Automat macht selbst kein I/O: jedes Event liefert höchstens eine
//! [`Action`], die der Firmware-Task ausführt.
//!
//! ```text
//! WifiJoining ─start()─▶ AwaitingIp ─GotIp─▶ Connecting ─Connected─▶ Connected
//!                            ▲                    │                       │
//!                            └────── Abbruch ─────┴───────────────────────┤
//!                                                                         ▼
//!                                 Sleeping ◀─ Disconnected (Single-Shot) ─┘
//! ```

use core::net::{Ipv4Addr, SocketAddrV4};
use core::time::Duration;

use crate::device::Device;
use crate::protocol::{Reply, Response, handle_line};
use crate::traits::WifiStation;
use crate::types::{Connection, DeviceIdentity, Line, WifiStatus};

/// Intervall des Readiness-Polls
pub const READINESS_INTERVAL: Duration = Duration::from_millis(500);

/// Pause zwischen zwei Poll-Ticks, solange das Gerät nichts zu tun hat
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    WifiJoining,
    AwaitingIp,
    Connecting,
    Connected,
    /// Verbindung wird abgebaut (Single-Shot nach dem Senden)
    Disconnected,
    /// Terminal: Deep Sleep
    Sleeping,
}

/// Verhalten nach dem Verbindungsende
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Verbindung bleibt offen, nach Abbruch sofort Reconnect
    Persistent,
    /// Eine Antwort, Verbindung schließen, dann Deep Sleep
    OneShot {
        /// Dauer des Deep Sleep
        sleep_for: Duration,
        /// Spätestens nach dieser Zeit ab Boot wird geschlafen
        awake_window: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub identity: DeviceIdentity,
    pub remote: SocketAddrV4,
    pub policy: SessionPolicy,
    pub readiness_interval: Duration,
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn new(identity: DeviceIdentity, remote: SocketAddrV4, policy: SessionPolicy) -> Self {
        Self {
            identity,
            remote,
            policy,
            readiness_interval: READINESS_INTERVAL,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Events aus Timer, WiFi und TCP-Stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent<'a> {
    /// Readiness-Timer abgelaufen, aktueller WiFi-Status
    ReadinessTick {
        status: WifiStatus,
        local_ip: Option<Ipv4Addr>,
    },
    Connected,
    ConnectFailed,
    /// Eine komplette Zeile vom Collector
    Received(&'a [u8]),
    SendComplete,
    /// Geordneter Verbindungsabbau (Peer oder eigenes Close)
    Disconnected,
    /// Socket-Fehler / Reset
    Aborted,
    /// Poll-Loop Tick (10 ms)
    PollTick,
    /// Wachfenster der Single-Shot-Variante abgelaufen
    SleepWindowElapsed,
}

/// Auftrag an den Firmware-Task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Readiness-Poll nach `Duration` erneut ausführen
    ArmReadinessPoll(Duration),
    Connect(SocketAddrV4),
    Send(Line),
    Close,
    DeepSleep(Duration),
}

#[cfg(feature = "defmt")]
impl defmt::Format for Action {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Action::ArmReadinessPoll(interval) => {
                defmt::write!(fmt, "ArmReadinessPoll({} ms)", interval.as_millis() as u64)
            }
            Action::Connect(remote) => {
                let ip = remote.ip().octets();
                defmt::write!(
                    fmt,
                    "Connect({}.{}.{}.{}:{})",
                    ip[0],
                    ip[1],
                    ip[2],
                    ip[3],
                    remote.port()
                )
            }
            Action::Send(line) => defmt::write!(fmt, "Send({=str})", line.as_str().trim_end()),
            Action::Close => defmt::write!(fmt, "Close"),
            Action::DeepSleep(duration) => {
                defmt::write!(fmt, "DeepSleep({} s)", duration.as_secs())
            }
        }
    }
}

pub struct Session<D: Device> {
    config: SessionConfig,
    device: D,
    state: SessionState,
    connection: Option<Connection>,
    readiness_armed: bool,
    connect_attempts: u32,
    dropped_responses: u32,
}

impl<D: Device> Session<D> {
    pub fn new(config: SessionConfig, device: D) -> Self {
        Self {
            config,
            device,
            state: SessionState::WifiJoining,
            connection: None,
            readiness_armed: false,
            connect_attempts: 0,
            dropped_responses: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_readiness_armed(&self) -> bool {
        self.readiness_armed
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    /// Antworten, die ohne Verbindung fällig wurden (z.B. `OK` nach Abbruch)
    pub fn dropped_responses(&self) -> u32 {
        self.dropped_responses
    }

    /// Wachfenster ab Boot, nur bei Single-Shot
    pub fn awake_window(&self) -> Option<Duration> {
        match self.config.policy {
            SessionPolicy::OneShot { awake_window, .. } => Some(awake_window),
            SessionPolicy::Persistent => None,
        }
    }

    /// Wartezeit bis zum nächsten `PollTick`
    ///
    /// Während einer Aussendung folgt der nächste Durchlauf sofort, die
    /// Pause zwischen den Durchläufen gibt der Encoder selbst aus.
    pub fn poll_delay(&self) -> Duration {
        if self.state != SessionState::Sleeping && self.device.is_busy() {
            Duration::ZERO
        } else {
            self.config.poll_interval
        }
    }

    /// WiFi ist konfiguriert: Readiness-Poll starten
    pub fn start(&mut self) -> Option<Action> {
        if self.state != SessionState::WifiJoining {
            return None;
        }
        self.state = SessionState::AwaitingIp;
        self.arm_readiness()
    }

    /// Readiness-Poll: WiFi-Status abfragen und als Event verarbeiten
    pub fn poll_readiness<W: WifiStation + ?Sized>(&mut self, wifi: &W) -> Option<Action> {
        self.dispatch(SessionEvent::ReadinessTick {
            status: wifi.status(),
            local_ip: wifi.ip_info(),
        })
    }

    pub fn dispatch(&mut self, event: SessionEvent<'_>) -> Option<Action> {
        if self.state == SessionState::Sleeping {
            return None;
        }

        match event {
            SessionEvent::ReadinessTick { status, local_ip } => {
                self.on_readiness_tick(status, local_ip)
            }
            SessionEvent::Connected => self.on_connected(),
            SessionEvent::Received(line) => self.on_received(line),
            SessionEvent::SendComplete => self.on_send_complete(),
            SessionEvent::Disconnected => self.on_disconnected(),
            SessionEvent::ConnectFailed | SessionEvent::Aborted => self.on_aborted(),
            SessionEvent::PollTick => self.on_poll_tick(),
            SessionEvent::SleepWindowElapsed => self.on_sleep_window(),
        }
    }

    fn arm_readiness(&mut self) -> Option<Action> {
        // höchstens ein Readiness-Poll gleichzeitig
        if self.readiness_armed {
            return None;
        }
        self.readiness_armed = true;
        Some(Action::ArmReadinessPoll(self.config.readiness_interval))
    }

    fn on_readiness_tick(
        &mut self,
        status: WifiStatus,
        local_ip: Option<Ipv4Addr>,
    ) -> Option<Action> {
        if self.state != SessionState::AwaitingIp || !self.readiness_armed {
            return None;
        }
        self.readiness_armed = false;

        match (status, local_ip) {
            (WifiStatus::GotIp, Some(local_ip)) => {
                self.connection = Some(Connection {
                    local_ip,
                    remote: self.config.remote,
                });
                self.connect_attempts = self.connect_attempts.wrapping_add(1);
                self.state = SessionState::Connecting;
                Some(Action::Connect(self.config.remote))
            }
            _ => self.arm_readiness(),
        }
    }

    fn on_connected(&mut self) -> Option<Action> {
        if self.state != SessionState::Connecting {
            return None;
        }
        self.state = SessionState::Connected;
        let greeting = self.device.greeting(&self.config.identity);
        Some(Action::Send(greeting.render_or_error()))
    }

    fn on_received(&mut self, line: &[u8]) -> Option<Action> {
        if self.state != SessionState::Connected {
            return None;
        }
        // Single-Shot: keine weitere Kommandoverarbeitung
        if let SessionPolicy::OneShot { .. } = self.config.policy {
            return None;
        }
        match handle_line(&mut self.device, line) {
            Reply::Send(response) => Some(Action::Send(response.render_or_error())),
            Reply::Deferred => None,
        }
    }

    fn on_send_complete(&mut self) -> Option<Action> {
        match (self.state, self.config.policy) {
            (SessionState::Connected, SessionPolicy::OneShot { .. }) => {
                self.state = SessionState::Disconnected;
                Some(Action::Close)
            }
            _ => None,
        }
    }

    fn on_disconnected(&mut self) -> Option<Action> {
        match self.state {
            SessionState::Connecting | SessionState::Connected | SessionState::Disconnected => {}
            _ => return None,
        }
        self.connection = None;

        match self.config.policy {
            SessionPolicy::Persistent => self.reconnect(),
            SessionPolicy::OneShot { sleep_for, .. } => self.enter_sleep(sleep_for),
        }
    }

    fn on_aborted(&mut self) -> Option<Action> {
        match self.state {
            SessionState::Connecting | SessionState::Connected | SessionState::Disconnected => {}
            _ => return None,
        }
        self.connection = None;
        self.reconnect()
    }

    fn reconnect(&mut self) -> Option<Action> {
        self.state = SessionState::AwaitingIp;
        self.arm_readiness()
    }

    fn on_poll_tick(&mut self) -> Option<Action> {
        let response = self.device.poll()?;
        self.send_if_connected(response)
    }

    fn send_if_connected(&mut self, response: Response) -> Option<Action> {
        if self.state == SessionState::Connected {
            Some(Action::Send(response.render_or_error()))
        } else {
            self.dropped_responses = self.dropped_responses.wrapping_add(1);
            None
        }
    }

    fn on_sleep_window(&mut self) -> Option<Action> {
        match self.config.policy {
            SessionPolicy::OneShot { sleep_for, .. } => self.enter_sleep(sleep_for),
            SessionPolicy::Persistent => None,
        }
    }

    fn enter_sleep(&mut self, duration: Duration) -> Option<Action> {
        self.device.power_down();
        self.connection = None;
        self.readiness_armed = false;
        self.state = SessionState::Sleeping;
        Some(Action::DeepSleep(duration))
    }
}
