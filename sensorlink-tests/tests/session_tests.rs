//! Integration Tests für den Session-Zustandsautomaten
//!
//! Kompletter Lebenszyklus: Readiness-Poll → Connect → Kommandos →
//! Abbruch → Reconnect bzw. Deep Sleep

mod common;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use common::{MockClimateSensor, MockProbe, MockSignalPin, MockWifi};
use sensorlink_core::device::CONVERSION_INTERVAL_TICKS;
use sensorlink_core::{
    Action, Device, DeviceIdentity, Session, SessionConfig, SessionEvent, SessionPolicy,
    SessionState, SignalEncoder, Thermometer, Transmitter, WeatherStation, WifiStatus,
};

const REMOTE: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(10, 0, 1, 8), 37201);
const TX_IDENTITY: DeviceIdentity =
    DeviceIdentity::new("433TX", "0ac1d020-7cd4-4ae4-9da3-241b4398bb8c");
const SLEEP_FOR: Duration = Duration::from_secs(5 * 60);
const AWAKE_WINDOW: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn transmitter_session() -> Session<Transmitter<MockSignalPin>> {
    let device = Transmitter::new(SignalEncoder::new(MockSignalPin::new()));
    Session::new(
        SessionConfig::new(TX_IDENTITY, REMOTE, SessionPolicy::Persistent),
        device,
    )
}

fn weather_session(sensor: MockClimateSensor) -> Session<WeatherStation<MockClimateSensor>> {
    let identity = DeviceIdentity::new("BME280", "97c8b991-4c85-4a90-8cfc-e3cfa4a732f1");
    let policy = SessionPolicy::OneShot {
        sleep_for: SLEEP_FOR,
        awake_window: AWAKE_WINDOW,
    };
    Session::new(
        SessionConfig::new(identity, SocketAddrV4::new(*REMOTE.ip(), 38000), policy),
        WeatherStation::new(sensor),
    )
}

fn send(text: &str) -> Option<Action> {
    Some(Action::Send(text.try_into().unwrap()))
}

/// Bis `Connected` durchschalten, Begrüßung zurückgeben
fn connect<D: Device>(session: &mut Session<D>) -> Option<Action> {
    assert_eq!(
        session.start(),
        Some(Action::ArmReadinessPoll(Duration::from_millis(500)))
    );
    let remote = session.config().remote;
    assert_eq!(
        session.poll_readiness(&MockWifi::got_ip()),
        Some(Action::Connect(remote))
    );
    session.dispatch(SessionEvent::Connected)
}

// ============================================================================
// Tests: Readiness-Poll
// ============================================================================

#[test]
fn test_session_starts_in_wifi_joining() {
    let session = transmitter_session();
    assert_eq!(session.state(), SessionState::WifiJoining);
    assert!(session.connection().is_none());
    assert!(!session.is_readiness_armed());
}

#[test]
fn test_readiness_poll_rearms_until_ip() {
    let mut session = transmitter_session();
    assert!(session.start().is_some());
    assert_eq!(session.state(), SessionState::AwaitingIp);

    let joining = MockWifi::joining();
    for _ in 0..5 {
        assert_eq!(
            session.poll_readiness(&joining),
            Some(Action::ArmReadinessPoll(Duration::from_millis(500)))
        );
        assert_eq!(session.state(), SessionState::AwaitingIp);
    }

    // Assoziiert, aber noch ohne IP
    let associated = MockWifi {
        status: WifiStatus::Associated,
        ip: None,
    };
    assert!(matches!(
        session.poll_readiness(&associated),
        Some(Action::ArmReadinessPoll(_))
    ));

    assert_eq!(
        session.poll_readiness(&MockWifi::got_ip()),
        Some(Action::Connect(REMOTE))
    );
    assert_eq!(session.state(), SessionState::Connecting);
    assert_eq!(session.connect_attempts(), 1);

    let connection = session.connection().unwrap();
    assert_eq!(connection.local_ip, Ipv4Addr::new(10, 0, 1, 42));
    assert_eq!(connection.remote, REMOTE);
}

#[test]
fn test_got_ip_fires_connect_exactly_once() {
    let mut session = transmitter_session();
    session.start();
    let wifi = MockWifi::got_ip();

    assert_eq!(session.poll_readiness(&wifi), Some(Action::Connect(REMOTE)));
    // Poll ist entschärft: weitere Ticks lösen nichts aus
    assert!(!session.is_readiness_armed());
    assert_eq!(session.poll_readiness(&wifi), None);
    assert_eq!(session.poll_readiness(&wifi), None);
    assert_eq!(session.connect_attempts(), 1);
}

#[test]
fn test_start_twice_arms_only_once() {
    let mut session = transmitter_session();
    assert!(session.start().is_some());
    assert_eq!(session.start(), None);
}

// ============================================================================
// Tests: Verbundene Session (Sender)
// ============================================================================

#[test]
fn test_connect_sends_identification_line() {
    let mut session = transmitter_session();
    assert_eq!(
        connect(&mut session),
        send("433TX;0ac1d020-7cd4-4ae4-9da3-241b4398bb8c\n")
    );
    assert_eq!(session.state(), SessionState::Connected);

    // Persistent: nach dem Senden bleibt die Verbindung offen
    assert_eq!(session.dispatch(SessionEvent::SendComplete), None);
    assert_eq!(session.state(), SessionState::Connected);
}

#[test]
fn test_ping_pong_once_connected() {
    let mut session = transmitter_session();
    connect(&mut session);

    for _ in 0..3 {
        assert_eq!(session.dispatch(SessionEvent::Received(b"PING\n")), send("PONG\n"));
        assert_eq!(session.dispatch(SessionEvent::SendComplete), None);
    }
}

#[test]
fn test_received_before_connect_is_ignored() {
    let mut session = transmitter_session();
    session.start();
    assert_eq!(session.dispatch(SessionEvent::Received(b"PING\n")), None);
}

#[test]
fn test_emission_reply_arrives_via_poll_loop() {
    let mut session = transmitter_session();
    connect(&mut session);

    assert_eq!(session.dispatch(SessionEvent::Received(b">1010\n")), None);
    assert_eq!(session.dispatch(SessionEvent::Received(b">0000\n")), send("BUSY\n"));

    let mut replies = Vec::new();
    for _ in 0..20 {
        if let Some(action) = session.dispatch(SessionEvent::PollTick) {
            replies.push(action);
        }
    }
    assert_eq!(replies, vec![Action::Send("OK\n".try_into().unwrap())]);

    // Danach wieder frei
    assert_eq!(session.dispatch(SessionEvent::Received(b">1\n")), None);
}

#[test]
fn test_emission_repeats_without_poll_pause() {
    let mut session = transmitter_session();
    connect(&mut session);
    assert_eq!(session.poll_delay(), POLL_INTERVAL);

    assert_eq!(session.dispatch(SessionEvent::Received(b">10\n")), None);

    // Poll-Loop wie in der Firmware: Pause abwarten, dann ticken
    let mut waited = Duration::ZERO;
    let mut ticks = 0;
    let reply = loop {
        waited += session.poll_delay();
        ticks += 1;
        if let Some(action) = session.dispatch(SessionEvent::PollTick) {
            break Some(action);
        }
        assert!(ticks < 100, "Emission never finished");
    };

    assert_eq!(reply, send("OK\n"));
    assert_eq!(ticks, 17);
    // Zwischen den Durchläufen nur die 9000 µs des Encoders
    assert_eq!(waited, Duration::ZERO);
    let pin = session.device().encoder().pin();
    assert_eq!(pin.gaps(), vec![9000; 16]);
    assert_eq!(pin.cells().len(), 2 * 17);

    assert_eq!(session.poll_delay(), POLL_INTERVAL);
}

#[test]
fn test_emission_without_connection_keeps_fast_polling() {
    let mut session = transmitter_session();
    connect(&mut session);
    session.dispatch(SessionEvent::Received(b">1\n"));
    session.dispatch(SessionEvent::Aborted);

    assert_eq!(session.poll_delay(), Duration::ZERO);
    for _ in 0..17 {
        session.dispatch(SessionEvent::PollTick);
    }
    assert_eq!(session.poll_delay(), POLL_INTERVAL);
}

#[test]
fn test_unknown_command_keeps_connection_and_job() {
    let mut session = transmitter_session();
    connect(&mut session);

    assert_eq!(session.dispatch(SessionEvent::Received(b"FOO\n")), send("ERROR\n"));
    assert_eq!(session.state(), SessionState::Connected);
    assert!(session.connection().is_some());
    assert!(!session.device().encoder().is_busy());
}

#[test]
fn test_completion_while_disconnected_is_dropped() {
    let mut session = transmitter_session();
    connect(&mut session);
    session.dispatch(SessionEvent::Received(b">1\n"));

    assert!(matches!(
        session.dispatch(SessionEvent::Aborted),
        Some(Action::ArmReadinessPoll(_))
    ));
    // Aussendung läuft weiter, OK geht verloren
    for _ in 0..17 {
        assert_eq!(session.dispatch(SessionEvent::PollTick), None);
    }
    assert!(!session.device().encoder().is_busy());
    assert_eq!(session.dropped_responses(), 1);
}

// ============================================================================
// Tests: Abbruch und Reconnect
// ============================================================================

#[test]
fn test_disconnect_reenters_readiness_polling() {
    for event in [SessionEvent::Disconnected, SessionEvent::Aborted] {
        let mut session = transmitter_session();
        connect(&mut session);

        assert_eq!(
            session.dispatch(event),
            Some(Action::ArmReadinessPoll(Duration::from_millis(500)))
        );
        assert_eq!(session.state(), SessionState::AwaitingIp);
        assert!(session.connection().is_none());
        assert!(session.is_readiness_armed());

        // Genau ein neuer Verbindungsversuch
        let wifi = MockWifi::got_ip();
        assert_eq!(session.poll_readiness(&wifi), Some(Action::Connect(REMOTE)));
        assert_eq!(session.poll_readiness(&wifi), None);
        assert_eq!(session.connect_attempts(), 2);
    }
}

#[test]
fn test_connect_failure_retries_without_backoff() {
    let mut session = transmitter_session();
    session.start();
    let wifi = MockWifi::got_ip();

    for attempt in 1..=3 {
        assert_eq!(session.poll_readiness(&wifi), Some(Action::Connect(REMOTE)));
        assert_eq!(session.connect_attempts(), attempt);
        assert_eq!(
            session.dispatch(SessionEvent::ConnectFailed),
            Some(Action::ArmReadinessPoll(Duration::from_millis(500)))
        );
    }
}

#[test]
fn test_duplicate_disconnect_does_not_double_arm() {
    let mut session = transmitter_session();
    connect(&mut session);

    assert!(session.dispatch(SessionEvent::Disconnected).is_some());
    assert_eq!(session.dispatch(SessionEvent::Disconnected), None);
    assert_eq!(session.dispatch(SessionEvent::Aborted), None);
}

#[test]
fn test_persistent_session_ignores_sleep_window() {
    let mut session = transmitter_session();
    connect(&mut session);
    assert_eq!(session.dispatch(SessionEvent::SleepWindowElapsed), None);
    assert_eq!(session.awake_window(), None);
}

// ============================================================================
// Tests: Thermometer
// ============================================================================

#[test]
fn test_thermometer_read_over_session() {
    let identity = DeviceIdentity::new("TEMP", "375433ac-c371-4d15-816b-1bbbb4b4f1d4");
    let mut session = Session::new(
        SessionConfig::new(identity, REMOTE, SessionPolicy::Persistent),
        Thermometer::new(MockProbe::new(2345)),
    );

    assert_eq!(
        connect(&mut session),
        send("TEMP;375433ac-c371-4d15-816b-1bbbb4b4f1d4\n")
    );
    assert_eq!(session.dispatch(SessionEvent::Received(b"READ\n")), send("23.45\n"));
}

#[test]
fn test_thermometer_starts_conversion_every_second() {
    let identity = DeviceIdentity::new("TEMP", "375433ac-c371-4d15-816b-1bbbb4b4f1d4");
    let mut session = Session::new(
        SessionConfig::new(identity, REMOTE, SessionPolicy::Persistent),
        Thermometer::new(MockProbe::new(2345)),
    );
    connect(&mut session);
    assert_eq!(session.poll_delay(), POLL_INTERVAL);

    for _ in 0..CONVERSION_INTERVAL_TICKS - 1 {
        assert_eq!(session.dispatch(SessionEvent::PollTick), None);
    }
    assert_eq!(session.device().probe().conversions, 0);

    assert_eq!(session.dispatch(SessionEvent::PollTick), None);
    assert_eq!(session.device().probe().conversions, 1);

    for _ in 0..CONVERSION_INTERVAL_TICKS {
        session.dispatch(SessionEvent::PollTick);
    }
    assert_eq!(session.device().probe().conversions, 2);

    // READ liest nur das Ergebnis, ohne neue Wandlung
    assert_eq!(session.dispatch(SessionEvent::Received(b"READ\n")), send("23.45\n"));
    assert_eq!(session.device().probe().conversions, 2);
    assert_eq!(session.device().probe().read_count, 1);
}

// ============================================================================
// Tests: Wetterstation (Single-Shot)
// ============================================================================

#[test]
fn test_weather_single_shot_then_sleep() {
    let mut session = weather_session(MockClimateSensor::new(2345, 101_325 << 8, 45 << 10));

    assert_eq!(connect(&mut session), send("23.45;1013.25;45.00\n"));
    // Keine Kommandoverarbeitung
    assert_eq!(session.dispatch(SessionEvent::Received(b"PING\n")), None);

    assert_eq!(session.dispatch(SessionEvent::SendComplete), Some(Action::Close));
    assert_eq!(session.state(), SessionState::Disconnected);

    assert_eq!(
        session.dispatch(SessionEvent::Disconnected),
        Some(Action::DeepSleep(SLEEP_FOR))
    );
    assert_eq!(session.state(), SessionState::Sleeping);
    assert!(session.device().sensor().asleep);
    assert!(session.connection().is_none());
}

#[test]
fn test_weather_broken_sensor_sends_error() {
    let mut session = weather_session(MockClimateSensor::broken());
    assert_eq!(connect(&mut session), send("ERROR\n"));
    assert_eq!(session.dispatch(SessionEvent::SendComplete), Some(Action::Close));
}

#[test]
fn test_weather_abort_reconnects() {
    let mut session = weather_session(MockClimateSensor::new(0, 0, 0));
    connect(&mut session);

    assert!(matches!(
        session.dispatch(SessionEvent::Aborted),
        Some(Action::ArmReadinessPoll(_))
    ));
    assert_eq!(session.state(), SessionState::AwaitingIp);
}

#[test]
fn test_weather_sleep_window() {
    let mut session = weather_session(MockClimateSensor::new(0, 0, 0));
    assert_eq!(session.awake_window(), Some(AWAKE_WINDOW));
    session.start();

    assert_eq!(
        session.dispatch(SessionEvent::SleepWindowElapsed),
        Some(Action::DeepSleep(SLEEP_FOR))
    );
    assert!(session.device().sensor().asleep);
}

#[test]
fn test_weather_sleep_window_while_connecting() {
    let mut session = weather_session(MockClimateSensor::new(0, 0, 0));
    session.start();
    assert_eq!(
        session.poll_readiness(&MockWifi::got_ip()),
        Some(Action::Connect(SocketAddrV4::new(*REMOTE.ip(), 38000)))
    );

    // Collector antwortet nicht, das Wachfenster läuft während des Connects ab
    assert_eq!(
        session.dispatch(SessionEvent::SleepWindowElapsed),
        Some(Action::DeepSleep(SLEEP_FOR))
    );
    assert_eq!(session.state(), SessionState::Sleeping);
    assert!(session.device().sensor().asleep);
    assert_eq!(session.dispatch(SessionEvent::ConnectFailed), None);
}

#[test]
fn test_sleeping_is_terminal() {
    let mut session = weather_session(MockClimateSensor::new(0, 0, 0));
    session.start();
    session.dispatch(SessionEvent::SleepWindowElapsed);

    assert_eq!(session.poll_readiness(&MockWifi::got_ip()), None);
    assert_eq!(session.dispatch(SessionEvent::Connected), None);
    assert_eq!(session.dispatch(SessionEvent::PollTick), None);
    assert_eq!(session.dispatch(SessionEvent::SleepWindowElapsed), None);
    assert_eq!(session.state(), SessionState::Sleeping);
}
