// Session Task - Führt die Actions des Session-Zustandsautomaten aus
use core::net::SocketAddrV4;

use defmt::{Debug2Format, info, warn};
use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_net::Stack;
use embassy_net::tcp::{self, TcpSocket};
use embassy_time::{Duration, Instant, Timer};
use esp_hal::rtc_cntl::Rtc;
use esp_hal::rtc_cntl::sleep::TimerWakeupSource;

use sensorlink_core::line::LineTooLong;
use sensorlink_core::types::LINE_CAPACITY;
use sensorlink_core::{Action, Device, LineAssembler, Session, SessionEvent};

use crate::config::{TCP_RX_BUFFER_SIZE, TCP_TIMEOUT_SECS, TCP_TX_BUFFER_SIZE};
use crate::tasks::wifi::StackWifiStation;
use crate::{ThermometerDevice, TransmitterDevice, WeatherDevice};

/// Ergebnis der Action-Ausführung innerhalb einer Verbindung
enum Flow {
    /// Verbindung bleibt bestehen
    Continue,
    /// Verbindung ist beendet, Folge-Action für den äußeren Loop
    Leave(Option<Action>),
}

/// Session Logic - Testbare Ablaufsteuerung über dem Zustandsautomaten
///
/// Der Automat in sensorlink-core entscheidet, diese Funktion führt aus:
/// - `ArmReadinessPoll`: warten, dann WiFi-Status abfragen
/// - `Connect`: TCP-Verbindung aufbauen und bedienen
/// - `DeepSleep`: RTC Timer-Wakeup, kehrt nicht zurück
///
/// Zwischen allen Schritten läuft der Poll-Loop weiter, damit eine
/// laufende Aussendung auch ohne Verbindung fertig wird. Den Abstand der
/// Ticks bestimmt [`Session::poll_delay`].
pub async fn session_logic<D: Device>(
    stack: Stack<'static>,
    mut session: Session<D>,
    mut rtc: Rtc<'static>,
) -> ! {
    let wifi = StackWifiStation::new(stack);
    // Instant zählt ab Boot
    let awake_until = session
        .awake_window()
        .map(|window| Instant::from_ticks(0) + to_embassy(window));

    info!(
        "Session: {} ({}) starting",
        session.config().identity.kind,
        session.config().identity.guid
    );

    let mut next = session.start();
    loop {
        next = match next.take() {
            Some(Action::ArmReadinessPoll(interval)) => {
                wait_for_readiness(&mut session, &wifi, to_embassy(interval), awake_until).await
            }
            Some(Action::Connect(remote)) => {
                info!(
                    "Session: Connecting to {} (attempt {})",
                    Debug2Format(&remote),
                    session.connect_attempts()
                );
                run_connection(stack, &mut session, remote, awake_until).await
            }
            Some(Action::DeepSleep(duration)) => deep_sleep(&mut rtc, duration),
            Some(action) => {
                warn!("Session: {} without connection, ignored", action);
                None
            }
            None => {
                pause(session.poll_delay()).await;
                tick(&mut session, awake_until)
            }
        };
    }
}

/// Ein Tick des Poll-Loops
///
/// Prüft zuerst das Wachfenster, danach darf das Gerät einen Schritt machen.
fn tick<D: Device>(session: &mut Session<D>, awake_until: Option<Instant>) -> Option<Action> {
    if awake_until.is_some_and(|deadline| Instant::now() >= deadline) {
        return window_elapsed(session);
    }

    let dropped = session.dropped_responses();
    let next = session.dispatch(SessionEvent::PollTick);
    if session.dropped_responses() != dropped {
        warn!("Session: Response dropped, no connection");
    }
    next
}

fn window_elapsed<D: Device>(session: &mut Session<D>) -> Option<Action> {
    info!("Session: Awake window elapsed");
    session.dispatch(SessionEvent::SleepWindowElapsed)
}

/// Wartet bis zum nächsten Poll-Tick
///
/// Ohne Pause nur einmal an den Executor abgeben, damit Netz- und
/// WiFi-Task zwischen zwei Durchläufen weiterlaufen.
async fn pause(delay: core::time::Duration) {
    if delay.is_zero() {
        yield_now().await;
    } else {
        Timer::after(to_embassy(delay)).await;
    }
}

/// Führt `future` aus, solange das Wachfenster offen ist
///
/// `None`, wenn das Fenster vorher abläuft.
async fn within_window<F: Future>(future: F, awake_until: Option<Instant>) -> Option<F::Output> {
    let Some(deadline) = awake_until else {
        return Some(future.await);
    };
    match select(future, Timer::at(deadline)).await {
        Either::First(output) => Some(output),
        Either::Second(()) => None,
    }
}

/// Wartet ein Readiness-Intervall und fragt dann den WiFi-Status ab
async fn wait_for_readiness<D: Device>(
    session: &mut Session<D>,
    wifi: &StackWifiStation,
    interval: Duration,
    awake_until: Option<Instant>,
) -> Option<Action> {
    let due = Instant::now() + interval;
    while Instant::now() < due {
        pause(session.poll_delay()).await;
        // Ohne Verbindung kann hier nur Deep Sleep entstehen
        if let Some(action) = tick(session, awake_until) {
            return Some(action);
        }
    }
    session.poll_readiness(wifi)
}

/// Baut die Verbindung auf und bedient sie bis zum Abbruch
async fn run_connection<D: Device>(
    stack: Stack<'static>,
    session: &mut Session<D>,
    remote: SocketAddrV4,
    awake_until: Option<Instant>,
) -> Option<Action> {
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(TCP_TIMEOUT_SECS)));

    match within_window(socket.connect((*remote.ip(), remote.port())), awake_until).await {
        Some(Ok(())) => info!("Session: Connected"),
        Some(Err(e)) => {
            warn!("Session: Connect failed: {}", Debug2Format(&e));
            return session.dispatch(SessionEvent::ConnectFailed);
        }
        None => {
            socket.abort();
            return window_elapsed(session);
        }
    }

    let greeting = session.dispatch(SessionEvent::Connected);
    let mut flow = execute(&mut socket, session, greeting, awake_until).await;

    let mut lines = LineAssembler::new();
    let mut chunk = [0u8; LINE_CAPACITY];

    loop {
        if let Flow::Leave(next) = flow {
            return next;
        }

        // Gleichzeitig auf Daten vom Collector und den Poll-Tick warten.
        // TcpSocket::read verliert beim Abbrechen keine Daten.
        let delay = session.poll_delay();
        flow = match select(socket.read(&mut chunk), pause(delay)).await {
            Either::First(Ok(0)) => {
                info!("Session: Connection closed by peer");
                Flow::Leave(close(&mut socket, session, awake_until).await)
            }
            Either::First(Ok(n)) => {
                receive(&mut socket, session, &mut lines, &chunk[..n], awake_until).await
            }
            Either::First(Err(e)) => {
                warn!("Session: Connection aborted: {}", Debug2Format(&e));
                Flow::Leave(session.dispatch(SessionEvent::Aborted))
            }
            Either::Second(()) => {
                let next = tick(session, awake_until);
                execute(&mut socket, session, next, awake_until).await
            }
        };
    }
}

/// Zerlegt empfangene Bytes in Zeilen und beantwortet jede Zeile einzeln
async fn receive<D: Device>(
    socket: &mut TcpSocket<'_>,
    session: &mut Session<D>,
    lines: &mut LineAssembler,
    data: &[u8],
    awake_until: Option<Instant>,
) -> Flow {
    for &byte in data {
        let next = match lines.push(byte) {
            None => continue,
            Some(Ok(line)) => {
                info!("Session: Received '{=[u8]:a}'", line);
                session.dispatch(SessionEvent::Received(line))
            }
            Some(Err(LineTooLong)) => {
                warn!("Session: Line exceeds {} bytes, rejected", LINE_CAPACITY);
                session.dispatch(SessionEvent::Received(&[]))
            }
        };

        if let Flow::Leave(next) = execute(socket, session, next, awake_until).await {
            return Flow::Leave(next);
        }
    }
    Flow::Continue
}

/// Führt Actions aus, bis der Automat nichts mehr zu tun hat
async fn execute<D: Device>(
    socket: &mut TcpSocket<'_>,
    session: &mut Session<D>,
    mut next: Option<Action>,
    awake_until: Option<Instant>,
) -> Flow {
    while let Some(action) = next.take() {
        match action {
            Action::Send(line) => {
                info!("Session: Sending '{=str}'", line.as_str().trim_end());
                match within_window(write_all(socket, line.as_bytes()), awake_until).await {
                    Some(Ok(())) => next = session.dispatch(SessionEvent::SendComplete),
                    Some(Err(e)) => {
                        warn!("Session: Send failed: {}", Debug2Format(&e));
                        socket.abort();
                        return Flow::Leave(session.dispatch(SessionEvent::Aborted));
                    }
                    None => {
                        socket.abort();
                        return Flow::Leave(window_elapsed(session));
                    }
                }
            }
            Action::Close => {
                info!("Session: Closing connection");
                return Flow::Leave(close(socket, session, awake_until).await);
            }
            other => return Flow::Leave(Some(other)),
        }
    }
    Flow::Continue
}

/// FIN senden und warten, bis alles beim Peer ist
async fn close<D: Device>(
    socket: &mut TcpSocket<'_>,
    session: &mut Session<D>,
    awake_until: Option<Instant>,
) -> Option<Action> {
    socket.close();
    match within_window(socket.flush(), awake_until).await {
        Some(Ok(())) => {}
        Some(Err(e)) => warn!("Session: Flush on close failed: {}", Debug2Format(&e)),
        None => {
            socket.abort();
            return window_elapsed(session);
        }
    }
    session.dispatch(SessionEvent::Disconnected)
}

async fn write_all(socket: &mut TcpSocket<'_>, mut data: &[u8]) -> Result<(), tcp::Error> {
    while !data.is_empty() {
        let written = socket.write(data).await?;
        data = &data[written..];
    }
    socket.flush().await
}

fn deep_sleep(rtc: &mut Rtc<'static>, duration: core::time::Duration) -> ! {
    info!("Session: Entering deep sleep for {} s", duration.as_secs());
    let wakeup = TimerWakeupSource::new(duration);
    rtc.sleep_deep(&[&wakeup])
}

fn to_embassy(duration: core::time::Duration) -> Duration {
    Duration::from_micros(duration.as_micros() as u64)
}

// ============================================================================
// Embassy Tasks je Gerätevariante
// ============================================================================
//
// Embassy Tasks dürfen nicht generisch sein, daher ein Wrapper pro Variante.

/// 433-MHz-Sender: persistente Verbindung, PING und `>bits`
#[embassy_executor::task]
pub async fn transmitter_session_task(
    stack: Stack<'static>,
    session: Session<TransmitterDevice>,
    rtc: Rtc<'static>,
) -> ! {
    session_logic(stack, session, rtc).await
}

/// DS18B20 Thermometer: persistente Verbindung, PING und READ
#[embassy_executor::task]
pub async fn thermometer_session_task(
    stack: Stack<'static>,
    session: Session<ThermometerDevice>,
    rtc: Rtc<'static>,
) -> ! {
    session_logic(stack, session, rtc).await
}

/// BME280 Wetterstation: eine Messung pro Verbindung, danach Deep Sleep
#[embassy_executor::task]
pub async fn weather_session_task(
    stack: Stack<'static>,
    session: Session<WeatherDevice>,
    rtc: Rtc<'static>,
) -> ! {
    session_logic(stack, session, rtc).await
}
