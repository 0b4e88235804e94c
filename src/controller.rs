//! Lifecycle controller.
//!
//! ```text
//!  Starting ──▶ Running ──▶ ShuttingDown ──▶ Terminated
//!  all off       poll/handle   all off          unsubscribe
//!  render        render        render           disconnect(grace)
//!  connect       publish
//!  subscribe
//! ```
//!
//! Commands and the shutdown sequence run on the calling thread only, so
//! a final inbound command can never interleave with the blanking render.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::app::ports::{EventSink, LedDriver};
use crate::app::service::BridgeService;
use crate::config::BridgeConfig;
use crate::error::{Result, TransportError};
use crate::mqtt::{MqttClient, Transport};
use crate::shutdown::ShutdownSignal;

/// Run the bridge until `shutdown` is triggered, then leave the strip dark.
///
/// `connect` opens a fresh broker session; it is called once at startup
/// (failure is fatal) and again whenever the connection drops.
pub fn run<T, D, S, C>(
    service: &mut BridgeService,
    driver: &mut D,
    sink: &mut S,
    shutdown: &ShutdownSignal,
    config: &BridgeConfig,
    mut connect: C,
) -> Result<()>
where
    T: Transport,
    D: LedDriver,
    S: EventSink,
    C: FnMut() -> core::result::Result<MqttClient<T>, TransportError>,
{
    // ── Starting ─────────────────────────────────────────────
    service.start(driver, sink)?;
    let mut client = Some(open_session(&mut connect, &config.command_topic)?);
    info!("Bridge ready, waiting for commands on '{}'", config.command_topic);

    // ── Running ──────────────────────────────────────────────
    while !shutdown.is_triggered() {
        let Some(session) = client.as_mut() else {
            client = reconnect(&mut connect, config, shutdown);
            continue;
        };
        if !session.is_connected() {
            warn!("Session marked dead after a failed write, dropping it");
            session.disconnect(Duration::ZERO);
            client = None;
            continue;
        }
        match session.poll() {
            Ok(Some(msg)) if msg.topic == config.command_topic => {
                debug!("MSG {} | {}", msg.topic, String::from_utf8_lossy(&msg.payload));
                // Malformed payloads are already logged and reported by the service.
                let _ = service.handle_message(&msg.payload, driver, session, sink);
                if !session.is_connected() {
                    warn!("Connection lost while publishing state");
                    session.disconnect(Duration::ZERO);
                    client = None;
                }
            }
            Ok(Some(msg)) => debug!("Ignoring message on '{}'", msg.topic),
            Ok(None) => {}
            Err(e) => {
                warn!("Connection lost: {}", e);
                session.disconnect(Duration::ZERO);
                client = None;
            }
        }
    }

    // ── ShuttingDown ─────────────────────────────────────────
    info!("Shutting down");
    if let Err(e) = service.shutdown(driver, sink) {
        error!("Strip may not be dark: {}", e);
    }
    if let Some(mut session) = client.take() {
        if session.is_connected() {
            if let Err(e) = session.unsubscribe(&config.command_topic) {
                warn!("Unsubscribe failed: {}", e);
            }
        }
        session.disconnect(Duration::from_millis(u64::from(config.disconnect_grace_ms)));
    }

    // ── Terminated ───────────────────────────────────────────
    service.terminate(sink);
    info!("Bridge stopped");
    Ok(())
}

fn open_session<T, C>(connect: &mut C, topic: &str) -> core::result::Result<MqttClient<T>, TransportError>
where
    T: Transport,
    C: FnMut() -> core::result::Result<MqttClient<T>, TransportError>,
{
    let mut client = connect()?;
    if let Err(e) = client.subscribe(topic) {
        client.disconnect(Duration::ZERO);
        return Err(e);
    }
    Ok(client)
}

/// Sleep for the reconnect delay (waking early on shutdown), then try once.
fn reconnect<T, C>(connect: &mut C, config: &BridgeConfig, shutdown: &ShutdownSignal) -> Option<MqttClient<T>>
where
    T: Transport,
    C: FnMut() -> core::result::Result<MqttClient<T>, TransportError>,
{
    let delay = Duration::from_millis(u64::from(config.reconnect_delay_ms));
    let step = Duration::from_millis(u64::from(config.poll_interval_ms));
    let until = Instant::now() + delay;
    while Instant::now() < until {
        if shutdown.is_triggered() {
            return None;
        }
        std::thread::sleep(step.min(until.saturating_duration_since(Instant::now())));
    }
    if shutdown.is_triggered() {
        return None;
    }

    match open_session(connect, &config.command_topic) {
        Ok(client) => {
            info!("Reconnected to broker");
            Some(client)
        }
        Err(e) => {
            warn!("Reconnect failed: {}", e);
            None
        }
    }
}
