//! Application service: the hexagonal core.
//!
//! [`BridgeService`] owns the LED state store and the lifecycle phase.
//! It runs the steady-state cycle for one inbound message at a time:
//!
//! ```text
//!  payload ──▶ Command::parse ──▶ apply ──▶ LedDriver (render)
//!                                       └──▶ StatePublisher (publish)
//! ```
//!
//! All I/O flows through port traits passed in at call sites, so the
//! whole cycle is testable with recording mocks.

use log::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::error::{CommandError, HardwareError, Result, TransportError};

use super::commands::{ApplyOutcome, Command};
use super::events::AppEvent;
use super::ports::{EventSink, LedDriver, StatePublisher};
use super::report::StateReport;
use super::strip::{LedStrip, MAX_LED_COUNT, SharedStrip, Snapshot};

/// Lifecycle phase of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Store allocated, nothing rendered yet.
    Starting,
    /// Accepting commands.
    Running,
    /// Strip forced off; bus teardown in progress.
    ShuttingDown,
    /// Hardware and bus released.
    Terminated,
}

// ───────────────────────────────────────────────────────────────
// BridgeService
// ───────────────────────────────────────────────────────────────

pub struct BridgeService {
    strip: SharedStrip,
    state_topic: String,
    phase: Phase,
    render_count: u64,
    publish_count: u64,
}

impl BridgeService {
    /// Allocate the strip described by `config`.
    ///
    /// Fails with [`Error::Config`](crate::error::Error::Config) on an
    /// invalid pixel count.  Does **not** render; call [`start`](Self::start).
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let strip = LedStrip::new(config.led_count)?;
        Ok(Self::with_strip(SharedStrip::new(strip), &config.state_topic))
    }

    /// Build around an existing strip handle.
    pub fn with_strip(strip: SharedStrip, state_topic: &str) -> Self {
        Self {
            strip,
            state_topic: state_topic.to_owned(),
            phase: Phase::Starting,
            render_count: 0,
            publish_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Clear the strip, render it once and enter [`Phase::Running`].
    ///
    /// A render failure here is fatal and leaves the service in `Starting`.
    pub fn start(&mut self, driver: &mut impl LedDriver, sink: &mut impl EventSink) -> Result<()> {
        if self.phase != Phase::Starting {
            warn!("start() called in {:?}, ignoring", self.phase);
            return Ok(());
        }
        self.strip.all_off();
        self.render(driver)?;
        sink.emit(&AppEvent::Started {
            led_count: self.strip.count(),
        });
        self.transition(Phase::Running, sink);
        info!("Bridge started with {} pixels", self.strip.count());
        Ok(())
    }

    /// Force the strip off and render once more.
    ///
    /// Idempotent: only the first call touches the hardware.  The render
    /// result is returned so the caller can log it, but the phase moves to
    /// `ShuttingDown` regardless.
    pub fn shutdown(
        &mut self,
        driver: &mut impl LedDriver,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), HardwareError> {
        if matches!(self.phase, Phase::ShuttingDown | Phase::Terminated) {
            debug!("shutdown() already done");
            return Ok(());
        }
        self.transition(Phase::ShuttingDown, sink);
        self.strip.all_off();
        let result = self.render(driver);
        if let Err(e) = result {
            error!("Final render failed: {}", e);
            sink.emit(&AppEvent::RenderFailed(e));
        }
        result
    }

    /// Mark the bus and hardware as released.
    pub fn terminate(&mut self, sink: &mut impl EventSink) {
        if self.phase != Phase::Terminated {
            self.transition(Phase::Terminated, sink);
        }
    }

    // ── Steady-state cycle ────────────────────────────────────

    /// Process one inbound payload: parse, mutate, render, publish.
    ///
    /// Malformed payloads are dropped before any render or publish.
    /// Render and publish failures are reported through `sink` and do not
    /// stop the cycle.  Returns `Ok(None)` when the service is not running.
    pub fn handle_message(
        &mut self,
        payload: &[u8],
        driver: &mut impl LedDriver,
        publisher: &mut impl StatePublisher,
        sink: &mut impl EventSink,
    ) -> core::result::Result<Option<ApplyOutcome>, CommandError> {
        if self.phase != Phase::Running {
            warn!("Dropping command received in {:?}", self.phase);
            return Ok(None);
        }

        let cmd = match Command::parse(payload) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Malformed command dropped: {}", e);
                sink.emit(&AppEvent::CommandRejected(e));
                return Err(e);
            }
        };

        let outcome = cmd.apply(&self.strip);
        match outcome {
            ApplyOutcome::Applied { index, color } => {
                sink.emit(&AppEvent::PixelSet { index, color });
            }
            ApplyOutcome::OutOfRange { index } => {
                sink.emit(&AppEvent::CommandIgnored { index });
            }
        }

        if let Err(e) = self.render(driver) {
            error!("Render failed: {}", e);
            sink.emit(&AppEvent::RenderFailed(e));
        }

        if let Err(e) = self.publish_state(publisher) {
            warn!("State publish failed: {}", e);
            sink.emit(&AppEvent::PublishFailed(e));
        }

        Ok(Some(outcome))
    }

    /// Push the current buffer to the strip: one `write`, one `refresh`.
    pub fn render(&mut self, driver: &mut impl LedDriver) -> core::result::Result<(), HardwareError> {
        let frame: heapless::Vec<u32, MAX_LED_COUNT> =
            self.strip.snapshot().iter().map(|c| c.packed()).collect();
        driver.write(&frame)?;
        driver.refresh()?;
        self.render_count += 1;
        Ok(())
    }

    /// Serialise the full strip and publish it on the state topic.
    pub fn publish_state(
        &mut self,
        publisher: &mut impl StatePublisher,
    ) -> core::result::Result<(), TransportError> {
        let payload = StateReport::from_snapshot(self.strip.snapshot()).to_json();
        publisher.publish(&self.state_topic, &payload)?;
        self.publish_count += 1;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle to the shared store, for the shutdown path.
    pub fn strip(&self) -> &SharedStrip {
        &self.strip
    }

    pub fn snapshot(&self) -> Snapshot {
        self.strip.snapshot()
    }

    pub fn state_topic(&self) -> &str {
        &self.state_topic
    }

    /// Successful renders since construction.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Successful state publishes since construction.
    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn transition(&mut self, to: Phase, sink: &mut impl EventSink) {
        let from = self.phase;
        self.phase = to;
        sink.emit(&AppEvent::PhaseChanged { from, to });
    }
}
