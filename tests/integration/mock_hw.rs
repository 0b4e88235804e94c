//! Mock LED driver, publisher and event sink for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching a real strip or broker.

use cavehat2mqtt::app::events::AppEvent;
use cavehat2mqtt::app::ports::{EventSink, LedDriver, StatePublisher};
use cavehat2mqtt::app::report::StateReport;
use cavehat2mqtt::error::{HardwareError, TransportError};

// ── Driver call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Write(Vec<u32>),
    Refresh,
}

// ── RecordingDriver ───────────────────────────────────────────

pub struct RecordingDriver {
    pub calls: Vec<DriverCall>,
    /// When set, every `refresh` fails with this error.
    pub fail_refresh: Option<HardwareError>,
}

#[allow(dead_code)]
impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_refresh: None,
        }
    }

    /// Completed renders (`write` followed by `refresh`).
    pub fn render_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DriverCall::Refresh))
            .count()
    }

    /// The most recently loaded frame.
    pub fn last_frame(&self) -> Option<&[u32]> {
        self.calls.iter().rev().find_map(|c| match c {
            DriverCall::Write(f) => Some(f.as_slice()),
            DriverCall::Refresh => None,
        })
    }
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LedDriver for RecordingDriver {
    fn write(&mut self, frame: &[u32]) -> Result<(), HardwareError> {
        self.calls.push(DriverCall::Write(frame.to_vec()));
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), HardwareError> {
        if let Some(e) = self.fail_refresh {
            return Err(e);
        }
        self.calls.push(DriverCall::Refresh);
        Ok(())
    }
}

// ── RecordingPublisher ────────────────────────────────────────

pub struct RecordingPublisher {
    pub published: Vec<(String, Vec<u8>)>,
    pub fail_with: Option<TransportError>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            published: Vec::new(),
            fail_with: None,
        }
    }

    pub fn last_report(&self) -> Option<StateReport> {
        self.published
            .last()
            .map(|(_, p)| StateReport::from_json(p).expect("publisher got invalid JSON"))
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePublisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }
}

// ── LogSink ───────────────────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, pred: impl Fn(&AppEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
