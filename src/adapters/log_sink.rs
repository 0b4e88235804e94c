//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the binary).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::app::service::Phase;

/// Adapter that logs every [`AppEvent`] as a one-line tagged record.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { led_count } => {
                info!("START | leds={} | all off", led_count);
            }
            AppEvent::PixelSet { index, color } => {
                info!(
                    "SET | led={} | R={} G={} B={} | packed=0x{:06X}",
                    index,
                    color.red,
                    color.green,
                    color.blue,
                    color.packed(),
                );
            }
            AppEvent::CommandIgnored { index } => {
                info!("IGNORE | led={} out of range", index);
            }
            AppEvent::CommandRejected(e) => {
                warn!("DROP | {}", e);
            }
            AppEvent::RenderFailed(e) => {
                warn!("RENDER | {}", e);
            }
            AppEvent::PublishFailed(e) => {
                warn!("PUBLISH | {}", e);
            }
            AppEvent::PhaseChanged {
                to: Phase::Terminated,
                ..
            } => {
                info!("STOP | strip dark, bus released");
            }
            AppEvent::PhaseChanged { from, to } => {
                debug!("PHASE | {:?} -> {:?}", from, to);
            }
        }
    }
}
