//! Outbound application events.
//!
//! The [`BridgeService`](super::service::BridgeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use super::service::Phase;
use super::strip::LedColor;
use crate::error::{CommandError, HardwareError, TransportError};

/// Structured events emitted by the bridge core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The strip was cleared and rendered at startup.
    Started { led_count: usize },

    /// A command overwrote one pixel.
    PixelSet { index: u8, color: LedColor },

    /// A command targeted a pixel outside the strip.
    CommandIgnored { index: u8 },

    /// A payload could not be decoded and was dropped.
    CommandRejected(CommandError),

    /// Pushing the buffer to the strip failed.
    RenderFailed(HardwareError),

    /// The state report could not be published.
    PublishFailed(TransportError),

    /// The lifecycle moved between phases.
    PhaseChanged { from: Phase, to: Phase },
}
