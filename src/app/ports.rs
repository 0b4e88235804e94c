//! Port traits: the hexagonal boundary between the bridge core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! Driven adapters (LED driver, message bus, event sinks, config storage)
//! implement these traits.  [`BridgeService`](super::service::BridgeService)
//! consumes them via generics, so the core never touches hardware or
//! sockets directly.

use crate::config::BridgeConfig;
use crate::error::{HardwareError, TransportError};

// ───────────────────────────────────────────────────────────────
// LED driver port (driven adapter: domain → strip hardware)
// ───────────────────────────────────────────────────────────────

/// Render-side port: pushes packed pixels to the strip.
///
/// A render is always `write` followed by `refresh`.
pub trait LedDriver {
    /// Load one frame of packed `0x00RRGGBB` values, in pixel order.
    fn write(&mut self, frame: &[u32]) -> Result<(), HardwareError>;

    /// Latch the loaded frame so it becomes visible.
    fn refresh(&mut self) -> Result<(), HardwareError>;
}

impl<T: LedDriver + ?Sized> LedDriver for &mut T {
    fn write(&mut self, frame: &[u32]) -> Result<(), HardwareError> {
        (**self).write(frame)
    }

    fn refresh(&mut self) -> Result<(), HardwareError> {
        (**self).refresh()
    }
}

impl<T: LedDriver + ?Sized> LedDriver for Box<T> {
    fn write(&mut self, frame: &[u32]) -> Result<(), HardwareError> {
        (**self).write(frame)
    }

    fn refresh(&mut self) -> Result<(), HardwareError> {
        (**self).refresh()
    }
}

// ───────────────────────────────────────────────────────────────
// State publisher port (driven adapter: domain → message bus)
// ───────────────────────────────────────────────────────────────

/// Hands a serialised state report to the bus.
///
/// Must not return before the transport has accepted the message, so the
/// next command cannot start while a publish is still in flight.
pub trait StatePublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ← persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads service configuration.
///
/// Implementations MUST run [`BridgeConfig::validate`] before returning;
/// invalid values are rejected, never clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<BridgeConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config is not valid JSON for [`BridgeConfig`].
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// The config source exists but could not be read.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
