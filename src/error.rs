//! Unified error types for the CaveHat MQTT device service.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! lifecycle controller's error handling uniform.  All variants are `Copy`
//! so they can be logged, emitted as events and returned without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level service error
// ---------------------------------------------------------------------------

/// Every fallible operation in the service funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid (fatal at startup).
    Config(&'static str),
    /// An inbound command payload could not be decoded.
    Command(CommandError),
    /// The messaging transport failed.
    Transport(TransportError),
    /// The LED driver failed.
    Hardware(HardwareError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// A malformed inbound command.  Never fatal: the command is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Payload is not well-formed JSON.
    InvalidJson,
    /// Payload is JSON but not an object.
    NotAnObject,
    /// The required `Led` field is absent or null.
    MissingLed,
    /// A field is present but not a number.  Carries the field name.
    NonNumeric(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "payload is not valid JSON"),
            Self::NotAnObject => write!(f, "payload is not a JSON object"),
            Self::MissingLed => write!(f, "required field `Led` is missing"),
            Self::NonNumeric(field) => write!(f, "field `{field}` is not a number"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// TCP connection to the broker could not be established.
    ConnectFailed,
    /// Broker answered CONNACK with a non-zero return code.
    ConnectionRefused(u8),
    /// Socket read or write failed.
    Io,
    /// The broker did not answer within the I/O timeout.
    Timeout,
    /// The broker sent bytes that are not a valid MQTT packet.
    Protocol,
    /// SUBACK carried the failure return code.
    SubscribeRejected,
    /// A PUBLISH could not be handed to the socket.
    PublishFailed,
    /// The connection was closed by the peer or never opened.
    Disconnected,
    /// An outgoing packet exceeds the maximum encodable size.
    PayloadTooLarge,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::ConnectionRefused(code) => write!(f, "broker refused connection (code {code})"),
            Self::Io => write!(f, "socket I/O error"),
            Self::Timeout => write!(f, "broker response timed out"),
            Self::Protocol => write!(f, "MQTT protocol violation"),
            Self::SubscribeRejected => write!(f, "subscription rejected"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::Disconnected => write!(f, "not connected"),
            Self::PayloadTooLarge => write!(f, "packet too large"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// Driver could not be opened or configured.
    InitFailed,
    /// Frame has more pixels than the driver can address.
    FrameTooLong,
    /// Latching the loaded frame onto the strip failed.
    RefreshFailed,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "LED driver init failed"),
            Self::FrameTooLong => write!(f, "frame longer than strip"),
            Self::RefreshFailed => write!(f, "LED refresh failed"),
        }
    }
}

impl std::error::Error for HardwareError {}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Service-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
