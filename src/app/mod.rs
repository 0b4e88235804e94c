//! Application core: pure domain logic, zero I/O.
//!
//! The LED state store, the command interpreter, the state report and
//! the service that sequences them.  All interaction with the strip and
//! the message bus happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod report;
pub mod service;
pub mod strip;
