//! CaveHat MQTT device service library.
//!
//! Bridges a publish/subscribe command topic to one addressable LED strip.
//! Exposes the pure-logic core and the adapters for integration testing;
//! the binary in `main.rs` only wires them together.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod mqtt;
pub mod shutdown;
