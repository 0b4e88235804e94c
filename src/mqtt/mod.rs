//! Minimal MQTT 3.1.1 client for the bridge.
//!
//! ```text
//!   MqttClient ──▶ packet (encode) ──▶ Transport ──▶ broker
//!   MqttClient ◀── codec (decode)  ◀── Transport ◀── broker
//! ```
//!
//! Supports exactly what the service needs: clean-session CONNECT,
//! QoS 0 SUBSCRIBE/PUBLISH, UNSUBSCRIBE, keep-alive pings and DISCONNECT.

pub mod client;
pub mod codec;
pub mod packet;
pub mod transport;

pub use client::{MqttClient, MqttOptions};
pub use packet::Publish;
pub use transport::{TcpTransport, Transport};
