//! Service configuration parameters
//!
//! All tunable parameters for the bridge.  Defaults reproduce the stock
//! CaveHat deployment: local broker, eight pixels, fixed topics.
//! Values can be overridden from a JSON file (see
//! [`JsonFileConfig`](crate::adapters::config_file::JsonFileConfig)).

use serde::{Deserialize, Serialize};

use crate::app::strip::MAX_LED_COUNT;

/// Inbound command topic.
pub const DEFAULT_COMMAND_TOPIC: &str = "cavehat2mqtt/neopixel/set";

/// Outbound state broadcast topic.
pub const DEFAULT_STATE_TOPIC: &str = "cavehat2mqtt/neopixel";

/// Which LED driver the binary wires behind the render port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// In-memory strip that logs every latched frame.
    Simulated,
    /// WS2812 over a Linux spidev bus (requires the `spidev` feature).
    Spi,
}

/// Core service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // --- Broker ---
    /// Broker hostname or IP
    pub broker_host: String,
    /// Broker TCP port
    pub broker_port: u16,
    /// MQTT client identifier; `None` derives `<hostname><second>`
    pub client_id: Option<String>,
    /// MQTT keep-alive interval (seconds)
    pub keep_alive_secs: u16,

    // --- Topics ---
    pub command_topic: String,
    pub state_topic: String,

    // --- Strip ---
    /// Number of physically addressable pixels
    pub led_count: usize,
    pub driver: DriverKind,
    /// spidev node used when `driver` is `spi`
    pub spi_device: String,

    // --- Timing ---
    /// Grace period for in-flight publishes on disconnect (milliseconds)
    pub disconnect_grace_ms: u32,
    /// Bound on broker acknowledgements and socket writes (milliseconds)
    pub io_timeout_ms: u32,
    /// Event loop read timeout; bounds shutdown latency (milliseconds)
    pub poll_interval_ms: u32,
    /// Delay between reconnect attempts (milliseconds)
    pub reconnect_delay_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // Broker
            broker_host: "localhost".into(),
            broker_port: 1883,
            client_id: None,
            keep_alive_secs: 30,

            // Topics
            command_topic: DEFAULT_COMMAND_TOPIC.into(),
            state_topic: DEFAULT_STATE_TOPIC.into(),

            // Strip
            led_count: 8,
            driver: DriverKind::Simulated,
            spi_device: "/dev/spidev0.0".into(),

            // Timing
            disconnect_grace_ms: 250,
            io_timeout_ms: 5000,
            poll_interval_ms: 100,
            reconnect_delay_ms: 1000,
        }
    }
}

impl BridgeConfig {
    /// Range-check every field.  The returned message names the offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.led_count == 0 {
            return Err("led_count must be at least 1");
        }
        if self.led_count > MAX_LED_COUNT {
            return Err("led_count exceeds the addressable maximum");
        }
        if self.broker_host.is_empty() {
            return Err("broker_host is empty");
        }
        if self.command_topic.is_empty() {
            return Err("command_topic is empty");
        }
        if self.state_topic.is_empty() {
            return Err("state_topic is empty");
        }
        if self.state_topic.contains(['+', '#']) {
            return Err("state_topic must not contain wildcards");
        }
        if self.io_timeout_ms == 0 || self.poll_interval_ms == 0 {
            return Err("timeouts must be non-zero");
        }
        if self.disconnect_grace_ms == 0 {
            return Err("disconnect_grace_ms must be non-zero");
        }
        Ok(())
    }

    /// Client id to present to the broker.
    ///
    /// `hostname` and `second` feed the derived id used when none is
    /// configured, so restarts within the same minute rarely collide.
    pub fn resolve_client_id(&self, hostname: &str, second: u64) -> String {
        match &self.client_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{hostname}{second}"),
        }
    }
}
