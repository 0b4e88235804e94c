//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements     | Connects to                 |
//! |----------------|----------------|-----------------------------|
//! | `config_file`  | ConfigPort     | JSON file / stock defaults  |
//! | `log_sink`     | EventSink      | `log` facade                |
//! | `sim_strip`    | LedDriver      | in-memory frame buffer      |
//! | `ws2812_spi`   | LedDriver      | WS2812 strip on an SPI bus  |
//! | `device_id`    | (none)         | hostname for the client id  |
//!
//! The bus side of the bridge lives in [`crate::mqtt`]: `MqttClient`
//! implements `StatePublisher`.

pub mod config_file;
pub mod device_id;
pub mod log_sink;
pub mod sim_strip;
pub mod ws2812_spi;
