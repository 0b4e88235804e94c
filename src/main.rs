//! CaveHat MQTT Device Service: main entry point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  SimulatedStrip / Ws2812Spi   MqttClient       LogEventSink  │
//! │  (LedDriver)                  (StatePublisher) (EventSink)   │
//! │  JsonFileConfig (ConfigPort)  ShutdownSignal (SIGINT/TERM)   │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │            BridgeService (pure logic)              │      │
//! │  │  LedStrip · Command · StateReport                  │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use cavehat2mqtt::adapters::config_file::JsonFileConfig;
use cavehat2mqtt::adapters::device_id;
use cavehat2mqtt::adapters::log_sink::LogEventSink;
use cavehat2mqtt::adapters::sim_strip::SimulatedStrip;
use cavehat2mqtt::app::ports::{ConfigPort, LedDriver};
use cavehat2mqtt::app::service::BridgeService;
use cavehat2mqtt::config::{BridgeConfig, DriverKind};
use cavehat2mqtt::controller;
use cavehat2mqtt::mqtt::{MqttClient, MqttOptions, TcpTransport};
use cavehat2mqtt::shutdown::ShutdownSignal;

fn build_driver(config: &BridgeConfig) -> Result<Box<dyn LedDriver>> {
    match config.driver {
        DriverKind::Simulated => {
            info!("LED driver: simulated ({} pixels)", config.led_count);
            Ok(Box::new(SimulatedStrip::new(config.led_count)))
        }
        #[cfg(feature = "spidev")]
        DriverKind::Spi => {
            info!("LED driver: WS2812 on {}", config.spi_device);
            let drv = cavehat2mqtt::adapters::ws2812_spi::open_spidev(&config.spi_device, config.led_count)
                .with_context(|| format!("opening {}", config.spi_device))?;
            Ok(Box::new(drv))
        }
        #[cfg(not(feature = "spidev"))]
        DriverKind::Spi => anyhow::bail!("driver \"spi\" needs a build with the `spidev` feature"),
    }
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("CaveHat MQTT Device Service v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = JsonFileConfig::from_env()
        .load()
        .context("loading configuration")?;

    // ── 3. Signals ────────────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    shutdown.install_os_handlers();

    // ── 4. Store + hardware ───────────────────────────────────
    let mut service = BridgeService::new(&config).context("allocating LED strip")?;
    let mut driver = build_driver(&config)?;
    let mut sink = LogEventSink::new();

    // ── 5. Broker session factory ─────────────────────────────
    let options = MqttOptions {
        client_id: config.resolve_client_id(&device_id::hostname(), device_id::current_second()),
        keep_alive_secs: config.keep_alive_secs,
        io_timeout: Duration::from_millis(u64::from(config.io_timeout_ms)),
    };
    let poll_timeout = Duration::from_millis(u64::from(config.poll_interval_ms));
    let connect = || {
        info!("Connecting to tcp://{}:{}", config.broker_host, config.broker_port);
        let transport = TcpTransport::connect(
            &config.broker_host,
            config.broker_port,
            poll_timeout,
            options.io_timeout,
        )?;
        MqttClient::connect(transport, options.clone())
    };

    // ── 6. Run until SIGINT / SIGTERM ─────────────────────────
    controller::run(&mut service, &mut driver, &mut sink, &shutdown, &config, connect)?;

    // Release the strip only after the final dark frame.
    drop(driver);
    Ok(())
}
