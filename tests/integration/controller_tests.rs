//! End-to-end lifecycle: controller + service + MQTT client over the fake
//! broker.  The broker raises the shutdown signal once it has nothing left
//! to deliver, so every run terminates on its own.

use std::cell::Cell;
use std::time::Duration;

use super::mock_bus::FakeBroker;
use super::mock_hw::{LogSink, RecordingDriver};

use cavehat2mqtt::app::events::AppEvent;
use cavehat2mqtt::app::report::StateReport;
use cavehat2mqtt::app::service::{BridgeService, Phase};
use cavehat2mqtt::app::strip::LedColor;
use cavehat2mqtt::config::{BridgeConfig, DEFAULT_COMMAND_TOPIC, DEFAULT_STATE_TOPIC};
use cavehat2mqtt::controller;
use cavehat2mqtt::error::{Error, TransportError};
use cavehat2mqtt::mqtt::packet;
use cavehat2mqtt::mqtt::{MqttClient, MqttOptions};
use cavehat2mqtt::shutdown::ShutdownSignal;

fn fast_config() -> BridgeConfig {
    BridgeConfig {
        reconnect_delay_ms: 10,
        poll_interval_ms: 5,
        ..BridgeConfig::default()
    }
}

fn options() -> MqttOptions {
    MqttOptions {
        client_id: "cavehat-test".into(),
        keep_alive_secs: 30,
        io_timeout: Duration::from_millis(200),
    }
}

fn broker_with_shutdown() -> (FakeBroker, ShutdownSignal) {
    let broker = FakeBroker::new();
    let shutdown = ShutdownSignal::new();
    let sig = shutdown.clone();
    broker.with(|s| s.shutdown_when_idle = Some(sig));
    (broker, shutdown)
}

#[test]
fn full_lifecycle_orders_packets_and_leaves_strip_dark() {
    let config = fast_config();
    let (broker, shutdown) = broker_with_shutdown();
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":3,"Red":255,"Green":0,"Blue":128}"#);
    broker.queue_publish("somewhere/else", br#"{"Led":1,"Red":1}"#);

    let mut service = BridgeService::new(&config).unwrap();
    let mut drv = RecordingDriver::new();
    let mut sink = LogSink::new();

    controller::run(&mut service, &mut drv, &mut sink, &shutdown, &config, || {
        MqttClient::connect(broker.clone(), options())
    })
    .unwrap();

    assert_eq!(
        broker.written_types(),
        vec![
            packet::CONNECT,
            packet::SUBSCRIBE,
            packet::PUBLISH,
            packet::UNSUBSCRIBE,
            packet::DISCONNECT
        ]
    );
    assert!(broker.with(|s| s.disconnect_received && s.closed));

    // Startup render, one command render, final blanking render.
    assert_eq!(drv.render_count(), 3);
    assert_eq!(drv.last_frame().unwrap(), &[0u32; 8][..]);

    let published = broker.published();
    assert_eq!(published.len(), 1, "foreign topic must not trigger a publish");
    assert_eq!(published[0].topic, DEFAULT_STATE_TOPIC);
    let report = StateReport::from_json(&published[0].payload).unwrap();
    assert_eq!(report.count, 8);
    assert_eq!(report.led[3], LedColor::new(255, 0, 128));

    assert_eq!(service.phase(), Phase::Terminated);
    assert!(service.snapshot().iter().all(|c| c.is_off()));
    assert!(sink.contains(|e| matches!(
        e,
        AppEvent::PhaseChanged {
            to: Phase::Terminated,
            ..
        }
    )));
}

#[test]
fn malformed_command_does_not_stop_the_loop() {
    let config = fast_config();
    let (broker, shutdown) = broker_with_shutdown();
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, b"not json");
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":0,"Green":9}"#);

    let mut service = BridgeService::new(&config).unwrap();
    let mut drv = RecordingDriver::new();
    let mut sink = LogSink::new();

    controller::run(&mut service, &mut drv, &mut sink, &shutdown, &config, || {
        MqttClient::connect(broker.clone(), options())
    })
    .unwrap();

    let published = broker.published();
    assert_eq!(published.len(), 1);
    let report = StateReport::from_json(&published[0].payload).unwrap();
    assert_eq!(report.led[0], LedColor::new(0, 9, 0));
    assert_eq!(drv.render_count(), 3);
}

#[test]
fn refused_initial_connection_is_fatal() {
    let config = fast_config();
    let (broker, shutdown) = broker_with_shutdown();
    broker.with(|s| s.connack_code = 5);

    let mut service = BridgeService::new(&config).unwrap();
    let mut drv = RecordingDriver::new();
    let mut sink = LogSink::new();

    let err = controller::run(&mut service, &mut drv, &mut sink, &shutdown, &config, || {
        MqttClient::connect(broker.clone(), options())
    })
    .unwrap_err();

    assert_eq!(err, Error::Transport(TransportError::ConnectionRefused(5)));
    assert_eq!(drv.render_count(), 1, "strip was blanked before connecting");
}

#[test]
fn lost_connection_is_reestablished() {
    let config = fast_config();
    let (broker, shutdown) = broker_with_shutdown();
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":1,"Red":10}"#);
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":2,"Blue":20}"#);
    broker.with(|s| s.drop_after = Some(1));

    let mut service = BridgeService::new(&config).unwrap();
    let mut drv = RecordingDriver::new();
    let mut sink = LogSink::new();
    let connects = Cell::new(0);

    controller::run(&mut service, &mut drv, &mut sink, &shutdown, &config, || {
        connects.set(connects.get() + 1);
        broker.with(|s| s.closed = false);
        MqttClient::connect(broker.clone(), options())
    })
    .unwrap();

    assert_eq!(connects.get(), 2);
    assert_eq!(
        broker.written_types(),
        vec![
            packet::CONNECT,
            packet::SUBSCRIBE,
            packet::PUBLISH,
            packet::CONNECT,
            packet::SUBSCRIBE,
            packet::PUBLISH,
            packet::UNSUBSCRIBE,
            packet::DISCONNECT
        ]
    );

    let published = broker.published();
    let last = StateReport::from_json(&published[1].payload).unwrap();
    assert_eq!(last.led[1], LedColor::new(10, 0, 0));
    assert_eq!(last.led[2], LedColor::new(0, 0, 20));
    assert!(service.snapshot().iter().all(|c| c.is_off()));
}

#[test]
fn shutdown_while_offline_still_blanks_the_strip() {
    let config = fast_config();
    let (broker, shutdown) = broker_with_shutdown();
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":6,"Red":99}"#);
    broker.with(|s| s.drop_after = Some(1));

    let mut service = BridgeService::new(&config).unwrap();
    let mut drv = RecordingDriver::new();
    let mut sink = LogSink::new();
    let connects = Cell::new(0);

    controller::run(&mut service, &mut drv, &mut sink, &shutdown, &config, || {
        connects.set(connects.get() + 1);
        if connects.get() > 1 {
            shutdown.trigger();
            return Err(TransportError::ConnectFailed);
        }
        MqttClient::connect(broker.clone(), options())
    })
    .unwrap();

    assert_eq!(connects.get(), 2);
    // No session left, so no UNSUBSCRIBE or DISCONNECT after the drop.
    assert_eq!(
        broker.written_types(),
        vec![packet::CONNECT, packet::SUBSCRIBE, packet::PUBLISH]
    );
    assert_eq!(drv.render_count(), 3);
    assert_eq!(drv.last_frame().unwrap(), &[0u32; 8][..]);
    assert_eq!(service.phase(), Phase::Terminated);
}

#[test]
fn failed_state_publish_reopens_the_session() {
    let config = fast_config();
    let (broker, shutdown) = broker_with_shutdown();
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":1,"Red":10}"#);
    broker.queue_publish(DEFAULT_COMMAND_TOPIC, br#"{"Led":2,"Blue":20}"#);
    broker.with(|s| s.failing_publishes = 1);

    let mut service = BridgeService::new(&config).unwrap();
    let mut drv = RecordingDriver::new();
    let mut sink = LogSink::new();
    let connects = Cell::new(0);

    controller::run(&mut service, &mut drv, &mut sink, &shutdown, &config, || {
        connects.set(connects.get() + 1);
        broker.with(|s| s.closed = false);
        MqttClient::connect(broker.clone(), options())
    })
    .unwrap();

    assert_eq!(connects.get(), 2, "dead session must be replaced");
    // The failed PUBLISH never reached the wire; the second command goes
    // out on the fresh session, which is then torn down cleanly.
    assert_eq!(
        broker.written_types(),
        vec![
            packet::CONNECT,
            packet::SUBSCRIBE,
            packet::CONNECT,
            packet::SUBSCRIBE,
            packet::PUBLISH,
            packet::UNSUBSCRIBE,
            packet::DISCONNECT
        ]
    );
    assert!(broker.with(|s| s.disconnect_received));
    assert!(sink.contains(|e| *e == AppEvent::PublishFailed(TransportError::PublishFailed)));

    let published = broker.published();
    let report = StateReport::from_json(&published[0].payload).unwrap();
    assert_eq!(report.led[1], LedColor::new(10, 0, 0));
    assert_eq!(report.led[2], LedColor::new(0, 0, 20));
}
