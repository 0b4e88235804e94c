//! MQTT client against the in-memory broker.

use std::time::Duration;

use super::mock_bus::FakeBroker;

use cavehat2mqtt::error::TransportError;
use cavehat2mqtt::mqtt::packet;
use cavehat2mqtt::mqtt::{MqttClient, MqttOptions};

fn options(keep_alive_secs: u16) -> MqttOptions {
    MqttOptions {
        client_id: "cavehat42".into(),
        keep_alive_secs,
        io_timeout: Duration::from_millis(200),
    }
}

#[test]
fn connect_subscribe_receive_publish() {
    let broker = FakeBroker::new();
    broker.queue_publish("cavehat2mqtt/neopixel/set", br#"{"Led":1}"#);

    let mut client = MqttClient::connect(broker.clone(), options(30)).unwrap();
    assert!(client.is_connected());
    client.subscribe("cavehat2mqtt/neopixel/set").unwrap();

    let msg = client.poll().unwrap().expect("queued message");
    assert_eq!(msg.topic, "cavehat2mqtt/neopixel/set");
    assert_eq!(msg.payload, br#"{"Led":1}"#);
    assert_eq!(client.poll().unwrap(), None);

    client.publish("cavehat2mqtt/neopixel", b"{}").unwrap();
    let published = broker.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "cavehat2mqtt/neopixel");

    assert_eq!(
        broker.written_types(),
        vec![packet::CONNECT, packet::SUBSCRIBE, packet::PUBLISH]
    );
}

#[test]
fn refused_connection_reports_code() {
    let broker = FakeBroker::new();
    broker.with(|s| s.connack_code = 5);
    let err = MqttClient::connect(broker.clone(), options(30)).err();
    assert_eq!(err, Some(TransportError::ConnectionRefused(5)));
    assert!(broker.with(|s| s.closed));
}

#[test]
fn rejected_subscription_is_an_error() {
    let broker = FakeBroker::new();
    broker.with(|s| s.suback_code = packet::SUBACK_FAILURE);
    let mut client = MqttClient::connect(broker, options(30)).unwrap();
    assert_eq!(
        client.subscribe("cavehat2mqtt/neopixel/set"),
        Err(TransportError::SubscribeRejected)
    );
}

#[test]
fn unsubscribe_then_disconnect_sends_disconnect() {
    let broker = FakeBroker::new();
    let mut client = MqttClient::connect(broker.clone(), options(30)).unwrap();
    client.subscribe("t").unwrap();
    client.unsubscribe("t").unwrap();
    client.disconnect(Duration::from_millis(250));

    assert!(!client.is_connected());
    assert!(broker.with(|s| s.disconnect_received && s.closed));
    assert_eq!(
        broker.written_types(),
        vec![
            packet::CONNECT,
            packet::SUBSCRIBE,
            packet::UNSUBSCRIBE,
            packet::DISCONNECT
        ]
    );
}

#[test]
fn missing_ack_times_out() {
    let broker = FakeBroker::new();
    let mut client = MqttClient::connect(broker.clone(), options(30)).unwrap();
    broker.with(|s| s.mute_acks = true);

    let start = std::time::Instant::now();
    assert_eq!(client.subscribe("t"), Err(TransportError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn unanswered_connect_times_out() {
    let broker = FakeBroker::new();
    broker.with(|s| s.mute_acks = true);
    let err = MqttClient::connect(broker, options(30)).err();
    assert_eq!(err, Some(TransportError::Timeout));
}

#[test]
fn keep_alive_sends_ping_when_idle() {
    let broker = FakeBroker::new();
    let mut client = MqttClient::connect(broker.clone(), options(1)).unwrap();
    std::thread::sleep(Duration::from_millis(1100));
    assert_eq!(client.poll().unwrap(), None);
    assert!(broker.written_types().contains(&packet::PINGREQ));
    // The PINGRESP was read in the same poll, so the ping is settled.
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(client.poll().unwrap(), None);
    assert!(client.is_connected());
}

#[test]
fn dropped_link_surfaces_as_disconnected() {
    let broker = FakeBroker::new();
    let mut client = MqttClient::connect(broker.clone(), options(30)).unwrap();
    broker.with(|s| s.closed = true);
    assert_eq!(client.poll(), Err(TransportError::Disconnected));
    assert!(!client.is_connected());
    assert_eq!(
        client.publish("t", b"x"),
        Err(TransportError::Disconnected)
    );
}

#[test]
fn zero_grace_disconnect_closes_without_disconnect_packet() {
    let broker = FakeBroker::new();
    let mut client = MqttClient::connect(broker.clone(), options(30)).unwrap();
    client.disconnect(Duration::ZERO);

    assert!(!client.is_connected());
    assert!(broker.with(|s| s.closed && !s.disconnect_received));
    assert_eq!(broker.written_types(), vec![packet::CONNECT]);
}

#[test]
fn failed_publish_marks_session_dead() {
    let broker = FakeBroker::new();
    let mut client = MqttClient::connect(broker.clone(), options(30)).unwrap();
    broker.with(|s| s.failing_publishes = 1);

    assert_eq!(client.publish("t", b"x"), Err(TransportError::PublishFailed));
    assert!(!client.is_connected());
}
