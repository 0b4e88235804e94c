//! Blocking MQTT 3.1.1 client, QoS 0 only.
//!
//! One thread owns the client and alternates between [`MqttClient::poll`]
//! (waits at most one read timeout for an inbound message) and
//! [`MqttClient::publish`].  Acknowledgements for CONNECT, SUBSCRIBE and
//! UNSUBSCRIBE are awaited synchronously, bounded by the I/O timeout;
//! application messages that arrive meanwhile are queued, not lost.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::codec::PacketDecoder;
use super::packet::{self, Packet, Publish};
use super::transport::Transport;
use crate::app::ports::StatePublisher;
use crate::error::TransportError;

const READ_CHUNK: usize = 1024;

/// Session parameters sent in CONNECT.
#[derive(Debug, Clone)]
pub struct MqttOptions {
    pub client_id: String,
    pub keep_alive_secs: u16,
    /// Bound on every acknowledgement wait.
    pub io_timeout: Duration,
}

pub struct MqttClient<T: Transport> {
    transport: T,
    decoder: PacketDecoder,
    options: MqttOptions,
    next_packet_id: u16,
    inbox: VecDeque<Publish>,
    last_sent: Instant,
    ping_sent: Option<Instant>,
    connected: bool,
}

impl<T: Transport> MqttClient<T> {
    /// Send CONNECT over `transport` and wait for a successful CONNACK.
    pub fn connect(transport: T, options: MqttOptions) -> Result<Self, TransportError> {
        let mut client = Self {
            transport,
            decoder: PacketDecoder::new(),
            options,
            next_packet_id: 0,
            inbox: VecDeque::new(),
            last_sent: Instant::now(),
            ping_sent: None,
            connected: false,
        };

        let mut out = Vec::new();
        packet::encode_connect(&client.options.client_id, client.options.keep_alive_secs, &mut out)?;
        client.send(&out)?;

        let code = client.wait_for(|p| match p {
            Packet::ConnAck { code, .. } => Some(*code),
            _ => None,
        })?;
        if code != 0 {
            warn!("Broker refused connection, return code {}", code);
            client.transport.close();
            return Err(TransportError::ConnectionRefused(code));
        }
        client.connected = true;
        info!("MQTT session established as '{}'", client.options.client_id);
        Ok(client)
    }

    /// Subscribe to `filter` at QoS 0 and wait for the SUBACK.
    pub fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        let id = self.packet_id();
        let mut out = Vec::new();
        packet::encode_subscribe(id, filter, &mut out)?;
        self.send(&out)?;
        let codes = self.wait_for(|p| match p {
            Packet::SubAck { packet_id, codes } if *packet_id == id => Some(codes.clone()),
            _ => None,
        })?;
        if codes.first().is_none_or(|c| *c == packet::SUBACK_FAILURE) {
            return Err(TransportError::SubscribeRejected);
        }
        info!("Subscribed to '{}'", filter);
        Ok(())
    }

    /// Unsubscribe from `filter` and wait for the UNSUBACK.
    pub fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        let id = self.packet_id();
        let mut out = Vec::new();
        packet::encode_unsubscribe(id, filter, &mut out)?;
        self.send(&out)?;
        self.wait_for(|p| match p {
            Packet::UnsubAck { packet_id } if *packet_id == id => Some(()),
            _ => None,
        })?;
        info!("Unsubscribed from '{}'", filter);
        Ok(())
    }

    /// Publish at QoS 0.  Returns once the packet is written and flushed.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let mut out = Vec::with_capacity(payload.len() + topic.len() + 5);
        packet::encode_publish(topic, payload, &mut out)?;
        self.send(&out).map_err(|e| match e {
            TransportError::Disconnected => e,
            _ => TransportError::PublishFailed,
        })
    }

    /// Wait up to one transport read timeout for the next inbound message.
    ///
    /// Also drives keep-alive: a PINGREQ goes out when the link has been
    /// idle for the keep-alive interval, and an unanswered ping past
    /// another interval is reported as [`TransportError::Timeout`].
    pub fn poll(&mut self) -> Result<Option<Publish>, TransportError> {
        if let Some(msg) = self.inbox.pop_front() {
            return Ok(Some(msg));
        }
        self.keep_alive()?;
        self.pump()?;
        Ok(self.inbox.pop_front())
    }

    /// Send DISCONNECT and close, spending at most `grace` on the write.
    ///
    /// A zero `grace` closes the transport without sending DISCONNECT.
    pub fn disconnect(&mut self, grace: Duration) {
        if self.connected && !grace.is_zero() {
            if let Err(e) = self.transport.set_write_timeout(grace) {
                warn!("Cannot bound DISCONNECT write to {:?}: {}", grace, e);
            }
            match self
                .transport
                .write_all(&packet::DISCONNECT_BYTES)
                .and_then(|()| self.transport.flush())
            {
                Ok(()) => debug!("DISCONNECT sent"),
                Err(e) => warn!("DISCONNECT not delivered: {}", e),
            }
        }
        self.transport.close();
        self.connected = false;
        self.inbox.clear();
        self.decoder.reset();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // ── Internal ──────────────────────────────────────────────

    fn packet_id(&mut self) -> u16 {
        // Zero is not a valid packet identifier.
        self.next_packet_id = self.next_packet_id.wrapping_add(1).max(1);
        self.next_packet_id
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let result = self
            .transport
            .write_all(bytes)
            .and_then(|()| self.transport.flush());
        match result {
            Ok(()) => {
                self.last_sent = Instant::now();
                Ok(())
            }
            Err(e) => {
                self.connected = false;
                Err(e)
            }
        }
    }

    fn keep_alive(&mut self) -> Result<(), TransportError> {
        if self.options.keep_alive_secs == 0 {
            return Ok(());
        }
        let interval = Duration::from_secs(u64::from(self.options.keep_alive_secs));
        if let Some(sent) = self.ping_sent {
            if sent.elapsed() > interval {
                self.connected = false;
                return Err(TransportError::Timeout);
            }
        } else if self.last_sent.elapsed() >= interval {
            debug!("PINGREQ");
            self.send(&packet::PINGREQ_BYTES)?;
            self.ping_sent = Some(Instant::now());
        }
        Ok(())
    }

    /// One transport read; decoded publishes go to the inbox, everything
    /// else is returned for the caller to inspect.
    fn pump(&mut self) -> Result<Vec<Packet>, TransportError> {
        let mut buf = [0u8; READ_CHUNK];
        let n = match self.transport.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                self.connected = false;
                return Err(e);
            }
        };
        self.decoder.feed(&buf[..n]);

        let mut control = Vec::new();
        loop {
            match self.decoder.next_packet() {
                Ok(Some(Packet::Publish(msg))) => self.inbox.push_back(msg),
                Ok(Some(Packet::PingResp)) => self.ping_sent = None,
                Ok(Some(other)) => control.push(other),
                Ok(None) => break,
                Err(e) => {
                    self.connected = false;
                    return Err(e);
                }
            }
        }
        Ok(control)
    }

    fn wait_for<R>(&mut self, mut matches: impl FnMut(&Packet) -> Option<R>) -> Result<R, TransportError> {
        let deadline = Instant::now() + self.options.io_timeout;
        loop {
            for packet in self.pump()? {
                if let Some(r) = matches(&packet) {
                    return Ok(r);
                }
                debug!("Ignoring {:?} while waiting for ack", packet);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout);
            }
        }
    }
}

impl<T: Transport> StatePublisher for MqttClient<T> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        MqttClient::publish(self, topic, payload)
    }
}
