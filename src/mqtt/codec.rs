//! Streaming MQTT packet decoder.
//!
//! Accumulates incoming bytes and yields complete packets.  This handles
//! partial reads gracefully: a single `Transport::read` call may return
//! part of a fixed header, part of a body, or several packets back to back.

use super::packet::{self, Packet};
use crate::error::TransportError;

/// Maximum accepted packet size (protects against memory exhaustion).
pub const MAX_PACKET_SIZE: usize = 64 * 1024;

pub struct PacketDecoder {
    buf: Vec<u8>,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append received bytes.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete packet, if one is buffered.
    ///
    /// A malformed or oversized packet is an error; the buffer is cleared
    /// since the stream can no longer be framed.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, TransportError> {
        let Some(&first) = self.buf.first() else {
            return Ok(None);
        };
        let (len, len_bytes) = match packet::decode_remaining_len(&self.buf[1..]) {
            Ok(Some(v)) => v,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.buf.clear();
                return Err(e);
            }
        };
        let header = 1 + len_bytes;
        if header + len > MAX_PACKET_SIZE {
            self.buf.clear();
            return Err(TransportError::PayloadTooLarge);
        }
        if self.buf.len() < header + len {
            return Ok(None);
        }
        let result = packet::decode(first, &self.buf[header..header + len]);
        self.buf.drain(..header + len);
        if result.is_err() {
            self.buf.clear();
        }
        result.map(Some)
    }

    /// Bytes waiting for the rest of their packet.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop partial input (e.g. after a reconnect).
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}
