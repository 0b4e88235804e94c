//! MQTT 3.1.1 packet encoding and decoding (QoS 0 subset).
//!
//! Fixed header layout:
//! ```text
//! ┌──────────────┬──────────────────────────┬───────────────────────┐
//! │ type | flags │ remaining length (1–4 B) │ variable hdr + payload│
//! └──────────────┴──────────────────────────┴───────────────────────┘
//! ```
//!
//! Only the packets this service sends or expects are modelled; anything
//! else decodes to [`Packet::Other`] and is ignored by the client.

use crate::error::TransportError;

pub const CONNECT: u8 = 1;
pub const CONNACK: u8 = 2;
pub const PUBLISH: u8 = 3;
pub const SUBSCRIBE: u8 = 8;
pub const SUBACK: u8 = 9;
pub const UNSUBSCRIBE: u8 = 10;
pub const UNSUBACK: u8 = 11;
pub const PINGREQ: u8 = 12;
pub const PINGRESP: u8 = 13;
pub const DISCONNECT: u8 = 14;

/// Largest value the 4-byte remaining-length field can carry.
pub const MAX_REMAINING_LEN: usize = 268_435_455;

/// SUBACK return code for a refused subscription.
pub const SUBACK_FAILURE: u8 = 0x80;

const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4;
const FLAG_CLEAN_SESSION: u8 = 0x02;

pub const PINGREQ_BYTES: [u8; 2] = [PINGREQ << 4, 0];
pub const DISCONNECT_BYTES: [u8; 2] = [DISCONNECT << 4, 0];

/// An application message delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Packets the client can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    ConnAck { session_present: bool, code: u8 },
    Publish(Publish),
    SubAck { packet_id: u16, codes: Vec<u8> },
    UnsubAck { packet_id: u16 },
    PingResp,
    /// Any other packet type (carries the type nibble).
    Other(u8),
}

// ───────────────────────────────────────────────────────────────
// Remaining length
// ───────────────────────────────────────────────────────────────

/// Append the variable-length encoding of `len`.
pub fn encode_remaining_len(mut len: usize, out: &mut Vec<u8>) -> Result<(), TransportError> {
    if len > MAX_REMAINING_LEN {
        return Err(TransportError::PayloadTooLarge);
    }
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if len == 0 {
            return Ok(());
        }
    }
}

/// Decode a remaining length from the start of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed, otherwise the value and
/// the number of bytes it occupied.
pub fn decode_remaining_len(buf: &[u8]) -> Result<Option<(usize, usize)>, TransportError> {
    let mut value = 0usize;
    let mut multiplier = 1usize;
    for (i, byte) in buf.iter().enumerate() {
        if i == 4 {
            return Err(TransportError::Protocol);
        }
        value += (*byte & 0x7F) as usize * multiplier;
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
        multiplier *= 128;
    }
    if buf.len() >= 4 {
        return Err(TransportError::Protocol);
    }
    Ok(None)
}

// ───────────────────────────────────────────────────────────────
// Encoders
// ───────────────────────────────────────────────────────────────

fn push_str(s: &[u8], out: &mut Vec<u8>) -> Result<(), TransportError> {
    let len = u16::try_from(s.len()).map_err(|_| TransportError::PayloadTooLarge)?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(s);
    Ok(())
}

fn finish(first: u8, body: &[u8], out: &mut Vec<u8>) -> Result<(), TransportError> {
    out.push(first);
    encode_remaining_len(body.len(), out)?;
    out.extend_from_slice(body);
    Ok(())
}

/// CONNECT with clean session, no will, no credentials.
pub fn encode_connect(client_id: &str, keep_alive_secs: u16, out: &mut Vec<u8>) -> Result<(), TransportError> {
    let mut body = Vec::with_capacity(12 + client_id.len());
    push_str(PROTOCOL_NAME, &mut body)?;
    body.push(PROTOCOL_LEVEL);
    body.push(FLAG_CLEAN_SESSION);
    body.extend_from_slice(&keep_alive_secs.to_be_bytes());
    push_str(client_id.as_bytes(), &mut body)?;
    finish(CONNECT << 4, &body, out)
}

/// PUBLISH at QoS 0, not retained.
pub fn encode_publish(topic: &str, payload: &[u8], out: &mut Vec<u8>) -> Result<(), TransportError> {
    let mut body = Vec::with_capacity(2 + topic.len() + payload.len());
    push_str(topic.as_bytes(), &mut body)?;
    body.extend_from_slice(payload);
    finish(PUBLISH << 4, &body, out)
}

/// SUBSCRIBE to one filter at QoS 0.
pub fn encode_subscribe(packet_id: u16, filter: &str, out: &mut Vec<u8>) -> Result<(), TransportError> {
    let mut body = Vec::with_capacity(5 + filter.len());
    body.extend_from_slice(&packet_id.to_be_bytes());
    push_str(filter.as_bytes(), &mut body)?;
    body.push(0);
    finish(SUBSCRIBE << 4 | 0x02, &body, out)
}

/// UNSUBSCRIBE from one filter.
pub fn encode_unsubscribe(packet_id: u16, filter: &str, out: &mut Vec<u8>) -> Result<(), TransportError> {
    let mut body = Vec::with_capacity(4 + filter.len());
    body.extend_from_slice(&packet_id.to_be_bytes());
    push_str(filter.as_bytes(), &mut body)?;
    finish(UNSUBSCRIBE << 4 | 0x02, &body, out)
}

// ───────────────────────────────────────────────────────────────
// Decoder
// ───────────────────────────────────────────────────────────────

fn read_u16(body: &[u8], at: usize) -> Result<u16, TransportError> {
    body.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(TransportError::Protocol)
}

/// Decode one complete packet from its first byte and body.
pub fn decode(first: u8, body: &[u8]) -> Result<Packet, TransportError> {
    match first >> 4 {
        CONNACK => {
            if body.len() != 2 {
                return Err(TransportError::Protocol);
            }
            Ok(Packet::ConnAck {
                session_present: body[0] & 0x01 != 0,
                code: body[1],
            })
        }
        PUBLISH => {
            let qos = (first >> 1) & 0x03;
            if qos == 3 {
                return Err(TransportError::Protocol);
            }
            let topic_len = read_u16(body, 0)? as usize;
            let topic_end = 2 + topic_len;
            let topic = body
                .get(2..topic_end)
                .and_then(|t| std::str::from_utf8(t).ok())
                .ok_or(TransportError::Protocol)?
                .to_owned();
            // QoS 1/2 carry a packet id before the payload.
            let payload_start = if qos > 0 { topic_end + 2 } else { topic_end };
            let payload = body.get(payload_start..).ok_or(TransportError::Protocol)?.to_vec();
            Ok(Packet::Publish(Publish { topic, payload }))
        }
        SUBACK => {
            let packet_id = read_u16(body, 0)?;
            Ok(Packet::SubAck {
                packet_id,
                codes: body[2..].to_vec(),
            })
        }
        UNSUBACK => Ok(Packet::UnsubAck {
            packet_id: read_u16(body, 0)?,
        }),
        PINGRESP => Ok(Packet::PingResp),
        other => Ok(Packet::Other(other)),
    }
}
