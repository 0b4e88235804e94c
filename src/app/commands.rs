//! Inbound colour-set commands.
//!
//! Payload schema (JSON object, field names are case-sensitive):
//!
//! ```text
//! { "Led": <number, required>, "Red": <number>, "Green": <number>, "Blue": <number> }
//! ```
//!
//! Every number, integer or floating point, is narrowed to `u8` by
//! truncating toward zero and wrapping modulo 256 (`300 → 44`,
//! `-1 → 255`, `12.9 → 12`).  A channel that is absent or `null` is
//! written as 0, it does **not** keep the pixel's previous value.

use serde_json::{Map, Number, Value};

use super::strip::{LedColor, SharedStrip};
use crate::error::CommandError;

/// A decoded, validated colour-set request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Target pixel, already narrowed to 8 bits.
    pub led: u8,
    pub red: Option<u8>,
    pub green: Option<u8>,
    pub blue: Option<u8>,
}

/// What [`Command::apply`] did to the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The pixel was overwritten with `color`.
    Applied { index: u8, color: LedColor },
    /// `index` is outside the strip; nothing changed.
    OutOfRange { index: u8 },
}

impl Command {
    /// Decode a raw payload.
    pub fn parse(payload: &[u8]) -> Result<Self, CommandError> {
        let value: Value = serde_json::from_slice(payload).map_err(|_| CommandError::InvalidJson)?;
        let Value::Object(fields) = value else {
            return Err(CommandError::NotAnObject);
        };

        let led = number_field(&fields, "Led")?.ok_or(CommandError::MissingLed)?;

        Ok(Self {
            led,
            red: number_field(&fields, "Red")?,
            green: number_field(&fields, "Green")?,
            blue: number_field(&fields, "Blue")?,
        })
    }

    /// Colour to write, with omitted channels defaulted to 0.
    pub fn color(&self) -> LedColor {
        LedColor::new(
            self.red.unwrap_or(0),
            self.green.unwrap_or(0),
            self.blue.unwrap_or(0),
        )
    }

    /// Write the command into `strip`.  Out-of-range targets are dropped silently.
    pub fn apply(&self, strip: &SharedStrip) -> ApplyOutcome {
        let color = self.color();
        if strip.set(self.led as usize, color) {
            ApplyOutcome::Applied {
                index: self.led,
                color,
            }
        } else {
            ApplyOutcome::OutOfRange { index: self.led }
        }
    }
}

/// `Ok(None)` for an absent or `null` field, an error for a non-number.
fn number_field(fields: &Map<String, Value>, name: &'static str) -> Result<Option<u8>, CommandError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(narrow_to_u8(n))),
        Some(_) => Err(CommandError::NonNumeric(name)),
    }
}

/// Truncate toward zero, then wrap modulo 256.
pub fn narrow_to_u8(n: &Number) -> u8 {
    if let Some(u) = n.as_u64() {
        return (u % 256) as u8;
    }
    if let Some(i) = n.as_i64() {
        return i.rem_euclid(256) as u8;
    }
    n.as_f64().map_or(0, narrow_f64)
}

fn narrow_f64(f: f64) -> u8 {
    if !f.is_finite() {
        return 0;
    }
    // f64 remainder is exact, so this holds for magnitudes past 2^53 too.
    f.trunc().rem_euclid(256.0) as u8
}
