//! Outbound state broadcast.
//!
//! Published on the state topic after every processed command:
//!
//! ```text
//! {"Count":8,"Led":[{"Red":0,"Green":0,"Blue":0}, ...]}
//! ```

use serde::{Deserialize, Serialize};

use super::strip::{LedColor, Snapshot};

/// Full strip state in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateReport {
    pub count: u8,
    pub led: Snapshot,
}

impl StateReport {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            count: snapshot.len() as u8,
            led: snapshot,
        }
    }

    pub fn to_json(&self) -> Vec<u8> {
        // Only derived impls over integers: serialisation cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode a report, rejecting one whose `Count` disagrees with `Led`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let report: Self = serde_json::from_slice(bytes)?;
        if usize::from(report.count) != report.led.len() {
            return Err(serde::de::Error::custom(format_args!(
                "Count is {} but Led has {} entries",
                report.count,
                report.led.len()
            )));
        }
        Ok(report)
    }

    pub fn pixels(&self) -> &[LedColor] {
        &self.led
    }
}
