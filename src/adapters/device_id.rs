//! Device identity used to derive the MQTT client id.
//!
//! The client id is `<hostname><second-of-minute>`, so two bridges on
//! different hosts never collide and a quick restart usually presents a
//! fresh id to the broker.

use std::time::{SystemTime, UNIX_EPOCH};

/// Fallback when the kernel hostname cannot be read.
pub const FALLBACK_HOSTNAME: &str = "cavehat";

const HOSTNAME_PATH: &str = "/proc/sys/kernel/hostname";

/// Read the host name from the kernel, then `$HOSTNAME`, then the fallback.
pub fn hostname() -> String {
    std::fs::read_to_string(HOSTNAME_PATH)
        .ok()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .map(|s| sanitize(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_owned())
}

/// Seconds field (0–59) of the current wall-clock time.
pub fn current_second() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() % 60)
}

/// Keep only characters every broker accepts in a client id.
fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
