//! Fuzz target: `Command::parse` + `Command::apply`
//!
//! Any payload must either be rejected with a typed error or produce a
//! command whose application touches at most the addressed pixel.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use cavehat2mqtt::app::commands::{ApplyOutcome, Command};
use cavehat2mqtt::app::strip::{LedStrip, SharedStrip};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cmd) = Command::parse(data) else {
        return;
    };
    let Ok(strip) = LedStrip::new(8) else {
        return;
    };
    let strip = SharedStrip::new(strip);

    match cmd.apply(&strip) {
        ApplyOutcome::Applied { index, color } => {
            assert!(index < 8);
            let snap = strip.snapshot();
            assert_eq!(snap[usize::from(index)], color);
            let mut others = snap
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != usize::from(index));
            assert!(others.all(|(_, c)| c.is_off()));
        }
        ApplyOutcome::OutOfRange { index } => {
            assert!(index >= 8);
            assert!(strip.snapshot().iter().all(|c| c.is_off()));
        }
    }
});
