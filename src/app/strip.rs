//! LED state store: the single source of truth for what the strip shows.
//!
//! [`LedStrip`] is a fixed-capacity buffer of [`LedColor`]s whose pixel
//! count is frozen at construction.  [`SharedStrip`] wraps it in one mutex
//! so the command path and the shutdown path mutate and read through the
//! same primitive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest pixel count addressable by an 8-bit command index.
pub const MAX_LED_COUNT: usize = u8::MAX as usize;

/// Immutable point-in-time copy of the strip, in index order.
pub type Snapshot = heapless::Vec<LedColor, MAX_LED_COUNT>;

/// One pixel: three independent 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LedColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl LedColor {
    pub const OFF: Self = Self::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Packed 24-bit value in driver order: red high byte, blue low byte.
    pub const fn packed(self) -> u32 {
        (self.red as u32) << 16 | (self.green as u32) << 8 | self.blue as u32
    }

    pub const fn is_off(self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0
    }
}

impl From<LedColor> for smart_leds::RGB8 {
    fn from(c: LedColor) -> Self {
        smart_leds::RGB8::new(c.red, c.green, c.blue)
    }
}

/// Fixed-size pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedStrip {
    leds: Snapshot,
}

impl LedStrip {
    /// Allocate `count` pixels, all off.
    ///
    /// Fails with [`Error::Config`] when `count` is zero or larger than
    /// [`MAX_LED_COUNT`].
    pub fn new(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::Config("pixel count must be at least 1"));
        }
        if count > MAX_LED_COUNT {
            return Err(Error::Config("pixel count exceeds the addressable maximum"));
        }
        let mut leds = Snapshot::new();
        leds.resize(count, LedColor::OFF)
            .map_err(|()| Error::Config("pixel count exceeds the addressable maximum"))?;
        Ok(Self { leds })
    }

    /// Declared pixel count; never changes after construction.
    pub fn count(&self) -> usize {
        self.leds.len()
    }

    /// Overwrite one pixel.  Out-of-range indices are ignored.
    ///
    /// Returns whether the pixel was written.
    pub fn set(&mut self, index: usize, color: LedColor) -> bool {
        match self.leds.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.leds.clone()
    }

    pub fn all_off(&mut self) {
        self.leds.fill(LedColor::OFF);
    }

    pub fn is_all_off(&self) -> bool {
        self.leds.iter().all(|c| c.is_off())
    }
}

/// Cloneable handle to the one strip shared by the command and shutdown paths.
#[derive(Debug, Clone)]
pub struct SharedStrip {
    inner: Arc<Mutex<LedStrip>>,
}

impl SharedStrip {
    pub fn new(strip: LedStrip) -> Self {
        Self {
            inner: Arc::new(Mutex::new(strip)),
        }
    }

    // Every mutation is a whole-pixel `Copy` assignment, so a poisoned
    // buffer is still consistent.
    fn lock(&self) -> MutexGuard<'_, LedStrip> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn set(&self, index: usize, color: LedColor) -> bool {
        self.lock().set(index, color)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn all_off(&self) {
        self.lock().all_off();
    }

    /// Run `f` with the strip locked, for multi-step updates.
    pub fn with<R>(&self, f: impl FnOnce(&mut LedStrip) -> R) -> R {
        f(&mut self.lock())
    }
}
