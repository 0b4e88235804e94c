//! Simulated LED strip.
//!
//! Stands in for the WS2812 hardware on hosts without an SPI bus: keeps
//! the loaded and latched frames in memory and logs every latch.

use log::debug;

use crate::app::ports::LedDriver;
use crate::app::strip::MAX_LED_COUNT;
use crate::error::HardwareError;

type Frame = heapless::Vec<u32, MAX_LED_COUNT>;

pub struct SimulatedStrip {
    pixels: usize,
    loaded: Frame,
    latched: Frame,
    refreshes: u64,
}

impl SimulatedStrip {
    pub fn new(pixels: usize) -> Self {
        Self {
            pixels: pixels.min(MAX_LED_COUNT),
            loaded: Frame::new(),
            latched: Frame::new(),
            refreshes: 0,
        }
    }

    /// The frame currently visible on the strip.
    pub fn latched(&self) -> &[u32] {
        &self.latched
    }

    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }
}

impl LedDriver for SimulatedStrip {
    fn write(&mut self, frame: &[u32]) -> Result<(), HardwareError> {
        if frame.len() > self.pixels {
            return Err(HardwareError::FrameTooLong);
        }
        self.loaded.clear();
        self.loaded
            .extend_from_slice(frame)
            .map_err(|()| HardwareError::FrameTooLong)
    }

    fn refresh(&mut self) -> Result<(), HardwareError> {
        self.latched.clone_from(&self.loaded);
        self.refreshes += 1;
        debug!("SIM | frame #{} {:06X?}", self.refreshes, &self.latched[..]);
        Ok(())
    }
}
