//! WS2812 ("NeoPixel") driver over an SPI bus.
//!
//! The SPI clock is run at ~3.2 MHz so that one SPI byte spans two WS2812
//! bit periods; each colour byte therefore expands to four SPI bytes.
//! Pixels go out in the strip's native GRB order, followed by a run of
//! zero bytes that holds the line low long enough to latch.
//!
//! `write` encodes into an internal buffer; `refresh` clocks it out.

use embedded_hal::spi::SpiBus;
use log::debug;
use smart_leds::RGB8;

use crate::app::ports::LedDriver;
use crate::error::HardwareError;

/// SPI bytes per pixel (3 channels × 4 bytes).
const PIXEL_LEN: usize = 12;
/// Zero bytes after the frame (≥ 50 µs low at 3.2 MHz is ~20 bytes).
const RESET_LEN: usize = 50;
/// Two WS2812 bits per SPI byte: `0` → `1000`, `1` → `1110`.
const PATTERNS: [u8; 4] = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];

/// Recommended SPI clock for this encoding.
pub const SPI_FREQUENCY_HZ: u32 = 3_200_000;

/// Total SPI bytes needed to drive `pixels` LEDs.
pub const fn line_len(pixels: usize) -> usize {
    PIXEL_LEN * pixels + RESET_LEN
}

/// Unpack a `0x00RRGGBB` value.
pub fn unpack(packed: u32) -> RGB8 {
    RGB8::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
}

fn encode_byte(mut value: u8, out: &mut [u8]) {
    for slot in out.iter_mut().take(4) {
        *slot = PATTERNS[((value & 0b1100_0000) >> 6) as usize];
        value <<= 2;
    }
}

/// Encode `pixels` into `out` (GRB per pixel, then the reset line).
pub fn encode_line(pixels: impl IntoIterator<Item = RGB8>, out: &mut Vec<u8>) {
    out.clear();
    for px in pixels {
        let mut bytes = [0u8; PIXEL_LEN];
        encode_byte(px.g, &mut bytes[0..4]);
        encode_byte(px.r, &mut bytes[4..8]);
        encode_byte(px.b, &mut bytes[8..12]);
        out.extend_from_slice(&bytes);
    }
    out.extend_from_slice(&[0u8; RESET_LEN]);
}

pub struct Ws2812Spi<SPI> {
    spi: SPI,
    pixels: usize,
    line: Vec<u8>,
}

impl<SPI: SpiBus<u8>> Ws2812Spi<SPI> {
    pub fn new(spi: SPI, pixels: usize) -> Self {
        Self {
            spi,
            pixels,
            line: Vec::with_capacity(line_len(pixels)),
        }
    }

    /// Give the bus back, e.g. to reconfigure it.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiBus<u8>> LedDriver for Ws2812Spi<SPI> {
    fn write(&mut self, frame: &[u32]) -> Result<(), HardwareError> {
        if frame.len() > self.pixels {
            return Err(HardwareError::FrameTooLong);
        }
        encode_line(frame.iter().copied().map(unpack), &mut self.line);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), HardwareError> {
        self.spi.write(&self.line).map_err(|e| {
            debug!("SPI write error: {:?}", e);
            HardwareError::RefreshFailed
        })?;
        self.spi.flush().map_err(|e| {
            debug!("SPI flush error: {:?}", e);
            HardwareError::RefreshFailed
        })
    }
}

/// Open a Linux spidev node configured for WS2812 timing.
#[cfg(feature = "spidev")]
pub fn open_spidev(
    path: &str,
    pixels: usize,
) -> Result<Ws2812Spi<linux_embedded_hal::SpidevBus>, HardwareError> {
    use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};

    let mut bus = linux_embedded_hal::SpidevBus::open(path).map_err(|e| {
        log::error!("Cannot open {}: {:?}", path, e);
        HardwareError::InitFailed
    })?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(SPI_FREQUENCY_HZ)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    bus.configure(&options).map_err(|e| {
        log::error!("Cannot configure {}: {:?}", path, e);
        HardwareError::InitFailed
    })?;
    Ok(Ws2812Spi::new(bus, pixels))
}
