/*
 *  driver/drivers/ws2812_spi.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  WS2812 strip driven from the SPI MOSI line (Linux spidev)
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_hal::spi::SpiDevice;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::SpidevDevice;

use log::{debug, info};

use crate::color::unpack_rgb;
use crate::config::ColorOrder;
use crate::driver::error::DriverError;
use crate::driver::traits::{check_buffer_len, DriverCapabilities, LedDriver};

/// 800 kHz WS2812 bit rate, 4 SPI bits per WS2812 bit (0 -> 1000, 1 -> 1110)
pub const DEFAULT_SPI_HZ: u32 = 3_200_000;

/// Zero bytes after the data, holds MOSI low past the 50us reset time.
pub const LATCH_LEN: usize = 140;

/// SPI bytes per LED (3 channels x 8 bits x 4 SPI bits / 8)
pub const BYTES_PER_LED: usize = 12;

/// One SPI byte carries two WS2812 bits.
const PATTERNS: [u8; 4] = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];

/// Channel bytes in wire order.
#[inline]
fn wire_order(color: u32, order: ColorOrder) -> [u8; 3] {
    let (r, g, b) = unpack_rgb(color);
    match order {
        ColorOrder::Grb => [g, r, b],
        ColorOrder::Rgb => [r, g, b],
    }
}

/// Encode packed colors into the SPI bit stream, latch included.
///
/// `out` is cleared and reused so the transmit buffer is allocated once.
pub fn encode_into(colors: &[u32], order: ColorOrder, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(colors.len() * BYTES_PER_LED + LATCH_LEN);
    for &color in colors {
        for mut byte in wire_order(color, order) {
            for _ in 0..4 {
                out.push(PATTERNS[((byte & 0b1100_0000) >> 6) as usize]);
                byte <<= 2;
            }
        }
    }
    out.resize(out.len() + LATCH_LEN, 0);
}

/// WS2812 (NeoPixel) strip on a spidev bus
pub struct Ws2812SpiDriver {
    bus_path: String,
    speed_hz: u32,
    order: ColorOrder,
    spi: Option<SpidevDevice>,
    colors: Vec<u32>,
    tx: Vec<u8>,
    capabilities: DriverCapabilities,
}

impl Ws2812SpiDriver {
    /// Create a driver for `pixel_count` LEDs on `bus_path` (e.g. "/dev/spidev0.0")
    ///
    /// The bus is not opened until [`LedDriver::init`].
    pub fn new(bus_path: &str, speed_hz: Option<u32>, pixel_count: usize, order: ColorOrder) -> Self {
        let speed_hz = speed_hz.unwrap_or(DEFAULT_SPI_HZ);

        // ~30us per LED on the wire plus the latch
        let frame_us = (pixel_count as u64 * 30).max(1) + 50;
        let max_fps = (1_000_000 / frame_us).clamp(1, 1000) as u32;

        Self {
            bus_path: bus_path.to_string(),
            speed_hz,
            order,
            spi: None,
            colors: vec![0; pixel_count],
            tx: Vec::with_capacity(pixel_count * BYTES_PER_LED + LATCH_LEN),
            capabilities: DriverCapabilities {
                name: "ws2812-spi".to_string(),
                pixel_count,
                max_fps,
            },
        }
    }
}

impl LedDriver for Ws2812SpiDriver {
    fn capabilities(&self) -> &DriverCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DriverError> {
        info!("Opening WS2812 strip on {} at {} Hz ({} LEDs, {:?})",
              self.bus_path, self.speed_hz, self.capabilities.pixel_count, self.order);

        let mut spi = SpidevDevice::open(&self.bus_path)
            .map_err(|e| DriverError::InitializationFailed(format!("Failed to open SPI {}: {:?}", self.bus_path, e)))?;

        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(self.speed_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.0
            .configure(&options)
            .map_err(|e| DriverError::InitializationFailed(format!("Failed to configure SPI: {}", e)))?;

        self.spi = Some(spi);
        Ok(())
    }

    fn set_buffer(&mut self, colors: &[u32]) -> Result<(), DriverError> {
        check_buffer_len(self.capabilities.pixel_count, colors)?;
        self.colors.copy_from_slice(colors);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DriverError> {
        let spi = self.spi.as_mut().ok_or(DriverError::NotInitialized)?;
        encode_into(&self.colors, self.order, &mut self.tx);
        spi.write(&self.tx)
            .map_err(|e| DriverError::SpiError(format!("{:?}", e)))?;
        debug!("ws2812 flush {} bytes", self.tx.len());
        Ok(())
    }
}
