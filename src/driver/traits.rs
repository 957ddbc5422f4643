/*
 *  driver/traits.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for LED strip driver abstraction
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

use crate::driver::error::DriverError;

/// Driver capabilities and metadata
#[derive(Debug, Clone)]
pub struct DriverCapabilities {
    /// Human readable driver name, used in logs
    pub name: String,

    /// Number of LEDs the driver pushes on every flush
    pub pixel_count: usize,

    /// Maximum sensible refresh rate for the strip length
    pub max_fps: u32,
}

/// Minimal hardware abstraction - every LED strip driver implements this
///
/// The driver owns its own transmit buffer. `set_buffer` copies the caller's
/// colors in and `flush` pushes them out; the caller's buffer is never
/// retained across frames.
pub trait LedDriver: Send {
    /// Returns the capabilities of this driver
    fn capabilities(&self) -> &DriverCapabilities;

    /// Number of LEDs on the strip
    fn pixel_count(&self) -> usize {
        self.capabilities().pixel_count
    }

    /// Initialize the strip hardware
    ///
    /// Opens and configures the bus; must succeed before any flush.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Stage packed `0xRRGGBB` colors, one per LED in strip order
    ///
    /// `colors` must hold exactly `pixel_count` entries.
    fn set_buffer(&mut self, colors: &[u32]) -> Result<(), DriverError>;

    /// Transmit the staged buffer to the strip (blocking)
    fn flush(&mut self) -> Result<(), DriverError>;

    /// Turn every LED off
    fn clear(&mut self) -> Result<(), DriverError> {
        let blank = vec![0; self.pixel_count()];
        self.set_buffer(&blank)?;
        self.flush()
    }
}

pub(crate) fn check_buffer_len(expected: usize, colors: &[u32]) -> Result<(), DriverError> {
    if colors.len() != expected {
        return Err(DriverError::BufferSizeMismatch {
            expected,
            actual: colors.len(),
        });
    }
    Ok(())
}
