/*
 *  grid.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Panel geometry and the (x, y) -> strip index mapping
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

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// How the LED strip snakes through the panel.
///
/// Coordinates are screen style: `(0, 0)` is the top-left cell, `x` grows to
/// the right and `y` grows downward. Both variants are serpentine by row; they
/// only disagree on which row parity runs left-to-right.
///
/// ```text
/// SerpentineEvenForward (3x2):   SerpentineEvenReverse (3x2):
///   LED0  LED1  LED2               LED2  LED1  LED0
///   LED5  LED4  LED3               LED3  LED4  LED5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Wiring {
    /// Even rows run left-to-right, odd rows right-to-left
    #[default]
    SerpentineEvenForward,
    /// Even rows run right-to-left, odd rows left-to-right
    SerpentineEvenReverse,
}

impl Wiring {
    /// Parse the kebab-case name used in config files and on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "serpentine-even-forward" => Some(Wiring::SerpentineEvenForward),
            "serpentine-even-reverse" => Some(Wiring::SerpentineEvenReverse),
            _ => None,
        }
    }

    fn row_runs_forward(self, y: usize) -> bool {
        let even = y % 2 == 0;
        match self {
            Wiring::SerpentineEvenForward => even,
            Wiring::SerpentineEvenReverse => !even,
        }
    }
}

/// Immutable panel description: logical size, wiring, and how many LEDs the
/// driver addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    wiring: Wiring,
    led_count: usize,
}

impl Grid {
    /// Build a grid, rejecting geometry that cannot be driven.
    ///
    /// `led_count` defaults to `width * height`. A larger count describes a
    /// strip with trailing LEDs beyond the panel; those are never mapped.
    pub fn new(
        width: usize,
        height: usize,
        wiring: Wiring,
        led_count: Option<usize>,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidGrid { width, height });
        }
        let cells = width
            .checked_mul(height)
            .ok_or(ConfigError::InvalidGrid { width, height })?;
        let led_count = led_count.unwrap_or(cells);
        if led_count < cells {
            return Err(ConfigError::LedCountTooSmall { led_count, cells });
        }

        Ok(Self { width, height, wiring, led_count })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// Number of mapped cells (`width * height`).
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of LEDs on the strip, mapped or not.
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// Translate a logical cell into its position on the strip.
    ///
    /// Callers must keep `x < width` and `y < height`; the compositor only
    /// ever iterates in range.
    #[inline]
    pub fn map_to_physical_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width, "x out of bounds");
        debug_assert!(y < self.height, "y out of bounds");

        if self.wiring.row_runs_forward(y) {
            y * self.width + x
        } else {
            (y + 1) * self.width - (x + 1)
        }
    }

    /// Every `(x, y)` cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }
}

/// Free-function form of [`Grid::map_to_physical_index`].
#[inline]
pub fn map_to_physical_index(x: usize, y: usize, grid: &Grid) -> usize {
    grid.map_to_physical_index(x, y)
}
