/*
 *  driver/drivers/mod.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  LED strip driver implementations
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

// Hardware drivers, compiled per feature
#[cfg(feature = "driver-ws2812-spi")]
pub mod ws2812_spi;

// Mock driver for tests and --dry-run
pub mod mock;
