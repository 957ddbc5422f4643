/*
 *  color.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Packed 24-bit colors, alpha premultiply, and brightness dimming
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

use std::num::NonZeroU32;

use smart_leds::RGB8;

use crate::config::ConfigError;

pub const RED: u32 = 0xFF0000;
pub const GREEN: u32 = 0x00FF00;
pub const BLUE: u32 = 0x0000FF;
pub const WHITE: u32 = 0xFFFFFF;
pub const BLACK: u32 = 0x000000;

/// Integer divisor applied to every channel to cap brightness and current draw.
///
/// A WS2812 at full white pulls ~60mA, so a 16x16 panel is run at 1/16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DimFactor(NonZeroU32);

impl DimFactor {
    pub const IDENTITY: DimFactor = DimFactor(NonZeroU32::MIN);

    /// Zero is a configuration error, never identity.
    pub fn new(factor: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(factor)
            .map(DimFactor)
            .ok_or(ConfigError::ZeroDimFactor)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for DimFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Pack channels as `0xRRGGBB`.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Split `0xRRGGBB` into channels; bits above 24 are ignored.
#[inline]
pub fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

/// Composite one channel against black: `c * a / 255`, truncating.
#[inline]
pub fn premultiply(channel: u8, alpha: u8) -> u8 {
    // max is 255*255/255, always fits
    ((u16::from(channel) * u16::from(alpha)) / 255) as u8
}

/// Divide each channel of a packed color by `factor`.
#[inline]
pub fn dim(color: u32, factor: DimFactor) -> u32 {
    let (r, g, b) = unpack_rgb(color);
    let f = factor.get();
    pack_rgb(
        (u32::from(r) / f) as u8,
        (u32::from(g) / f) as u8,
        (u32::from(b) / f) as u8,
    )
}

/// Component-triple form of [`dim`].
#[inline]
pub fn dim_rgb(color: RGB8, factor: DimFactor) -> RGB8 {
    let (r, g, b) = unpack_rgb(dim(to_packed(color), factor));
    RGB8::new(r, g, b)
}

#[inline]
pub fn to_packed(color: RGB8) -> u32 {
    pack_rgb(color.r, color.g, color.b)
}

#[inline]
pub fn from_packed(color: u32) -> RGB8 {
    let (r, g, b) = unpack_rgb(color);
    RGB8::new(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(f: u32) -> DimFactor {
        DimFactor::new(f).unwrap()
    }

    #[test]
    fn test_zero_factor_rejected() {
        assert!(matches!(DimFactor::new(0), Err(ConfigError::ZeroDimFactor)));
    }

    #[test]
    fn test_identity_at_one() {
        for color in [BLACK, WHITE, RED, GREEN, BLUE, 0x123456, 0xFEDCBA, 0x010203] {
            assert_eq!(dim(color, DimFactor::IDENTITY), color);
            assert_eq!(dim(color, factor(1)), color);
        }
    }

    #[test]
    fn test_dims_each_channel_independently() {
        // 0xFF/16 = 15, 0x80/16 = 8, 0x0F/16 = 0
        assert_eq!(dim(0xFF800F, factor(16)), 0x0F0800);
        assert_eq!(dim(WHITE, factor(2)), 0x7F7F7F);
        assert_eq!(dim(WHITE, factor(256)), BLACK);
    }

    #[test]
    fn test_monotonic_in_factor() {
        let color = 0xC86432;
        let mut previous = unpack_rgb(dim(color, factor(1)));
        for f in 2..=300 {
            let current = unpack_rgb(dim(color, factor(f)));
            assert!(current.0 <= previous.0);
            assert!(current.1 <= previous.1);
            assert!(current.2 <= previous.2);
            previous = current;
        }
    }

    #[test]
    fn test_high_bits_ignored() {
        assert_eq!(dim(0xAA_FFFFFF, factor(1)), WHITE);
    }

    #[test]
    fn test_rgb8_matches_packed() {
        let rgb = RGB8::new(200, 100, 50);
        let dimmed = dim_rgb(rgb, factor(4));
        assert_eq!(dimmed, RGB8::new(50, 25, 12));
        assert_eq!(to_packed(dimmed), dim(to_packed(rgb), factor(4)));
        assert_eq!(from_packed(0x326419), RGB8::new(0x32, 0x64, 0x19));
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(premultiply(255, 255), 255);
        assert_eq!(premultiply(255, 0), 0);
        assert_eq!(premultiply(200, 128), 100);
        assert_eq!(premultiply(1, 254), 0);
    }
}
