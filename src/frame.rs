/*
 *  frame.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Decoded RGBA frames and the per-LED output buffer
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

use crate::decoder::DecodeError;
use crate::grid::Grid;

/// One decoded image: row-major RGBA8, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = width * height * 4;
        if pixels.len() != expected {
            return Err(DecodeError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Build a frame from `(r, g, b, a)` tuples in row-major order.
    pub fn from_rgba(width: usize, height: usize, pixels: &[(u8, u8, u8, u8)]) -> Result<Self, DecodeError> {
        let bytes = pixels
            .iter()
            .flat_map(|&(r, g, b, a)| [r, g, b, a])
            .collect();
        Self::new(width, height, bytes)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Packed `0xRRGGBB` value per physical LED, indexed in strip order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedBuffer {
    leds: Vec<u32>,
}

impl LedBuffer {
    /// All-black buffer with one slot per LED on the strip.
    pub fn new(len: usize) -> Self {
        Self { leds: vec![0; len] }
    }

    pub fn for_grid(grid: &Grid) -> Self {
        Self::new(grid.led_count())
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.leds.get(index).copied()
    }

    pub fn set(&mut self, index: usize, color: u32) {
        if let Some(slot) = self.leds.get_mut(index) {
            *slot = color;
        }
    }

    pub fn fill(&mut self, color: u32) {
        self.leds.fill(color);
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.leds
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.leds
    }
}

impl From<Vec<u32>> for LedBuffer {
    fn from(leds: Vec<u32>) -> Self {
        Self { leds }
    }
}
