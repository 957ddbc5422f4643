/*
 *  compositor.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Turns a decoded frame into drive values in strip order
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

use thiserror::Error;

use crate::color::{dim, pack_rgb, premultiply, DimFactor};
use crate::frame::{Frame, LedBuffer};
use crate::grid::Grid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Usually an authoring mistake: the image was exported at the wrong size.
    #[error("image is {}x{} but the grid is {}x{}", actual.0, actual.1, expected.0, expected.1)]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("LED buffer holds {actual} LEDs, grid needs {expected}")]
    BufferTooSmall { expected: usize, actual: usize },
}

/// Render `frame` into a fresh buffer sized for the whole strip.
///
/// LEDs past the mapped cells stay black.
pub fn render(frame: &Frame, grid: &Grid, dim_factor: DimFactor) -> Result<LedBuffer, RenderError> {
    let mut buffer = LedBuffer::for_grid(grid);
    render_into(frame, grid, dim_factor, &mut buffer)?;
    Ok(buffer)
}

/// Render `frame` into `target`, overwriting every mapped LED.
///
/// All checks happen before the first write, so on error `target` is left
/// exactly as it was. Indices at or past `grid.cell_count()` are not touched.
pub fn render_into(
    frame: &Frame,
    grid: &Grid,
    dim_factor: DimFactor,
    target: &mut LedBuffer,
) -> Result<(), RenderError> {
    let expected = (grid.width(), grid.height());
    if frame.dimensions() != expected {
        return Err(RenderError::DimensionMismatch {
            expected,
            actual: frame.dimensions(),
        });
    }
    if target.len() < grid.cell_count() {
        return Err(RenderError::BufferTooSmall {
            expected: grid.cell_count(),
            actual: target.len(),
        });
    }

    let width = grid.width();
    let leds = target.as_mut_slice();
    // row-major walk over the RGBA bytes
    for (cell, rgba) in frame.as_bytes().chunks_exact(4).enumerate() {
        let (x, y) = (cell % width, cell / width);
        let alpha = rgba[3];
        let color = pack_rgb(
            premultiply(rgba[0], alpha),
            premultiply(rgba[1], alpha),
            premultiply(rgba[2], alpha),
        );
        leds[grid.map_to_physical_index(x, y)] = dim(color, dim_factor);
    }

    Ok(())
}
