/*
 *  pattern.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Straight-line wiring check for bringing up a new panel
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

use std::time::Duration;

use log::info;

use crate::color::{dim, DimFactor, BLUE, RED};
use crate::driver::{DriverError, LedDriver};
use crate::frame::LedBuffer;
use crate::grid::Grid;
use crate::pacer::{sleep_or_stop, StopSignal};

/// How long each wiring check frame stays lit.
pub const HOLD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Column `index`, top to bottom
    Vertical,
    /// Row `index`, left to right
    Horizontal,
}

/// Paint a full column or row. An index past the edge draws nothing.
pub fn draw_line(
    buffer: &mut LedBuffer,
    grid: &Grid,
    index: usize,
    orientation: Orientation,
    color: u32,
    dim_factor: DimFactor,
) {
    let color = dim(color, dim_factor);
    match orientation {
        Orientation::Vertical if index < grid.width() => {
            for y in 0..grid.height() {
                buffer.set(grid.map_to_physical_index(index, y), color);
            }
        }
        Orientation::Horizontal if index < grid.height() => {
            for x in 0..grid.width() {
                buffer.set(grid.map_to_physical_index(x, index), color);
            }
        }
        _ => {}
    }
}

/// Blue columns 2 and 5, then red rows 1 and 5, clamped to the panel.
///
/// On a correctly wired panel both frames show straight lines; a wrong
/// [`Wiring`](crate::grid::Wiring) shows up as zig-zags. Buffers are `len`
/// LEDs long so they can go straight to a driver with trailing LEDs.
pub fn wiring_check_frames(grid: &Grid, dim_factor: DimFactor, len: usize) -> Vec<LedBuffer> {
    let clamp_x = |i: usize| i.min(grid.width() - 1);
    let clamp_y = |i: usize| i.min(grid.height() - 1);

    let mut columns = LedBuffer::new(len);
    for x in [2, 5] {
        draw_line(&mut columns, grid, clamp_x(x), Orientation::Vertical, BLUE, dim_factor);
    }

    let mut rows = LedBuffer::new(len);
    for y in [1, 5] {
        draw_line(&mut rows, grid, clamp_y(y), Orientation::Horizontal, RED, dim_factor);
    }

    vec![columns, rows]
}

/// Loop the wiring check on `driver` until `stop` fires, then blank it.
pub async fn run_wiring_check(
    driver: &mut dyn LedDriver,
    grid: &Grid,
    dim_factor: DimFactor,
    mut stop: StopSignal,
) -> Result<(), DriverError> {
    info!("Wiring check on {}x{} {:?}", grid.width(), grid.height(), grid.wiring());
    driver.init()?;
    let frames = wiring_check_frames(grid, dim_factor, driver.pixel_count());

    'outer: loop {
        for frame in &frames {
            driver.set_buffer(frame.as_slice())?;
            driver.flush()?;
            if !sleep_or_stop(HOLD, &mut stop).await {
                break 'outer;
            }
        }
    }

    driver.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::grid::Wiring;
    use crate::pacer::stop_channel;

    fn lit(buffer: &LedBuffer) -> Vec<usize> {
        (0..buffer.len()).filter(|&i| buffer.get(i) != Some(0)).collect()
    }

    #[test]
    fn test_vertical_line_follows_serpentine() {
        let grid = Grid::new(3, 3, Wiring::SerpentineEvenForward, None).unwrap();
        let mut buffer = LedBuffer::for_grid(&grid);
        draw_line(&mut buffer, &grid, 0, Orientation::Vertical, RED, DimFactor::IDENTITY);
        // (0,0)=0, (0,1)=5, (0,2)=6
        assert_eq!(lit(&buffer), vec![0, 5, 6]);
    }

    #[test]
    fn test_horizontal_line_is_contiguous_run() {
        let grid = Grid::new(4, 3, Wiring::SerpentineEvenReverse, None).unwrap();
        let mut buffer = LedBuffer::for_grid(&grid);
        draw_line(&mut buffer, &grid, 1, Orientation::Horizontal, BLUE, DimFactor::IDENTITY);
        assert_eq!(lit(&buffer), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_line_outside_grid_draws_nothing() {
        let grid = Grid::new(2, 2, Wiring::default(), None).unwrap();
        let mut buffer = LedBuffer::for_grid(&grid);
        draw_line(&mut buffer, &grid, 2, Orientation::Vertical, RED, DimFactor::IDENTITY);
        assert!(lit(&buffer).is_empty());
    }

    #[test]
    fn test_line_is_dimmed() {
        let grid = Grid::new(2, 1, Wiring::default(), None).unwrap();
        let mut buffer = LedBuffer::for_grid(&grid);
        draw_line(&mut buffer, &grid, 0, Orientation::Horizontal, RED, DimFactor::new(16).unwrap());
        assert_eq!(buffer.as_slice(), &[0x0F0000, 0x0F0000]);
    }

    #[test]
    fn test_check_frames_on_16x16() {
        let grid = Grid::new(16, 16, Wiring::default(), None).unwrap();
        let frames = wiring_check_frames(&grid, DimFactor::IDENTITY, 256);
        assert_eq!(frames.len(), 2);
        assert_eq!(lit(&frames[0]).len(), 32);
        assert_eq!(lit(&frames[1]).len(), 32);
        assert_eq!(frames[0].get(grid.map_to_physical_index(2, 7)), Some(BLUE));
        assert_eq!(frames[1].get(grid.map_to_physical_index(9, 5)), Some(RED));
    }

    #[test]
    fn test_check_frames_clamped_on_small_panel() {
        let grid = Grid::new(4, 3, Wiring::default(), Some(14)).unwrap();
        let frames = wiring_check_frames(&grid, DimFactor::IDENTITY, 14);
        assert_eq!(frames[0].len(), 14);
        // columns 2 and 3 (5 clamped)
        assert_eq!(lit(&frames[0]).len(), 6);
        // rows 1 and 2 (5 clamped)
        assert_eq!(lit(&frames[1]).len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_wiring_check_stops_and_clears() {
        let grid = Grid::new(8, 8, Wiring::default(), None).unwrap();
        let mut driver = MockDriver::new(64);
        let state = driver.state();
        let (handle, stop) = stop_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.stop();
        });
        run_wiring_check(&mut driver, &grid, DimFactor::IDENTITY, stop).await.unwrap();

        let state = state.lock().unwrap();
        // frames at 0s, 2s, 4s then the blanking flush
        assert_eq!(state.flush_count, 4);
        assert_eq!(state.shown, vec![0; 64]);
    }
}
