/*
 *  tests/mapping.rs
 *
 *  Panel geometry and the (x, y) -> strip index mapping
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 */

use std::collections::HashSet;

use lednode::color::{DimFactor, WHITE};
use lednode::compositor::render;
use lednode::{map_to_physical_index, Frame, Grid, Wiring};

const WIRINGS: [Wiring; 2] = [Wiring::SerpentineEvenForward, Wiring::SerpentineEvenReverse];

#[test]
fn test_mapping_is_a_bijection() {
    for (w, h) in [(1, 1), (1, 5), (5, 1), (2, 2), (8, 7), (16, 16), (7, 8)] {
        for wiring in WIRINGS {
            let grid = Grid::new(w, h, wiring, None).unwrap();
            let seen: HashSet<usize> = grid.cells().map(|(x, y)| map_to_physical_index(x, y, &grid)).collect();
            assert_eq!(seen.len(), w * h, "{w}x{h} {wiring:?}");
            assert!(seen.iter().all(|&i| i < w * h));
        }
    }
}

#[test]
fn test_rows_are_contiguous_runs() {
    let grid = Grid::new(8, 7, Wiring::SerpentineEvenForward, None).unwrap();
    for y in 0..7 {
        let mut row: Vec<usize> = (0..8).map(|x| grid.map_to_physical_index(x, y)).collect();
        row.sort_unstable();
        assert_eq!(row, (y * 8..y * 8 + 8).collect::<Vec<_>>());
    }
}

#[test]
fn test_adjacent_rows_meet_at_the_same_edge() {
    // the strip turns around at the panel edge, so the last LED of a row
    // sits directly above/below the first LED of the next
    for wiring in WIRINGS {
        let grid = Grid::new(16, 16, wiring, None).unwrap();
        for i in 0..255 {
            let cell = |idx: usize| grid.cells().find(|&(x, y)| grid.map_to_physical_index(x, y) == idx).unwrap();
            let (x0, y0) = cell(i);
            let (x1, y1) = cell(i + 1);
            assert_eq!(x0.abs_diff(x1) + y0.abs_diff(y1), 1, "LED {i} -> {} {wiring:?}", i + 1);
        }
    }
}

#[test]
fn test_known_corners() {
    let forward = Grid::new(16, 16, Wiring::SerpentineEvenForward, None).unwrap();
    assert_eq!(forward.map_to_physical_index(0, 0), 0);
    assert_eq!(forward.map_to_physical_index(15, 0), 15);
    assert_eq!(forward.map_to_physical_index(15, 1), 16);
    assert_eq!(forward.map_to_physical_index(0, 15), 255);

    let reverse = Grid::new(16, 16, Wiring::SerpentineEvenReverse, None).unwrap();
    assert_eq!(reverse.map_to_physical_index(15, 0), 0);
    assert_eq!(reverse.map_to_physical_index(0, 0), 15);
    assert_eq!(reverse.map_to_physical_index(0, 1), 16);
    assert_eq!(reverse.map_to_physical_index(15, 15), 255);
}

#[test]
fn test_render_touches_only_mapped_leds() {
    let grid = Grid::new(3, 2, Wiring::SerpentineEvenReverse, Some(9)).unwrap();
    let frame = Frame::from_rgba(3, 2, &[(255, 255, 255, 255); 6]).unwrap();
    let leds = render(&frame, &grid, DimFactor::IDENTITY).unwrap();
    assert_eq!(leds.len(), 9);
    assert_eq!(&leds.as_slice()[..6], &[WHITE; 6]);
    assert_eq!(&leds.as_slice()[6..], &[0; 3]);
}
