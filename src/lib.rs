/*
 *  lib.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  PNG animation player for serpentine WS2812 LED matrices
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

pub mod color;
pub mod compositor;
pub mod config;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod frame;
pub mod grid;
pub mod pacer;
pub mod pattern;
pub mod sequencer;
pub mod source;
pub mod store;

pub use color::DimFactor;
pub use config::{ConfigError, Settings};
pub use decoder::{ImageDecoder, PngDecoder};
pub use error::PlaybackError;
pub use frame::{Frame, LedBuffer};
pub use grid::{map_to_physical_index, Grid, Wiring};
pub use pacer::{stop_channel, StopHandle, StopSignal};
pub use sequencer::{PlaybackState, PlaybackStats, Phase, Sequencer, SequencerConfig, StepOutcome};
pub use source::{ImageSourceSet, SourceMode};
pub use store::{FsImageStore, ImageStore};
