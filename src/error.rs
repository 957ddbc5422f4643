/*
 *  error.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playback error taxonomy
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

use crate::compositor::RenderError;
use crate::config::ConfigError;
use crate::decoder::DecodeError;
use crate::driver::DriverError;
use crate::store::StoreError;

/// Everything that can go wrong between a stored file and lit LEDs.
///
/// Only configuration and driver start-up errors stop playback; the rest are
/// logged per frame and the frame is skipped.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no frames found for image set '{0}'")]
    EmptySourceSet(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("LED driver error: {0}")]
    Driver(#[from] DriverError),
}

impl PlaybackError {
    /// Short label used in per-frame log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackError::Config(_) => "config",
            PlaybackError::EmptySourceSet(_) => "empty-set",
            PlaybackError::Store(_) => "io",
            PlaybackError::Decode(_) => "decode",
            PlaybackError::Render(RenderError::DimensionMismatch { .. }) => "dimension-mismatch",
            PlaybackError::Render(_) => "render",
            PlaybackError::Driver(_) => "driver",
        }
    }
}
