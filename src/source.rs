/*
 *  source.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Image source sets: one animation each, templated or scanned
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
use std::path::PathBuf;

use log::warn;

use crate::config::ConfigError;
use crate::error::PlaybackError;
use crate::store::ImageStore;

pub const DEFAULT_EXTENSION: &str = "png";

/// Fastest rate with a non-zero whole-millisecond frame interval.
pub const MAX_FRAMES_PER_SECOND: u32 = 1000;

/// How a set turns into an ordered list of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    /// `{directory}/{base_name}-{i}.{extension}` for `i in 0..count`,
    /// the naming the GIF frame splitter writes.
    Templated {
        base_name: String,
        count: usize,
        extension: String,
    },
    /// Whatever matches `extension` in the directory, re-read on every pass.
    Scanned { extension: String },
}

/// One animation: a directory of frames played at one rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSourceSet {
    name: String,
    directory: PathBuf,
    mode: SourceMode,
    frames_per_second: NonZeroU32,
}

impl ImageSourceSet {
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        mode: SourceMode,
        frames_per_second: u32,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if frames_per_second > MAX_FRAMES_PER_SECOND {
            return Err(ConfigError::FrameRateTooHigh { name, fps: frames_per_second });
        }
        let frames_per_second =
            NonZeroU32::new(frames_per_second).ok_or_else(|| ConfigError::ZeroFrameRate(name.clone()))?;
        Ok(Self {
            name,
            directory: directory.into(),
            mode,
            frames_per_second,
        })
    }

    /// Scanned set named after its directory.
    pub fn scanned(directory: impl Into<PathBuf>, frames_per_second: u32) -> Result<Self, ConfigError> {
        let directory = directory.into();
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| directory.display().to_string());
        Self::new(
            name,
            directory,
            SourceMode::Scanned { extension: DEFAULT_EXTENSION.to_string() },
            frames_per_second,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    pub fn mode(&self) -> &SourceMode {
        &self.mode
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second.get()
    }

    /// Produce this pass's ordered file list.
    ///
    /// Zero entries is `EmptySourceSet`. A directory that cannot be listed is
    /// logged and reported the same way, since there is nothing to play.
    pub fn resolve(&self, store: &impl ImageStore) -> Result<Vec<PathBuf>, PlaybackError> {
        let files = match &self.mode {
            SourceMode::Templated { base_name, count, extension } => (0..*count)
                .map(|i| self.directory.join(format!("{base_name}-{i}.{extension}")))
                .collect(),
            SourceMode::Scanned { extension } => {
                match store.list_files(&self.directory, extension) {
                    Ok(files) => files,
                    Err(e) => {
                        warn!("Cannot scan image set '{}': {}", self.name, e);
                        Vec::new()
                    }
                }
            }
        };

        if files.is_empty() {
            return Err(PlaybackError::EmptySourceSet(self.name.clone()));
        }
        Ok(files)
    }
}
