/*
 *  store.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Image storage: directory scanning and file reads
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

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io { path: path.to_path_buf(), source }
        }
    }
}

/// Where frames live.
///
/// `list_files` must return the same order for the same directory contents;
/// the sequencer plays frames in exactly that order.
pub trait ImageStore {
    fn list_files(&self, directory: &Path, extension: &str) -> Result<Vec<PathBuf>, StoreError>;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StoreError>;
}

/// Totals reported at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub files: usize,
    pub bytes: u64,
}

/// Filesystem-backed store rooted at the mounted image partition.
///
/// Relative paths are resolved against `root`; absolute paths are used as is.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Count files and bytes under the root, recursively.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|e| StoreError::from_io(&dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| StoreError::from_io(&dir, e))?;
                let meta = entry.metadata().map_err(|e| StoreError::from_io(&entry.path(), e))?;
                if meta.is_dir() {
                    pending.push(entry.path());
                } else if meta.is_file() {
                    stats.files += 1;
                    stats.bytes += meta.len();
                }
            }
        }
        Ok(stats)
    }
}

impl ImageStore for FsImageStore {
    fn list_files(&self, directory: &Path, extension: &str) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.resolve(directory);
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::from_io(&dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_io(&dir, e))?;
            let file_type = entry.file_type().map_err(|e| StoreError::from_io(&dir, e))?;
            if !file_type.is_file() {
                continue;
            }
            let path = entry.path();
            if has_extension(&path, extension) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        debug!("Scanned {} '.{}' files in {}", files.len(), extension, dir.display());
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(path);
        fs::read(&path).map_err(|e| StoreError::from_io(&path, e))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Compare names so that digit runs sort by value: `a-2` < `a-10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_num = l_run.trim_start_matches('0');
                let r_num = r_run.trim_start_matches('0');
                let ord = l_num
                    .len()
                    .cmp(&r_num.len())
                    .then_with(|| l_num.cmp(r_num));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}
