/*
 *  driver/drivers/mock.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock LED driver for testing and dry runs without hardware
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

use std::sync::{Arc, Mutex, MutexGuard};

use log::trace;

use crate::driver::error::DriverError;
use crate::driver::traits::{check_buffer_len, DriverCapabilities, LedDriver};

/// Mock LED driver
///
/// This driver simulates a strip without requiring hardware. It's useful for:
/// - Unit tests
/// - Integration tests
/// - `--dry-run` on a desktop
///
/// Every operation is recorded in a shared [`MockDriverState`], so a test can
/// keep a handle to the state after moving the driver into the sequencer.
#[derive(Debug, Clone)]
pub struct MockDriver {
    /// Driver capabilities
    capabilities: DriverCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of successful flush() calls
    pub flush_count: usize,

    /// Number of set_buffer() calls
    pub set_buffer_count: usize,

    /// Whether the driver is initialized
    pub is_initialized: bool,

    /// Colors staged by the last set_buffer()
    pub staged: Vec<u32>,

    /// Colors currently "lit" (staged buffer at the last flush)
    pub shown: Vec<u32>,

    /// Every flushed buffer, oldest first
    pub history: Vec<Vec<u32>>,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriver {
    /// Create a mock strip with `pixel_count` LEDs
    pub fn new(pixel_count: usize) -> Self {
        let capabilities = DriverCapabilities {
            name: "mock".to_string(),
            pixel_count,
            max_fps: 1000,
        };

        let state = MockDriverState {
            staged: vec![0; pixel_count],
            shown: vec![0; pixel_count],
            ..Default::default()
        };

        Self {
            capabilities,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Advertise a lower refresh limit, like a long strip would
    pub fn with_max_fps(mut self, max_fps: u32) -> Self {
        self.capabilities.max_fps = max_fps;
        self
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockDriverState>, DriverError> {
        self.state
            .lock()
            .map_err(|_| DriverError::Other("mock driver state poisoned".to_string()))
    }
}

impl LedDriver for MockDriver {
    fn capabilities(&self) -> &DriverCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DriverError> {
        let mut state = self.lock()?;

        if state.simulate_init_failure {
            return Err(DriverError::InitializationFailed("Simulated init failure".to_string()));
        }

        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn set_buffer(&mut self, colors: &[u32]) -> Result<(), DriverError> {
        check_buffer_len(self.capabilities.pixel_count, colors)?;
        let mut state = self.lock()?;
        state.set_buffer_count += 1;
        state.staged.clear();
        state.staged.extend_from_slice(colors);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DriverError> {
        let mut state = self.lock()?;

        if !state.is_initialized {
            return Err(DriverError::NotInitialized);
        }
        if state.simulate_flush_failure {
            return Err(DriverError::Other("Simulated flush failure".to_string()));
        }

        state.flush_count += 1;
        let staged = state.staged.clone();
        state.shown.clone_from(&staged);
        state.history.push(staged);
        trace!("mock flush #{}", state.flush_count);
        Ok(())
    }
}
