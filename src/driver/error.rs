/*
 *  driver/error.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the LED driver subsystem
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

use std::fmt;
use std::error::Error;

/// Unified error type for all LED driver operations
#[derive(Debug)]
pub enum DriverError {
    /// Hardware initialization failed
    InitializationFailed(String),

    /// SPI communication error
    SpiError(String),

    /// Flush or set_buffer before init()
    NotInitialized,

    /// Color buffer length does not match the strip
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::InitializationFailed(msg) =>
                write!(f, "LED driver initialization failed: {}", msg),
            DriverError::SpiError(msg) =>
                write!(f, "SPI communication error: {}", msg),
            DriverError::NotInitialized =>
                write!(f, "LED driver used before init()"),
            DriverError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Buffer size mismatch: expected {} LEDs, got {}", expected, actual),
            DriverError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DriverError {}

/// Factory error types
#[derive(Debug)]
pub enum DriverFactoryError {
    /// No bus configuration for a hardware driver
    NoBusConfiguration,

    /// Driver compiled out of this build
    DriverNotEnabled(&'static str),

    /// Configuration validation error
    ConfigError(String),
}

impl fmt::Display for DriverFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverFactoryError::NoBusConfiguration =>
                write!(f, "No bus configuration specified"),
            DriverFactoryError::DriverNotEnabled(feature) =>
                write!(f, "Driver not enabled. Enable with --features {}", feature),
            DriverFactoryError::ConfigError(msg) =>
                write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for DriverFactoryError {}
