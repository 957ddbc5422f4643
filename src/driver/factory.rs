/*
 *  driver/factory.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Factory for creating LED drivers from configuration
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

use crate::config::{DriverConfig, DriverKind};
use crate::driver::error::DriverFactoryError;
use crate::driver::traits::LedDriver;
use crate::driver::drivers::mock::MockDriver;
use log::info;

#[cfg(feature = "driver-ws2812-spi")]
use crate::config::BusConfig;

#[cfg(feature = "driver-ws2812-spi")]
use crate::driver::drivers::ws2812_spi::Ws2812SpiDriver;

/// Type alias for boxed LED driver trait objects
pub type BoxedDriver = Box<dyn LedDriver>;

/// Factory for creating LED drivers from configuration
pub struct LedDriverFactory;

impl LedDriverFactory {
    /// Create an LED driver from configuration
    ///
    /// The driver is constructed but not initialized; the bus is opened by
    /// [`LedDriver::init`]. `pixel_count` must already be resolved (config
    /// validation fills it from the grid when the YAML leaves it out).
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = DriverConfig {
    ///     driver: Some(DriverKind::Ws2812Spi),
    ///     bus: Some(BusConfig::Spi {
    ///         bus: "/dev/spidev0.0".to_string(),
    ///         speed_hz: None,
    ///     }),
    ///     pixel_count: Some(256),
    ///     ..Default::default()
    /// };
    ///
    /// let driver = LedDriverFactory::create_from_config(&config)?;
    /// ```
    pub fn create_from_config(config: &DriverConfig) -> Result<BoxedDriver, DriverFactoryError> {
        let kind = config.driver.unwrap_or_default();
        let pixel_count = config.pixel_count
            .ok_or_else(|| DriverFactoryError::ConfigError("driver pixel_count not set".to_string()))?;
        if pixel_count == 0 {
            return Err(DriverFactoryError::ConfigError("driver pixel_count must be > 0".to_string()));
        }

        match kind {
            DriverKind::Mock => {
                info!("Using mock LED driver ({} LEDs)", pixel_count);
                Ok(Box::new(MockDriver::new(pixel_count)))
            }

            #[cfg(feature = "driver-ws2812-spi")]
            DriverKind::Ws2812Spi => {
                let BusConfig::Spi { bus, speed_hz } = config.bus.as_ref()
                    .ok_or(DriverFactoryError::NoBusConfiguration)?;
                Ok(Box::new(Ws2812SpiDriver::new(
                    bus,
                    *speed_hz,
                    pixel_count,
                    config.color_order.unwrap_or_default(),
                )))
            }

            #[cfg(not(feature = "driver-ws2812-spi"))]
            DriverKind::Ws2812Spi => Err(DriverFactoryError::DriverNotEnabled("driver-ws2812-spi")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock() {
        let config = DriverConfig {
            driver: Some(DriverKind::Mock),
            pixel_count: Some(64),
            ..Default::default()
        };
        let driver = LedDriverFactory::create_from_config(&config).unwrap();
        assert_eq!(driver.capabilities().name, "mock");
        assert_eq!(driver.pixel_count(), 64);
    }

    #[test]
    fn test_pixel_count_required() {
        let config = DriverConfig {
            driver: Some(DriverKind::Mock),
            ..Default::default()
        };
        assert!(matches!(
            LedDriverFactory::create_from_config(&config),
            Err(DriverFactoryError::ConfigError(_))
        ));
    }

    #[cfg(feature = "driver-ws2812-spi")]
    #[test]
    fn test_ws2812_requires_bus() {
        let config = DriverConfig {
            driver: Some(DriverKind::Ws2812Spi),
            pixel_count: Some(256),
            ..Default::default()
        };
        assert!(matches!(
            LedDriverFactory::create_from_config(&config),
            Err(DriverFactoryError::NoBusConfiguration)
        ));
    }

    #[cfg(feature = "driver-ws2812-spi")]
    #[test]
    fn test_ws2812_construct_does_not_open_bus() {
        let config = DriverConfig {
            driver: Some(DriverKind::Ws2812Spi),
            bus: Some(BusConfig::Spi {
                bus: "/dev/does-not-exist".to_string(),
                speed_hz: None,
            }),
            pixel_count: Some(256),
            ..Default::default()
        };
        let driver = LedDriverFactory::create_from_config(&config).unwrap();
        assert_eq!(driver.capabilities().name, "ws2812-spi");
    }
}
