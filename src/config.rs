/*
 *  config.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML configuration layered under command line overrides
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

use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::color::DimFactor;
use crate::grid::{Grid, Wiring};
use crate::source::{ImageSourceSet, SourceMode, DEFAULT_EXTENSION};

pub const DEFAULT_IMAGE_ROOT: &str = "/spiffs/images";
pub const DEFAULT_GRID_SIZE: usize = 16;
pub const DEFAULT_DIM_FACTOR: u32 = 16;
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;
pub const DEFAULT_EMPTY_SET_RETRY_MS: u64 = 1000;
pub const DEFAULT_SPI_BUS: &str = "/dev/spidev0.0";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("grid must be at least 1x1, got {width}x{height}")]
    InvalidGrid { width: usize, height: usize },
    #[error("led_count {led_count} is smaller than the {cells} grid cells")]
    LedCountTooSmall { led_count: usize, cells: usize },
    #[error("dim factor must be >= 1")]
    ZeroDimFactor,
    #[error("image set '{0}' needs frames_per_second >= 1")]
    ZeroFrameRate(String),
    #[error("image set '{name}' runs at {fps} fps, the limit is 1000")]
    FrameRateTooHigh { name: String, fps: u32 },
    #[error("empty_set_retry_ms must be >= 1")]
    ZeroEmptySetRetry,
    #[error("no image sets configured")]
    NoSourceSets,
    #[error("max_iterations must be >= 1")]
    ZeroIterations,
    #[error("driver drives {driver_pixels} LEDs but the grid needs {led_count}")]
    DriverTooSmall { driver_pixels: usize, led_count: usize },
}

/// Raw application configuration as found in YAML. Every field is optional
/// so files and flags can be layered; [`Settings`] is the validated form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,          // e.g., "info" | "debug"
    pub image_root: Option<PathBuf>,        // mounted image partition
    pub dim_factor: Option<u32>,            // global brightness divisor
    pub max_iterations: Option<u32>,        // loops per set before advancing
    pub empty_set_retry_ms: Option<u64>,
    pub clear_on_exit: Option<bool>,
    pub grid: Option<GridConfig>,
    pub driver: Option<DriverConfig>,
    pub sets: Option<Vec<SetConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GridConfig {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub wiring: Option<Wiring>,
    pub led_count: Option<usize>,   // LEDs on the strip, >= width*height
}

/// One animation. With `count` the frame names are generated
/// (`{base_name}-{i}.{extension}`), without it the directory is scanned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetConfig {
    pub name: String,
    pub directory: Option<PathBuf>, // relative to image_root, defaults to name
    pub fps: u32,
    pub count: Option<usize>,
    pub base_name: Option<String>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DriverConfig {
    pub driver: Option<DriverKind>,
    pub bus: Option<BusConfig>,
    pub pixel_count: Option<usize>, // defaults to the grid led_count
    pub color_order: Option<ColorOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    Spi {
        bus: String,        // e.g. "/dev/spidev0.0"
        speed_hz: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    Mock,
    #[default]
    Ws2812Spi,
}

/// Channel order on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    #[default]
    Grb,
    Rgb,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "lednode", version, about = "PNG animation player for WS2812 LED matrices")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Directory the image sets live under
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub image_root: Option<PathBuf>,
    #[arg(long)]
    pub dim_factor: Option<u32>,
    #[arg(long)]
    pub grid_width: Option<usize>,
    #[arg(long)]
    pub grid_height: Option<usize>,
    /// serpentine-even-forward | serpentine-even-reverse
    #[arg(long)]
    pub wiring: Option<String>,
    #[arg(long)]
    pub max_iterations: Option<u32>,
    /// SPI device for the strip, e.g. /dev/spidev0.0
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub spi_bus: Option<String>,
    /// Render to the mock driver instead of hardware
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
    /// Loop the wiring check pattern instead of playing images
    #[arg(long, action = ArgAction::SetTrue)]
    pub test_pattern: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Validated, typed configuration the player runs from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub image_root: PathBuf,
    pub grid: Grid,
    pub dim_factor: DimFactor,
    pub max_iterations: u32,
    pub empty_set_retry: Duration,
    pub clear_on_exit: bool,
    pub sets: Vec<ImageSourceSet>,
    pub driver: DriverConfig,
    pub test_pattern: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Settings, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    let mut settings = validate(&cfg)?;
    settings.test_pattern = cli.test_pattern;
    Ok(settings)
}

/// Defaults, then YAML (explicit path or search), then CLI overrides.
pub fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults
    let mut cfg = Config::defaults();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli)?;

    Ok(cfg)
}

impl Config {
    /// The stock build: 16x16 panel on spidev0.0, the four bundled sets.
    pub fn defaults() -> Self {
        Config {
            log_level: Some("info".to_string()),
            image_root: Some(PathBuf::from(DEFAULT_IMAGE_ROOT)),
            dim_factor: Some(DEFAULT_DIM_FACTOR),
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            empty_set_retry_ms: Some(DEFAULT_EMPTY_SET_RETRY_MS),
            clear_on_exit: Some(true),
            grid: Some(GridConfig {
                width: Some(DEFAULT_GRID_SIZE),
                height: Some(DEFAULT_GRID_SIZE),
                wiring: Some(Wiring::default()),
                led_count: None,
            }),
            driver: Some(DriverConfig {
                driver: Some(DriverKind::Ws2812Spi),
                bus: Some(BusConfig::Spi { bus: DEFAULT_SPI_BUS.to_string(), speed_hz: None }),
                pixel_count: None,
                color_order: Some(ColorOrder::Grb),
            }),
            sets: Some(vec![
                SetConfig::templated("bird", 8, 10),
                SetConfig::templated("coin", 7, 8),
                SetConfig::templated("sword", 15, 20),
                SetConfig::templated("torch", 5, 10),
            ]),
        }
    }
}

impl SetConfig {
    pub fn templated(name: &str, count: usize, fps: u32) -> Self {
        SetConfig {
            name: name.to_string(),
            directory: None,
            fps,
            count: Some(count),
            base_name: None,
            extension: None,
        }
    }

    pub fn scanned(name: &str, fps: u32) -> Self {
        SetConfig {
            name: name.to_string(),
            directory: None,
            fps,
            count: None,
            base_name: None,
            extension: None,
        }
    }

    /// Directories stay relative; the store resolves them against image_root.
    fn to_source_set(&self) -> Result<ImageSourceSet, ConfigError> {
        let directory = self.directory.clone().unwrap_or_else(|| PathBuf::from(&self.name));
        let extension = self.extension.clone().unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let mode = match self.count {
            Some(count) => SourceMode::Templated {
                base_name: self.base_name.clone().unwrap_or_else(|| self.name.clone()),
                count,
                extension,
            },
            None => SourceMode::Scanned { extension },
        };
        ImageSourceSet::new(self.name.clone(), directory, mode, self.fps)
    }
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/lednode/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/lednode/config.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["lednode.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()          { dst.log_level = src.log_level; }
    if src.image_root.is_some()         { dst.image_root = src.image_root; }
    if src.dim_factor.is_some()         { dst.dim_factor = src.dim_factor; }
    if src.max_iterations.is_some()     { dst.max_iterations = src.max_iterations; }
    if src.empty_set_retry_ms.is_some() { dst.empty_set_retry_ms = src.empty_set_retry_ms; }
    if src.clear_on_exit.is_some()      { dst.clear_on_exit = src.clear_on_exit; }
    // a set list replaces the defaults wholesale
    if src.sets.is_some()               { dst.sets = src.sets; }
    // grid
    match (&mut dst.grid, src.grid) {
        (None, Some(g)) => dst.grid = Some(g),
        (Some(d), Some(s)) => merge_grid(d, s),
        _ => {}
    }
    // driver
    match (&mut dst.driver, src.driver) {
        (None, Some(c)) => dst.driver = Some(c),
        (Some(d), Some(s)) => merge_driver(d, s),
        _ => {}
    }
}

fn merge_grid(dst: &mut GridConfig, src: GridConfig) {
    if src.width.is_some()      { dst.width = src.width; }
    if src.height.is_some()     { dst.height = src.height; }
    if src.wiring.is_some()     { dst.wiring = src.wiring; }
    if src.led_count.is_some()  { dst.led_count = src.led_count; }
}

fn merge_driver(dst: &mut DriverConfig, src: DriverConfig) {
    if src.driver.is_some()      { dst.driver = src.driver; }
    if src.bus.is_some()         { dst.bus = src.bus; }
    if src.pixel_count.is_some() { dst.pixel_count = src.pixel_count; }
    if src.color_order.is_some() { dst.color_order = src.color_order; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if cli.debug                    { cfg.log_level = Some("debug".to_string()); }
    if cli.image_root.is_some()     { cfg.image_root = cli.image_root.clone(); }
    if cli.dim_factor.is_some()     { cfg.dim_factor = cli.dim_factor; }
    if cli.max_iterations.is_some() { cfg.max_iterations = cli.max_iterations; }

    let grid = cfg.grid.get_or_insert_with(GridConfig::default);
    if cli.grid_width.is_some()     { grid.width = cli.grid_width; }
    if cli.grid_height.is_some()    { grid.height = cli.grid_height; }
    if let Some(name) = cli.wiring.as_deref() {
        let wiring = Wiring::from_name(name).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unknown wiring '{name}' (serpentine-even-forward|serpentine-even-reverse)"
            ))
        })?;
        grid.wiring = Some(wiring);
    }

    let driver = cfg.driver.get_or_insert_with(DriverConfig::default);
    if let Some(bus) = cli.spi_bus.as_ref() {
        let speed_hz = match driver.bus.as_ref() {
            Some(BusConfig::Spi { speed_hz, .. }) => *speed_hz,
            None => None,
        };
        driver.bus = Some(BusConfig::Spi { bus: bus.clone(), speed_hz });
    }
    if cli.dry_run {
        driver.driver = Some(DriverKind::Mock);
    }
    Ok(())
}

/// Check invariants and build the typed [`Settings`].
pub fn validate(cfg: &Config) -> Result<Settings, ConfigError> {
    let grid_cfg = cfg.grid.clone().unwrap_or_default();
    let grid = Grid::new(
        grid_cfg.width.unwrap_or(DEFAULT_GRID_SIZE),
        grid_cfg.height.unwrap_or(DEFAULT_GRID_SIZE),
        grid_cfg.wiring.unwrap_or_default(),
        grid_cfg.led_count,
    )?;

    let dim_factor = DimFactor::new(cfg.dim_factor.unwrap_or(DEFAULT_DIM_FACTOR))?;

    let max_iterations = cfg.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
    if max_iterations == 0 {
        return Err(ConfigError::ZeroIterations);
    }

    let empty_set_retry_ms = cfg.empty_set_retry_ms.unwrap_or(DEFAULT_EMPTY_SET_RETRY_MS);
    if empty_set_retry_ms == 0 {
        return Err(ConfigError::ZeroEmptySetRetry);
    }

    let image_root = cfg.image_root.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_ROOT));
    let sets = cfg.sets.as_deref().unwrap_or_default();
    if sets.is_empty() {
        return Err(ConfigError::NoSourceSets);
    }
    let sets = sets
        .iter()
        .map(SetConfig::to_source_set)
        .collect::<Result<Vec<_>, _>>()?;

    let mut driver = cfg.driver.clone().unwrap_or_default();
    let driver_pixels = *driver.pixel_count.get_or_insert(grid.led_count());
    if driver_pixels < grid.led_count() {
        return Err(ConfigError::DriverTooSmall { driver_pixels, led_count: grid.led_count() });
    }

    Ok(Settings {
        log_level: cfg.log_level.clone().unwrap_or_else(|| "info".to_string()),
        image_root,
        grid,
        dim_factor,
        max_iterations,
        empty_set_retry: Duration::from_millis(empty_set_retry_ms),
        clear_on_exit: cfg.clear_on_exit.unwrap_or(true),
        sets,
        driver,
        test_pattern: false,
    })
}
