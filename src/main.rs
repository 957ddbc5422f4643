/*
 *  main.rs
 *
 *  LEDNode - pixels on a string
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use lednode::config;
use lednode::driver::LedDriverFactory;
use lednode::pattern;
use lednode::{stop_channel, FsImageStore, PngDecoder, Sequencer, SequencerConfig};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Wait for SIGINT, SIGTERM or SIGHUP.
async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = config::load().context("Failed to load configuration")?;

    // Initialize the logger with the configured level, RUST_LOG still wins
    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()))
        .format_timestamp_secs()
        .init();

    info!("{} - pixels on a string", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let mut driver = LedDriverFactory::create_from_config(&settings.driver)
        .context("Failed to create LED driver")?;

    let (handle, stop) = stop_channel();
    tokio::spawn(async move {
        match signal_handler().await {
            Ok(()) => handle.stop(),
            Err(e) => error!("Signal handler unavailable: {}", e),
        }
    });

    if settings.test_pattern {
        pattern::run_wiring_check(driver.as_mut(), &settings.grid, settings.dim_factor, stop)
            .await
            .context("Wiring check failed")?;
        return Ok(());
    }

    let store = FsImageStore::new(&settings.image_root);
    match store.stats() {
        Ok(stats) => info!("Image store {}: {} files, {} bytes",
                           settings.image_root.display(), stats.files, stats.bytes),
        Err(e) => warn!("Image store {} unavailable: {}", settings.image_root.display(), e),
    }

    let mut sequencer = Sequencer::new(
        SequencerConfig::from(&settings),
        settings.sets.clone(),
        store,
        PngDecoder,
        driver,
    )?;
    sequencer.run(stop).await.context("Playback failed")?;

    info!("Goodbye");
    Ok(())
}
