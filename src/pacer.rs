/*
 *  pacer.rs
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
use std::time::Duration;

use tokio::sync::watch;

/// Inter-frame delay for a rate: whole milliseconds, rounded down.
#[inline]
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_millis(u64::from(1000 / fps.max(1)))
}

/// Fixed-interval frame pacing. The delay starts after the flush, so a slow
/// decode stretches the frame rather than being absorbed.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    frame: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        Self { frame: frame_interval(target_fps) }
    }

    #[inline]
    pub fn set_fps(&mut self, fps: u32) {
        self.frame = frame_interval(fps);
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.frame
    }
}

/// Sleep for `duration` unless `stop` fires. Returns true if the full
/// duration elapsed.
pub async fn sleep_or_stop(duration: Duration, stop: &mut StopSignal) -> bool {
    if stop.is_stopped() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = stop.stopped() => false,
    }
}

/// Sending half of the stop signal, owned by whoever handles shutdown.
#[derive(Debug)]
pub struct StopHandle(watch::Sender<bool>);

/// Receiving half, checked at the top of every playback step and raced
/// against every inter-frame delay.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(tx), StopSignal(rx))
}

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once stop has been requested. If the handle is dropped
    /// without stopping, this never resolves.
    pub async fn stopped(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
