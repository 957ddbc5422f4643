/*
 *  sequencer.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playback sequencer: sets, frames, iterations and the run loop
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

use std::mem;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::color::DimFactor;
use crate::compositor::{render_into, RenderError};
use crate::config::{ConfigError, Settings};
use crate::decoder::ImageDecoder;
use crate::driver::BoxedDriver;
use crate::error::PlaybackError;
use crate::frame::LedBuffer;
use crate::grid::Grid;
use crate::pacer::{sleep_or_stop, Pacer, StopSignal};
use crate::source::ImageSourceSet;
use crate::store::ImageStore;

/// Knobs the sequencer needs from the validated configuration.
#[derive(Debug, Clone, Copy)]
pub struct SequencerConfig {
    pub grid: Grid,
    pub dim_factor: DimFactor,
    pub max_iterations: u32,
    pub empty_set_retry: Duration,
    pub clear_on_exit: bool,
}

impl From<&Settings> for SequencerConfig {
    fn from(s: &Settings) -> Self {
        SequencerConfig {
            grid: s.grid,
            dim_factor: s.dim_factor,
            max_iterations: s.max_iterations,
            empty_set_retry: s.empty_set_retry,
            clear_on_exit: s.clear_on_exit,
        }
    }
}

/// Where playback is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_set_index: usize,
    pub current_frame_index: usize,
    pub frames_per_second: u32,
    /// Completed passes over the current set
    pub iteration_count: u32,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Playing,
    AdvanceSet,
    Stopped,
}

/// Counters logged at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub io_errors: u64,
    pub decode_errors: u64,
    pub dimension_mismatches: u64,
    pub driver_errors: u64,
    pub empty_sets: u64,
    pub sets_played: u64,
}

/// What one call to [`Sequencer::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Set resolved into this many frames
    Loaded { frames: usize },
    /// Frame shown; wait `delay` before the next step
    Rendered { path: PathBuf, delay: Duration },
    /// Frame could not be shown; the LEDs keep the previous image
    Skipped { path: PathBuf, reason: String, delay: Duration },
    /// Set had nothing to play
    EmptySet { name: String, delay: Duration },
    Advanced { to: usize },
    Stopped,
}

impl StepOutcome {
    /// How long the run loop waits before the next step.
    pub fn delay(&self) -> Duration {
        match self {
            StepOutcome::Rendered { delay, .. }
            | StepOutcome::Skipped { delay, .. }
            | StepOutcome::EmptySet { delay, .. } => *delay,
            _ => Duration::ZERO,
        }
    }
}

/// Drives the whole pipeline: resolve a set, decode each frame, render it
/// through the grid and push it to the strip, then pace and loop.
///
/// Rendering goes into a back buffer which is swapped to the front only
/// after a successful flush, so a bad frame never disturbs what is lit.
pub struct Sequencer<S, D> {
    config: SequencerConfig,
    sets: Vec<ImageSourceSet>,
    store: S,
    decoder: D,
    driver: BoxedDriver,
    phase: Phase,
    state: PlaybackState,
    files: Vec<PathBuf>,
    front: LedBuffer,
    back: LedBuffer,
    pacer: Pacer,
    stats: PlaybackStats,
    empty_in_rotation: usize,
    started: bool,
}

impl<S: ImageStore, D: ImageDecoder> Sequencer<S, D> {
    pub fn new(
        config: SequencerConfig,
        sets: Vec<ImageSourceSet>,
        store: S,
        decoder: D,
        driver: BoxedDriver,
    ) -> Result<Self, PlaybackError> {
        let driver_pixels = driver.pixel_count();
        let led_count = config.grid.led_count();
        if driver_pixels < led_count {
            return Err(ConfigError::DriverTooSmall { driver_pixels, led_count }.into());
        }
        if config.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }

        let phase = if sets.is_empty() {
            error!("No image sets configured, nothing to play");
            Phase::Stopped
        } else {
            Phase::Idle
        };
        let fps = sets.first().map_or(1, |s| s.frames_per_second());

        Ok(Self {
            config,
            sets,
            store,
            decoder,
            driver,
            phase,
            state: PlaybackState {
                current_set_index: 0,
                current_frame_index: 0,
                frames_per_second: fps,
                iteration_count: 0,
                max_iterations: config.max_iterations,
            },
            files: Vec::new(),
            front: LedBuffer::new(driver_pixels),
            back: LedBuffer::new(driver_pixels),
            pacer: Pacer::new(fps),
            stats: PlaybackStats::default(),
            empty_in_rotation: 0,
            started: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Colors currently lit, in strip order.
    pub fn displayed(&self) -> &LedBuffer {
        &self.front
    }

    /// Frame list of the current set (empty before the first load).
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Initialize the strip and blank every LED, trailing unmapped ones
    /// included. Driver failures here are fatal.
    pub fn start(&mut self) -> Result<(), PlaybackError> {
        if self.phase == Phase::Stopped {
            return Ok(());
        }
        let caps = self.driver.capabilities();
        info!("Starting playback on {} ({} LEDs, {}x{} grid, {} sets)",
              caps.name, caps.pixel_count, self.config.grid.width(), self.config.grid.height(), self.sets.len());

        self.driver.init()?;
        self.front.fill(0);
        self.driver.set_buffer(self.front.as_slice())?;
        self.driver.flush()?;
        self.started = true;
        self.phase = Phase::Loading;
        Ok(())
    }

    /// Request a stop; the next step returns [`StepOutcome::Stopped`].
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    /// Perform exactly one state transition. A sequencer still `Idle` is
    /// started first; if the strip cannot be started playback stops.
    pub fn step(&mut self) -> StepOutcome {
        match self.phase {
            Phase::Idle => match self.start() {
                Ok(()) => self.load_set(),
                Err(e) => {
                    error!("Failed to start LED strip: {}", e);
                    self.phase = Phase::Stopped;
                    StepOutcome::Stopped
                }
            },
            Phase::Loading => self.load_set(),
            Phase::Playing => self.play_frame(),
            Phase::AdvanceSet => self.advance_set(),
            Phase::Stopped => StepOutcome::Stopped,
        }
    }

    fn load_set(&mut self) -> StepOutcome {
        let set = &self.sets[self.state.current_set_index];
        match set.resolve(&self.store) {
            Ok(files) => {
                info!("Playing '{}': {} frames at {} fps, {} iterations",
                      set.name(), files.len(), set.frames_per_second(), self.state.max_iterations);
                let max_fps = self.driver.capabilities().max_fps;
                if set.frames_per_second() > max_fps {
                    warn!("'{}' asks for {} fps but the strip refreshes at most {} fps, pacing at {}",
                          set.name(), set.frames_per_second(), max_fps, max_fps);
                }
                self.state.frames_per_second = set.frames_per_second();
                self.state.current_frame_index = 0;
                self.state.iteration_count = 0;
                self.pacer.set_fps(set.frames_per_second().min(max_fps));
                self.empty_in_rotation = 0;
                self.files = files;
                self.phase = Phase::Playing;
                StepOutcome::Loaded { frames: self.files.len() }
            }
            Err(e) => {
                warn!("{}, skipping", e);
                let name = set.name().to_string();
                self.stats.empty_sets += 1;
                self.files.clear();
                self.empty_in_rotation += 1;
                let delay = if self.empty_in_rotation >= self.sets.len() {
                    warn!("Every image set is empty, retrying in {:?}", self.config.empty_set_retry);
                    self.empty_in_rotation = 0;
                    self.config.empty_set_retry
                } else {
                    Duration::ZERO
                };
                self.phase = Phase::AdvanceSet;
                StepOutcome::EmptySet { name, delay }
            }
        }
    }

    fn play_frame(&mut self) -> StepOutcome {
        let path = self.files[self.state.current_frame_index].clone();
        let delay = self.pacer.interval();

        let outcome = match self.show(&path) {
            Ok(()) => {
                self.stats.frames_rendered += 1;
                debug!("frame {} {}", self.state.current_frame_index, path.display());
                StepOutcome::Rendered { path, delay }
            }
            Err(e) => {
                self.count_error(&e);
                warn!("Skipping {} [{}]: {}", path.display(), e.kind(), e);
                StepOutcome::Skipped { path, reason: e.to_string(), delay }
            }
        };

        self.state.current_frame_index += 1;
        if self.state.current_frame_index >= self.files.len() {
            self.state.current_frame_index = 0;
            self.state.iteration_count += 1;
            if self.state.iteration_count >= self.state.max_iterations {
                self.stats.sets_played += 1;
                self.phase = Phase::AdvanceSet;
            }
        }
        outcome
    }

    fn advance_set(&mut self) -> StepOutcome {
        let to = (self.state.current_set_index + 1) % self.sets.len();
        self.state.current_set_index = to;
        self.state.current_frame_index = 0;
        self.state.iteration_count = 0;
        self.phase = Phase::Loading;
        StepOutcome::Advanced { to }
    }

    /// Read, decode, render into the back buffer, flush, swap.
    fn show(&mut self, path: &Path) -> Result<(), PlaybackError> {
        let bytes = self.store.read_file(path)?;
        let frame = self.decoder.decode(&bytes)?;
        render_into(&frame, &self.config.grid, self.config.dim_factor, &mut self.back)?;
        self.driver.set_buffer(self.back.as_slice())?;
        self.driver.flush()?;
        mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn count_error(&mut self, e: &PlaybackError) {
        self.stats.frames_skipped += 1;
        match e {
            PlaybackError::Store(_) => self.stats.io_errors += 1,
            PlaybackError::Decode(_) => self.stats.decode_errors += 1,
            PlaybackError::Render(RenderError::DimensionMismatch { .. }) => self.stats.dimension_mismatches += 1,
            PlaybackError::Driver(_) => self.stats.driver_errors += 1,
            _ => {}
        }
    }

    /// Start the strip and play until `stop` fires.
    ///
    /// The stop signal is checked before every step and raced against every
    /// delay, so shutdown never waits out a frame.
    pub async fn run(&mut self, mut stop: StopSignal) -> Result<PlaybackStats, PlaybackError> {
        if self.phase == Phase::Idle {
            self.start()?;
        }

        loop {
            if stop.is_stopped() {
                break;
            }
            let outcome = self.step();
            if outcome == StepOutcome::Stopped {
                break;
            }
            let delay = outcome.delay();
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else if !sleep_or_stop(delay, &mut stop).await {
                break;
            }
        }

        self.phase = Phase::Stopped;
        if self.started && self.config.clear_on_exit {
            if let Err(e) = self.driver.clear() {
                warn!("Failed to clear LEDs on exit: {}", e);
            }
        }
        info!("Playback stopped: {} frames shown, {} skipped, {} empty sets",
              self.stats.frames_rendered, self.stats.frames_skipped, self.stats.empty_sets);
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::color::{BLUE, GREEN, RED};
    use crate::decoder::DecodeError;
    use crate::driver::{MockDriver, MockDriverState};
    use crate::frame::Frame;
    use crate::grid::Wiring;
    use crate::pacer::stop_channel;
    use crate::source::SourceMode;
    use crate::store::StoreError;

    /// Files held in memory, listed in name order.
    #[derive(Default)]
    struct MemStore {
        files: BTreeMap<PathBuf, Vec<u8>>,
    }

    impl MemStore {
        fn with(mut self, path: &str, bytes: Vec<u8>) -> Self {
            self.files.insert(PathBuf::from(path), bytes);
            self
        }
    }

    impl ImageStore for MemStore {
        fn list_files(&self, directory: &Path, extension: &str) -> Result<Vec<PathBuf>, StoreError> {
            Ok(self
                .files
                .keys()
                .filter(|p| p.parent() == Some(directory))
                .filter(|p| p.extension().is_some_and(|e| e == extension))
                .cloned()
                .collect())
        }

        fn read_file(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
            self.files.get(path).cloned().ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
        }
    }

    /// `[w, h, r, g, b]` becomes a solid frame; anything else fails.
    #[derive(Clone, Default)]
    struct SolidDecoder {
        calls: Arc<AtomicUsize>,
    }

    impl ImageDecoder for SolidDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<Frame, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let [w, h, r, g, b] = bytes else {
                return Err(DecodeError::Unsupported("not a solid frame".to_string()));
            };
            let (w, h) = (*w as usize, *h as usize);
            Frame::from_rgba(w, h, &vec![(*r, *g, *b, 255); w * h])
        }
    }

    fn solid(w: u8, h: u8, color: u32) -> Vec<u8> {
        vec![w, h, (color >> 16) as u8, (color >> 8) as u8, color as u8]
    }

    fn config(max_iterations: u32) -> SequencerConfig {
        SequencerConfig {
            grid: Grid::new(2, 2, Wiring::default(), None).unwrap(),
            dim_factor: DimFactor::IDENTITY,
            max_iterations,
            empty_set_retry: Duration::from_secs(1),
            clear_on_exit: true,
        }
    }

    fn scanned(dir: &str, fps: u32) -> ImageSourceSet {
        ImageSourceSet::scanned(dir, fps).unwrap()
    }

    fn sequencer(
        cfg: SequencerConfig,
        sets: Vec<ImageSourceSet>,
        store: MemStore,
    ) -> (Sequencer<MemStore, SolidDecoder>, Arc<Mutex<MockDriverState>>, Arc<AtomicUsize>) {
        let driver = MockDriver::new(cfg.grid.led_count());
        let state = driver.state();
        let decoder = SolidDecoder::default();
        let calls = Arc::clone(&decoder.calls);
        let seq = Sequencer::new(cfg, sets, store, decoder, Box::new(driver)).unwrap();
        (seq, state, calls)
    }

    fn three_frames() -> MemStore {
        MemStore::default()
            .with("a/a-0.png", solid(2, 2, RED))
            .with("a/a-1.png", solid(2, 2, GREEN))
            .with("a/a-2.png", solid(2, 2, BLUE))
            .with("b/b-0.png", solid(2, 2, RED))
    }

    #[test]
    fn test_start_blanks_strip() {
        let cfg = SequencerConfig {
            grid: Grid::new(2, 2, Wiring::default(), Some(6)).unwrap(),
            ..config(1)
        };
        let (mut seq, driver, _) = sequencer(cfg, vec![scanned("a", 10)], three_frames());
        seq.start().unwrap();

        let driver = driver.lock().unwrap();
        assert_eq!(driver.init_count, 1);
        assert_eq!(driver.history, vec![vec![0; 6]]);
        assert_eq!(seq.phase(), Phase::Loading);
    }

    #[test]
    fn test_iterations_then_advance() {
        let (mut seq, driver, _) =
            sequencer(config(2), vec![scanned("a", 10), scanned("b", 5)], three_frames());
        seq.start().unwrap();

        assert_eq!(seq.step(), StepOutcome::Loaded { frames: 3 });
        assert_eq!(seq.state().frames_per_second, 10);

        for i in 0..6 {
            let outcome = seq.step();
            assert!(matches!(outcome, StepOutcome::Rendered { .. }), "step {i}: {outcome:?}");
            assert_eq!(outcome.delay(), Duration::from_millis(100));
        }
        // 1 blanking flush + 3 frames x 2 iterations
        assert_eq!(driver.lock().unwrap().flush_count, 7);
        assert_eq!(seq.phase(), Phase::AdvanceSet);
        assert_eq!(seq.state().current_frame_index, 0);
        assert_eq!(seq.state().iteration_count, 2);

        assert_eq!(seq.step(), StepOutcome::Advanced { to: 1 });
        assert_eq!(seq.step(), StepOutcome::Loaded { frames: 1 });
        assert_eq!(seq.state().frames_per_second, 5);
        assert_eq!(seq.state().iteration_count, 0);
        assert_eq!(seq.stats().sets_played, 1);
    }

    #[test]
    fn test_frames_lit_in_order() {
        let (mut seq, driver, _) = sequencer(config(1), vec![scanned("a", 10)], three_frames());
        seq.start().unwrap();
        seq.step();
        for _ in 0..3 {
            seq.step();
        }
        let history = driver.lock().unwrap().history.clone();
        assert_eq!(history[1], vec![RED; 4]);
        assert_eq!(history[2], vec![GREEN; 4]);
        assert_eq!(history[3], vec![BLUE; 4]);
        assert_eq!(seq.displayed().as_slice(), &[BLUE; 4]);
    }

    #[test]
    fn test_single_set_wraps_to_itself() {
        let (mut seq, _, _) = sequencer(config(1), vec![scanned("b", 10)], three_frames());
        seq.start().unwrap();
        assert_eq!(seq.step(), StepOutcome::Loaded { frames: 1 });
        assert!(matches!(seq.step(), StepOutcome::Rendered { .. }));
        assert_eq!(seq.step(), StepOutcome::Advanced { to: 0 });
        assert_eq!(seq.step(), StepOutcome::Loaded { frames: 1 });
    }

    #[test]
    fn test_empty_set_skipped_without_decode() {
        let (mut seq, driver, calls) =
            sequencer(config(1), vec![scanned("empty", 10), scanned("b", 10)], three_frames());
        seq.start().unwrap();

        assert_eq!(
            seq.step(),
            StepOutcome::EmptySet { name: "empty".to_string(), delay: Duration::ZERO }
        );
        assert_eq!(seq.step(), StepOutcome::Advanced { to: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(driver.lock().unwrap().flush_count, 1);
        assert_eq!(seq.stats().empty_sets, 1);
    }

    #[test]
    fn test_all_sets_empty_waits_before_retry() {
        let (mut seq, _, _) =
            sequencer(config(1), vec![scanned("x", 10), scanned("y", 10)], MemStore::default());
        seq.start().unwrap();

        assert_eq!(seq.step().delay(), Duration::ZERO);
        seq.step();
        assert_eq!(seq.step().delay(), Duration::from_secs(1));
        seq.step();
        // counter restarts after the retry wait
        assert_eq!(seq.step().delay(), Duration::ZERO);
    }

    #[test]
    fn test_mismatched_frame_skipped_keeps_image() {
        let store = MemStore::default()
            .with("a/a-0.png", solid(2, 2, RED))
            .with("a/a-1.png", solid(3, 2, GREEN))
            .with("a/a-2.png", vec![0xde, 0xad]);
        let (mut seq, driver, _) = sequencer(config(1), vec![scanned("a", 8)], store);
        seq.start().unwrap();
        seq.step();

        assert!(matches!(seq.step(), StepOutcome::Rendered { .. }));
        let outcome = seq.step();
        assert!(matches!(outcome, StepOutcome::Skipped { .. }));
        assert_eq!(outcome.delay(), Duration::from_millis(125));
        assert!(matches!(seq.step(), StepOutcome::Skipped { .. }));

        assert_eq!(driver.lock().unwrap().flush_count, 2);
        assert_eq!(driver.lock().unwrap().shown, vec![RED; 4]);
        assert_eq!(seq.displayed().as_slice(), &[RED; 4]);
        assert_eq!(seq.stats().dimension_mismatches, 1);
        assert_eq!(seq.stats().decode_errors, 1);
        assert_eq!(seq.stats().frames_skipped, 2);
    }

    #[test]
    fn test_missing_templated_frame_is_io_skip() {
        let set = ImageSourceSet::new(
            "a",
            "a",
            SourceMode::Templated { base_name: "a".to_string(), count: 4, extension: "png".to_string() },
            10,
        )
        .unwrap();
        let (mut seq, _, _) = sequencer(config(1), vec![set], three_frames());
        seq.start().unwrap();
        assert_eq!(seq.step(), StepOutcome::Loaded { frames: 4 });
        for _ in 0..3 {
            assert!(matches!(seq.step(), StepOutcome::Rendered { .. }));
        }
        assert!(matches!(seq.step(), StepOutcome::Skipped { .. }));
        assert_eq!(seq.stats().io_errors, 1);
    }

    #[test]
    fn test_flush_failure_is_skip() {
        let (mut seq, driver, _) = sequencer(config(1), vec![scanned("a", 10)], three_frames());
        seq.start().unwrap();
        seq.step();
        driver.lock().unwrap().simulate_flush_failure = true;
        assert!(matches!(seq.step(), StepOutcome::Skipped { .. }));
        assert_eq!(seq.stats().driver_errors, 1);
        assert_eq!(seq.displayed().as_slice(), &[0; 4]);
    }

    #[test]
    fn test_no_sets_is_stopped() {
        let (mut seq, driver, _) = sequencer(config(1), vec![], MemStore::default());
        assert_eq!(seq.phase(), Phase::Stopped);
        seq.start().unwrap();
        assert_eq!(seq.step(), StepOutcome::Stopped);
        assert_eq!(driver.lock().unwrap().init_count, 0);
    }

    #[test]
    fn test_driver_too_small_rejected() {
        let driver = MockDriver::new(3);
        let result = Sequencer::new(
            config(1),
            vec![scanned("a", 10)],
            MemStore::default(),
            SolidDecoder::default(),
            Box::new(driver),
        );
        assert!(matches!(
            result,
            Err(PlaybackError::Config(ConfigError::DriverTooSmall { driver_pixels: 3, led_count: 4 }))
        ));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = Sequencer::new(
            config(0),
            vec![scanned("a", 10)],
            MemStore::default(),
            SolidDecoder::default(),
            Box::new(MockDriver::new(4)),
        );
        assert!(matches!(result, Err(PlaybackError::Config(ConfigError::ZeroIterations))));
    }

    #[test]
    fn test_step_from_idle_starts_strip() {
        let (mut seq, driver, _) = sequencer(config(1), vec![scanned("a", 10)], three_frames());
        assert_eq!(seq.phase(), Phase::Idle);
        assert_eq!(seq.step(), StepOutcome::Loaded { frames: 3 });
        assert!(matches!(seq.step(), StepOutcome::Rendered { .. }));

        let driver = driver.lock().unwrap();
        assert_eq!(driver.init_count, 1);
        assert_eq!(driver.shown, vec![RED; 4]);
        assert_eq!(seq.stats().driver_errors, 0);
    }

    #[test]
    fn test_step_from_idle_stops_when_init_fails() {
        let (mut seq, driver, calls) = sequencer(config(1), vec![scanned("a", 10)], three_frames());
        driver.lock().unwrap().simulate_init_failure = true;
        assert_eq!(seq.step(), StepOutcome::Stopped);
        assert_eq!(seq.phase(), Phase::Stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pacing_capped_at_strip_refresh() {
        let cfg = config(1);
        let driver = MockDriver::new(4).with_max_fps(50);
        let mut seq = Sequencer::new(
            cfg,
            vec![scanned("a", 100)],
            three_frames(),
            SolidDecoder::default(),
            Box::new(driver),
        )
        .unwrap();
        seq.start().unwrap();
        seq.step();
        assert_eq!(seq.state().frames_per_second, 100);
        assert_eq!(seq.step().delay(), Duration::from_millis(20));
    }

    #[test]
    fn test_init_failure_is_fatal() {
        let (mut seq, driver, _) = sequencer(config(1), vec![scanned("a", 10)], three_frames());
        driver.lock().unwrap().simulate_init_failure = true;
        assert!(matches!(seq.start(), Err(PlaybackError::Driver(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_stopped_then_clears() {
        let (mut seq, driver, _) = sequencer(config(2), vec![scanned("a", 10)], three_frames());
        let (handle, stop) = stop_channel();

        tokio::spawn(async move {
            // 4 frames at 100ms, stop part way into the 5th delay
            tokio::time::sleep(Duration::from_millis(450)).await;
            handle.stop();
        });

        let stats = seq.run(stop).await.unwrap();
        assert_eq!(stats.frames_rendered, 5);
        assert_eq!(seq.phase(), Phase::Stopped);

        let driver = driver.lock().unwrap();
        assert_eq!(driver.shown, vec![0; 4]);
        assert_eq!(driver.history.last(), Some(&vec![0; 4]));
    }

    #[tokio::test]
    async fn test_run_with_zero_retry_still_sees_stop() {
        let cfg = SequencerConfig { empty_set_retry: Duration::ZERO, ..config(1) };
        let (mut seq, driver, _) =
            sequencer(cfg, vec![scanned("x", 10), scanned("y", 10)], MemStore::default());
        let (handle, stop) = stop_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.stop();
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), seq.run(stop))
            .await
            .expect("run loop must yield to the stop task")
            .unwrap();
        assert!(stats.empty_sets > 0);
        assert_eq!(stats.frames_rendered, 0);
        assert_eq!(seq.phase(), Phase::Stopped);
        assert_eq!(driver.lock().unwrap().shown, vec![0; 4]);
    }
}
