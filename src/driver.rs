// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The frame driver: the host's side of the worker protocol.
//!
//! Call `tick` once per display frame.  If every worker has finished
//! its band, the completed image is handed to the presenter, the zoom
//! advances, and every worker gets the next frame's job.  If any band
//! is still being drawn, nothing happens and the host keeps showing
//! whatever it presented last.  Slow frames are simply skipped.

use crate::buffer::PixelBuffer;
use crate::color::ColorRamp;
use crate::config::RenderConfig;
use crate::errors::{Error, Result};
use crate::job::{validate_bands, Band, RenderJob};
use crate::planes::Viewport;
use crate::worker::{FractalWorker, WorkerHandle};
use log::{debug, warn};
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// A source of elapsed time, in seconds since the zoom started.
pub trait Clock {
    /// Seconds elapsed.
    fn elapsed(&self) -> f64;
}

/// Wall-clock time since construction.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Start counting now.
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> f64 {
        let elapsed = self.start.elapsed();
        elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9
    }
}

/// A clock that only moves when told to.  Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    seconds: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// A clock reading zero.
    pub fn new() -> Self {
        ManualClock::default()
    }

    /// Set the reading.
    pub fn set(&self, seconds: f64) {
        *self.seconds.lock().unwrap_or_else(PoisonError::into_inner) = seconds;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> f64 {
        *self.seconds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The zoom step.  The divisor grows with elapsed time, so the zoom
/// accelerates the longer it runs; the result never drops below
/// `min_scale`.
pub fn next_scale(scale: f64, elapsed: f64, zoom_speed: f64, min_scale: f64) -> f64 {
    let factor = 1.0 + elapsed * zoom_speed;
    let next = 1.0 / (factor * (1.0 / scale));
    if next < min_scale || !next.is_finite() {
        min_scale
    } else {
        next
    }
}

/// What a call to `tick` did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FrameStatus {
    /// A complete frame was presented and the next one started.
    Presented {
        /// Count of frames presented so far, starting at one.
        frame: usize,
        /// The viewport of the frame just presented.
        viewport: Viewport,
    },
    /// At least one band is still rendering.
    Pending,
}

/// Owns the workers of a zoom and the image they draw into.
pub struct FrameDriver<C: Clock> {
    config: RenderConfig,
    buffer: Arc<PixelBuffer>,
    workers: Vec<WorkerHandle>,
    jobs: Vec<RenderJob>,
    viewport: Viewport,
    clock: C,
    frames: usize,
}

impl<C: Clock> FrameDriver<C> {
    /// Split the image into `config.bands` even bands, start one worker
    /// per band, and hand each the first frame.
    pub fn new(config: RenderConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let bands = Band::split(config.height, config.bands)?;
        FrameDriver::with_bands(config, &bands, clock)
    }

    /// As `new`, with an explicit band layout.  The bands must be
    /// disjoint and cover the image.
    pub fn with_bands(config: RenderConfig, bands: &[Band], clock: C) -> Result<Self> {
        config.validate()?;
        validate_bands(config.height, bands)?;
        let viewport = config.viewport()?;
        let buffer = Arc::new(PixelBuffer::new(config.width, config.height)?);
        let ramp = Arc::new(ColorRamp::new(config.max_colors)?);
        let jobs: Vec<RenderJob> = bands
            .iter()
            .map(|band| RenderJob {
                band: *band,
                viewport,
            })
            .collect();

        let mut driver = FrameDriver {
            config,
            buffer: Arc::clone(&buffer),
            workers: Vec::with_capacity(jobs.len()),
            jobs,
            viewport,
            clock,
            frames: 0,
        };
        for (i, job) in driver.jobs.iter().enumerate() {
            let worker = FractalWorker::new(Arc::clone(&buffer), Arc::clone(&ramp), config.kernel())
                .with_min_scale(config.min_scale);
            worker.assign(*job)?;
            let handle = Arc::new(worker).spawn(&format!("band-{}", i))?;
            driver.workers.push(handle);
        }
        debug!(
            "started {} workers on a {}x{} image",
            driver.workers.len(),
            config.width,
            config.height
        );
        Ok(driver)
    }

    /// The shared image.
    pub fn buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }

    /// The viewport of the frame currently being rendered.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Frames presented so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// True if every band of the current frame is finished.
    pub fn all_done(&self) -> bool {
        self.workers.iter().all(|worker| worker.is_done())
    }

    /// Drive one display frame.  If the current frame is complete it is
    /// passed to `present`, and the next frame is started.
    pub fn tick<F>(&mut self, present: F) -> Result<FrameStatus>
    where
        F: FnOnce(&PixelBuffer) -> Result<()>,
    {
        if let Some(dead) = self.workers.iter().find(|worker| worker.is_finished()) {
            return Err(Error::WorkerPanicked {
                name: dead.name().to_string(),
            });
        }

        let elapsed = self.clock.elapsed();
        if !self.all_done() {
            return Ok(FrameStatus::Pending);
        }

        present(&self.buffer)?;
        self.frames += 1;
        let presented = self.viewport;
        debug!("presented frame {} at scale {:e}", self.frames, presented.scale);

        let scale = next_scale(
            presented.scale,
            elapsed,
            self.config.zoom_speed,
            self.config.min_scale,
        );
        if scale <= self.config.min_scale && presented.scale > self.config.min_scale {
            warn!("zoom reached the scale floor {:e}", self.config.min_scale);
        }
        self.viewport = Viewport::new(scale, presented.offset);
        for (worker, job) in self.workers.iter().zip(self.jobs.iter_mut()) {
            *job = job.with_viewport(self.viewport);
            worker.assign(*job)?;
        }

        Ok(FrameStatus::Presented {
            frame: self.frames,
            viewport: presented,
        })
    }

    /// Stop every worker and wait for them.  Workers finish the band
    /// they're on first.  This is the way to release the workers and
    /// find out whether any of them died; dropping the driver also
    /// stops and joins them, but can only log a failure.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<()> {
        let workers = mem::replace(&mut self.workers, Vec::new());
        for worker in &workers {
            worker.request_stop();
        }
        let mut result = Ok(());
        for worker in workers {
            if let Err(err) = worker.join() {
                result = result.and(Err(err));
            }
        }
        debug!("all workers stopped after {} frames", self.frames);
        result
    }
}

impl<C: Clock> Drop for FrameDriver<C> {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        if let Err(err) = self.stop_and_join() {
            warn!("{}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_single;
    use num::Complex;
    use std::thread;
    use std::time::Duration;

    fn config() -> RenderConfig {
        RenderConfig {
            width: 24,
            height: 16,
            scale: 1.5,
            offset: Complex::new(-0.5, 0.0),
            ..RenderConfig::default()
        }
    }

    fn present_next<C: Clock>(driver: &mut FrameDriver<C>) -> (Viewport, Vec<u8>) {
        let mut bytes = Vec::new();
        for _ in 0..30_000 {
            let status = driver
                .tick(|buffer| {
                    bytes = buffer.to_vec();
                    Ok(())
                })
                .unwrap();
            if let FrameStatus::Presented { viewport, .. } = status {
                return (viewport, bytes);
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("no frame was presented");
    }

    #[test]
    fn next_scale_divides_by_elapsed_factor() {
        assert_eq!(next_scale(2.0, 0.0, 0.005, 1e-11), 2.0);
        assert!((next_scale(2.0, 200.0, 0.005, 1e-11) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn next_scale_clamps_at_the_floor() {
        let mut scale = 2.0;
        for _ in 0..200 {
            scale = next_scale(scale, 200.0, 0.005, 1e-11);
            assert!(scale >= 1e-11);
        }
        assert_eq!(scale, 1e-11);
        assert_eq!(next_scale(0.0, 1.0, 0.005, 1e-11), 1e-11);
    }

    #[test]
    fn frames_match_single_threaded_renders() {
        let clock = ManualClock::new();
        let config = config();
        let mut driver = FrameDriver::new(config, clock.clone()).unwrap();

        let (viewport, bytes) = present_next(&mut driver);
        assert_eq!(viewport.scale, 1.5);
        assert_eq!(bytes, render_single(&config).unwrap());

        clock.set(100.0);
        let (viewport, _) = present_next(&mut driver);
        assert_eq!(viewport.scale, 1.5);
        assert!((driver.viewport().scale - 1.0).abs() < 1e-12);

        let (viewport, bytes) = present_next(&mut driver);
        assert_eq!(
            bytes,
            render_single(&RenderConfig {
                scale: viewport.scale,
                ..config
            })
            .unwrap()
        );
        assert_eq!(driver.frames(), 3);
        driver.shutdown().unwrap();
    }

    #[test]
    fn zoom_stops_at_the_floor() {
        let clock = ManualClock::new();
        clock.set(1.0e6);
        let config = RenderConfig {
            width: 4,
            height: 4,
            ..config()
        };
        let mut driver = FrameDriver::new(config, clock).unwrap();
        for _ in 0..6 {
            present_next(&mut driver);
        }
        assert_eq!(driver.viewport().scale, config.min_scale);
        driver.shutdown().unwrap();
    }

    #[test]
    fn uneven_bands_render_the_same_image() {
        let config = config();
        let bands = [Band::new(0, 3), Band::new(3, 9), Band::new(12, 4)];
        let mut driver = FrameDriver::with_bands(config, &bands, ManualClock::new()).unwrap();
        let (_, bytes) = present_next(&mut driver);
        assert_eq!(bytes, render_single(&config).unwrap());
        driver.shutdown().unwrap();
    }

    #[test]
    fn bad_band_layouts_are_refused() {
        let bands = [Band::new(0, 9), Band::new(8, 8)];
        assert!(FrameDriver::with_bands(config(), &bands, ManualClock::new()).is_err());
        let short = [Band::new(0, 8)];
        assert!(FrameDriver::with_bands(config(), &short, ManualClock::new()).is_err());
    }

    #[test]
    fn dropping_the_driver_joins_its_workers() {
        let driver = FrameDriver::new(config(), ManualClock::new()).unwrap();
        let buffer = Arc::clone(driver.buffer());
        assert!(Arc::strong_count(&buffer) > 2);
        drop(driver);
        assert_eq!(Arc::strong_count(&buffer), 1);
    }

    #[test]
    fn presenter_errors_propagate() {
        let mut driver = FrameDriver::new(config(), ManualClock::new()).unwrap();
        let mut failed = false;
        for _ in 0..30_000 {
            match driver.tick(|_| Err(Error::InvalidConfig {
                reason: "presenter failed".to_string(),
            })) {
                Ok(FrameStatus::Pending) => thread::sleep(Duration::from_millis(1)),
                Ok(FrameStatus::Presented { .. }) => panic!("presenter error was swallowed"),
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        assert!(failed);
        driver.shutdown().unwrap();
    }
}
