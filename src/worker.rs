// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Long-lived band workers.
//!
//! A worker owns one horizontal band of the shared image for its whole
//! life.  It loops on its own thread: if the latest job it was handed
//! hasn't been rendered yet, render it straight into the buffer and
//! mark it done; otherwise sleep for a tick and look again.  Nothing
//! blocks.  The driver asks `is_done` whenever it likes and hands out
//! the next job once every worker says yes.
//!
//! The job and its done flag live under the same mutex.  Each
//! assignment bumps a generation number, and a worker records the
//! generation it actually rendered, so a job assigned while a band is
//! still being drawn is rendered afterwards rather than being reported
//! done.  Because the worker takes that mutex after its last pixel
//! write, and the driver takes it before reading the image, the pixels
//! are always visible to the driver once it sees the band done.

use crate::buffer::PixelBuffer;
use crate::color::ColorRamp;
use crate::config::MIN_SCALE;
use crate::errors::{Error, Result};
use crate::job::RenderJob;
use crate::render::{render_band, Kernel};
use log::{debug, trace};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long an idle worker sleeps before looking for a new job.
pub const IDLE_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct JobSlot {
    job: Option<RenderJob>,
    assigned: u64,
    completed: u64,
}

/// One band's renderer.  Share it with `Arc` and run `run` (or call
/// `spawn`) on a thread of its own.
pub struct FractalWorker {
    buffer: Arc<PixelBuffer>,
    ramp: Arc<ColorRamp>,
    kernel: Kernel,
    slot: Mutex<JobSlot>,
    running: Mutex<bool>,
    idle: Duration,
    min_scale: f64,
}

impl FractalWorker {
    /// An idle worker with no job.
    pub fn new(buffer: Arc<PixelBuffer>, ramp: Arc<ColorRamp>, kernel: Kernel) -> Self {
        FractalWorker {
            buffer,
            ramp,
            kernel,
            slot: Mutex::new(JobSlot::default()),
            running: Mutex::new(true),
            idle: IDLE_TICK,
            min_scale: MIN_SCALE,
        }
    }

    /// Change the idle polling interval.
    pub fn with_idle_tick(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Change the scale floor that assigned viewports are clamped to.
    pub fn with_min_scale(mut self, min_scale: f64) -> Self {
        self.min_scale = min_scale;
        self
    }

    // Nothing panics while holding either lock, so a poisoned lock
    // still holds consistent data.
    fn slot(&self) -> MutexGuard<JobSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn running(&self) -> MutexGuard<bool> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the worker its next job; `is_done` is false until the
    /// worker has rendered it.  A band that falls outside the image or
    /// a viewport that isn't finite is refused; a scale below the floor
    /// is clamped to it.
    pub fn assign(&self, job: RenderJob) -> Result<()> {
        if job.band.row_count == 0 || !job.fits(self.buffer.height()) {
            return Err(Error::InvalidBands {
                reason: format!(
                    "rows {:?} do not fit an image {} rows tall",
                    job.band.rows(),
                    self.buffer.height()
                ),
            });
        }
        let viewport = job.viewport.sanitized(self.min_scale)?;
        let mut slot = self.slot();
        slot.job = Some(job.with_viewport(viewport));
        slot.assigned += 1;
        Ok(())
    }

    /// True if the most recently assigned job has been rendered.  A
    /// worker that has never been given a job is idle, and so done.
    pub fn is_done(&self) -> bool {
        let slot = self.slot();
        slot.completed == slot.assigned
    }

    /// Ask the loop to exit after its current pass.  Idempotent.
    pub fn request_stop(&self) {
        *self.running() = false;
    }

    /// False once a stop has been requested.
    pub fn is_running(&self) -> bool {
        *self.running()
    }

    fn pending(&self) -> Option<(RenderJob, u64)> {
        let slot = self.slot();
        if slot.completed == slot.assigned {
            return None;
        }
        slot.job.map(|job| (job, slot.assigned))
    }

    /// The worker loop.  Returns once a stop has been requested; a
    /// band that is being rendered when the request arrives is
    /// finished first.
    pub fn run(&self) {
        loop {
            match self.pending() {
                Some((job, generation)) => {
                    render_band(&self.kernel, &self.ramp, &self.buffer, &job);
                    self.slot().completed = generation;
                    trace!("band {:?} done (generation {})", job.band.rows(), generation);
                }
                None => thread::sleep(self.idle),
            }
            if !self.is_running() {
                break;
            }
        }
    }

    /// Start the loop on a named thread of its own.
    pub fn spawn(self: Arc<Self>, name: &str) -> Result<WorkerHandle> {
        let worker = Arc::clone(&self);
        let thread = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!("worker {} started", thread_name());
            worker.run();
            debug!("worker {} stopped", thread_name());
        })?;
        Ok(WorkerHandle {
            name: name.to_string(),
            worker: self,
            thread,
        })
    }
}

fn thread_name() -> String {
    thread::current().name().unwrap_or("<unnamed>").to_string()
}

/// A worker running on its own thread.
pub struct WorkerHandle {
    name: String,
    worker: Arc<FractalWorker>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// The worker's thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// See `FractalWorker::assign`.
    pub fn assign(&self, job: RenderJob) -> Result<()> {
        self.worker.assign(job)
    }

    /// See `FractalWorker::is_done`.
    pub fn is_done(&self) -> bool {
        self.worker.is_done()
    }

    /// See `FractalWorker::request_stop`.
    pub fn request_stop(&self) {
        self.worker.request_stop()
    }

    /// True once the thread has exited, whether it was stopped or died.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the thread to exit.  Call `request_stop` first or this
    /// never returns.
    pub fn join(self) -> Result<()> {
        let name = self.name;
        self.thread
            .join()
            .map_err(|_| Error::WorkerPanicked { name })
    }
}
