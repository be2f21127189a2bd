#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot zoom renderer
//!
//! The Mandelbrot set takes a point on the complex plane and
//! repeatedly multiplies it by itself, measuring how quickly that
//! number goes to infinity.  This "velocity" is the number used to
//! pick a color; points that never go to infinity are painted black.
//!
//! This crate renders a continuous zoom into the set.  The image is
//! cut into horizontal bands, and each band belongs to a worker thread
//! for the life of the zoom.  The host calls `FrameDriver::tick` once
//! per display frame; whenever every band of the current frame is
//! finished, the image is handed over for presentation and the
//! workers are set to the next, slightly deeper, frame.  The host
//! never waits on the workers and the workers never wait on the host.

pub mod buffer;
pub mod color;
pub mod config;
pub mod driver;
pub mod errors;
pub mod escape;
pub mod job;
pub mod planes;
pub mod render;
pub mod worker;

pub use buffer::PixelBuffer;
pub use color::{Color, ColorRamp};
pub use config::RenderConfig;
pub use driver::{Clock, FrameDriver, FrameStatus, ManualClock, SystemClock};
pub use errors::{Error, Result};
pub use escape::{escape_time, Escape, InteriorTest, SmoothIndex};
pub use job::{Band, RenderJob};
pub use planes::{Pixel, PlaneMapper, Viewport};
pub use render::{render_single, render_threaded, Kernel};
pub use worker::{FractalWorker, WorkerHandle};
