// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning bands of pixels into colors.
//!
//! `render_band` is the inner loop every worker runs.  The two
//! `render_*` entry points below it produce a complete still image in
//! one call, either on the calling thread or with one scoped thread
//! per band; the animated zoom goes through the long-lived workers in
//! `worker` instead.

use crate::buffer::PixelBuffer;
use crate::color::ColorRamp;
use crate::config::RenderConfig;
use crate::errors::{Error, Result};
use crate::escape::{escape_time, InteriorTest};
use crate::job::{validate_bands, Band, RenderJob};
use crate::planes::{IntegralPlane, Pixel, PlaneMapper};
use itertools::iproduct;
use log::trace;

/// The per-pixel settings shared by every band of a render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Kernel {
    /// Iteration budget per pixel.
    pub max_iterations: usize,
    /// Early-exit test.
    pub interior: InteriorTest,
}

impl Kernel {
    /// Classify one pixel and pick its color.
    #[inline]
    pub fn pixel(&self, plane: &PlaneMapper, ramp: &ColorRamp, pixel: &Pixel) -> [u8; 3] {
        let c = plane.pixel_to_point(pixel);
        let escape = escape_time(c, self.max_iterations, self.interior);
        ramp.resolve(escape.smooth(self.max_iterations)).to_rgb8()
    }
}

/// Render every pixel of the job's band straight into the buffer.
/// The band must lie inside the buffer.
pub fn render_band(kernel: &Kernel, ramp: &ColorRamp, buffer: &PixelBuffer, job: &RenderJob) {
    debug_assert!(job.fits(buffer.height()));
    let plane = PlaneMapper {
        integral_plane: IntegralPlane(buffer.width(), buffer.height()),
        viewport: job.viewport,
    };
    trace!("rendering rows {:?} at scale {:e}", job.band.rows(), job.viewport.scale);
    for (row, column) in iproduct!(job.band.rows(), 0..buffer.width()) {
        let pixel = Pixel(column, row);
        buffer.write_pixel(&pixel, kernel.pixel(&plane, ramp, &pixel));
    }
}

/// Render the configured starting viewport as a single band on the
/// calling thread.
pub fn render_single(config: &RenderConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let buffer = PixelBuffer::new(config.width, config.height)?;
    let ramp = ColorRamp::new(config.max_colors)?;
    let job = RenderJob {
        band: Band::new(0, config.height),
        viewport: config.viewport()?,
    };
    render_band(&config.kernel(), &ramp, &buffer, &job);
    Ok(buffer.to_vec())
}

/// Render the configured starting viewport with one scoped thread per
/// band.
pub fn render_threaded(config: &RenderConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let bands = Band::split(config.height, config.bands)?;
    render_bands(config, &bands)
}

/// Render the configured starting viewport over an explicit band
/// layout, one scoped thread per band.
pub fn render_bands(config: &RenderConfig, bands: &[Band]) -> Result<Vec<u8>> {
    config.validate()?;
    validate_bands(config.height, bands)?;
    let buffer = PixelBuffer::new(config.width, config.height)?;
    let ramp = ColorRamp::new(config.max_colors)?;
    let kernel = config.kernel();
    let viewport = config.viewport()?;
    {
        let (buffer, ramp, kernel) = (&buffer, &ramp, &kernel);
        crossbeam::scope(|spawner| {
            for band in bands {
                let job = RenderJob {
                    band: *band,
                    viewport,
                };
                spawner.spawn(move |_| render_band(kernel, ramp, buffer, &job));
            }
        })
        .map_err(|_| Error::WorkerPanicked {
            name: "scoped band renderer".to_string(),
        })?;
    }
    Ok(buffer.to_vec())
}
