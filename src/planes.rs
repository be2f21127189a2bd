// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a window onto the complex plane described by a Viewport: a
//! scale factor and an offset.  The integral plane is first squashed
//! into the square from -1-1i to 1+1i, then scaled, then shifted.
use crate::errors::{Error, Result};
use log::warn;
use num::Complex;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a point on the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The scale and offset that map the normalized square onto the
/// complex plane for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Half the width of the visible region of the complex plane.
    pub scale: f64,
    /// The point of the complex plane at the center of the image.
    pub offset: Complex<f64>,
}

impl Viewport {
    /// Plain constructor; see `sanitized` for the checked version.
    pub fn new(scale: f64, offset: Complex<f64>) -> Self {
        Viewport { scale, offset }
    }

    /// Returns a viewport safe to render.  A scale that has underflowed
    /// (or gone negative) is clamped to `min_scale`; a non-finite
    /// offset or scale cannot be repaired and is an error.
    pub fn sanitized(self, min_scale: f64) -> Result<Self> {
        if !self.offset.re.is_finite() || !self.offset.im.is_finite() {
            warn!("rejecting viewport with offset {}", self.offset);
            return Err(Error::InvalidViewport {
                reason: format!("offset {} is not finite", self.offset),
            });
        }
        if !self.scale.is_finite() {
            warn!("rejecting viewport with scale {}", self.scale);
            return Err(Error::InvalidViewport {
                reason: format!("scale {} is not finite", self.scale),
            });
        }
        if self.scale < min_scale {
            return Ok(Viewport {
                scale: min_scale,
                offset: self.offset,
            });
        }
        Ok(self)
    }
}

/// Contains the definition of the integral plane and the viewport
/// onto the complex plane, and maps pixels from one to the other.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The right-lower corner of the integral cartesian plane.
    /// The left-upper is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// Where on the complex plane the image is looking.
    pub viewport: Viewport,
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// viewport for this frame.
    pub fn new(width: usize, height: usize, viewport: Viewport) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            viewport,
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, map it to the
    /// corresponding point on the complex plane: normalize into the
    /// square -1..1, multiply by the scale, add the offset.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let normalized = Complex::new(
            (pixel.0 as f64 / self.integral_plane.0 as f64) * 2.0 - 1.0,
            (pixel.1 as f64 / self.integral_plane.1 as f64) * 2.0 - 1.0,
        );
        normalized * self.viewport.scale + self.viewport.offset
    }
}
