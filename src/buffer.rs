// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The shared RGB8 output image.
//!
//! Every worker holds a reference to the same buffer and writes the
//! rows of its own band while the others write theirs.  The bands are
//! disjoint, so no byte is ever written by two workers and the buffer
//! itself carries no lock.  Bytes are stored as relaxed atomics; the
//! workers' job mutex is what publishes a finished band to whoever
//! reads the buffer next.

use crate::errors::{Error, Result};
use crate::planes::Pixel;
use std::sync::atomic::{AtomicU8, Ordering};

/// Bytes per pixel.
pub const CHANNELS: usize = 3;

/// A row-major RGB8 image that may be written from several threads.
pub struct PixelBuffer {
    width: usize,
    height: usize,
    bytes: Vec<AtomicU8>,
}

impl PixelBuffer {
    /// A black image of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let bytes = (0..width * height * CHANNELS)
            .map(|_| AtomicU8::new(0))
            .collect();
        Ok(PixelBuffer {
            width,
            height,
            bytes,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Size in bytes, `width * height * 3`.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Never true; a buffer always has at least one pixel.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    fn offset(&self, pixel: &Pixel) -> usize {
        debug_assert!(pixel.0 < self.width && pixel.1 < self.height);
        (pixel.1 * self.width + pixel.0) * CHANNELS
    }

    /// Store one pixel.
    #[inline]
    pub fn write_pixel(&self, pixel: &Pixel, rgb: [u8; 3]) {
        let offset = self.offset(pixel);
        for (byte, value) in self.bytes[offset..offset + CHANNELS].iter().zip(&rgb) {
            byte.store(*value, Ordering::Relaxed);
        }
    }

    /// Load one pixel.
    pub fn read_pixel(&self, pixel: &Pixel) -> [u8; 3] {
        let offset = self.offset(pixel);
        let mut rgb = [0u8; 3];
        for (value, byte) in rgb.iter_mut().zip(&self.bytes[offset..offset + CHANNELS]) {
            *value = byte.load(Ordering::Relaxed);
        }
        rgb
    }

    /// Copy the whole image out.  Only meaningful once every band
    /// covering the image has reported done.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes
            .iter()
            .map(|byte| byte.load(Ordering::Relaxed))
            .collect()
    }
}
