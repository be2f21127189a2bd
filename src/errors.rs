// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error type shared by the whole crate.  Nothing in the pixel
//! kernel can fail; everything here is a configuration mistake caught
//! before rendering starts, or a worker thread that died.

use failure::Fail;
use std::io;

/// Everything that can go wrong while setting up or driving a render.
#[derive(Debug, Fail)]
pub enum Error {
    /// The image has no pixels.
    #[fail(display = "Image dimensions must be non-zero, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// Bands overlap, leave a gap, or run off the bottom of the image.
    #[fail(display = "Invalid band layout: {}", reason)]
    InvalidBands {
        /// What was wrong with the layout.
        reason: String,
    },

    /// The viewport contains a value that would turn every pixel into NaN.
    #[fail(display = "Invalid viewport: {}", reason)]
    InvalidViewport {
        /// What was wrong with the viewport.
        reason: String,
    },

    /// A tunable is out of range.
    #[fail(display = "Invalid configuration: {}", reason)]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// A worker thread panicked; its band was left unfinished.
    #[fail(display = "Worker {} died before finishing its band", name)]
    WorkerPanicked {
        /// The thread name of the worker.
        name: String,
    },

    /// Writing a frame failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
