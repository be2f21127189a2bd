// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render jobs and the bands they cover.

use crate::errors::{Error, Result};
use crate::planes::Viewport;
use num::Complex;
use std::ops::Range;

/// A contiguous run of image rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Band {
    /// First row of the band.
    pub row_start: usize,
    /// Number of rows in the band.
    pub row_count: usize,
}

impl Band {
    /// Constructor.
    pub fn new(row_start: usize, row_count: usize) -> Self {
        Band {
            row_start,
            row_count,
        }
    }

    /// The rows as a range.
    pub fn rows(&self) -> Range<usize> {
        self.row_start..self.row_start + self.row_count
    }

    /// Cut `height` rows into `count` bands of `height / count` rows;
    /// the last band takes whatever is left over.
    pub fn split(height: usize, count: usize) -> Result<Vec<Band>> {
        if count == 0 || count > height {
            return Err(Error::InvalidBands {
                reason: format!("cannot cut {} rows into {} bands", height, count),
            });
        }
        let size = height / count;
        Ok((0..count)
            .map(|i| {
                let row_start = i * size;
                let row_count = if i + 1 == count { height - row_start } else { size };
                Band::new(row_start, row_count)
            })
            .collect())
    }
}

/// Check that the bands are disjoint and together cover `0..height`
/// exactly once.
pub fn validate_bands(height: usize, bands: &[Band]) -> Result<()> {
    let mut sorted: Vec<Band> = bands.to_vec();
    sorted.sort_by_key(|band| band.row_start);
    let mut next = 0;
    for band in &sorted {
        if band.row_count == 0 {
            return Err(Error::InvalidBands {
                reason: format!("band at row {} is empty", band.row_start),
            });
        }
        if band.row_start != next {
            return Err(Error::InvalidBands {
                reason: if band.row_start < next {
                    format!("band at row {} overlaps row {}", band.row_start, next - 1)
                } else {
                    format!("rows {}..{} are not covered", next, band.row_start)
                },
            });
        }
        next = band.row_start + band.row_count;
    }
    if next != height {
        return Err(Error::InvalidBands {
            reason: format!("bands cover {} rows of {}", next, height),
        });
    }
    Ok(())
}

/// Everything a worker needs to render one band of one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderJob {
    /// The rows to render.
    pub band: Band,
    /// The frame's view of the complex plane.
    pub viewport: Viewport,
}

impl RenderJob {
    /// Constructor.
    pub fn new(row_start: usize, row_count: usize, scale: f64, offset: Complex<f64>) -> Self {
        RenderJob {
            band: Band::new(row_start, row_count),
            viewport: Viewport::new(scale, offset),
        }
    }

    /// The same band with a different viewport.
    pub fn with_viewport(self, viewport: Viewport) -> Self {
        RenderJob {
            band: self.band,
            viewport,
        }
    }

    /// True if the band lies inside an image `height` rows tall.
    pub fn fits(&self, height: usize) -> bool {
        self.band.row_start + self.band.row_count <= height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_bands_split_evenly() {
        let bands = Band::split(256, 2).unwrap();
        assert_eq!(bands, vec![Band::new(0, 128), Band::new(128, 128)]);
    }

    #[test]
    fn last_band_takes_remainder() {
        let bands = Band::split(10, 3).unwrap();
        assert_eq!(bands, vec![Band::new(0, 3), Band::new(3, 3), Band::new(6, 4)]);
        assert!(validate_bands(10, &bands).is_ok());
    }

    #[test]
    fn split_rejects_impossible_counts() {
        assert!(Band::split(10, 0).is_err());
        assert!(Band::split(2, 3).is_err());
    }

    #[test]
    fn every_split_covers_the_image() {
        for height in 1..40 {
            for count in 1..=height {
                let bands = Band::split(height, count).unwrap();
                assert_eq!(bands.len(), count);
                assert!(validate_bands(height, &bands).is_ok());
            }
        }
    }

    #[test]
    fn validation_catches_overlaps_and_gaps() {
        assert!(validate_bands(10, &[Band::new(0, 6), Band::new(5, 5)]).is_err());
        assert!(validate_bands(10, &[Band::new(0, 4), Band::new(5, 5)]).is_err());
        assert!(validate_bands(10, &[Band::new(0, 5), Band::new(5, 6)]).is_err());
        assert!(validate_bands(10, &[Band::new(0, 10), Band::new(10, 0)]).is_err());
        assert!(validate_bands(10, &[Band::new(5, 5), Band::new(0, 5)]).is_ok());
    }

    #[test]
    fn jobs_keep_their_band_across_viewports() {
        let job = RenderJob::new(4, 4, 2.0, Complex::new(0.0, 0.0));
        let next = job.with_viewport(Viewport::new(1.0, Complex::new(0.5, 0.5)));
        assert_eq!(next.band, job.band);
        assert_eq!(next.viewport.scale, 1.0);
        assert!(job.fits(8));
        assert!(!job.fits(7));
    }
}
