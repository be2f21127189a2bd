// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The tunables of a zoom, with the defaults the renderer has always
//! shipped with.

use crate::errors::{Error, Result};
use crate::escape::InteriorTest;
use crate::planes::Viewport;
use crate::render::Kernel;
use num::Complex;

/// Default iteration budget per pixel.
pub const MAX_ITERATIONS: usize = 1000;
/// Default number of distinct ramp colors (the ramp holds twice this).
pub const MAX_COLORS: usize = 50;
/// Default image edge length.
pub const SIZE: usize = 256;
/// Default number of worker bands.
pub const BANDS: usize = 2;
/// Default initial scale.
pub const SCALE: f64 = 2.0;
/// Default zoom speed: the per-second growth of the zoom divisor.
pub const ZOOM_SPEED: f64 = 0.005;
/// Smallest scale before f64 runs out of precision.
pub const MIN_SCALE: f64 = 0.000_000_000_01;

/// The default zoom target, deep in the spiral near `0 + 0.82i`.
pub fn default_offset() -> Complex<f64> {
    Complex::new(0.001_643_721_971_153, 0.822_467_633_298_876)
}

/// Everything needed to set up a zoom.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Iteration budget per pixel.
    pub max_iterations: usize,
    /// Half the size of the color ramp.
    pub max_colors: usize,
    /// Number of workers, one per horizontal band.
    pub bands: usize,
    /// Starting scale.
    pub scale: f64,
    /// Zoom target.
    pub offset: Complex<f64>,
    /// Zoom speed coefficient.
    pub zoom_speed: f64,
    /// Scale floor.
    pub min_scale: f64,
    /// Early-exit test to run before iterating.
    pub interior: InteriorTest,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: SIZE,
            height: SIZE,
            max_iterations: MAX_ITERATIONS,
            max_colors: MAX_COLORS,
            bands: BANDS,
            scale: SCALE,
            offset: default_offset(),
            zoom_speed: ZOOM_SPEED,
            min_scale: MIN_SCALE,
            interior: InteriorTest::default(),
        }
    }
}

impl RenderConfig {
    /// Check every tunable.  The viewport is checked (and its scale
    /// clamped) separately by `viewport`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations < 2 {
            return Err(Error::InvalidConfig {
                reason: format!("iteration count {} is too small", self.max_iterations),
            });
        }
        if self.max_colors == 0 {
            return Err(Error::InvalidConfig {
                reason: "the color ramp needs at least one color".to_string(),
            });
        }
        if self.bands == 0 || self.bands > self.height {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "band count must be between 1 and {}, got {}",
                    self.height, self.bands
                ),
            });
        }
        if !(self.zoom_speed.is_finite() && self.zoom_speed >= 0.0) {
            return Err(Error::InvalidConfig {
                reason: format!("zoom speed {} must be a non-negative number", self.zoom_speed),
            });
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(Error::InvalidConfig {
                reason: format!("minimum scale {} must be positive", self.min_scale),
            });
        }
        Ok(())
    }

    /// The starting viewport, clamped to the scale floor.
    pub fn viewport(&self) -> Result<Viewport> {
        Viewport::new(self.scale, self.offset).sanitized(self.min_scale)
    }

    /// The per-pixel kernel settings.
    pub fn kernel(&self) -> Kernel {
        Kernel {
            max_iterations: self.max_iterations,
            interior: self.interior,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.max_colors, 50);
        assert_eq!(config.bands, 2);
        assert_eq!(config.min_scale, 1e-11);
        assert_eq!(config.viewport().unwrap().scale, 2.0);
    }

    #[test]
    fn bad_tunables_are_rejected() {
        let base = RenderConfig::default();
        let broken = vec![
            RenderConfig { width: 0, ..base },
            RenderConfig { max_iterations: 1, ..base },
            RenderConfig { max_colors: 0, ..base },
            RenderConfig { bands: 0, ..base },
            RenderConfig { bands: 257, ..base },
            RenderConfig { zoom_speed: -1.0, ..base },
            RenderConfig { min_scale: 0.0, ..base },
        ];
        for config in broken {
            assert!(config.validate().is_err(), "{:?} should not validate", config);
        }
    }
}
