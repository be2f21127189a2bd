// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Colors and the color ramp.
//!
//! The ramp is built once, shared read-only by every worker, and
//! indexed by the smoothed escape index.  It "ping-pongs": the second
//! half is the first half in reverse, so when the index wraps around
//! the end of the ramp there's no visible seam.

use crate::errors::{Error, Result};
use crate::escape::SmoothIndex;
use num::clamp;
use std::ops::{Add, Mul};

/// A linear RGB color, each channel nominally in `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl Color {
    /// Constructor.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// The color of points inside the set.
    pub fn black() -> Self {
        Color::new(0.0, 0.0, 0.0)
    }

    /// Encode as three bytes.  Channels are truncated, not rounded.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            clamp(self.r * 255.0, 0.0, 255.0) as u8,
            clamp(self.g * 255.0, 0.0, 255.0) as u8,
            clamp(self.b * 255.0, 0.0, 255.0) as u8,
        ]
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, factor: f64) -> Color {
        Color::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

/// A symmetric palette of `2 * max_colors` entries.
#[derive(Clone, Debug)]
pub struct ColorRamp {
    colors: Vec<Color>,
}

impl ColorRamp {
    /// Build the ramp.  Red rises quickly (fourth root), green rises
    /// linearly, blue falls from one half to zero; the second half of
    /// the ramp mirrors the first.  A ramp needs at least one color.
    pub fn new(max_colors: usize) -> Result<Self> {
        if max_colors == 0 {
            return Err(Error::InvalidConfig {
                reason: "the color ramp needs at least one color".to_string(),
            });
        }
        let mut colors = vec![Color::black(); max_colors * 2];
        for i in 0..max_colors {
            let factor = i as f32 / max_colors as f32;
            let inverse_factor = (max_colors - i) as f32 / max_colors as f32;
            let color = Color::new(
                f64::from(factor.sqrt().sqrt()),
                f64::from(factor),
                f64::from(inverse_factor * 0.5),
            );
            colors[i] = color;
            colors[max_colors * 2 - 1 - i] = color;
        }
        Ok(ColorRamp { colors })
    }

    /// Number of entries, `2 * max_colors`.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True for a ramp built with zero colors.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Look up an entry, wrapping any index (including negative ones)
    /// around the ramp.
    pub fn get(&self, index: i64) -> Color {
        self.colors[index.rem_euclid(self.colors.len() as i64) as usize]
    }

    /// Resolve an escape result to a color: black for the interior,
    /// otherwise a blend of the two ramp entries either side of the
    /// smoothed index.
    pub fn resolve(&self, index: Option<SmoothIndex>) -> Color {
        match index {
            None => Color::black(),
            Some(SmoothIndex {
                first,
                second,
                factor,
            }) => self.get(second) * factor + self.get(first) * (1.0 - factor),
        }
    }
}
