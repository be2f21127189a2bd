// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel.  Takes a point on the complex plane and
//! repeatedly squares-and-adds, measuring how quickly the orbit goes
//! to infinity.  Points whose orbits never leave the circle of radius
//! two within the iteration budget are considered part of the set.
//!
//! The raw iteration count produces visible bands of color, so escaped
//! points also get a continuous "smoothed" index computed from how far
//! past the bailout radius the orbit had travelled when it escaped.

use num::Complex;
use std::f64::consts::LN_2;

/// The bailout radius, squared.
const ESCAPE_NORM_SQR: f64 = 2.0 * 2.0;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// Which early-exit test runs before the iteration loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InteriorTest {
    /// The test the renderer has always shipped with.  It is evaluated
    /// against the orbit's starting value rather than the point itself,
    /// with its quarter and sixteenth constants truncated to zero, and
    /// therefore never reports a point as inside.  Kept so that images
    /// match earlier renders exactly.
    Literal,
    /// The main cardioid and period-2 bulb tests evaluated against the
    /// point being classified.  Skips the loop for most of the black
    /// heart without changing any pixel.
    CardioidBulb,
}

impl Default for InteriorTest {
    fn default() -> Self {
        InteriorTest::Literal
    }
}

/// The outcome of iterating a single point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Escape {
    /// The point belongs to the set, as far as we can tell.
    Interior,
    /// The orbit left the bailout circle.
    Escaped {
        /// Number of iterations performed, always in `1..max_iterations`.
        iterations: usize,
        /// The first orbit value outside the bailout circle.
        z: Complex<f64>,
    },
}

/// A smoothed escape index split into the two ramp entries it falls
/// between and the weight of the upper one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SmoothIndex {
    /// `floor(s)`.  May be negative for points far outside the set.
    pub first: i64,
    /// `first + 1`.
    pub second: i64,
    /// `s - first`, in `[0, 1)`.
    pub factor: f64,
}

impl SmoothIndex {
    /// Split a continuous index into its integral and fractional parts.
    pub fn split(s: f64) -> Self {
        let floor = s.floor();
        let first = floor as i64;
        SmoothIndex {
            first,
            second: first + 1,
            factor: s - floor,
        }
    }
}

/// The cardioid/bulb test exactly as it has always been evaluated:
/// on the orbit's initial value, with the integer-truncated constants.
/// Both halves have to hold for the loop to be skipped.
fn literal_inside(z: Complex<f64>) -> bool {
    let (quarter, sixteenth) = (0.0_f64, 0.0_f64);
    let q = (z.re - quarter) * (z.re - quarter) + z.im * z.im;
    let inside_cardioid = q * (q + (z.re - quarter)) < quarter * z.im * z.im;
    let inside_bulb = (z.re + 1.0) * (z.re + 1.0) + z.im * z.im < sixteenth;
    inside_cardioid && inside_bulb
}

/// True if the point is definitely inside the main cardioid or the
/// period-2 bulb, both of which are wholly contained in the set.
pub fn in_cardioid_or_bulb(point: Complex<f64>) -> bool {
    let y = point.im * point.im;
    let q = (point.re - D4) * (point.re - D4) + y;
    let inside_cardioid = q * (q + (point.re - D4)) < D4 * y;
    let inside_bulb = (point.re + 1.0) * (point.re + 1.0) + y < D16;
    inside_cardioid || inside_bulb
}

/// This is our classic iterator function: iterate `z = z² + c` from
/// zero until the orbit escapes or the budget runs out.
pub fn escape_time(c: Complex<f64>, max_iterations: usize, test: InteriorTest) -> Escape {
    let mut z = Complex::new(0.0_f64, 0.0_f64);
    let skip = match test {
        InteriorTest::Literal => literal_inside(z),
        InteriorTest::CardioidBulb => in_cardioid_or_bulb(c),
    };

    let mut i = 0;
    if skip {
        i = max_iterations;
    } else {
        while i < max_iterations && z.norm_sqr() < ESCAPE_NORM_SQR {
            z = z * z + c;
            i += 1;
        }
    }

    if z.norm_sqr() < ESCAPE_NORM_SQR || i == max_iterations {
        Escape::Interior
    } else {
        Escape::Escaped { iterations: i, z }
    }
}

/// The normalized iteration count: the escape count plus a correction
/// for how far past the bailout radius the orbit landed.
pub fn smooth_value(iterations: usize, z: Complex<f64>, max_iterations: usize) -> f64 {
    let reference = (max_iterations as f64).ln().ln();
    iterations as f64 + (reference - z.norm().ln().ln()) / LN_2
}

impl Escape {
    /// The smoothed index for an escaped point, `None` for interior points.
    pub fn smooth(&self, max_iterations: usize) -> Option<SmoothIndex> {
        match *self {
            Escape::Interior => None,
            Escape::Escaped { iterations, z } => Some(SmoothIndex::split(smooth_value(
                iterations,
                z,
                max_iterations,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1000;

    #[test]
    fn origin_is_interior() {
        for test in &[InteriorTest::Literal, InteriorTest::CardioidBulb] {
            assert_eq!(escape_time(Complex::new(0.0, 0.0), MAX, *test), Escape::Interior);
        }
    }

    #[test]
    fn literal_test_never_fires() {
        assert!(!literal_inside(Complex::new(0.0, 0.0)));
    }

    #[test]
    fn cardioid_and_bulb_membership() {
        assert!(in_cardioid_or_bulb(Complex::new(0.0, 0.0)));
        assert!(in_cardioid_or_bulb(Complex::new(-0.1, 0.3)));
        assert!(in_cardioid_or_bulb(Complex::new(-1.0, 0.0)));
        assert!(in_cardioid_or_bulb(Complex::new(-1.1, 0.1)));
        assert!(!in_cardioid_or_bulb(Complex::new(0.3, 0.0)));
        assert!(!in_cardioid_or_bulb(Complex::new(-1.9984, -1.1775)));
    }

    #[test]
    fn far_point_escapes_quickly() {
        match escape_time(Complex::new(-1.9984, -1.1775), MAX, InteriorTest::Literal) {
            Escape::Escaped { iterations, z } => {
                assert!(iterations >= 1 && iterations < 5);
                assert!(z.norm_sqr() >= 4.0);
            }
            Escape::Interior => panic!("point outside radius two must escape"),
        }
    }

    #[test]
    fn smooth_index_is_continuous_above_iteration_count() {
        let c = Complex::new(0.5, 0.5);
        if let Escape::Escaped { iterations, z } = escape_time(c, MAX, InteriorTest::Literal) {
            assert!(iterations > 1 && iterations < MAX);
            let s = smooth_value(iterations, z, MAX);
            assert!(s >= iterations as f64);
            let split = SmoothIndex::split(s);
            assert_eq!(split.second, split.first + 1);
            assert!(split.factor >= 0.0 && split.factor < 1.0);
            assert!((split.first as f64 + split.factor - s).abs() < 1e-12);
        } else {
            panic!("0.5+0.5i is outside the set");
        }
    }

    #[test]
    fn split_handles_negative_indices() {
        let split = SmoothIndex::split(-0.25);
        assert_eq!(split.first, -1);
        assert_eq!(split.second, 0);
        assert!((split.factor - 0.75).abs() < 1e-12);
    }

    #[test]
    fn interior_has_no_smooth_index() {
        assert_eq!(Escape::Interior.smooth(MAX), None);
    }
}
