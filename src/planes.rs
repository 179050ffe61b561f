// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and the fixed window of the complex plane in which the whole
//! Mandelbrot set fits: real axis [-2.5, 1.0], imaginary axis
//! [-1.0, 1.0].
use num::Complex;

/// Left edge of the complex window.
pub const RE_MIN: f32 = -2.5;
/// Width of the complex window along the real axis.
pub const RE_SPAN: f32 = 3.5;
/// Bottom edge of the complex window.
pub const IM_MIN: f32 = -1.0;
/// Height of the complex window along the imaginary axis.
pub const IM_SPAN: f32 = 2.0;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a point in a region.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of the integral plane onto the fixed complex window.
/// The first and last column land exactly on the window's real
/// edges, and the first and last row on its imaginary edges.
///
/// Every execution strategy goes through this one mapping, so the
/// arithmetic here must not be rearranged per caller: the iteration
/// counts are only reproducible if every caller gets the same bits.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    // Divisors for the two axes; a dimension of one is treated as two
    // so the single column or row sits on the window's edge.
    grid_divisors: (f32, f32),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane.  Zero-sized
    /// planes are rejected by the callers before they get here.
    pub fn new(width: usize, height: usize) -> PlaneMapper {
        PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            grid_divisors: (divisor(width), divisor(height)),
        }
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// The real coordinate of column `x`.  Columns past the right edge
    /// of the plane are still mapped; the SIMD kernel computes them and
    /// throws them away.
    #[inline]
    pub fn column_to_re(&self, x: usize) -> f32 {
        (x as f32) * RE_SPAN / self.grid_divisors.0 + RE_MIN
    }

    /// The imaginary coordinate of row `y`.
    #[inline]
    pub fn row_to_im(&self, y: usize) -> f32 {
        (y as f32) * IM_SPAN / self.grid_divisors.1 + IM_MIN
    }

    /// Given a pixel on the integral cartesian plane, map that to a
    /// point on the complex cartesian plane.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f32> {
        Complex::new(self.column_to_re(pixel.0), self.row_to_im(pixel.1))
    }
}

fn divisor(dimension: usize) -> f32 {
    (dimension.max(2) - 1) as f32
}
