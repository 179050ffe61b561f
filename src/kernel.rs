// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The scalar escape-time kernel.
//!
//! A point `c` is iterated as `z = z * z + c` starting from zero.  The
//! count returned is the index of the step after which `|z|^2` first
//! reached 4, so a point that leaves the radius-2 disk on the very
//! first step has a count of zero.  A point that never leaves within
//! `limit` steps gets `limit` itself, which is how the rest of the
//! pipeline recognizes members of the set.

use num::Complex;

use crate::planes::PlaneMapper;

/// Squared escape radius.
pub const ESCAPE_RADIUS_SQR: f32 = 4.0;

/// This is our classic iterator function, which returns the number
/// of iterations it took to escape the Mandelbrot set, or `limit` if
/// it never did.
#[inline]
pub fn escape_time(c: Complex<f32>, limit: u32) -> u32 {
    let mut z = Complex::new(0.0_f32, 0.0_f32);
    for i in 0..limit {
        z = z * z + c;
        if z.norm_sqr() >= ESCAPE_RADIUS_SQR {
            return i;
        }
    }
    limit
}

/// Fill one row of the iteration map, one point at a time.
pub fn fill_row(plane: &PlaneMapper, y: usize, row: &mut [u32], limit: u32) {
    let im = plane.row_to_im(y);
    for (x, count) in row.iter_mut().enumerate() {
        *count = escape_time(Complex::new(plane.column_to_re(x), im), limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_points_escape_immediately() {
        assert_eq!(escape_time(Complex::new(5.0, 0.0), 50), 0);
        assert_eq!(escape_time(Complex::new(-2.5, -1.0), 50), 0);
    }

    #[test]
    fn members_exhaust_the_budget() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 50), 50);
        assert_eq!(escape_time(Complex::new(-0.75, 0.0), 50), 50);
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), 1000), 1000);
    }

    #[test]
    fn count_never_exceeds_limit() {
        for limit in 0..20 {
            for re in -25..10 {
                let c = Complex::new(re as f32 / 10.0, 0.3);
                assert!(escape_time(c, limit) <= limit);
            }
        }
    }

    #[test]
    fn zero_budget_means_nothing_escapes() {
        assert_eq!(escape_time(Complex::new(5.0, 0.0), 0), 0);
    }

    #[test]
    fn point_near_boundary_takes_a_few_steps() {
        // 1 -> 2 -> 5: |z|^2 crosses 4 on the second step.
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 50), 1);
    }

    #[test]
    fn fill_row_matches_pointwise_kernel() {
        let plane = PlaneMapper::new(16, 9);
        let mut row = vec![0u32; 16];
        fill_row(&plane, 2, &mut row, 64);
        for (x, count) in row.iter().enumerate() {
            let c = plane.pixel_to_point(&crate::planes::Pixel(x, 2));
            assert_eq!(*count, escape_time(c, 64));
        }
    }
}
