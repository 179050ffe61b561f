// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Eight-lane escape-time kernel.
//!
//! Eight adjacent columns of one row are iterated together.  The real
//! and imaginary parts live in separate registers, and a bitmask keeps
//! track of which lanes have not escaped yet.  A lane that escapes has
//! its count frozen; the arithmetic keeps running on it (masked off)
//! until every lane has escaped or the budget runs out.
//!
//! The operations are written in the same order as the scalar kernel's
//! `z * z + c` on `Complex<f32>`, so both produce the same count for
//! every pixel.

use wide::*;

use crate::kernel::ESCAPE_RADIUS_SQR;
use crate::planes::PlaneMapper;

/// Number of columns iterated per batch.
pub const LANES: usize = 8;

const ALL_LANES: i32 = (1 << LANES) - 1;

/// Returns the escape count of each lane.  `re` holds the real parts of
/// eight points that share the imaginary part `im`.
pub fn escape_time_x8(re: [f32; LANES], im: f32, limit: u32) -> [u32; LANES] {
    let cr = f32x8::from(re);
    let ci = f32x8::splat(im);
    let threshold = f32x8::splat(ESCAPE_RADIUS_SQR);

    let mut v = f32x8::splat(0.0);
    let mut w = f32x8::splat(0.0);
    let mut counts = [limit; LANES];
    let mut active = ALL_LANES;

    for i in 0..limit {
        let vw = v * w;
        let v_next = v * v - w * w + cr;
        w = vw + vw + ci;
        v = v_next;

        let escaped = (v * v + w * w).cmp_ge(threshold).move_mask() & active;
        if escaped != 0 {
            for (lane, count) in counts.iter_mut().enumerate() {
                if escaped & (1 << lane) != 0 {
                    *count = i;
                }
            }
            active &= !escaped;
            if active == 0 {
                break;
            }
        }
    }
    counts
}

/// Fill one row of the iteration map eight columns at a time.  The last
/// batch may run past the end of the row; those lanes are computed and
/// dropped.
pub fn fill_row(plane: &PlaneMapper, y: usize, row: &mut [u32], limit: u32) {
    let im = plane.row_to_im(y);
    for (batch, chunk) in row.chunks_mut(LANES).enumerate() {
        let first = batch * LANES;
        let mut re = [0.0_f32; LANES];
        for (lane, value) in re.iter_mut().enumerate() {
            *value = plane.column_to_re(first + lane);
        }
        let counts = escape_time_x8(re, im, limit);
        chunk.copy_from_slice(&counts[..chunk.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel;
    use num::Complex;

    #[test]
    fn lanes_agree_with_scalar_kernel() {
        let re = [-2.5, -1.75, -1.0, -0.75, -0.1, 0.25, 0.3, 1.0];
        for &im in &[-1.0_f32, -0.5, -0.1, 0.0] {
            let counts = escape_time_x8(re, im, 200);
            for lane in 0..LANES {
                assert_eq!(
                    counts[lane],
                    kernel::escape_time(Complex::new(re[lane], im), 200),
                    "lane {} at im {}",
                    lane,
                    im
                );
            }
        }
    }

    #[test]
    fn lanes_freeze_independently() {
        let re = [5.0, 0.0, 1.0, 0.0, 5.0, 0.0, 1.0, 0.0];
        let counts = escape_time_x8(re, 0.0, 30);
        assert_eq!(counts, [0, 30, 1, 30, 0, 30, 1, 30]);
    }

    #[test]
    fn batch_stops_once_every_lane_escaped() {
        let counts = escape_time_x8([5.0; LANES], 3.0, u32::max_value());
        assert_eq!(counts, [0; LANES]);
    }

    #[test]
    fn ragged_row_matches_scalar_row() {
        let plane = PlaneMapper::new(21, 11);
        for y in 0..6 {
            let mut simd_row = vec![0u32; 21];
            let mut scalar_row = vec![0u32; 21];
            fill_row(&plane, y, &mut simd_row, 100);
            kernel::fill_row(&plane, y, &mut scalar_row, 100);
            assert_eq!(simd_row, scalar_row, "row {}", y);
        }
    }
}
