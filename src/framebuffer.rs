// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A view over a caller-owned RGB8 buffer.
//!
//! Rows start `stride` bytes apart and hold `width` packed pixels each;
//! any bytes between the end of the pixels and the start of the next
//! row are padding and are never touched.
//!
//! The Mandelbrot set is symmetric about the real axis, and the
//! fixed window puts the real axis on the image's horizontal
//! centerline.  Only the upper half of the image is computed, so
//! rows are handed out in mirrored pairs: row `y` together with row
//! `height - 1 - y`.

use crate::color::Rgb8;
use crate::error::RenderError;

/// Bytes per packed pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// A stride-addressed RGB8 image borrowed from the caller.
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> FrameBuffer<'a> {
    /// Wraps `data` after checking that `height` rows of `stride`
    /// bytes, each holding `width` pixels, fit inside it.
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }
        let overflow = || RenderError::GeometryOverflow {
            width,
            height,
            stride,
        };
        let row_bytes = width.checked_mul(BYTES_PER_PIXEL).ok_or_else(overflow)?;
        if stride < row_bytes {
            return Err(RenderError::StrideTooSmall {
                stride,
                min: row_bytes,
            });
        }
        let min = height.checked_mul(stride).ok_or_else(overflow)?;
        if data.len() < min {
            return Err(RenderError::BufferTooSmall {
                len: data.len(),
                min,
            });
        }
        Ok(FrameBuffer {
            data,
            width,
            height,
            stride,
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

    /// The pixel at column `x` of row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb8 {
        let offset = self.offset(x, y);
        Rgb8::from_bytes(&self.data[offset..offset + BYTES_PER_PIXEL])
    }

    /// Overwrites the pixel at column `x` of row `y`.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb8) {
        let offset = self.offset(x, y);
        self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color.to_bytes());
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) is outside a {}x{} image",
            x,
            y,
            self.width,
            self.height
        );
        y * self.stride + x * BYTES_PER_PIXEL
    }

    /// Splits the image into mirrored row pairs, one per computed row,
    /// in order of `y`.  The pairs borrow disjoint parts of the buffer
    /// and can be painted from different threads.
    pub fn mirrored_rows(&mut self) -> Vec<RowPair<'_>> {
        let height = self.height;
        let stride = self.stride;
        let pixels = self.width * BYTES_PER_PIXEL;
        let mut upper: Vec<&mut [u8]> = self
            .data
            .chunks_mut(stride)
            .take(height)
            .map(|row| &mut row[..pixels])
            .collect();
        let lower = upper.split_off(upper_rows(height));
        let mut lower = lower.into_iter().rev();
        upper
            .into_iter()
            .enumerate()
            .map(|(y, row)| RowPair {
                y,
                upper: row,
                lower: lower.next(),
            })
            .collect()
    }
}

/// Rows `0..upper_rows(height)` are computed; for an odd height this
/// includes the centerline.
pub fn upper_rows(height: usize) -> usize {
    height / 2 + height % 2
}

/// Row `y` of the upper half together with its mirror image, row
/// `height - 1 - y`.  The centerline of an odd-height image is its own
/// mirror and has no `lower` row.
pub struct RowPair<'a> {
    /// Index of the upper row.
    pub y: usize,
    upper: &'a mut [u8],
    lower: Option<&'a mut [u8]>,
}

impl<'a> RowPair<'a> {
    /// Writes `color` to column `x` of both rows.
    #[inline]
    pub fn put(&mut self, x: usize, color: Rgb8) {
        let bytes = color.to_bytes();
        let at = x * BYTES_PER_PIXEL;
        self.upper[at..at + BYTES_PER_PIXEL].copy_from_slice(&bytes);
        if let Some(lower) = self.lower.as_mut() {
            lower[at..at + BYTES_PER_PIXEL].copy_from_slice(&bytes);
        }
    }

    /// True for the centerline of an odd-height image.
    pub fn is_centerline(&self) -> bool {
        self.lower.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_geometry() {
        let mut data = vec![0u8; 100];
        assert_eq!(
            FrameBuffer::new(&mut data, 0, 4, 12).unwrap_err(),
            RenderError::EmptyImage {
                width: 0,
                height: 4
            }
        );
        assert_eq!(
            FrameBuffer::new(&mut data, 4, 4, 11).unwrap_err(),
            RenderError::StrideTooSmall { stride: 11, min: 12 }
        );
        assert_eq!(
            FrameBuffer::new(&mut data, 4, 9, 12).unwrap_err(),
            RenderError::BufferTooSmall { len: 100, min: 108 }
        );
        assert!(FrameBuffer::new(&mut data, 4, 8, 12).is_ok());
    }

    #[test]
    fn rejects_geometry_that_overflows() {
        let mut data = [0u8; 4];
        let width = usize::max_value() / 3 + 1;
        assert_eq!(
            FrameBuffer::new(&mut data, width, 1, 2).unwrap_err(),
            RenderError::GeometryOverflow {
                width,
                height: 1,
                stride: 2
            }
        );
        let height = usize::max_value() / 2;
        assert_eq!(
            FrameBuffer::new(&mut data, 1, height, 3).unwrap_err(),
            RenderError::GeometryOverflow {
                width: 1,
                height,
                stride: 3
            }
        );
    }

    #[test]
    fn even_height_pairs_rows_from_the_outside_in() {
        let mut data = vec![0u8; 4 * 6];
        {
            let mut fb = FrameBuffer::new(&mut data, 2, 4, 6).unwrap();
            let mut pairs = fb.mirrored_rows();
            assert_eq!(pairs.len(), 2);
            for pair in pairs.iter_mut() {
                let y = pair.y as u8 + 1;
                pair.put(1, Rgb8::new(y, y, y));
            }
        }
        let fb = FrameBuffer::new(&mut data, 2, 4, 6).unwrap();
        assert_eq!(fb.pixel(1, 0), Rgb8::new(1, 1, 1));
        assert_eq!(fb.pixel(1, 3), Rgb8::new(1, 1, 1));
        assert_eq!(fb.pixel(1, 1), Rgb8::new(2, 2, 2));
        assert_eq!(fb.pixel(1, 2), Rgb8::new(2, 2, 2));
        assert_eq!(fb.pixel(0, 0), Rgb8::new(0, 0, 0));
    }

    #[test]
    fn odd_height_centerline_mirrors_onto_itself() {
        let mut data = vec![0u8; 5 * 3];
        let mut fb = FrameBuffer::new(&mut data, 1, 5, 3).unwrap();
        let pairs = fb.mirrored_rows();
        assert_eq!(pairs.len(), 3);
        assert!(!pairs[1].is_centerline());
        assert!(pairs[2].is_centerline());
    }

    #[test]
    fn single_row_image_is_all_centerline() {
        let mut data = vec![0u8; 9];
        let mut fb = FrameBuffer::new(&mut data, 3, 1, 9).unwrap();
        let mut pairs = fb.mirrored_rows();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].is_centerline());
        pairs[0].put(2, Rgb8::new(7, 8, 9));
        drop(pairs);
        assert_eq!(fb.pixel(2, 0), Rgb8::new(7, 8, 9));
    }

    #[test]
    fn stride_padding_is_left_alone() {
        let mut data = vec![0xAAu8; 2 * 8];
        {
            let mut fb = FrameBuffer::new(&mut data, 2, 2, 8).unwrap();
            for mut pair in fb.mirrored_rows() {
                pair.put(0, Rgb8::new(1, 2, 3));
                pair.put(1, Rgb8::new(4, 5, 6));
            }
        }
        assert_eq!(&data[..8], &[1, 2, 3, 4, 5, 6, 0xAA, 0xAA]);
        assert_eq!(&data[8..], &[1, 2, 3, 4, 5, 6, 0xAA, 0xAA]);
    }

    #[test]
    fn set_pixel_respects_stride() {
        let mut data = vec![0u8; 3 * 10];
        let mut fb = FrameBuffer::new(&mut data, 3, 3, 10).unwrap();
        fb.set_pixel(2, 1, Rgb8::new(9, 9, 9));
        assert_eq!(fb.pixel(2, 1), Rgb8::new(9, 9, 9));
        drop(fb);
        assert_eq!(&data[16..19], &[9, 9, 9]);
    }
}
