#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot heat-map renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane for
//! which `z = z * z + c`, starting at zero, never runs off to infinity.
//! Points outside the set do run away, and the number of steps they
//! take to leave the disk of radius 2 is their "escape time".
//!
//! Coloring by raw escape time leaves most of the image in one or two
//! colors, because most points escape almost at once.  Instead, each
//! escape time is ranked against all the others (histogram
//! equalization) and the rank picks a color on a blue-to-red heat
//! ramp, so every color gets roughly the same number of pixels.
//! Points in the set are black.
//!
//! The image always shows the whole set (real axis -2.5 to 1.0,
//! imaginary axis -1.0 to 1.0).  The set is symmetric about the real
//! axis, so only the upper half of the image is computed and the lower
//! half is a mirror copy.
//!
//! ```
//! let (width, height) = (64, 48);
//! let mut pixels = vec![0u8; width * height * 3];
//! heatbrot::render(&mut pixels, width, height, width * 3, 100);
//! ```

pub mod color;
pub mod error;
pub mod framebuffer;
pub mod histogram;
pub mod kernel;
pub mod planes;
pub mod renderer;
pub mod simd;
pub mod workers;

pub use color::{heat_lut, Rgb8, SENTINEL};
pub use error::RenderError;
pub use framebuffer::FrameBuffer;
pub use renderer::{HeatmapRenderer, IterationMap, Kernel, Strategy};

/// Renders into `buffer` on the calling thread.
///
/// `buffer` holds `height` rows starting `stride` bytes apart, each with
/// `width` packed RGB8 pixels.
///
/// # Panics
///
/// Malformed geometry is a caller bug: an empty image, a stride shorter
/// than a row, a buffer shorter than `height * stride`, or a zero
/// iteration budget all panic before anything is written.  Use
/// [`FrameBuffer::new`] and [`HeatmapRenderer::new`] to check the
/// geometry up front.
pub fn render(buffer: &mut [u8], width: usize, height: usize, stride: usize, n_iterations: u32) {
    render_strategy(buffer, width, height, stride, n_iterations, Strategy::Sequential)
}

/// Same as [`render`], with the rows spread over every CPU.
pub fn render_mt(buffer: &mut [u8], width: usize, height: usize, stride: usize, n_iterations: u32) {
    render_strategy(
        buffer,
        width,
        height,
        stride,
        n_iterations,
        Strategy::RowParallel { threads: 0 },
    )
}

/// Same as [`render`], with the eight-lane kernel and the rows spread
/// over every CPU.
pub fn render_simd(
    buffer: &mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    n_iterations: u32,
) {
    render_strategy(
        buffer,
        width,
        height,
        stride,
        n_iterations,
        Strategy::Simd { threads: 0 },
    )
}

fn render_strategy(
    buffer: &mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    n_iterations: u32,
    strategy: Strategy,
) {
    let outcome = FrameBuffer::new(buffer, width, height, stride).and_then(|mut fb| {
        HeatmapRenderer::new(width, height, n_iterations)?.render_with(&mut fb, strategy)
    });
    if let Err(e) = outcome {
        panic!("render contract violated: {}", e);
    }
}
