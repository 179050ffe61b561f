// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render pipeline.
//!
//! Every strategy runs the same four phases:
//!
//! 1. compute the escape count of every pixel in the upper half,
//! 2. histogram the escape counts,
//! 3. turn the histogram into cumulative hues,
//! 4. color every upper-half pixel and write it to both rows of its
//!    mirrored pair.
//!
//! Phases 1, 2 and 4 are independent per row and fan out over threads;
//! phase 3 is a prefix sum and always runs on the calling thread.  The
//! strategies differ only in which kernel phase 1 uses and in how many
//! threads the row phases get, so they produce identical images.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use tracing::debug;

use crate::color::{heat_lut, SENTINEL};
use crate::error::RenderError;
use crate::framebuffer::{upper_rows, FrameBuffer};
use crate::histogram::{AtomicHistogram, Hues};
use crate::planes::PlaneMapper;
use crate::{kernel, simd, workers};

/// Which escape-time kernel fills the iteration map.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kernel {
    /// One point per call.
    Scalar,
    /// Eight adjacent columns per call.
    Simd,
}

impl Kernel {
    fn fill_row(self, plane: &PlaneMapper, y: usize, row: &mut [u32], limit: u32) {
        match self {
            Kernel::Scalar => kernel::fill_row(plane, y, row, limit),
            Kernel::Simd => simd::fill_row(plane, y, row, limit),
        }
    }
}

/// How a render is executed.  A thread count of zero means one thread
/// per CPU.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Scalar kernel, everything on the calling thread.
    Sequential,
    /// Scalar kernel, rows spread over threads.
    RowParallel {
        /// Worker threads
        threads: usize,
    },
    /// Eight-lane kernel, rows spread over threads.
    Simd {
        /// Worker threads
        threads: usize,
    },
}

impl Strategy {
    /// The kernel used for phase 1.
    pub fn kernel(self) -> Kernel {
        match self {
            Strategy::Sequential | Strategy::RowParallel { .. } => Kernel::Scalar,
            Strategy::Simd { .. } => Kernel::Simd,
        }
    }

    /// The number of threads the row phases run on.
    pub fn threads(self) -> usize {
        match self {
            Strategy::Sequential => 1,
            Strategy::RowParallel { threads } | Strategy::Simd { threads } => {
                workers::thread_count(threads)
            }
        }
    }

    /// The same kind of strategy with a different thread count.  The
    /// sequential strategy ignores it.
    pub fn with_threads(self, threads: usize) -> Self {
        match self {
            Strategy::Sequential => Strategy::Sequential,
            Strategy::RowParallel { .. } => Strategy::RowParallel { threads },
            Strategy::Simd { .. } => Strategy::Simd { threads },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::RowParallel { .. } => write!(f, "parallel"),
            Strategy::Simd { .. } => write!(f, "simd"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    /// Parses a strategy name; parallel strategies start out with one
    /// thread per CPU.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" | "seq" => Ok(Strategy::Sequential),
            "parallel" | "mt" => Ok(Strategy::RowParallel { threads: 0 }),
            "simd" => Ok(Strategy::Simd { threads: 0 }),
            _ => Err(format!(
                "unknown strategy '{}', expected sequential, parallel or simd",
                s
            )),
        }
    }
}

/// Escape counts for the computed rows, row-major.  Only the upper
/// half of the image is ever stored; the lower half is never computed.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationMap {
    width: usize,
    counts: Vec<u32>,
}

impl IterationMap {
    /// `width * rows` has already been checked by `HeatmapRenderer::new`.
    fn new(width: usize, rows: usize) -> Self {
        IterationMap {
            width,
            counts: vec![0; width * rows],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of stored rows.
    pub fn rows(&self) -> usize {
        self.counts.len() / self.width
    }

    /// The escape count at column `x` of computed row `y`.
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts[y * self.width + x]
    }

    /// One computed row.
    pub fn row(&self, y: usize) -> &[u32] {
        &self.counts[y * self.width..(y + 1) * self.width]
    }

    /// All counts, row by row.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}

/// Renders the histogram-equalized heat map of the Mandelbrot set at a
/// fixed image size and iteration budget.  Once built, a renderer can
/// be used for any number of framebuffers of its size.
#[derive(Debug, Clone)]
pub struct HeatmapRenderer {
    plane: PlaneMapper,
    limit: u32,
}

impl HeatmapRenderer {
    /// Requires the width and height of the image and the number of
    /// iterations to run per point before declaring it a member of the
    /// set.
    pub fn new(width: usize, height: usize, limit: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }
        if limit == 0 {
            return Err(RenderError::ZeroIterations);
        }
        // The iteration map holds the upper rows; the framebuffer checks
        // its own byte counts.
        if width.checked_mul(upper_rows(height)).is_none() {
            return Err(RenderError::GeometryOverflow {
                width,
                height,
                stride: 0,
            });
        }
        Ok(HeatmapRenderer {
            plane: PlaneMapper::new(width, height),
            limit,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.plane.integral_plane.0
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.plane.integral_plane.1
    }

    /// The iteration budget.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The single-threaded render.
    pub fn render_single(&self, buffer: &mut FrameBuffer) -> Result<(), RenderError> {
        self.render_with(buffer, Strategy::Sequential)
    }

    /// The row-parallel render; `threads` of zero uses every CPU.
    pub fn render(&self, buffer: &mut FrameBuffer, threads: usize) -> Result<(), RenderError> {
        self.render_with(buffer, Strategy::RowParallel { threads })
    }

    /// The eight-lane render, rows spread over `threads`.
    pub fn render_simd(&self, buffer: &mut FrameBuffer, threads: usize) -> Result<(), RenderError> {
        self.render_with(buffer, Strategy::Simd { threads })
    }

    /// Runs the whole pipeline into `buffer` with the given strategy.
    /// The only failure is a framebuffer whose size does not match the
    /// renderer's; it is reported before anything is written.
    pub fn render_with(
        &self,
        buffer: &mut FrameBuffer,
        strategy: Strategy,
    ) -> Result<(), RenderError> {
        let actual = (buffer.width(), buffer.height());
        let expected = (self.width(), self.height());
        if actual != expected {
            return Err(RenderError::SizeMismatch { expected, actual });
        }

        let started = Instant::now();
        let threads = strategy.threads();
        let map = self.iteration_map(strategy);
        let hues = self.hues(&map, threads);
        self.paint(buffer, &map, &hues, threads);
        debug!(
            %strategy,
            threads,
            width = expected.0,
            height = expected.1,
            limit = self.limit,
            escaped = hues.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "render finished"
        );
        Ok(())
    }

    /// Phase 1: the escape counts of the upper half of the image.
    pub fn iteration_map(&self, strategy: Strategy) -> IterationMap {
        let started = Instant::now();
        let mut map = IterationMap::new(self.width(), upper_rows(self.height()));
        let width = map.width;
        let kernel = strategy.kernel();
        let plane = &self.plane;
        let limit = self.limit;
        workers::for_each(
            map.counts.chunks_mut(width).enumerate(),
            strategy.threads(),
            |(y, row)| kernel.fill_row(plane, y, row, limit),
        );
        debug!(
            ?kernel,
            rows = map.rows(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "iteration map computed"
        );
        map
    }

    /// Phases 2 and 3: histogram the computed rows, then accumulate.
    pub fn hues(&self, map: &IterationMap, threads: usize) -> Hues {
        let histogram = AtomicHistogram::new(self.limit);
        workers::for_each(map.counts.chunks(map.width), threads, |row| {
            histogram.record_row(row)
        });
        let hues = Hues::new(&histogram.into_histogram(), threads);
        debug!(escaped = hues.total(), "cumulative hues built");
        hues
    }

    /// Phase 4: color each computed pixel and write it to its row and
    /// the mirrored row.
    fn paint(&self, buffer: &mut FrameBuffer, map: &IterationMap, hues: &Hues, threads: usize) {
        workers::for_each(buffer.mirrored_rows(), threads, |mut pair| {
            for (x, &count) in map.row(pair.y).iter().enumerate() {
                let color = match hues.normalized(count) {
                    Some(hue) => heat_lut(hue),
                    None => SENTINEL,
                };
                pair.put(x, color);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb8;

    fn render(width: usize, height: usize, limit: u32, strategy: Strategy) -> Vec<u8> {
        let mut data = vec![0u8; width * height * 3];
        let renderer = HeatmapRenderer::new(width, height, limit).unwrap();
        let mut fb = FrameBuffer::new(&mut data, width, height, width * 3).unwrap();
        renderer.render_with(&mut fb, strategy).unwrap();
        data
    }

    #[test]
    fn rejects_empty_images_and_zero_budgets() {
        assert_eq!(
            HeatmapRenderer::new(0, 10, 10).unwrap_err(),
            RenderError::EmptyImage {
                width: 0,
                height: 10
            }
        );
        assert_eq!(
            HeatmapRenderer::new(10, 10, 0).unwrap_err(),
            RenderError::ZeroIterations
        );
    }

    #[test]
    fn rejects_iteration_maps_that_cannot_be_addressed() {
        let width = usize::max_value() / 2;
        assert_eq!(
            HeatmapRenderer::new(width, 6, 10).unwrap_err(),
            RenderError::GeometryOverflow {
                width,
                height: 6,
                stride: 0
            }
        );
        assert!(HeatmapRenderer::new(width, 1, 10).is_ok());
        assert_eq!(
            HeatmapRenderer::new(2, usize::max_value(), 10).unwrap_err(),
            RenderError::GeometryOverflow {
                width: 2,
                height: usize::max_value(),
                stride: 0
            }
        );
    }

    #[test]
    fn rejects_framebuffer_of_wrong_size() {
        let renderer = HeatmapRenderer::new(4, 4, 10).unwrap();
        let mut data = vec![0u8; 5 * 4 * 3];
        let mut fb = FrameBuffer::new(&mut data, 5, 4, 15).unwrap();
        assert_eq!(
            renderer.render_single(&mut fb).unwrap_err(),
            RenderError::SizeMismatch {
                expected: (4, 4),
                actual: (5, 4)
            }
        );
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn three_by_three_scenario() {
        let renderer = HeatmapRenderer::new(3, 3, 50).unwrap();
        let map = renderer.iteration_map(Strategy::Sequential);
        assert_eq!(map.rows(), 2);
        assert_eq!(map.get(1, 1), 50);
        assert!(map.get(0, 0) < 5);

        let mut data = render(3, 3, 50, Strategy::Sequential);
        let fb = FrameBuffer::new(&mut data, 3, 3, 9).unwrap();
        assert_eq!(fb.pixel(1, 1), SENTINEL);
        assert_ne!(fb.pixel(0, 0), SENTINEL);
        assert_eq!(fb.pixel(0, 0), fb.pixel(0, 2));
    }

    #[test]
    fn single_iteration_budget_uses_one_color() {
        let renderer = HeatmapRenderer::new(40, 30, 1).unwrap();
        let map = renderer.iteration_map(Strategy::Sequential);
        assert!(map.counts().iter().all(|&c| c <= 1));
        let hues = renderer.hues(&map, 1);
        let escaped = map.counts().iter().filter(|&&c| c == 0).count();
        assert_eq!(hues.total(), escaped);
        assert_eq!(hues.cumulative(), &[escaped]);

        let mut data = render(40, 30, 1, Strategy::Sequential);
        let fb = FrameBuffer::new(&mut data, 40, 30, 120).unwrap();
        let colors: Vec<Rgb8> = (0..30)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .map(|(x, y)| fb.pixel(x, y))
            .filter(|&c| c != SENTINEL)
            .collect();
        assert!(!colors.is_empty());
        assert!(colors.iter().all(|&c| c == Rgb8::new(255, 0, 0)));
    }

    #[test]
    fn strategies_produce_identical_images() {
        let sequential = render(67, 41, 120, Strategy::Sequential);
        assert_eq!(render(67, 41, 120, Strategy::RowParallel { threads: 4 }), sequential);
        assert_eq!(render(67, 41, 120, Strategy::Simd { threads: 1 }), sequential);
        assert_eq!(render(67, 41, 120, Strategy::Simd { threads: 3 }), sequential);
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("sequential".parse::<Strategy>(), Ok(Strategy::Sequential));
        assert_eq!("parallel".parse::<Strategy>(), Ok(Strategy::RowParallel { threads: 0 }));
        assert_eq!("simd".parse::<Strategy>(), Ok(Strategy::Simd { threads: 0 }));
        assert!("gpu".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Simd { threads: 0 }.with_threads(2).threads(), 2);
        assert_eq!(Strategy::Sequential.with_threads(8).threads(), 1);
    }
}
