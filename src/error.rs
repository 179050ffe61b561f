// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Geometry errors.  These are the only failures the renderer knows
//! about; everything after validation is infallible.

use thiserror::Error;

/// Malformed render geometry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Width or height is zero.
    #[error("image must be at least 1x1 pixels, got {width}x{height}")]
    EmptyImage {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },
    /// A row of the buffer cannot hold `width` packed pixels.
    #[error("stride of {stride} bytes cannot hold a row of {min} bytes")]
    StrideTooSmall {
        /// Requested stride
        stride: usize,
        /// Bytes needed for one row of pixels
        min: usize,
    },
    /// The buffer is shorter than `height * stride`.
    #[error("buffer of {len} bytes is smaller than the {min} bytes required")]
    BufferTooSmall {
        /// Length of the supplied buffer
        len: usize,
        /// `height * stride`
        min: usize,
    },
    /// The byte or pixel counts implied by the geometry do not fit in
    /// a `usize`.
    #[error("{width}x{height} image with a stride of {stride} bytes is too large to address")]
    GeometryOverflow {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Requested stride, in bytes
        stride: usize,
    },
    /// The iteration budget is zero.
    #[error("iteration budget must be at least 1")]
    ZeroIterations,
    /// The framebuffer and the renderer disagree about the image size.
    #[error("renderer is {expected:?} but framebuffer is {actual:?}")]
    SizeMismatch {
        /// The renderer's (width, height)
        expected: (usize, usize),
        /// The framebuffer's (width, height)
        actual: (usize, usize),
    },
}
