// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The heat-map palette.

/// One packed 8-bit RGB pixel, in the byte order it has in the
/// framebuffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb8 {
    /// Constructor.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb8 { r, g, b }
    }

    /// The three bytes as they are laid out in memory.
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Reads a pixel back out of three packed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Rgb8::new(bytes[0], bytes[1], bytes[2])
    }
}

/// The color of every point that did not escape.  Pure black is not
/// on the heat ramp, so set members can never be confused with the
/// slowest- or fastest-escaping points.
pub const SENTINEL: Rgb8 = Rgb8::new(0, 0, 0);

const X0: f32 = 1.0 / 4.0;
const X1: f32 = 2.0 / 4.0;
const X2: f32 = 3.0 / 4.0;

/// Maps a normalized hue in `[0, 1]` onto a blue → cyan → green →
/// yellow → red ramp.  The ramp is linear between the quarter marks.
/// Both ends are inclusive: 0 is pure blue and 1 is pure red.
///
/// # Panics
///
/// A hue outside `[0, 1]` (or NaN) means the histogram bookkeeping is
/// wrong, and is treated as a bug rather than clamped.
pub fn heat_lut(x: f32) -> Rgb8 {
    assert!(
        (0.0..=1.0).contains(&x),
        "normalized hue {} is outside [0, 1]",
        x
    );

    if x < X0 {
        Rgb8::new(0, ramp(x / X0), 255)
    } else if x < X1 {
        Rgb8::new(0, 255, ramp((X1 - x) / X0))
    } else if x < X2 {
        Rgb8::new(ramp((x - X1) / X0), 255, 0)
    } else {
        Rgb8::new(255, ramp((1.0 - x) / X0), 0)
    }
}

#[inline]
fn ramp(t: f32) -> u8 {
    (t * 255.0) as u8
}
