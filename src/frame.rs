//! # Frame Color Extraction Module
//!
//! Reduces one raw camera preview frame to the average R/G/B brightness of a
//! square window at the center of the image, plus the red channel's standard
//! deviation (a texture measure: a fingertip over the lens is nearly
//! uniform).
//!
//! ## Frame Layout
//! ```text
//! [ Y plane: width * height bytes ][ chroma: (height / 2) rows of width bytes ]
//!                                    U0 V0 U1 V1 ...   (one pair per 2x2 block)
//! ```
//! Pixels whose chroma pair lies past the end of the buffer are approximated
//! from luma alone instead of being dropped.

use crate::timeseries::Sample;

/// Luma-only fallback scaling per channel
const FALLBACK_RED: f64 = 1.0;
const FALLBACK_GREEN: f64 = 0.7;
const FALLBACK_BLUE: f64 = 0.5;

/// One raw preview frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: usize,
    pub height: usize,
}

impl<'a> Frame<'a> {
    pub fn new(pixels: &'a [u8], width: usize, height: usize) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Bounds of the centered analysis window as `(x0, y0, side)`
    fn analysis_window(&self) -> (usize, usize, usize) {
        let side = self.width.min(self.height) / 4;
        let x0 = self.width / 2 - side / 2;
        let y0 = self.height / 2 - side / 2;
        (x0, y0, side)
    }

    /// Luma and, if present, centered chroma `(u, v)` for a pixel
    fn yuv_at(&self, x: usize, y: usize) -> Option<(u8, Option<(i32, i32)>)> {
        let luma = *self.pixels.get(y * self.width + x)?;
        let uv_index = self.width * self.height + (y / 2) * self.width + (x & !1);
        let chroma = match (self.pixels.get(uv_index), self.pixels.get(uv_index + 1)) {
            (Some(&u), Some(&v)) => Some((u as i32 - 128, v as i32 - 128)),
            _ => None,
        };
        Some((luma, chroma))
    }
}

/// Averages over the analysis window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub red_std_dev: f64,
}

impl FrameColor {
    pub fn into_sample(self, timestamp_ms: u64) -> Sample {
        Sample::new(timestamp_ms, self.red, self.green, self.blue)
    }
}

fn yuv_to_rgb(luma: f64, u: f64, v: f64) -> (f64, f64, f64) {
    let r = luma + 1.370705 * v;
    let g = luma - 0.337633 * u - 0.698001 * v;
    let b = luma + 1.732446 * u;
    (r.clamp(0.0, 255.0), g.clamp(0.0, 255.0), b.clamp(0.0, 255.0))
}

/// Extract window averages from `frame`.
///
/// Returns `None` if no pixel of the window is inside the buffer.
pub fn extract(frame: &Frame) -> Option<FrameColor> {
    let (x0, y0, side) = frame.analysis_window();

    let mut red_sum = 0.0;
    let mut green_sum = 0.0;
    let mut blue_sum = 0.0;
    let mut red_square_sum = 0.0;
    let mut count = 0usize;

    for y in y0..(y0 + side).min(frame.height) {
        for x in x0..(x0 + side).min(frame.width) {
            let Some((luma, chroma)) = frame.yuv_at(x, y) else {
                continue;
            };
            let luma = luma as f64;

            let (r, g, b) = match chroma {
                Some((u, v)) => yuv_to_rgb(luma, u as f64, v as f64),
                None => (
                    luma * FALLBACK_RED,
                    luma * FALLBACK_GREEN,
                    luma * FALLBACK_BLUE,
                ),
            };

            red_sum += r;
            green_sum += g;
            blue_sum += b;
            red_square_sum += r * r;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }

    let n = count as f64;
    let red = red_sum / n;
    let variance = red_square_sum / n - red * red;

    Some(FrameColor {
        red,
        green: green_sum / n,
        blue: blue_sum / n,
        red_std_dev: variance.max(0.0).sqrt(),
    })
}
