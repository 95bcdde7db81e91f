//! Pixel-difference engines.
//!
//! An engine counts how many pixels of two equally sized RGBA images are
//! "different". [`PixelMatch`] compares colors perceptually in YIQ space and
//! discounts anti-aliasing noise; [`ExactMatch`] compares raw bytes.

use imgref::{ImgRef, ImgVec};
use rgb::RGBA8;

use crate::consts::{
    AA_COLOR, DEFAULT_THRESHOLD, DIFF_BACKGROUND_ALPHA, DIFF_COLOR, MAX_YIQ_DELTA, RGB_TO_I,
    RGB_TO_Q, RGB_TO_Y, YIQ_DELTA_WEIGHTS,
};

/// Counts differing pixels between two images of equal dimensions.
///
/// Callers guarantee `a` and `b` have the same width and height; the
/// comparator checks this before any engine runs.
pub trait DifferenceEngine: Send + Sync {
    /// Number of pixels considered different.
    fn count_differences(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> usize;

    /// Number of differing pixels plus a visualization of where they are.
    fn diff_image(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> (usize, ImgVec<RGBA8>);
}

impl<E: DifferenceEngine + ?Sized> DifferenceEngine for Box<E> {
    fn count_differences(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> usize {
        (**self).count_differences(a, b)
    }

    fn diff_image(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> (usize, ImgVec<RGBA8>) {
        (**self).diff_image(a, b)
    }
}

/// Clamps a per-pixel threshold to `0.0..=1.0`, mapping NaN to the default.
pub(crate) fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        DEFAULT_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// Anti-aliasing aware perceptual pixel matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMatch {
    threshold: f64,
    include_aa: bool,
}

impl Default for PixelMatch {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            include_aa: false,
        }
    }
}

impl PixelMatch {
    /// Creates a matcher with the default threshold (0.1), ignoring anti-aliasing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-pixel threshold, clamped to `0.0..=1.0`.
    /// Smaller values make the comparison more sensitive. NaN keeps the
    /// default threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = clamp_threshold(threshold);
        self
    }

    /// Counts anti-aliased pixels as differences when `true`.
    #[must_use]
    pub fn with_include_aa(mut self, include_aa: bool) -> Self {
        self.include_aa = include_aa;
        self
    }

    /// Returns the per-pixel threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns whether anti-aliased pixels are counted.
    #[must_use]
    pub fn include_aa(&self) -> bool {
        self.include_aa
    }

    fn run(
        &self,
        a: ImgRef<'_, RGBA8>,
        b: ImgRef<'_, RGBA8>,
        mut output: Option<&mut [RGBA8]>,
    ) -> usize {
        debug_assert_eq!((a.width(), a.height()), (b.width(), b.height()));
        let (width, height) = (a.width(), a.height());

        if a.rows().eq(b.rows()) {
            if let Some(out) = output {
                for y in 0..height {
                    for x in 0..width {
                        out[y * width + x] = gray_pixel(pixel(a, x, y));
                    }
                }
            }
            return 0;
        }

        let max_delta = MAX_YIQ_DELTA * self.threshold * self.threshold;
        let mut diff = 0;

        for y in 0..height {
            for x in 0..width {
                let delta = color_delta(pixel(a, x, y), pixel(b, x, y), false);
                let marker = if delta.abs() > max_delta {
                    if !self.include_aa && (antialiased(a, b, x, y) || antialiased(b, a, x, y)) {
                        opaque(AA_COLOR)
                    } else {
                        diff += 1;
                        opaque(DIFF_COLOR)
                    }
                } else {
                    gray_pixel(pixel(a, x, y))
                };
                if let Some(out) = output.as_deref_mut() {
                    out[y * width + x] = marker;
                }
            }
        }

        diff
    }
}

impl DifferenceEngine for PixelMatch {
    fn count_differences(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> usize {
        self.run(a, b, None)
    }

    fn diff_image(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> (usize, ImgVec<RGBA8>) {
        let mut out = vec![RGBA8::default(); a.width() * a.height()];
        let diff = self.run(a, b, Some(&mut out));
        (diff, ImgVec::new(out, a.width(), a.height()))
    }
}

/// Strict engine: any byte difference makes a pixel different.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactMatch;

impl DifferenceEngine for ExactMatch {
    fn count_differences(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> usize {
        a.rows()
            .zip(b.rows())
            .map(|(ra, rb)| ra.iter().zip(rb).filter(|(pa, pb)| pa != pb).count())
            .sum()
    }

    fn diff_image(&self, a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> (usize, ImgVec<RGBA8>) {
        let mut diff = 0;
        let mut out = Vec::with_capacity(a.width() * a.height());
        for (ra, rb) in a.rows().zip(b.rows()) {
            for (pa, pb) in ra.iter().zip(rb) {
                if pa == pb {
                    out.push(gray_pixel(*pa));
                } else {
                    diff += 1;
                    out.push(opaque(DIFF_COLOR));
                }
            }
        }
        (diff, ImgVec::new(out, a.width(), a.height()))
    }
}

#[inline]
fn pixel(img: ImgRef<'_, RGBA8>, x: usize, y: usize) -> RGBA8 {
    img.buf()[y * img.stride() + x]
}

#[inline]
fn opaque([r, g, b]: [u8; 3]) -> RGBA8 {
    RGBA8::new(r, g, b, 255)
}

#[inline]
fn rgb_to_y(r: f64, g: f64, b: f64) -> f64 {
    r * RGB_TO_Y[0] + g * RGB_TO_Y[1] + b * RGB_TO_Y[2]
}

#[inline]
fn rgb_to_i(r: f64, g: f64, b: f64) -> f64 {
    r * RGB_TO_I[0] + g * RGB_TO_I[1] + b * RGB_TO_I[2]
}

#[inline]
fn rgb_to_q(r: f64, g: f64, b: f64) -> f64 {
    r * RGB_TO_Q[0] + g * RGB_TO_Q[1] + b * RGB_TO_Q[2]
}

/// Blends a channel value onto a white background.
#[inline]
fn blend(c: f64, alpha: f64) -> f64 {
    255.0 + (c - 255.0) * alpha
}

/// Channels as f64, composited onto white when not fully opaque.
#[inline]
fn composited(p: RGBA8) -> (f64, f64, f64) {
    let (r, g, b) = (f64::from(p.r), f64::from(p.g), f64::from(p.b));
    if p.a < 255 {
        let alpha = f64::from(p.a) / 255.0;
        (blend(r, alpha), blend(g, alpha), blend(b, alpha))
    } else {
        (r, g, b)
    }
}

/// Squared YIQ distance between two pixels.
///
/// The sign tells which pixel is brighter: negative when `p1` is lighter.
/// With `y_only` only the signed brightness difference is returned.
fn color_delta(p1: RGBA8, p2: RGBA8, y_only: bool) -> f64 {
    if p1 == p2 {
        return 0.0;
    }

    let (r1, g1, b1) = composited(p1);
    let (r2, g2, b2) = composited(p2);

    let y1 = rgb_to_y(r1, g1, b1);
    let y2 = rgb_to_y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb_to_i(r1, g1, b1) - rgb_to_i(r2, g2, b2);
    let q = rgb_to_q(r1, g1, b1) - rgb_to_q(r2, g2, b2);

    let delta = YIQ_DELTA_WEIGHTS[0] * y * y
        + YIQ_DELTA_WEIGHTS[1] * i * i
        + YIQ_DELTA_WEIGHTS[2] * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

/// 3x3 neighbourhood of `(x, y)`, clamped to the image.
#[inline]
fn neighbourhood(width: usize, height: usize, x: usize, y: usize) -> (usize, usize, usize, usize) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

/// Checks whether the pixel at `(x1, y1)` of `img` looks like anti-aliasing.
///
/// A pixel is anti-aliased when it sits between a darker and a brighter
/// neighbour and one of those extremes is part of a flat region in both
/// images.
fn antialiased(img: ImgRef<'_, RGBA8>, other: ImgRef<'_, RGBA8>, x1: usize, y1: usize) -> bool {
    let (width, height) = (img.width(), img.height());
    let (x0, y0, x2, y2) = neighbourhood(width, height, x1, y1);
    let center = pixel(img, x1, y1);

    let on_edge = x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2;
    let mut zeroes = usize::from(on_edge);

    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (0, 0);
    let mut max_at = (0, 0);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }

            let delta = color_delta(center, pixel(img, x, y), true);
            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = (x, y);
            } else if delta > max {
                max = delta;
                max_at = (x, y);
            }
        }
    }

    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at.0, min_at.1) && has_many_siblings(other, min_at.0, min_at.1))
        || (has_many_siblings(img, max_at.0, max_at.1)
            && has_many_siblings(other, max_at.0, max_at.1))
}

/// Checks whether at least three neighbours of `(x1, y1)` share its exact color.
fn has_many_siblings(img: ImgRef<'_, RGBA8>, x1: usize, y1: usize) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(img.width(), img.height(), x1, y1);
    let center = pixel(img, x1, y1);

    let on_edge = x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2;
    let mut zeroes = usize::from(on_edge);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }
            if pixel(img, x, y) == center {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}

/// Faded grayscale of a pixel, used as the diff image background.
fn gray_pixel(p: RGBA8) -> RGBA8 {
    let luma = rgb_to_y(f64::from(p.r), f64::from(p.g), f64::from(p.b));
    let val = blend(luma, DIFF_BACKGROUND_ALPHA * f64::from(p.a) / 255.0);
    let val = val.round().clamp(0.0, 255.0) as u8;
    RGBA8::new(val, val, val, 255)
}
