//! Deterministic frame generators for framematch tests.
//!
//! Frames are RGBA8 and use an LCG PRNG so that every platform sees the
//! same pixels.

use framematch::{RasterImage, RGBA8};

/// Conventional emulator frame width.
pub const FRAME_WIDTH: usize = 256;
/// Conventional emulator frame height.
pub const FRAME_HEIGHT: usize = 240;

pub const BLACK: RGBA8 = RGBA8::new(0, 0, 0, 255);
pub const WHITE: RGBA8 = RGBA8::new(255, 255, 255, 255);
pub const SKY: RGBA8 = RGBA8::new(92, 148, 252, 255);

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

// ============================================================================
// Frame Generation Functions
// ============================================================================

/// Generate a single-color frame.
pub fn gen_solid(width: usize, height: usize, color: RGBA8) -> RasterImage {
    RasterImage::from_pixels(vec![color; width * height], width, height).expect("valid frame")
}

/// Generate an opaque frame of random colors.
pub fn gen_noise(width: usize, height: usize, seed: u64) -> RasterImage {
    let mut rng = Lcg::new(seed);
    let pixels = (0..width * height)
        .map(|_| RGBA8::new(rng.next_u8(), rng.next_u8(), rng.next_u8(), 255))
        .collect();
    RasterImage::from_pixels(pixels, width, height).expect("valid frame")
}

/// Generate a frame of `background` whose top `rows` rows are `band`, plus
/// `extra` further pixels of `band` at the start of the next row.
///
/// Whole-row bands keep every changed pixel inside a flat region, so none of
/// them is mistaken for anti-aliasing.
pub fn gen_banded(
    width: usize,
    height: usize,
    background: RGBA8,
    band: RGBA8,
    rows: usize,
    extra: usize,
) -> RasterImage {
    let changed = rows * width + extra;
    let pixels = (0..width * height)
        .map(|i| if i < changed { band } else { background })
        .collect();
    RasterImage::from_pixels(pixels, width, height).expect("valid frame")
}
