//! Constants for the pixel-difference engine and the matcher thresholds.

// ============================================================================
// YIQ Color Space Constants
// ============================================================================

/// RGB to Y (luma) weights.
pub const RGB_TO_Y: [f64; 3] = [0.29889531, 0.58662247, 0.11448223];

/// RGB to I (in-phase chroma) weights.
pub const RGB_TO_I: [f64; 3] = [0.59597799, -0.27417610, -0.32180189];

/// RGB to Q (quadrature chroma) weights.
pub const RGB_TO_Q: [f64; 3] = [0.21147017, -0.52261711, 0.31114694];

/// Weights of the squared Y, I and Q deltas in the perceptual color distance.
pub const YIQ_DELTA_WEIGHTS: [f64; 3] = [0.5053, 0.299, 0.1957];

/// Upper bound of the YIQ delta between any two colors.
///
/// The per-pixel threshold is scaled by this so that a threshold of 1.0
/// accepts every pair of colors.
pub const MAX_YIQ_DELTA: f64 = 35215.0;

// ============================================================================
// Engine Defaults
// ============================================================================

/// Default per-pixel matching threshold (0.0 = strict, 1.0 = anything goes).
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Opacity of the faded actual image drawn under the diff overlay.
pub const DIFF_BACKGROUND_ALPHA: f64 = 0.1;

/// Color of pixels that differ.
pub const DIFF_COLOR: [u8; 3] = [255, 0, 0];

/// Color of pixels that differ but were classified as anti-aliasing.
pub const AA_COLOR: [u8; 3] = [255, 255, 0];

// ============================================================================
// Matcher Thresholds
// ============================================================================

/// Minimum similarity for `toBeSimilarToImage` to pass.
pub const SIMILAR_PERCENT: f64 = 80.0;

/// Similarity required for `toBeIdenticalToImage` to pass.
pub const IDENTICAL_PERCENT: f64 = 100.0;

/// Conventional fixture size: the emulator frame buffer.
pub const FRAME_WIDTH: usize = 256;
/// Conventional fixture size: the emulator frame buffer.
pub const FRAME_HEIGHT: usize = 240;
