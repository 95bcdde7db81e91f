//! # framematch
//!
//! Image matchers for screenshot tests: compare an image captured at runtime
//! (typically an emulator frame) against a reference PNG stored next to the
//! test, either exactly or "similar enough".
//!
//! A comparison decodes both images, requires them to have the same
//! dimensions, counts differing pixels with a [`DifferenceEngine`] and turns
//! the count into a similarity percentage:
//!
//! ```text
//! similarity = (1 - differing / (width * height)) * 100
//! ```
//!
//! ## Matchers
//!
//! | Name                   | Passes when        |
//! |------------------------|--------------------|
//! | `toBeSimilarToImage`   | similarity >= 80%  |
//! | `toBeIdenticalToImage` | similarity == 100% |
//!
//! ## Example
//!
//! ```rust
//! use framematch::{ImageComparator, RasterImage, RGBA8};
//!
//! let frame = vec![RGBA8::new(0, 0, 0, 255); 256 * 240];
//! let actual = RasterImage::from_pixels(frame.clone(), 256, 240)?;
//! let expected = RasterImage::from_pixels(frame, 256, 240)?;
//!
//! let result = ImageComparator::new().compare_images(&actual, &expected)?;
//! assert_eq!(result.similarity_percent, 100.0);
//! # Ok::<(), framematch::CompareError>(())
//! ```
//!
//! In tests, the assertion macros resolve relative fixture paths against the
//! directory of the test source file:
//!
//! ```rust,no_run
//! # let screenshot = std::path::PathBuf::from("/tmp/intro.png");
//! framematch::assert_similar_to_image!(&screenshot, "fixtures/intro.png");
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;

pub mod assertions;
pub mod compare;
pub mod consts;
pub mod diff;
pub mod location;
pub mod matcher;
pub mod raster;
pub mod registry;

pub use compare::{similarity_percent, ComparisonResult, ImageComparator};
pub use diff::{DifferenceEngine, ExactMatch, PixelMatch};
pub use location::source_dir;
pub use matcher::{resolve_reference, ImageMatcher, Matcher, MatcherOutcome, Predicate};
pub use raster::RasterImage;
pub use registry::{install_image_matchers, install_image_matchers_with, MatcherRegistry};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::RGBA8;

/// Error type for image comparisons.
///
/// None of these are assertion failures: a failed match is reported as a
/// [`MatcherOutcome`] with `pass == false`. An error means the comparison
/// itself could not be carried out.
#[derive(Debug)]
#[non_exhaustive]
pub enum CompareError {
    /// The image file is missing or could not be decoded.
    Decode {
        /// Path that was being decoded.
        path: PathBuf,
        /// Decoder error.
        source: image::ImageError,
    },
    /// The two images don't have the same dimensions.
    DimensionMismatch {
        /// Actual image width.
        w1: usize,
        /// Actual image height.
        h1: usize,
        /// Expected image width.
        w2: usize,
        /// Expected image height.
        h2: usize,
    },
    /// An image has a zero dimension.
    EmptyImage {
        /// Width provided.
        width: usize,
        /// Height provided.
        height: usize,
    },
    /// Buffer size doesn't match `width * height * 4`.
    InvalidBufferSize {
        /// Expected buffer size in bytes.
        expected: usize,
        /// Actual buffer size in bytes.
        actual: usize,
    },
    /// No matcher with this name is registered.
    UnknownMatcher {
        /// Requested matcher name.
        name: String,
    },
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode { path, source } => {
                write!(f, "failed to load '{}': {source}", path.display())
            }
            Self::DimensionMismatch { w1, h1, w2, h2 } => {
                write!(
                    f,
                    "image sizes did not match ({w1}x{h1} vs {w2}x{h2}), cannot compare; \
                     images should be {}x{} PNGs",
                    consts::FRAME_WIDTH,
                    consts::FRAME_HEIGHT
                )
            }
            Self::EmptyImage { width, height } => {
                write!(f, "image has no pixels: {width}x{height}")
            }
            Self::InvalidBufferSize { expected, actual } => {
                write!(
                    f,
                    "buffer size {actual} doesn't match expected size {expected}"
                )
            }
            Self::UnknownMatcher { name } => write!(f, "no matcher named '{name}' is registered"),
        }
    }
}

impl std::error::Error for CompareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Matcher parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use framematch::MatchParams;
///
/// let params = MatchParams::new()
///     .with_threshold(0.05)       // stricter per-pixel color tolerance
///     .with_include_aa(true)      // count anti-aliased pixels too
///     .with_similar_percent(95.0); // raise the bar for "similar"
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams {
    threshold: f64,
    include_aa: bool,
    similar_percent: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            threshold: consts::DEFAULT_THRESHOLD,
            include_aa: false,
            similar_percent: consts::SIMILAR_PERCENT,
        }
    }
}

impl MatchParams {
    /// Creates a new `MatchParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-pixel color threshold of the difference engine, clamped
    /// to 0.0-1.0. NaN keeps the default.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = diff::clamp_threshold(threshold);
        self
    }

    /// Sets whether anti-aliased pixels count as different.
    #[must_use]
    pub fn with_include_aa(mut self, include_aa: bool) -> Self {
        self.include_aa = include_aa;
        self
    }

    /// Sets the minimum similarity for `toBeSimilarToImage`, clamped to 0-100.
    /// NaN keeps the default of 80.
    #[must_use]
    pub fn with_similar_percent(mut self, similar_percent: f64) -> Self {
        self.similar_percent = if similar_percent.is_nan() {
            consts::SIMILAR_PERCENT
        } else {
            similar_percent.clamp(0.0, 100.0)
        };
        self
    }

    /// Returns the per-pixel color threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns whether anti-aliased pixels count as different.
    #[must_use]
    pub fn include_aa(&self) -> bool {
        self.include_aa
    }

    /// Returns the minimum similarity for `toBeSimilarToImage`.
    #[must_use]
    pub fn similar_percent(&self) -> f64 {
        self.similar_percent
    }

    /// Builds the difference engine these parameters describe.
    #[must_use]
    pub fn engine(&self) -> PixelMatch {
        PixelMatch::new()
            .with_threshold(self.threshold)
            .with_include_aa(self.include_aa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = CompareError::DimensionMismatch {
            w1: 256,
            h1: 240,
            w2: 128,
            h2: 120,
        };
        let msg = err.to_string();
        assert!(msg.contains("did not match"), "{msg}");
        assert!(msg.contains("256x240 vs 128x120"), "{msg}");
        assert!(msg.contains("cannot compare"), "{msg}");
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let err = RasterImage::open("/nonexistent/framematch/frame.png").unwrap_err();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("frame.png"));
    }

    #[test]
    fn test_params_defaults() {
        let params = MatchParams::default();
        assert_eq!(params.threshold(), 0.1);
        assert!(!params.include_aa());
        assert_eq!(params.similar_percent(), 80.0);
        assert_eq!(params.engine(), PixelMatch::new());
    }

    #[test]
    fn test_params_builder() {
        let params = MatchParams::new()
            .with_threshold(0.2)
            .with_include_aa(true)
            .with_similar_percent(150.0);
        assert_eq!(params.similar_percent(), 100.0);
        let engine = params.engine();
        assert_eq!(engine.threshold(), 0.2);
        assert!(engine.include_aa());
    }

    #[test]
    fn test_params_threshold_matches_engine() {
        let params = MatchParams::new().with_threshold(7.0);
        assert_eq!(params.threshold(), 1.0);
        assert_eq!(params.engine().threshold(), params.threshold());

        let params = MatchParams::new().with_threshold(-0.5);
        assert_eq!(params.threshold(), 0.0);
    }

    #[test]
    fn test_params_nan_keeps_defaults() {
        let params = MatchParams::new()
            .with_threshold(f64::NAN)
            .with_similar_percent(f64::NAN);
        assert_eq!(params, MatchParams::default());

        let frame = RasterImage::from_pixels(vec![RGBA8::new(0, 0, 0, 255); 64], 8, 8).unwrap();
        let white = RasterImage::from_pixels(vec![RGBA8::new(255, 255, 255, 255); 64], 8, 8).unwrap();
        let result = ImageComparator::with_engine(params.engine())
            .compare_images(&frame, &white)
            .unwrap();
        assert_eq!(result.similarity_percent, 0.0);
        assert!(!ImageMatcher::with_params(Predicate::IdenticalTo, &params)
            .judge(result.similarity_percent)
            .pass);
        assert!(!ImageMatcher::with_params(Predicate::SimilarTo, &params)
            .judge(result.similarity_percent)
            .pass);
        assert!(ImageMatcher::with_params(Predicate::SimilarTo, &params)
            .judge(80.0)
            .pass);
    }
}
