//! The image comparator: two images in, one similarity percentage out.

use std::path::Path;

use log::debug;

use crate::diff::{DifferenceEngine, PixelMatch};
use crate::raster::RasterImage;
use crate::CompareError;

/// Outcome of comparing two images of equal size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    /// Share of matching pixels, 0.0-100.0. 100 means no pixel differs.
    pub similarity_percent: f64,
    /// Pixels the engine reported as different.
    pub differing_pixels: usize,
    /// Pixels compared (`width * height`).
    pub total_pixels: usize,
    /// Width of both images.
    pub width: usize,
    /// Height of both images.
    pub height: usize,
}

impl ComparisonResult {
    /// True when no pixel differs.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.differing_pixels == 0
    }
}

/// Converts a differing-pixel count into a similarity percentage.
///
/// Equivalent to `(1 - differing / total) * 100`, evaluated so that whole
/// ratios (e.g. exactly 20% differing) come out exact.
#[must_use]
pub fn similarity_percent(differing: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let matching = total - differing.min(total);
    matching as f64 * 100.0 / total as f64
}

/// Compares images with a [`DifferenceEngine`].
#[derive(Debug, Clone, Default)]
pub struct ImageComparator<E = PixelMatch> {
    engine: E,
}

impl ImageComparator {
    /// Creates a comparator backed by [`PixelMatch`] with default settings.
    pub fn new() -> Self {
        Self {
            engine: PixelMatch::new(),
        }
    }
}

impl<E: DifferenceEngine> ImageComparator<E> {
    /// Creates a comparator backed by `engine`.
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// Returns the difference engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Decodes both files and returns their similarity percentage.
    ///
    /// # Errors
    /// Returns an error if either file can't be decoded or the image
    /// dimensions differ.
    pub fn compare(
        &self,
        actual: impl AsRef<Path>,
        expected: impl AsRef<Path>,
    ) -> Result<f64, CompareError> {
        self.compare_files(actual, expected)
            .map(|result| result.similarity_percent)
    }

    /// Decodes both files and returns the full comparison result.
    ///
    /// # Errors
    /// Returns an error if either file can't be decoded or the image
    /// dimensions differ.
    pub fn compare_files(
        &self,
        actual: impl AsRef<Path>,
        expected: impl AsRef<Path>,
    ) -> Result<ComparisonResult, CompareError> {
        let actual_img = RasterImage::open(actual.as_ref())?;
        let expected_img = RasterImage::open(expected.as_ref())?;
        self.compare_images(&actual_img, &expected_img)
    }

    /// Compares two decoded images.
    ///
    /// # Errors
    /// Returns [`CompareError::DimensionMismatch`] if the images differ in
    /// width or height. Nothing is resized or cropped.
    pub fn compare_images(
        &self,
        actual: &RasterImage,
        expected: &RasterImage,
    ) -> Result<ComparisonResult, CompareError> {
        check_dimensions(actual, expected)?;
        let differing = self
            .engine
            .count_differences(actual.view(), expected.view());
        Ok(self.finish(actual, differing))
    }

    /// Like [`compare_images`](Self::compare_images), also rendering a diff
    /// image that highlights differing pixels.
    ///
    /// # Errors
    /// Returns [`CompareError::DimensionMismatch`] if the images differ in
    /// width or height.
    pub fn diff_images(
        &self,
        actual: &RasterImage,
        expected: &RasterImage,
    ) -> Result<(ComparisonResult, RasterImage), CompareError> {
        check_dimensions(actual, expected)?;
        let (differing, diff) = self.engine.diff_image(actual.view(), expected.view());
        let (width, height) = (diff.width(), diff.height());
        let diff = RasterImage::from_pixels(diff.into_buf(), width, height)?;
        Ok((self.finish(actual, differing), diff))
    }

    fn finish(&self, actual: &RasterImage, differing: usize) -> ComparisonResult {
        let total = actual.pixel_count();
        let result = ComparisonResult {
            similarity_percent: similarity_percent(differing, total),
            differing_pixels: differing,
            total_pixels: total,
            width: actual.width(),
            height: actual.height(),
        };
        debug!(
            "compared {}x{} images: {} of {} pixels differ ({}% similar)",
            result.width,
            result.height,
            result.differing_pixels,
            result.total_pixels,
            result.similarity_percent
        );
        result
    }
}

fn check_dimensions(actual: &RasterImage, expected: &RasterImage) -> Result<(), CompareError> {
    if actual.same_size(expected) {
        Ok(())
    } else {
        Err(CompareError::DimensionMismatch {
            w1: actual.width(),
            h1: actual.height(),
            w2: expected.width(),
            h2: expected.height(),
        })
    }
}
