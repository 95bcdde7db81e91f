//! Decoded RGBA raster images.
//!
//! A [`RasterImage`] is immutable once constructed and always holds exactly
//! `width * height` pixels, row-major, with no padding.

use std::path::Path;

use imgref::{ImgRef, ImgVec};
use rgb::{ComponentBytes, FromSlice, RGBA8};

use crate::CompareError;

/// An RGBA8 image with non-zero dimensions.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: ImgVec<RGBA8>,
}

impl RasterImage {
    /// Creates an image from RGBA pixels.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero or the pixel count
    /// doesn't match `width * height`.
    pub fn from_pixels(
        pixels: Vec<RGBA8>,
        width: usize,
        height: usize,
    ) -> Result<Self, CompareError> {
        if width == 0 || height == 0 {
            return Err(CompareError::EmptyImage { width, height });
        }
        let expected = width * height;
        if pixels.len() != expected {
            return Err(CompareError::InvalidBufferSize {
                expected: expected * 4,
                actual: pixels.len() * 4,
            });
        }
        Ok(Self {
            pixels: ImgVec::new(pixels, width, height),
        })
    }

    /// Creates an image from a raw RGBA byte buffer (`width * height * 4` bytes).
    ///
    /// # Errors
    /// Returns an error if either dimension is zero or the buffer length is wrong.
    pub fn from_rgba_bytes(bytes: &[u8], width: usize, height: usize) -> Result<Self, CompareError> {
        if width == 0 || height == 0 {
            return Err(CompareError::EmptyImage { width, height });
        }
        let expected = width * height * 4;
        if bytes.len() != expected {
            return Err(CompareError::InvalidBufferSize {
                expected,
                actual: bytes.len(),
            });
        }
        Self::from_pixels(bytes.as_rgba().to_vec(), width, height)
    }

    /// Converts a decoded image of any color type to RGBA8.
    ///
    /// # Errors
    /// Returns an error if the image has a zero dimension.
    pub fn from_dynamic(img: &image::DynamicImage) -> Result<Self, CompareError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba_bytes(rgba.as_raw(), width as usize, height as usize)
    }

    /// Decodes the image file at `path`.
    ///
    /// # Errors
    /// Returns [`CompareError::Decode`] if the file is missing or isn't a
    /// decodable image.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CompareError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| CompareError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_dynamic(&decoded)
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    /// Number of pixels.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Checks if two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }

    /// Borrowed view for the difference engines.
    #[inline]
    #[must_use]
    pub fn view(&self) -> ImgRef<'_, RGBA8> {
        self.pixels.as_ref()
    }

    /// Pixels in row-major order.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[RGBA8] {
        self.pixels.buf()
    }

    /// Raw RGBA bytes in row-major order.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.buf().as_bytes()
    }

    /// Gets a pixel.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> RGBA8 {
        self.pixels()[y * self.width() + x]
    }

    /// Converts into an `image` buffer, e.g. for saving.
    #[must_use]
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_raw(
            self.width() as u32,
            self.height() as u32,
            self.as_bytes().to_vec(),
        )
        .unwrap_or_else(|| unreachable!("pixel count validated on construction"))
    }
}
