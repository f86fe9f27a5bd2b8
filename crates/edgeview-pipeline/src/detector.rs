//! Sobel edge detector: RGBA pixels in, binary edge map out.
//!
//! [`EdgeDetector`] runs the four detection steps in order:
//!
//! 1. Luminance extraction ([`grayscale::luminance_into`])
//! 2. Sobel gradient magnitude ([`sobel::magnitude_into`])
//! 3. Normalization so the strongest gradient maps to 255
//!    ([`threshold::normalization_scale`])
//! 4. Quantization and inclusive thresholding
//!    ([`threshold::binarize_into`])
//!
//! Detection is a pure function of the pixels, dimensions and
//! parameters. The detector only keeps its grayscale and magnitude
//! scratch buffers between calls so that per-frame detection does not
//! reallocate them. It never holds on to the caller's pixel buffer.
//!
//! A detector is not meant to be shared between concurrent callers;
//! give each thread or worker its own.

use crate::types::{DetectError, Dimensions, EdgeMap, Parameters};
use crate::{grayscale, sobel, threshold};

/// Reusable Sobel edge detector.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    gray: Vec<f32>,
    magnitude: Vec<f32>,
    dimensions: Option<Dimensions>,
}

impl EdgeDetector {
    /// Create a detector with empty scratch buffers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gray: Vec::new(),
            magnitude: Vec::new(),
            dimensions: None,
        }
    }

    /// Detect edges in an RGBA `pixels` buffer of `width * height` pixels.
    ///
    /// The threshold in `params` is clamped into `0..=255` before use.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidDimensions`] if `width` or `height`
    /// is zero; `pixels` is not read in that case.
    /// Returns [`DetectError::BufferSizeMismatch`] if `pixels.len()` is
    /// not `width * height * 4`.
    pub fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        params: &Parameters,
    ) -> Result<EdgeMap, DetectError> {
        let dimensions = validate(pixels, width, height)?;
        self.dimensions = None;

        grayscale::luminance_into(pixels, &mut self.gray);
        sobel::magnitude_into(&self.gray, dimensions, &mut self.magnitude);

        let scale = threshold::normalization_scale(&self.magnitude);
        let mut out = vec![0; pixels.len()];
        threshold::binarize_into(
            &self.magnitude,
            scale,
            params.effective_threshold(),
            &mut out,
        );
        self.dimensions = Some(dimensions);

        EdgeMap::from_raw(dimensions, out).ok_or(DetectError::BufferSizeMismatch {
            expected: dimensions.pixel_count().saturating_mul(4),
            actual: pixels.len(),
        })
    }

    /// Detect edges in an `RgbaImage`.
    ///
    /// # Errors
    ///
    /// Same as [`detect`](Self::detect).
    pub fn detect_image(
        &mut self,
        image: &image::RgbaImage,
        params: &Parameters,
    ) -> Result<EdgeMap, DetectError> {
        self.detect(image.as_raw(), image.width(), image.height(), params)
    }

    /// Luminance buffer from the last successful detection.
    #[must_use]
    pub fn grayscale(&self) -> Option<&[f32]> {
        self.dimensions.map(|_| self.gray.as_slice())
    }

    /// Raw (pre-normalization) gradient magnitudes from the last
    /// successful detection.
    #[must_use]
    pub fn magnitude(&self) -> Option<&[f32]> {
        self.dimensions.map(|_| self.magnitude.as_slice())
    }

    /// Largest raw gradient magnitude from the last successful detection.
    #[must_use]
    pub fn max_magnitude(&self) -> Option<f32> {
        self.magnitude().map(sobel::max_magnitude)
    }

    /// Dimensions of the last successful detection.
    #[must_use]
    pub const fn last_dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }
}

/// Detect edges with a fresh, one-shot detector.
///
/// Prefer keeping an [`EdgeDetector`] around when detecting every frame.
///
/// # Errors
///
/// Same as [`EdgeDetector::detect`].
pub fn detect(
    pixels: &[u8],
    width: u32,
    height: u32,
    params: &Parameters,
) -> Result<EdgeMap, DetectError> {
    EdgeDetector::new().detect(pixels, width, height, params)
}

/// Check the dimensions, then the buffer length.
///
/// The dimension check comes first and does not look at `pixels`.
pub(crate) fn validate(pixels: &[u8], width: u32, height: u32) -> Result<Dimensions, DetectError> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidDimensions { width, height });
    }

    let dimensions = Dimensions::new(width, height);
    let expected = dimensions.pixel_count().saturating_mul(4);
    if u64::try_from(pixels.len()).ok() != Some(expected) {
        return Err(DetectError::BufferSizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(dimensions)
}
