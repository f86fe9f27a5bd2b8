//! Image decoding and luminance extraction.
//!
//! Decoding turns raw file bytes (PNG, JPEG, BMP, WebP) into a
//! [`DynamicImage`]. Luminance extraction turns an RGBA pixel buffer into
//! the floating-point grayscale buffer consumed by the Sobel stage.

use image::DynamicImage;

use crate::types::{DetectError, RgbaImage};

/// BT.601 red weight.
pub const LUMA_R: f64 = 0.299;
/// BT.601 green weight.
pub const LUMA_G: f64 = 0.587;
/// BT.601 blue weight.
pub const LUMA_B: f64 = 0.114;

/// Perceptual luminance of one RGB sample: `0.299*R + 0.587*G + 0.114*B`.
///
/// Not rounded to an integer. The sum is formed in `f64` and stored as
/// `f32`, the precision of the grayscale buffer.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::suboptimal_flops)]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (LUMA_R * f64::from(r) + LUMA_G * f64::from(g) + LUMA_B * f64::from(b)) as f32
}

/// Fill `gray` with the luminance of every RGBA pixel in `pixels`.
///
/// `gray` is cleared and refilled, so a buffer reused across frames of
/// different sizes always ends up with exactly `pixels.len() / 4`
/// entries. Alpha is ignored.
pub fn luminance_into(pixels: &[u8], gray: &mut Vec<f32>) {
    gray.clear();
    gray.extend(
        pixels
            .chunks_exact(4)
            .map(|px| luminance(px[0], px[1], px[2])),
    );
}

/// Decode raw image bytes.
///
/// Supports whatever the `image` crate is built with (PNG, JPEG, BMP,
/// WebP).
///
/// # Errors
///
/// Returns [`DetectError::EmptyInput`] if `bytes` is empty.
/// Returns [`DetectError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DetectError> {
    if bytes.is_empty() {
        return Err(DetectError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Convert a decoded image to 8-bit RGBA.
#[must_use]
pub fn to_rgba(image: &DynamicImage) -> RgbaImage {
    image.to_rgba8()
}
