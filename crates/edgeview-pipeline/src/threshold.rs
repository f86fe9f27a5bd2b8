//! Magnitude normalization and binary thresholding.
//!
//! Raw Sobel magnitudes are rescaled so the strongest gradient in the
//! frame maps to 255, quantized to an integer, then compared against the
//! user threshold. The comparison is inclusive: a normalized value equal
//! to the threshold is an edge.

use crate::sobel::max_magnitude;
use crate::types::EdgeMap;

/// Scale factor mapping the largest magnitude to 255.
///
/// Returns `1.0` when every magnitude is zero (uniform or degenerate
/// image), which leaves the all-zero buffer unchanged instead of
/// dividing by zero.
#[must_use]
pub fn normalization_scale(magnitude: &[f32]) -> f64 {
    let max = max_magnitude(magnitude);
    if max > 0.0 { 255.0 / f64::from(max) } else { 1.0 }
}

/// Normalize one magnitude: `min(255, round(magnitude * scale))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(magnitude: f32, scale: f64) -> u8 {
    // Magnitudes are non-negative and the result is clamped to 255.
    (f64::from(magnitude) * scale).round().min(255.0) as u8
}

/// Write the binary RGBA edge map for `magnitude` into `out`.
///
/// Each pixel's R, G and B are [`EdgeMap::EDGE`] when its normalized
/// value is at least `threshold` and [`EdgeMap::BACKGROUND`] otherwise.
/// Alpha is always 255.
///
/// `out` must hold exactly `magnitude.len() * 4` bytes.
pub fn binarize_into(magnitude: &[f32], scale: f64, threshold: u8, out: &mut [u8]) {
    debug_assert_eq!(out.len(), magnitude.len() * 4, "output buffer size mismatch");

    for (&m, px) in magnitude.iter().zip(out.chunks_exact_mut(4)) {
        let v = if quantize(m, scale) >= threshold {
            EdgeMap::EDGE
        } else {
            EdgeMap::BACKGROUND
        };
        px.copy_from_slice(&[v, v, v, 255]);
    }
}
