//! Sobel gradient magnitude.
//!
//! The 3x3 kernels are applied by correlation (no kernel flip):
//!
//! ```text
//!        [-1  0  1]          [-1 -2 -1]
//!   gx = [-2  0  2]     gy = [ 0  0  0]
//!        [-1  0  1]          [ 1  2  1]
//! ```
//!
//! Only interior pixels are visited. The one-pixel border is left at
//! zero rather than filled by clamping the kernel, so the neighbourhood
//! of every visited pixel is in bounds and border magnitudes are exactly
//! zero.

use crate::types::Dimensions;

/// Horizontal Sobel kernel, row-major.
pub const KERNEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];

/// Vertical Sobel kernel, row-major.
pub const KERNEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Horizontal and vertical gradient at one interior pixel.
///
/// `i` is the row-major index of the centre pixel and `w` the row
/// stride. The caller guarantees `1 <= x < w - 1` and `1 <= y < h - 1`.
#[inline]
fn gradient_at(gray: &[f32], i: usize, w: usize) -> (f32, f32) {
    let (above, row, below) = (i - w, i, i + w);
    let mut gx = 0.0;
    let mut gy = 0.0;
    for (k, base) in [above, row, below].into_iter().enumerate() {
        for (j, v) in gray[base - 1..=base + 1].iter().enumerate() {
            gx += KERNEL_X[k][j] * v;
            gy += KERNEL_Y[k][j] * v;
        }
    }
    (gx, gy)
}

/// Fill `magnitude` with `hypot(gx, gy)` for every interior pixel of
/// `gray`, and zero on the border.
///
/// `magnitude` is reset to `dimensions.pixel_count()` zeros first, so a
/// scratch buffer reused across frames never carries stale border
/// values.
///
/// `gray.len()` must equal the pixel count; the detector guarantees
/// this before calling.
pub fn magnitude_into(gray: &[f32], dimensions: Dimensions, magnitude: &mut Vec<f32>) {
    let w = dimensions.width as usize;
    let h = dimensions.height as usize;
    debug_assert_eq!(gray.len(), w * h, "grayscale buffer does not match dimensions");

    magnitude.clear();
    magnitude.resize(gray.len(), 0.0);
    if dimensions.has_no_interior() {
        return;
    }

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let i = y * w + x;
            let (gx, gy) = gradient_at(gray, i, w);
            magnitude[i] = gx.hypot(gy);
        }
    }
}

/// Largest value in a magnitude buffer, or `0.0` if it is empty.
#[must_use]
pub fn max_magnitude(magnitude: &[f32]) -> f32 {
    magnitude.iter().copied().fold(0.0, f32::max)
}
