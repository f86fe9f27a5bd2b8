//! edgeview-pipeline: Pure Sobel edge detection pipeline (sans-IO).
//!
//! Turns an RGBA pixel buffer into a binary edge map through:
//! luminance -> Sobel gradient magnitude -> normalization -> threshold.
//!
//! Around that core sit the pieces an interactive viewer needs: decoding
//! and fitting a source image to a working resolution ([`fit`]), a
//! viewer session that only recomputes when its inputs change
//! ([`viewer`]), a frame-rate meter ([`fps`]), and per-stage timing
//! ([`diagnostics`]).
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. File, browser, and worker
//! interaction lives in `edgeview-bench` and `edgeview-worker`.

pub mod detector;
pub mod diagnostics;
pub mod fit;
pub mod fps;
pub mod grayscale;
pub mod sobel;
pub mod threshold;
pub mod types;
pub mod viewer;

pub use detector::{EdgeDetector, detect};
pub use fit::{FitConfig, ResizeFilter};
pub use fps::{FpsClass, FpsMeter};
pub use types::{
    DetectError, Dimensions, EdgeMap, Parameters, ProcessResult, RgbaImage, ViewerConfig,
};
pub use viewer::Viewer;

/// Decode image bytes, fit them to the working resolution, and detect
/// edges.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration and
/// returns the working-resolution source frame together with its edge
/// map.
///
/// # Errors
///
/// Returns [`DetectError::InvalidConfig`] if the fit configuration is
/// invalid.
/// Returns [`DetectError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`DetectError::ImageDecode`] if the image format is unrecognized.
pub fn process(image_bytes: &[u8], config: &ViewerConfig) -> Result<ProcessResult, DetectError> {
    config.fit.validate()?;

    // 1. Decode.
    let decoded = grayscale::decode(image_bytes)?;

    // 2. Fit to working resolution.
    let (source, _) = fit::fit_image(&decoded, &config.fit);
    let dimensions = Dimensions::new(source.width(), source.height());

    // 3. Detect.
    let edges = EdgeDetector::new().detect_image(&source, &config.parameters)?;

    Ok(ProcessResult {
        source,
        edges,
        dimensions,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Create a PNG with a sharp black/white boundary for testing.
    ///
    /// The left half is black, the right half is white, producing a strong
    /// vertical edge.
    fn sharp_edge_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &ViewerConfig::default());
        assert!(matches!(result, Err(DetectError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &ViewerConfig::default());
        assert!(matches!(result, Err(DetectError::ImageDecode(_))));
    }

    #[test]
    fn process_invalid_fit_config() {
        let config = ViewerConfig {
            fit: FitConfig {
                max_width: 0,
                ..FitConfig::default()
            },
            ..ViewerConfig::default()
        };
        let result = process(&sharp_edge_png(10, 10), &config);
        assert!(matches!(result, Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn process_sharp_edge_finds_boundary() {
        let result = process(&sharp_edge_png(400, 300), &ViewerConfig::default()).unwrap();
        assert_eq!(result.dimensions, Dimensions::new(400, 300));
        assert_eq!(result.edges.dimensions(), result.dimensions);
        // The step sits between columns 199 and 200.
        for y in [1, 150, 298] {
            assert!(result.edges.is_edge(199, y), "expected edge at (199, {y})");
            assert!(result.edges.is_edge(200, y), "expected edge at (200, {y})");
            assert!(!result.edges.is_edge(50, y));
            assert!(!result.edges.is_edge(350, y));
        }
    }

    #[test]
    fn process_uniform_image_has_no_edges() {
        let img = image::RgbaImage::from_fn(20, 20, |_, _| image::Rgba([128, 128, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();

        let result = process(&buf, &ViewerConfig::default()).unwrap();
        assert_eq!(result.edges.edge_pixel_count(), 0);
    }

    #[test]
    fn process_small_image_is_fitted_up() {
        let result = process(&sharp_edge_png(40, 40), &ViewerConfig::default()).unwrap();
        assert_eq!(result.dimensions, Dimensions::new(320, 240));
        assert_eq!(result.source.dimensions(), (320, 240));
    }
}
