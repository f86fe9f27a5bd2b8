//! Fit a decoded source image to the viewer's working resolution.
//!
//! Wide images are scaled down so the width is at most
//! [`FitConfig::max_width`]; the result is then padded up to at least
//! [`FitConfig::min_width`] x [`FitConfig::min_height`]. Both axes use
//! the same scale factor, but the minimums are applied per axis, so very
//! small or very thin images are stretched rather than letterboxed.
//!
//! ```text
//! scale  = min(1, max_width / natural_width)
//! width  = max(min_width,  round(natural_width  * scale))
//! height = max(min_height, round(natural_height * scale))
//! ```
//!
//! A zero natural width or height (an image that reported no size)
//! falls back to 640x480.

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::grayscale::to_rgba;
use crate::types::{DetectError, Dimensions, RgbaImage};

/// Resampling filter used when stretching to the working resolution.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality. Closest to what a
    /// browser canvas does when drawing a scaled image.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest/best for photos.
    Lanczos3,
}

impl ResizeFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Working-resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Widest working width; wider sources are scaled down.
    pub max_width: u32,
    /// Narrowest working width.
    pub min_width: u32,
    /// Shortest working height.
    pub min_height: u32,
    /// Resampling filter.
    pub filter: ResizeFilter,
}

impl FitConfig {
    /// Default [`max_width`](Self::max_width).
    pub const DEFAULT_MAX_WIDTH: u32 = 900;
    /// Default [`min_width`](Self::min_width).
    pub const DEFAULT_MIN_WIDTH: u32 = 320;
    /// Default [`min_height`](Self::min_height).
    pub const DEFAULT_MIN_HEIGHT: u32 = 240;
    /// Default [`filter`](Self::filter).
    pub const DEFAULT_FILTER: ResizeFilter = ResizeFilter::Triangle;

    /// Width assumed for a source that reports zero width.
    pub const FALLBACK_WIDTH: u32 = 640;
    /// Height assumed for a source that reports zero height.
    pub const FALLBACK_HEIGHT: u32 = 480;

    /// Check that the configuration can produce a non-empty frame.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if `max_width` is zero.
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.max_width == 0 {
            return Err(DetectError::InvalidConfig(
                "max_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_width: Self::DEFAULT_MAX_WIDTH,
            min_width: Self::DEFAULT_MIN_WIDTH,
            min_height: Self::DEFAULT_MIN_HEIGHT,
            filter: Self::DEFAULT_FILTER,
        }
    }
}

/// Working dimensions for a source of the given natural size.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_dimensions(natural: Dimensions, config: &FitConfig) -> Dimensions {
    let scale = if natural.width == 0 {
        1.0
    } else {
        (f64::from(config.max_width) / f64::from(natural.width)).min(1.0)
    };

    let source_w = if natural.width == 0 {
        FitConfig::FALLBACK_WIDTH
    } else {
        natural.width
    };
    let source_h = if natural.height == 0 {
        FitConfig::FALLBACK_HEIGHT
    } else {
        natural.height
    };

    // scale <= 1, so the rounded values fit back into u32.
    let width = ((f64::from(source_w) * scale).round() as u32).max(config.min_width);
    let height = ((f64::from(source_h) * scale).round() as u32).max(config.min_height);
    Dimensions::new(width, height)
}

/// Stretch a decoded image to its working dimensions.
///
/// Returns the RGBA frame and whether resampling was actually applied.
/// Images already at their working size are converted without
/// resampling.
#[must_use]
pub fn fit_image(image: &DynamicImage, config: &FitConfig) -> (RgbaImage, bool) {
    let natural = Dimensions::new(image.width(), image.height());
    let target = fit_dimensions(natural, config);

    if target == natural {
        return (to_rgba(image), false);
    }
    if natural.pixel_count() == 0 {
        return (RgbaImage::new(target.width, target.height), true);
    }

    let resized = image.resize_exact(target.width, target.height, config.filter.to_image_filter());
    (to_rgba(&resized), true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            image::Rgba([128, 128, 128, 255]),
        ))
    }

    fn fit(w: u32, h: u32) -> Dimensions {
        fit_dimensions(Dimensions::new(w, h), &FitConfig::default())
    }

    #[test]
    fn default_config_matches_viewer() {
        let config = FitConfig::default();
        assert_eq!(config.max_width, 900);
        assert_eq!(config.min_width, 320);
        assert_eq!(config.min_height, 240);
        assert_eq!(config.filter, ResizeFilter::Triangle);
    }

    #[test]
    fn mid_sized_image_is_unchanged() {
        assert_eq!(fit(640, 480), Dimensions::new(640, 480));
        assert_eq!(fit(900, 600), Dimensions::new(900, 600));
    }

    #[test]
    fn wide_image_is_scaled_to_max_width() {
        // scale = 900 / 1800 = 0.5
        assert_eq!(fit(1800, 1200), Dimensions::new(900, 600));
    }

    #[test]
    fn scaled_height_is_rounded() {
        // scale = 900 / 1000 = 0.9; 555 * 0.9 = 499.5 rounds up.
        assert_eq!(fit(1000, 555), Dimensions::new(900, 500));
    }

    #[test]
    fn small_image_is_stretched_to_minimum() {
        assert_eq!(fit(100, 50), Dimensions::new(320, 240));
        assert_eq!(fit(500, 100), Dimensions::new(500, 240));
    }

    #[test]
    fn very_wide_panorama_hits_minimum_height() {
        // scale = 900 / 9000 = 0.1; height 100 * 0.1 = 10 -> 240.
        assert_eq!(fit(9000, 100), Dimensions::new(900, 240));
    }

    #[test]
    fn zero_size_falls_back() {
        assert_eq!(fit(0, 0), Dimensions::new(640, 480));
        assert_eq!(fit(1800, 0), Dimensions::new(900, 240));
    }

    #[test]
    fn custom_minimums_apply() {
        let config = FitConfig {
            max_width: 100,
            min_width: 3,
            min_height: 3,
            ..FitConfig::default()
        };
        assert_eq!(
            fit_dimensions(Dimensions::new(400, 8), &config),
            Dimensions::new(100, 3)
        );
    }

    #[test]
    fn zero_max_width_is_rejected() {
        let config = FitConfig {
            max_width: 0,
            ..FitConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectError::InvalidConfig(_))
        ));
        assert!(FitConfig::default().validate().is_ok());
    }

    #[test]
    fn fit_image_resamples_to_target() {
        let (rgba, applied) = fit_image(&test_image(1800, 1200), &FitConfig::default());
        assert!(applied);
        assert_eq!(rgba.dimensions(), (900, 600));
    }

    #[test]
    fn fit_image_skips_when_already_fitted() {
        let (rgba, applied) = fit_image(&test_image(640, 480), &FitConfig::default());
        assert!(!applied);
        assert_eq!(rgba.dimensions(), (640, 480));
        assert_eq!(rgba.get_pixel(0, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn every_filter_produces_target_size() {
        for filter in [
            ResizeFilter::Nearest,
            ResizeFilter::Triangle,
            ResizeFilter::CatmullRom,
            ResizeFilter::Gaussian,
            ResizeFilter::Lanczos3,
        ] {
            let config = FitConfig {
                filter,
                ..FitConfig::default()
            };
            let (rgba, _) = fit_image(&test_image(50, 40), &config);
            assert_eq!(rgba.dimensions(), (320, 240), "{filter}");
        }
    }

    #[test]
    fn config_serde_fills_missing_fields() {
        let config: FitConfig = serde_json::from_str(r#"{"max_width": 400}"#).unwrap();
        assert_eq!(config.max_width, 400);
        assert_eq!(config.min_width, FitConfig::DEFAULT_MIN_WIDTH);
        assert_eq!(config.filter, ResizeFilter::Triangle);
    }
}
