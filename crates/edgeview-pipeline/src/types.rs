//! Shared types for the edgeview detection pipeline.

use serde::{Deserialize, Serialize};

use crate::fit::FitConfig;

/// Re-export `RgbaImage` so downstream crates can reference source
/// frames and edge maps without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if every pixel lies on the one-pixel border, i.e.
    /// the Sobel kernel has no interior pixel to visit.
    #[must_use]
    pub const fn has_no_interior(self) -> bool {
        self.width < 3 || self.height < 3
    }
}

/// Tunable detection parameters.
///
/// Owned by whichever component manages the user-facing controls and
/// read fresh on every detection call. The threshold is stored as given
/// and clamped to `[MIN_THRESHOLD, MAX_THRESHOLD]` when used, so a live
/// slider can never produce an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Cutoff on the normalized (0-255) gradient magnitude. Pixels at or
    /// above the threshold become edges.
    pub threshold: i32,
}

impl Parameters {
    /// Default threshold used by the interactive viewer.
    pub const DEFAULT_THRESHOLD: i32 = 100;
    /// Lowest effective threshold; every pixel is an edge.
    pub const MIN_THRESHOLD: i32 = 0;
    /// Highest effective threshold; only maximum-magnitude pixels are edges.
    pub const MAX_THRESHOLD: i32 = 255;

    /// Create parameters with the given (unclamped) threshold.
    #[must_use]
    pub const fn new(threshold: i32) -> Self {
        Self { threshold }
    }

    /// The threshold clamped into `0..=255`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn effective_threshold(&self) -> u8 {
        let t = if self.threshold < Self::MIN_THRESHOLD {
            Self::MIN_THRESHOLD
        } else if self.threshold > Self::MAX_THRESHOLD {
            Self::MAX_THRESHOLD
        } else {
            self.threshold
        };
        // 0..=255 after clamping.
        t as u8
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

/// Configuration for the viewer pipeline: how the source is fitted to
/// the working resolution, and the detection parameters.
///
/// Every field has a default, so partial JSON such as
/// `{"parameters": {"threshold": 60}}` is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Working-resolution settings.
    pub fit: FitConfig,
    /// Detection parameters.
    pub parameters: Parameters,
}

/// Result of running decode, fit and detection on encoded image bytes.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// The source frame at working resolution.
    pub source: RgbaImage,
    /// The edge map computed from `source`.
    pub edges: EdgeMap,
    /// Working dimensions (shared by `source` and `edges`).
    pub dimensions: Dimensions,
}

/// A binary edge map: RGBA, every pixel either opaque black or opaque
/// white.
///
/// Has the same extents as the pixel buffer it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap(RgbaImage);

impl EdgeMap {
    /// Value written to R, G and B of edge pixels.
    pub const EDGE: u8 = 255;
    /// Value written to R, G and B of background pixels.
    pub const BACKGROUND: u8 = 0;

    /// Wrap a raw RGBA buffer produced by the detector.
    ///
    /// Returns `None` if the buffer length does not match the
    /// dimensions.
    pub(crate) fn from_raw(dimensions: Dimensions, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(dimensions.width, dimensions.height, pixels).map(Self)
    }

    /// Dimensions of the edge map in pixels.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.0.width(), self.0.height())
    }

    /// The raw RGBA samples, row-major.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// Consume the edge map and return the raw RGBA samples.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.0.into_raw()
    }

    /// Borrow the edge map as an `RgbaImage`.
    #[must_use]
    pub const fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    /// Consume the edge map and return it as an `RgbaImage`.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.0
    }

    /// Whether the pixel at `(x, y)` is an edge.
    ///
    /// Out-of-bounds coordinates are not edges.
    #[must_use]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.0
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] == Self::EDGE)
    }

    /// Number of edge pixels.
    #[must_use]
    pub fn edge_pixel_count(&self) -> u64 {
        self.0
            .pixels()
            .map(|p| u64::from(p.0[0] == Self::EDGE))
            .sum()
    }
}

/// Errors that can occur during detection.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Width or height is zero.
    #[error("invalid dimensions {width}x{height}: width and height must be at least 1")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The pixel buffer length is not `width * height * 4`.
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        /// Required length in bytes.
        expected: u64,
        /// Length actually supplied.
        actual: usize,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rendering was requested before any source image was loaded.
    #[error("no source image loaded")]
    NoSource,
}

/// Serde-compatible proxy for `DetectError`.
///
/// A deserialized `ImageDecode` becomes `InvalidConfig` carrying the
/// original message, since the typed `image::ImageError` cannot be
/// reconstructed.
#[derive(Serialize, Deserialize)]
enum DetectErrorProxy {
    InvalidDimensions { width: u32, height: u32 },
    BufferSizeMismatch { expected: u64, actual: usize },
    EmptyInput,
    ImageDecode(String),
    InvalidConfig(String),
    NoSource,
}

impl Serialize for DetectError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::InvalidDimensions { width, height } => DetectErrorProxy::InvalidDimensions {
                width: *width,
                height: *height,
            },
            Self::BufferSizeMismatch { expected, actual } => DetectErrorProxy::BufferSizeMismatch {
                expected: *expected,
                actual: *actual,
            },
            Self::EmptyInput => DetectErrorProxy::EmptyInput,
            Self::ImageDecode(e) => DetectErrorProxy::ImageDecode(e.to_string()),
            Self::InvalidConfig(s) => DetectErrorProxy::InvalidConfig(s.clone()),
            Self::NoSource => DetectErrorProxy::NoSource,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DetectError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = DetectErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            DetectErrorProxy::InvalidDimensions { width, height } => {
                Self::InvalidDimensions { width, height }
            }
            DetectErrorProxy::BufferSizeMismatch { expected, actual } => {
                Self::BufferSizeMismatch { expected, actual }
            }
            DetectErrorProxy::EmptyInput => Self::EmptyInput,
            DetectErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            DetectErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            DetectErrorProxy::NoSource => Self::NoSource,
        })
    }
}
