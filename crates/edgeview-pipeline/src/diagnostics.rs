//! Detection diagnostics: timing and counts for each stage.
//!
//! [`process_with_diagnostics`] runs decode, fit and detection, timing
//! each stage with a caller-supplied [`Clock`]. [`WebClock`] is backed by
//! the `web-time` crate, which uses `performance.now()` on WASM and
//! `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detector::EdgeDetector;
use crate::fit::fit_image;
use crate::grayscale;
use crate::types::{DetectError, Dimensions, ProcessResult, ViewerConfig};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`], usable both natively and
/// inside a browser worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single decode/fit/detect run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Fitting to the working resolution.
    pub fit: StageDiagnostics,
    /// Sobel edge detection.
    pub detect: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts.
    pub summary: DetectionSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Working-resolution fit metrics.
    Fit {
        /// Working width in pixels.
        width: u32,
        /// Working height in pixels.
        height: u32,
        /// Resampling filter name.
        filter: String,
        /// Whether the image was actually resampled.
        resampled: bool,
    },
    /// Edge detection metrics.
    Detect {
        /// Effective (clamped) threshold.
        threshold: u8,
        /// Largest raw gradient magnitude before normalization.
        max_magnitude: f32,
        /// Number of edge pixels in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Working width in pixels.
    pub image_width: u32,
    /// Working height in pixels.
    pub image_height: u32,
    /// Working pixel count.
    pub pixel_count: u64,
    /// Number of edge pixels.
    pub edge_pixel_count: u64,
}

impl DetectionDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Detection Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Fit", &self.fit),
            ("Edge Detection", &self.detect),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!("Edge pixels: {}", self.summary.edge_pixel_count));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
pub(crate) fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Fit {
            width,
            height,
            filter,
            resampled,
        } => {
            if *resampled {
                format!("{width}x{height} ({filter})")
            } else {
                format!("{width}x{height} (unchanged)")
            }
        }
        StageMetrics::Detect {
            threshold,
            max_magnitude,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "threshold={threshold} max={max_magnitude:.1} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
    }
}

/// Decode, fit and detect, collecting per-stage diagnostics.
///
/// # Errors
///
/// Returns [`DetectError::InvalidConfig`] if the fit configuration is
/// invalid, [`DetectError::EmptyInput`] if `image_bytes` is empty, and
/// [`DetectError::ImageDecode`] if the image cannot be decoded.
pub fn process_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &ViewerConfig,
    clock: &C,
) -> Result<(ProcessResult, DetectionDiagnostics), DetectError> {
    config.fit.validate()?;
    let total_start = clock.now();

    // 1. Decode.
    let start = clock.now();
    let decoded = grayscale::decode(image_bytes)?;
    let natural = Dimensions::new(decoded.width(), decoded.height());
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: natural.width,
            height: natural.height,
            pixel_count: natural.pixel_count(),
        },
    };

    // 2. Fit to working resolution.
    let start = clock.now();
    let (source, resampled) = fit_image(&decoded, &config.fit);
    let dimensions = Dimensions::new(source.width(), source.height());
    let fit = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Fit {
            width: dimensions.width,
            height: dimensions.height,
            filter: config.fit.filter.to_string(),
            resampled,
        },
    };

    // 3. Detect.
    let start = clock.now();
    let mut detector = EdgeDetector::new();
    let edges = detector.detect_image(&source, &config.parameters)?;
    let edge_pixel_count = edges.edge_pixel_count();
    let detect = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Detect {
            threshold: config.parameters.effective_threshold(),
            max_magnitude: detector.max_magnitude().unwrap_or(0.0),
            edge_pixel_count,
            total_pixel_count: dimensions.pixel_count(),
        },
    };

    let diagnostics = DetectionDiagnostics {
        decode,
        fit,
        detect,
        total_duration: clock.elapsed(&total_start),
        summary: DetectionSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            edge_pixel_count,
        },
    };

    Ok((
        ProcessResult {
            source,
            edges,
            dimensions,
        },
        diagnostics,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Clock that advances one millisecond every time it is read.
    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

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
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let png = sharp_edge_png(400, 300);
        let (result, diag) =
            process_with_diagnostics(&png, &ViewerConfig::default(), &StepClock(Cell::new(0)))
                .unwrap();

        assert_eq!(result.dimensions, Dimensions::new(400, 300));
        assert!(matches!(
            diag.decode.metrics,
            StageMetrics::Decode {
                width: 400,
                height: 300,
                ..
            }
        ));
        assert!(matches!(
            diag.fit.metrics,
            StageMetrics::Fit {
                resampled: false,
                ..
            }
        ));
        let StageMetrics::Detect {
            threshold,
            max_magnitude,
            edge_pixel_count,
            total_pixel_count,
        } = diag.detect.metrics
        else {
            unreachable!("detect stage carries detect metrics");
        };
        assert_eq!(threshold, 100);
        assert!(max_magnitude > 0.0);
        assert_eq!(edge_pixel_count, result.edges.edge_pixel_count());
        assert_eq!(total_pixel_count, 120_000);
        assert!(diag.total_duration >= diag.detect.duration);
    }

    #[test]
    fn works_with_web_clock() {
        let png = sharp_edge_png(20, 20);
        let (result, _) = process_with_diagnostics(&png, &ViewerConfig::default(), &WebClock)
            .unwrap();
        assert_eq!(result.dimensions, Dimensions::new(320, 240));
    }

    #[test]
    fn empty_input_is_reported() {
        let result = process_with_diagnostics(&[], &ViewerConfig::default(), &WebClock);
        assert!(matches!(result, Err(DetectError::EmptyInput)));
    }

    #[test]
    fn report_mentions_stages() {
        let png = sharp_edge_png(30, 30);
        let (_, diag) =
            process_with_diagnostics(&png, &ViewerConfig::default(), &StepClock(Cell::new(0)))
                .unwrap();
        let report = diag.report();
        assert!(report.contains("Detection Diagnostics Report"));
        assert!(report.contains("Edge Detection"));
        assert!(report.contains("320x240 (Triangle)"));
    }

    #[test]
    fn diagnostics_json_round_trip() {
        let png = sharp_edge_png(30, 30);
        let (_, diag) =
            process_with_diagnostics(&png, &ViewerConfig::default(), &StepClock(Cell::new(0)))
                .unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: DetectionDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.decode.duration, diag.decode.duration);
        assert_eq!(back.summary.edge_pixel_count, diag.summary.edge_pixel_count);
    }
}
