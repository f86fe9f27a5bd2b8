//! Interactive viewer state: source frame, threshold, run state, and the
//! cached edge map.
//!
//! A render loop calls [`Viewer::tick`] once per animation frame. The
//! edge map is only recomputed when something it depends on has changed
//! since the last render (a new source frame or a different effective
//! threshold); otherwise the cached map is returned. The cached map is
//! therefore always the detection result for the most recent valid
//! source and parameters.
//!
//! Loading a source that fails to decode or validate leaves the previous
//! source and cached map untouched.
//!
//! The first frame after [`Viewer::start`] restarts the caller's
//! [`FpsMeter`] window, so time spent paused never counts towards the
//! frame rate.

use std::time::Duration;

use crate::detector::{EdgeDetector, validate};
use crate::fit::{FitConfig, fit_image};
use crate::fps::FpsMeter;
use crate::grayscale;
use crate::types::{DetectError, Dimensions, EdgeMap, Parameters, RgbaImage};

/// Viewer session driving edge detection for a single source image.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    source: Option<RgbaImage>,
    params: Parameters,
    detector: EdgeDetector,
    output: Option<EdgeMap>,
    dirty: bool,
    running: bool,
    restart_meter: bool,
    recompute_count: u64,
}

impl Viewer {
    /// Create a paused viewer with no source and the given parameters.
    #[must_use]
    pub fn new(params: Parameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Replace the source frame. The next render recomputes.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidDimensions`] for an empty frame. The
    /// previous source is kept in that case.
    pub fn load_source(&mut self, frame: RgbaImage) -> Result<Dimensions, DetectError> {
        let dimensions = validate(frame.as_raw(), frame.width(), frame.height())?;
        self.replace_source(frame);
        Ok(dimensions)
    }

    fn replace_source(&mut self, frame: RgbaImage) {
        self.source = Some(frame);
        self.dirty = true;
    }

    /// Replace the source frame from a raw RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidDimensions`] or
    /// [`DetectError::BufferSizeMismatch`] if the buffer does not
    /// describe a `width x height` RGBA image. The previous source is
    /// kept in that case.
    pub fn load_pixels(
        &mut self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<Dimensions, DetectError> {
        let dimensions = validate(&pixels, width, height)?;
        let actual = pixels.len();
        let frame =
            RgbaImage::from_raw(width, height, pixels).ok_or(DetectError::BufferSizeMismatch {
                expected: dimensions.pixel_count().saturating_mul(4),
                actual,
            })?;
        self.replace_source(frame);
        Ok(dimensions)
    }

    /// Decode encoded image bytes, fit them to the working resolution,
    /// and use the result as the source frame.
    ///
    /// Returns the working dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if `fit` is invalid,
    /// [`DetectError::EmptyInput`] or [`DetectError::ImageDecode`] if
    /// the bytes cannot be decoded. The previous source is kept in that
    /// case.
    pub fn load_image_bytes(
        &mut self,
        bytes: &[u8],
        fit: &FitConfig,
    ) -> Result<Dimensions, DetectError> {
        fit.validate()?;
        let decoded = grayscale::decode(bytes)?;
        let (frame, _) = fit_image(&decoded, fit);
        self.load_source(frame)
    }

    /// The current source frame.
    #[must_use]
    pub const fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    /// Dimensions of the current source frame.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.source
            .as_ref()
            .map(|s| Dimensions::new(s.width(), s.height()))
    }

    /// Current detection parameters.
    #[must_use]
    pub const fn parameters(&self) -> Parameters {
        self.params
    }

    /// Replace the detection parameters.
    ///
    /// Only a change in the *effective* (clamped) threshold invalidates
    /// the cached edge map.
    pub fn set_parameters(&mut self, params: Parameters) {
        if params.effective_threshold() != self.params.effective_threshold() {
            self.dirty = true;
        }
        self.params = params;
    }

    /// Set the threshold; see [`set_parameters`](Self::set_parameters).
    pub fn set_threshold(&mut self, threshold: i32) {
        self.set_parameters(Parameters::new(threshold));
    }

    /// Force the next render to recompute even if nothing changed.
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether the next render will recompute.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.source.is_some() && (self.dirty || self.output.is_none())
    }

    /// Return the edge map for the current source and parameters,
    /// recomputing it only if stale.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::NoSource`] if no source has been loaded.
    pub fn render(&mut self) -> Result<&EdgeMap, DetectError> {
        let Some(source) = self.source.as_ref() else {
            return Err(DetectError::NoSource);
        };

        if self.dirty || self.output.is_none() {
            let edges = self.detector.detect_image(source, &self.params)?;
            self.output = Some(edges);
            self.dirty = false;
            self.recompute_count += 1;
        }

        self.output.as_ref().ok_or(DetectError::NoSource)
    }

    /// The last rendered edge map, which may be stale if
    /// [`is_dirty`](Self::is_dirty) is `true`.
    #[must_use]
    pub const fn output(&self) -> Option<&EdgeMap> {
        self.output.as_ref()
    }

    /// How many times the edge map has actually been recomputed.
    #[must_use]
    pub const fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// The detector, for inspecting the last run's scratch buffers.
    #[must_use]
    pub const fn detector(&self) -> &EdgeDetector {
        &self.detector
    }

    /// Start the render loop.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::NoSource`] if no source has been loaded.
    pub fn start(&mut self) -> Result<(), DetectError> {
        if self.source.is_none() {
            return Err(DetectError::NoSource);
        }
        if !self.running {
            self.restart_meter = true;
        }
        self.running = true;
        Ok(())
    }

    /// Pause the render loop.
    pub const fn stop(&mut self) {
        self.running = false;
    }

    /// Toggle between running and paused; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::NoSource`] when starting without a source.
    pub fn toggle(&mut self) -> Result<bool, DetectError> {
        if self.running {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.running)
    }

    /// Whether the render loop is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// One animation frame at time `now`.
    ///
    /// While running, records the frame in `fps` and returns the current
    /// edge map (recomputed only if stale). The first frame after
    /// [`start`](Self::start) restarts the meter's window at `now`
    /// instead of being counted. While paused, does nothing and returns
    /// `None`.
    ///
    /// # Errors
    ///
    /// Propagates [`render`](Self::render) errors.
    pub fn tick(
        &mut self,
        fps: &mut FpsMeter,
        now: Duration,
    ) -> Result<Option<&EdgeMap>, DetectError> {
        if !self.running {
            return Ok(None);
        }
        if self.restart_meter {
            fps.reset(now);
            self.restart_meter = false;
        } else {
            fps.tick(now);
        }
        self.render().map(Some)
    }
}
