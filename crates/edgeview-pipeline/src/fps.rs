//! Frame-rate measurement for a render loop.
//!
//! [`FpsMeter`] counts frames over windows of at least one second and
//! publishes `round(frames * 1000 / elapsed_ms)` when a window closes.
//! Timestamps are plain [`Duration`]s from any monotonic origin, such as
//! a `requestAnimationFrame` timestamp or `Instant::elapsed` on native.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rough performance class of a measured frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FpsClass {
    /// At least [`FpsClass::HIGH_FPS`] frames per second.
    High,
    /// At least [`FpsClass::NORMAL_FPS`] frames per second.
    Normal,
    /// Below [`FpsClass::NORMAL_FPS`].
    Low,
}

impl FpsClass {
    /// Lower bound of [`FpsClass::High`].
    pub const HIGH_FPS: u32 = 55;
    /// Lower bound of [`FpsClass::Normal`].
    pub const NORMAL_FPS: u32 = 30;

    /// Classify a frame rate.
    #[must_use]
    pub const fn classify(fps: u32) -> Self {
        if fps >= Self::HIGH_FPS {
            Self::High
        } else if fps >= Self::NORMAL_FPS {
            Self::Normal
        } else {
            Self::Low
        }
    }
}

/// Sliding one-second frame counter.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window_start: Duration,
    frames: u32,
    current: u32,
}

impl FpsMeter {
    /// Minimum length of a measurement window.
    pub const WINDOW: Duration = Duration::from_secs(1);

    /// Start measuring at `now`.
    #[must_use]
    pub const fn new(now: Duration) -> Self {
        Self {
            window_start: now,
            frames: 0,
            current: 0,
        }
    }

    /// Restart the current window at `now`, e.g. after the loop was
    /// paused. The last published rate is kept.
    pub const fn reset(&mut self, now: Duration) {
        self.window_start = now;
        self.frames = 0;
    }

    /// Record one frame rendered at `now`.
    ///
    /// Returns the new rate when this frame closes a window.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tick(&mut self, now: Duration) -> Option<u32> {
        self.frames = self.frames.saturating_add(1);
        let elapsed = now.saturating_sub(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        // Non-negative and bounded by frames * 1000.
        let fps = (f64::from(self.frames) * 1000.0 / elapsed_ms).round() as u32;
        self.current = fps;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }

    /// The most recently published rate (0 before the first window).
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Class of the most recently published rate.
    #[must_use]
    pub const fn class(&self) -> FpsClass {
        FpsClass::classify(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn no_rate_before_a_full_window() {
        let mut meter = FpsMeter::new(ms(0));
        for i in 1..60 {
            assert_eq!(meter.tick(ms(i * 16)), None);
        }
        assert_eq!(meter.current(), 0);
    }

    #[test]
    fn sixty_frames_per_second() {
        let mut meter = FpsMeter::new(ms(0));
        let mut published = None;
        for i in 1..=60 {
            published = meter.tick(ms(i * 1000 / 60)).or(published);
        }
        assert_eq!(published, Some(60));
        assert_eq!(meter.class(), FpsClass::High);
    }

    #[test]
    fn window_longer_than_a_second_is_averaged() {
        let mut meter = FpsMeter::new(ms(0));
        for i in 1..=44 {
            assert_eq!(meter.tick(ms(i * 22)), None);
        }
        // 45th frame at 1100ms: 45 * 1000 / 1100 = 40.9 -> 41.
        assert_eq!(meter.tick(ms(1100)), Some(41));
        assert_eq!(meter.class(), FpsClass::Normal);
    }

    #[test]
    fn window_restarts_after_publish() {
        let mut meter = FpsMeter::new(ms(0));
        assert_eq!(meter.tick(ms(1000)), Some(1));
        assert_eq!(meter.tick(ms(1500)), None);
        assert_eq!(meter.tick(ms(2000)), Some(2));
    }

    #[test]
    fn reset_keeps_last_rate() {
        let mut meter = FpsMeter::new(ms(0));
        assert_eq!(meter.tick(ms(1000)), Some(1));
        meter.reset(ms(5000));
        assert_eq!(meter.current(), 1);
        assert_eq!(meter.tick(ms(5500)), None);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(FpsClass::classify(60), FpsClass::High);
        assert_eq!(FpsClass::classify(55), FpsClass::High);
        assert_eq!(FpsClass::classify(54), FpsClass::Normal);
        assert_eq!(FpsClass::classify(30), FpsClass::Normal);
        assert_eq!(FpsClass::classify(29), FpsClass::Low);
        assert_eq!(FpsClass::classify(0), FpsClass::Low);
    }
}
