#![forbid(unsafe_code)]

//! Frame quantization.
//!
//! The video clock reports continuous, slightly jittery times. Every editing
//! decision ("is there already a keyframe here?", "which keyframe is
//! selected?") compares times after snapping them down to the start of the
//! frame they fall in:
//!
//! ```text
//! quantize(t) = floor(t * fps) / fps
//! ```
//!
//! # Invariants
//!
//! 1. `quantize_equal` is the only time-equality used by editing code.
//! 2. `quantize(t) <= t` for every finite `t` when the rate is known.
//! 3. With an unknown rate (`fps <= 0`, not finite) quantization is the
//!    identity and equality is exact float equality.
//!
//! # Failure Modes
//!
//! - Metadata not loaded yet: the rate is [`FrameRate::UNKNOWN`] and snapping
//!   is disabled rather than dividing by zero.

use serde::{Deserialize, Serialize};

/// Video frame rate in frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameRate(f64);

impl FrameRate {
    /// Rate before video metadata has been loaded.
    pub const UNKNOWN: FrameRate = FrameRate(0.0);

    /// Create a frame rate from frames per second.
    #[must_use]
    pub const fn new(fps: f64) -> Self {
        Self(fps)
    }

    /// Raw frames per second.
    #[must_use]
    pub const fn fps(self) -> f64 {
        self.0
    }

    /// Whether the rate can be used for snapping.
    #[must_use]
    pub fn is_known(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Snap `time` down to the start of its frame.
    #[must_use]
    pub fn quantize(self, time: f64) -> f64 {
        if self.is_known() {
            (time * self.0).floor() / self.0
        } else {
            time
        }
    }

    /// Whether two times fall in the same frame.
    #[must_use]
    pub fn quantize_equal(self, a: f64, b: f64) -> bool {
        self.quantize(a) == self.quantize(b)
    }

    /// Length of one frame in seconds, if the rate is known.
    #[must_use]
    pub fn frame_duration(self) -> Option<f64> {
        self.is_known().then(|| 1.0 / self.0)
    }

    /// Step `frames` whole frames from the frame containing `time`.
    ///
    /// Negative counts step backwards; the result never goes below zero.
    /// With an unknown rate the time is returned unchanged.
    #[must_use]
    pub fn step_frames(self, time: f64, frames: i64) -> f64 {
        match self.frame_duration() {
            Some(frame) => (self.quantize(time) + frames as f64 * frame).max(0.0),
            None => time,
        }
    }
}

impl From<f64> for FrameRate {
    fn from(fps: f64) -> Self {
        Self(fps)
    }
}
