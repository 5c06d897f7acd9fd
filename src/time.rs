//! Frame timing for the animation loop.
//!
//! Motion in orbitext is expressed per *reference frame* (1/60 s), the way a
//! display-synced animation callback advances it. [`FrameClock`] turns real
//! frame times into that unit so labels move at the same speed on 30 Hz and
//! 144 Hz displays.
//!
//! # Example
//!
//! ```ignore
//! use orbitext::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In your frame callback, with the host's frame delta:
//! let dt = clock.advance(frame_seconds);
//! scene.frame(&mut host, clock.frame_scale(), dt);
//! ```

/// Duration of one reference frame in seconds.
pub const REFERENCE_FRAME: f32 = 1.0 / 60.0;

/// Upper bound on the tick scale of a single frame.
///
/// A stalled window (dragged, minimized) would otherwise produce one huge
/// step that throws labels across the scene.
pub const MAX_FRAME_SCALE: f32 = 4.0;

/// Frame timing state.
#[derive(Debug, Default)]
pub struct FrameClock {
    /// Time since last frame in seconds.
    delta_secs: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by a delta supplied by the host (for example egui's `stable_dt`).
    ///
    /// Non-finite and negative deltas count as zero. Returns the delta in seconds.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        self.delta_secs = if raw_delta.is_finite() { raw_delta.max(0.0) } else { 0.0 };
        self.delta_secs
    }

    /// Delta expressed in reference frames, clamped to [`MAX_FRAME_SCALE`].
    #[inline]
    pub fn frame_scale(&self) -> f32 {
        (self.delta_secs / REFERENCE_FRAME).clamp(0.0, MAX_FRAME_SCALE)
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }
}
