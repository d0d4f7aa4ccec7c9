//! Fixed-rate logical frame clock.
//!
//! Converts wall-clock delta time into whole 60 Hz logical frames. Every
//! frame-denominated counter in the core (hitstun, invincibility, hitbox
//! lifetimes) ticks from one of these.

use serde::{Deserialize, Serialize};

/// Logical frames per second.
pub const FRAME_RATE: u32 = 60;

/// Duration of one logical frame in seconds.
pub const FRAME_DT: f32 = 1.0 / FRAME_RATE as f32;

const FIXED_TIMESTEP: f64 = 1.0 / FRAME_RATE as f64;

/// Absorbs float drift so feeding exactly `FRAME_DT` yields exactly one frame.
const DRIFT_EPSILON: f64 = 1e-7;

/// Converts seconds to whole frames (rounded to nearest).
#[must_use]
pub fn seconds_to_frames(seconds: f32) -> u32 {
    (seconds.max(0.0) * FRAME_RATE as f32).round() as u32
}

/// Converts frames to seconds.
#[must_use]
pub fn frames_to_seconds(frames: u32) -> f32 {
    frames as f32 * FRAME_DT
}

/// Monotonic fixed-rate frame counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    /// Frames elapsed since creation or reset.
    frame: u64,
    /// Unconsumed wall-clock time.
    accumulator: f64,
    /// Largest delta accepted per call (prevents spiral of death).
    max_delta: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock at frame zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: 0,
            accumulator: 0.0,
            max_delta: 0.25,
        }
    }

    /// Set the largest delta accepted per call, in seconds.
    #[must_use]
    pub fn with_max_delta(mut self, seconds: f32) -> Self {
        self.max_delta = f64::from(seconds.max(FRAME_DT));
        self
    }

    /// Feed wall-clock time; returns how many logical frames elapsed.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulator += f64::from(dt).min(self.max_delta);

        let mut frames = 0;
        while self.accumulator + DRIFT_EPSILON >= FIXED_TIMESTEP {
            self.accumulator = (self.accumulator - FIXED_TIMESTEP).max(0.0);
            frames += 1;
        }
        self.frame += u64::from(frames);
        frames
    }

    /// Current frame number.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Fraction of the next frame already accumulated (for interpolation).
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / FIXED_TIMESTEP) as f32
    }

    /// Reset to frame zero.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.accumulator = 0.0;
    }
}
