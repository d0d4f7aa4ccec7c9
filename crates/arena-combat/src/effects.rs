//! Screen feel effects driven by combat events.
//!
//! Shake, flash, hit-stop and particle intensity are pure functions of the
//! hit that produced them. The coordinator only reads events; nothing here
//! feeds back into the combat core.

use serde::{Deserialize, Serialize};

use crate::clock::frames_to_seconds;
use crate::config::FeelTuning;
use crate::events::{CombatEvent, CombatEventHandler};

/// Reference weight at which shake is unscaled.
const REFERENCE_WEIGHT: f32 = 100.0;

/// Largest shake amplitude.
const MAX_SHAKE: f32 = 5.0;

/// Largest particle burst.
const MAX_PARTICLES: u32 = 64;

/// Base shake duration in seconds, before hit-stop is added.
const BASE_SHAKE_DURATION: f32 = 0.1;

/// Extra hit-stop frames on a legendary blow.
const LEGENDARY_HITSTOP_BONUS: u32 = 4;

/// One presentation cue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeelCue {
    /// Shake amplitude (0 when shake is disabled).
    pub shake: f32,
    /// Shake duration in seconds.
    pub shake_duration: f32,
    /// Whether to flash the screen.
    pub flash: bool,
    /// Frames to freeze the presentation.
    pub hitstop_frames: u32,
    /// Particles to spawn.
    pub particles: u32,
    /// Whether this was a legendary blow.
    pub legendary: bool,
}

impl FeelCue {
    /// Cue for a landed hit.
    #[must_use]
    pub fn for_hit(
        damage: f32,
        defender_weight: f32,
        hit_stop_frames: u32,
        tuning: &FeelTuning,
    ) -> Self {
        let damage = damage.max(0.0);
        let legendary = damage >= tuning.legendary_threshold;
        let weight_factor = (REFERENCE_WEIGHT / defender_weight.max(1.0)).clamp(0.5, 1.5);

        let mut shake = damage / 10.0 * weight_factor;
        let mut particles = (damage * 1.5).round() as u32 + 4;
        let mut hitstop_frames = hit_stop_frames;
        if legendary {
            shake *= 2.0;
            particles *= 2;
            hitstop_frames += LEGENDARY_HITSTOP_BONUS;
        }

        let shake = if tuning.screen_shake {
            (shake * tuning.shake_intensity).min(MAX_SHAKE)
        } else {
            0.0
        };

        Self {
            shake,
            shake_duration: BASE_SHAKE_DURATION + frames_to_seconds(hitstop_frames),
            flash: tuning.flash && damage * 2.0 >= tuning.legendary_threshold,
            hitstop_frames,
            particles: particles.min(MAX_PARTICLES),
            legendary,
        }
    }

    /// Cue for a transformation flash.
    #[must_use]
    pub fn for_transformation(level: u8, tuning: &FeelTuning) -> Self {
        let shake = if tuning.screen_shake {
            (1.5 * f32::from(level) * tuning.shake_intensity).min(MAX_SHAKE)
        } else {
            0.0
        };
        Self {
            shake,
            shake_duration: 0.5,
            flash: tuning.flash,
            hitstop_frames: 0,
            particles: (32 * u32::from(level)).min(MAX_PARTICLES),
            legendary: false,
        }
    }

    /// Cue for an event, if it has one.
    #[must_use]
    pub fn for_event(event: &CombatEvent, tuning: &FeelTuning) -> Option<Self> {
        match event {
            CombatEvent::HitLanded {
                damage,
                defender_weight,
                hit_stop_frames,
                ..
            } => Some(Self::for_hit(*damage, *defender_weight, *hit_stop_frames, tuning)),
            CombatEvent::TransformationActivated { level, .. } => {
                Some(Self::for_transformation(*level, tuning))
            },
            _ => None,
        }
    }
}

/// Feel-effects coordinator.
#[derive(Debug, Clone, Default)]
pub struct FeelEffects {
    tuning: FeelTuning,
    shake: f32,
    shake_duration: f32,
    shake_remaining: f32,
    pending: Vec<FeelCue>,
    legendary_count: u32,
}

impl FeelEffects {
    /// Create a coordinator with the given tuning.
    #[must_use]
    pub fn new(tuning: FeelTuning) -> Self {
        Self {
            tuning,
            ..Self::default()
        }
    }

    /// Toggle screen shake (accessibility). Disabling stops any shake.
    pub fn set_screen_shake(&mut self, enabled: bool) {
        self.tuning.screen_shake = enabled;
        if !enabled {
            self.shake = 0.0;
            self.shake_remaining = 0.0;
        }
    }

    /// Current tuning.
    #[must_use]
    pub const fn tuning(&self) -> &FeelTuning {
        &self.tuning
    }

    /// Current shake amplitude, fading linearly to zero.
    #[must_use]
    pub fn current_shake(&self) -> f32 {
        if self.shake_remaining <= 0.0 || self.shake_duration <= 0.0 {
            return 0.0;
        }
        self.shake * (self.shake_remaining / self.shake_duration)
    }

    /// Legendary blows seen so far.
    #[must_use]
    pub const fn legendary_count(&self) -> u32 {
        self.legendary_count
    }

    /// Take cues produced since the last call.
    pub fn drain_cues(&mut self) -> Vec<FeelCue> {
        std::mem::take(&mut self.pending)
    }

    /// Decay the running shake.
    pub fn update(&mut self, dt: f32) {
        self.shake_remaining = (self.shake_remaining - dt.max(0.0)).max(0.0);
        if self.shake_remaining == 0.0 {
            self.shake = 0.0;
        }
    }

    fn apply(&mut self, cue: FeelCue) {
        // A stronger shake takes over; a weaker one never cuts it short.
        if cue.shake >= self.current_shake() && cue.shake > 0.0 {
            self.shake = cue.shake;
            self.shake_duration = cue.shake_duration;
            self.shake_remaining = cue.shake_duration;
        }
        if cue.legendary {
            self.legendary_count += 1;
        }
        self.pending.push(cue);
    }
}

impl CombatEventHandler for FeelEffects {
    fn handle(&mut self, event: &CombatEvent) {
        if let Some(cue) = FeelCue::for_event(event, &self.tuning) {
            self.apply(cue);
        }
    }
}
