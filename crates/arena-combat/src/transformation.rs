//! Transformation (synergy) controller.
//!
//! A combatant may hold up to two transformation tiers. Activating a tier
//! consumes a full synergy meter and overrides stats, moveset and frame data
//! for a bounded time; reverting restores the base values and starts a
//! cooldown.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combo::{Meters, METER_MAX};
use crate::error::{Rejection, Resource};
use crate::moves::{FrameDataMultipliers, MovesetOverride};

/// Default transformation length in seconds.
pub const DEFAULT_DURATION: f32 = 30.0;

/// Default cooldown after a revert, in seconds.
pub const DEFAULT_COOLDOWN: f32 = 10.0;

/// Highest transformation tier.
pub const MAX_LEVEL: u8 = 2;

// ============================================================================
// Definitions
// ============================================================================

/// Multiplicative stat factors (1.0 = unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatMultipliers {
    /// Weight factor.
    pub weight: f32,
    /// Movement speed factor.
    pub speed: f32,
    /// Jump power factor.
    pub jump: f32,
    /// Attack power factor.
    pub attack_power: f32,
    /// Defense factor.
    pub defense: f32,
}

impl Default for StatMultipliers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl StatMultipliers {
    /// No change.
    pub const IDENTITY: Self = Self {
        weight: 1.0,
        speed: 1.0,
        jump: 1.0,
        attack_power: 1.0,
        defense: 1.0,
    };
}

/// Conditions that must hold to activate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationRequirements {
    /// Synergy meter required (and consumed).
    pub min_meter: f32,
    /// Optional minimum damage in the running combo.
    pub min_combo_damage: Option<f32>,
}

impl Default for ActivationRequirements {
    fn default() -> Self {
        Self {
            min_meter: METER_MAX,
            min_combo_damage: None,
        }
    }
}

/// Static description of one transformation tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationDefinition {
    /// Tier (1 or 2).
    pub level: u8,
    /// Display name.
    pub name: String,
    /// Stat factors while active.
    #[serde(default)]
    pub multipliers: StatMultipliers,
    /// Replacement moves while active.
    #[serde(default)]
    pub moveset: Option<MovesetOverride>,
    /// Frame-data factors while active.
    #[serde(default)]
    pub frame_data: Option<FrameDataMultipliers>,
    /// Seconds the form lasts; `None` lasts until reverted.
    #[serde(default = "default_duration")]
    pub duration: Option<f32>,
    /// Seconds after a revert before the next activation.
    #[serde(default = "default_cooldown")]
    pub cooldown: f32,
    /// Activation gates.
    #[serde(default)]
    pub requirements: ActivationRequirements,
    /// Revert early when HP falls below this fraction of max HP.
    #[serde(default)]
    pub ends_below_hp_fraction: Option<f32>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_duration() -> Option<f32> {
    Some(DEFAULT_DURATION)
}

fn default_cooldown() -> f32 {
    DEFAULT_COOLDOWN
}

impl TransformationDefinition {
    /// Create a tier with default timings and no overrides.
    #[must_use]
    pub fn new(level: u8, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
            multipliers: StatMultipliers::IDENTITY,
            moveset: None,
            frame_data: None,
            duration: default_duration(),
            cooldown: DEFAULT_COOLDOWN,
            requirements: ActivationRequirements::default(),
            ends_below_hp_fraction: None,
        }
    }

    /// Set stat factors.
    #[must_use]
    pub fn with_multipliers(mut self, multipliers: StatMultipliers) -> Self {
        self.multipliers = multipliers;
        self
    }

    /// Set a moveset override.
    #[must_use]
    pub fn with_moveset(mut self, moveset: MovesetOverride) -> Self {
        self.moveset = Some(moveset);
        self
    }

    /// Set frame-data factors.
    #[must_use]
    pub fn with_frame_data(mut self, frame_data: FrameDataMultipliers) -> Self {
        self.frame_data = Some(frame_data);
        self
    }

    /// Set the duration (`None` for unbounded).
    #[must_use]
    pub fn with_duration(mut self, seconds: Option<f32>) -> Self {
        self.duration = seconds;
        self
    }

    /// Set the cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }

    /// Set activation gates.
    #[must_use]
    pub fn with_requirements(mut self, requirements: ActivationRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Revert early below an HP fraction.
    #[must_use]
    pub fn with_hp_threshold(mut self, fraction: f32) -> Self {
        self.ends_below_hp_fraction = Some(fraction);
        self
    }
}

// ============================================================================
// Controller
// ============================================================================

/// What an accepted activation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// A tier became active.
    Activated(u8),
    /// Level 0 was requested while transformed; the tier ended.
    Reverted(u8),
    /// Level 0 was requested at base; nothing to do.
    Unchanged,
}

/// Why a transformation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertReason {
    /// Countdown ran out.
    Expired,
    /// HP fell below the definition's threshold.
    LowHealth,
    /// Requested through level 0.
    Manual,
    /// Match ended.
    MatchEnd,
}

/// Transformation state of one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationController {
    definitions: Vec<TransformationDefinition>,
    unlocked_tier: u8,
    level: u8,
    remaining: Option<f32>,
    cooldown: f32,
}

impl TransformationController {
    /// Create a controller over a fighter's tiers with everything locked.
    #[must_use]
    pub fn new(definitions: Vec<TransformationDefinition>) -> Self {
        Self {
            definitions,
            unlocked_tier: 0,
            level: 0,
            remaining: None,
            cooldown: 0.0,
        }
    }

    /// Unlock tiers up to and including `tier`.
    #[must_use]
    pub fn with_unlocked_tier(mut self, tier: u8) -> Self {
        self.unlocked_tier = tier.min(MAX_LEVEL);
        self
    }

    /// Change the unlocked tier.
    pub fn set_unlocked_tier(&mut self, tier: u8) {
        self.unlocked_tier = tier.min(MAX_LEVEL);
    }

    /// Highest unlocked tier.
    #[must_use]
    pub const fn unlocked_tier(&self) -> u8 {
        self.unlocked_tier
    }

    /// Active tier (0 = base).
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Whether a tier is active.
    #[must_use]
    pub const fn is_transformed(&self) -> bool {
        self.level > 0
    }

    /// Seconds left in the active form.
    #[must_use]
    pub const fn remaining(&self) -> Option<f32> {
        self.remaining
    }

    /// Seconds left on the cooldown.
    #[must_use]
    pub const fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Definition of a tier.
    #[must_use]
    pub fn definition(&self, level: u8) -> Option<&TransformationDefinition> {
        self.definitions.iter().find(|d| d.level == level)
    }

    /// Definition of the active tier.
    #[must_use]
    pub fn active(&self) -> Option<&TransformationDefinition> {
        if self.level == 0 {
            None
        } else {
            self.definition(self.level)
        }
    }

    /// Stat factors in effect.
    #[must_use]
    pub fn multipliers(&self) -> StatMultipliers {
        self.active()
            .map_or(StatMultipliers::IDENTITY, |d| d.multipliers)
    }

    /// Frame-data factors in effect.
    #[must_use]
    pub fn frame_data(&self) -> FrameDataMultipliers {
        self.active()
            .and_then(|d| d.frame_data)
            .unwrap_or(FrameDataMultipliers::IDENTITY)
    }

    /// Moveset override in effect.
    #[must_use]
    pub fn moveset(&self) -> Option<&MovesetOverride> {
        self.active().and_then(|d| d.moveset.as_ref())
    }

    /// Check whether `level` could be activated now.
    pub fn check(&self, level: u8, meters: &Meters, combo_damage: f32) -> Result<(), Rejection> {
        if level == 0 {
            return Ok(());
        }
        if self.level > 0 {
            return Err(Rejection::AlreadyTransformed { level: self.level });
        }
        let Some(definition) = self.definition(level).filter(|_| level <= self.unlocked_tier)
        else {
            return Err(Rejection::TierLocked { level });
        };
        if self.cooldown > 0.0 {
            return Err(Rejection::OnCooldown {
                remaining: self.cooldown,
            });
        }

        let requirements = definition.requirements;
        if meters.synergy < requirements.min_meter {
            return Err(Rejection::InsufficientResource {
                resource: Resource::Synergy,
                required: requirements.min_meter,
                available: meters.synergy,
            });
        }
        if let Some(required) = requirements.min_combo_damage {
            if combo_damage < required {
                return Err(Rejection::InsufficientResource {
                    resource: Resource::ComboDamage,
                    required,
                    available: combo_damage,
                });
            }
        }
        Ok(())
    }

    /// Whether `level` could be activated now.
    #[must_use]
    pub fn can_activate(&self, level: u8, meters: &Meters, combo_damage: f32) -> bool {
        self.check(level, meters, combo_damage).is_ok()
    }

    /// Activate a tier, consuming the synergy meter. Level 0 reverts.
    pub fn activate(
        &mut self,
        level: u8,
        meters: &mut Meters,
        combo_damage: f32,
    ) -> Result<Activation, Rejection> {
        if level == 0 {
            return Ok(match self.revert(RevertReason::Manual) {
                Some(previous) => Activation::Reverted(previous),
                None => Activation::Unchanged,
            });
        }

        self.check(level, meters, combo_damage)?;
        let duration = self.definition(level).and_then(|d| d.duration);

        meters.set(Resource::Synergy, 0.0);
        self.level = level;
        self.remaining = duration;
        info!("Transformation level {} activated ({:?}s)", level, duration);
        Ok(Activation::Activated(level))
    }

    /// End the active tier; returns the tier that ended.
    pub fn revert(&mut self, reason: RevertReason) -> Option<u8> {
        if self.level == 0 {
            return None;
        }
        let previous = self.level;
        self.cooldown = self.active().map_or(0.0, |d| d.cooldown.max(0.0));
        self.level = 0;
        self.remaining = None;
        info!("Transformation level {} reverted ({:?})", previous, reason);
        Some(previous)
    }

    /// Count down the active form and the cooldown. Returns the tier and
    /// reason if the form ended this call.
    pub fn update(&mut self, dt: f32, hp_fraction: f32) -> Option<(u8, RevertReason)> {
        if self.level == 0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
            return None;
        }

        if let Some(threshold) = self.active().and_then(|d| d.ends_below_hp_fraction) {
            if hp_fraction < threshold {
                return self
                    .revert(RevertReason::LowHealth)
                    .map(|level| (level, RevertReason::LowHealth));
            }
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                debug!("Transformation countdown elapsed");
                return self
                    .revert(RevertReason::Expired)
                    .map(|level| (level, RevertReason::Expired));
            }
        }
        None
    }

    /// Drop the active form and cooldown (rematch). Unlocks are kept.
    pub fn reset(&mut self) {
        self.level = 0;
        self.remaining = None;
        self.cooldown = 0.0;
    }
}
