//! Combo counting, damage scaling and meters.
//!
//! Tracks:
//! - The running combo (count, scaled damage, timeout)
//! - Special, ultimate and synergy meters with hit gains and passive drift

use serde::{Deserialize, Serialize};

use crate::config::{ComboTuning, MeterTuning};
use crate::error::{Rejection, Resource};
use crate::moves::MeterCost;

/// Upper bound of every meter.
pub const METER_MAX: f32 = 100.0;

/// Timeout values at or below this count as expired.
const TIMEOUT_EPSILON: f32 = 1e-6;

const SCALE_EPSILON: f32 = 1e-4;

// ============================================================================
// Meters
// ============================================================================

/// Meter values, each within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Meters {
    /// Special meter.
    pub special: f32,
    /// Ultimate meter.
    pub ultimate: f32,
    /// Synergy (transformation) meter.
    pub synergy: f32,
}

impl Meters {
    /// Value of one meter. Combo damage is not a meter and reads as zero.
    #[must_use]
    pub fn get(&self, resource: Resource) -> f32 {
        match resource {
            Resource::Special => self.special,
            Resource::Ultimate => self.ultimate,
            Resource::Synergy => self.synergy,
            Resource::ComboDamage => 0.0,
        }
    }

    fn slot(&mut self, resource: Resource) -> Option<&mut f32> {
        match resource {
            Resource::Special => Some(&mut self.special),
            Resource::Ultimate => Some(&mut self.ultimate),
            Resource::Synergy => Some(&mut self.synergy),
            Resource::ComboDamage => None,
        }
    }

    /// Add (or subtract) from a meter, clamped to [0, 100].
    pub fn add(&mut self, resource: Resource, amount: f32) {
        if let Some(slot) = self.slot(resource) {
            *slot = (*slot + amount).clamp(0.0, METER_MAX);
        }
    }

    /// Set a meter, clamped to [0, 100].
    pub fn set(&mut self, resource: Resource, value: f32) {
        if let Some(slot) = self.slot(resource) {
            *slot = value.clamp(0.0, METER_MAX);
        }
    }

    /// Sum of all meters (time-limit tiebreak).
    #[must_use]
    pub fn total(&self) -> f32 {
        self.special + self.ultimate + self.synergy
    }

    /// Whether the meters cover a move cost.
    #[must_use]
    pub fn can_afford(&self, cost: &MeterCost) -> bool {
        self.check_cost(cost).is_ok()
    }

    /// Check a move cost, naming the first meter that falls short.
    pub fn check_cost(&self, cost: &MeterCost) -> Result<(), Rejection> {
        for (resource, required) in [
            (Resource::Special, cost.special),
            (Resource::Ultimate, cost.ultimate),
        ] {
            let available = self.get(resource);
            if required > 0.0 && available < required {
                return Err(Rejection::InsufficientResource {
                    resource,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Deduct a move cost (clamped at zero).
    pub fn spend(&mut self, cost: &MeterCost) {
        self.add(Resource::Special, -cost.special);
        self.add(Resource::Ultimate, -cost.ultimate);
    }

    /// Gain meter from a landed hit.
    pub fn gain_from_hit(&mut self, hit: &ComboHit, synergy_allowed: bool, tuning: &MeterTuning) {
        self.add(Resource::Special, hit.scaled_damage * tuning.special_gain);
        self.add(Resource::Ultimate, hit.scaled_damage * tuning.ultimate_gain);
        if synergy_allowed {
            self.add(
                Resource::Synergy,
                hit.scaled_damage * tuning.synergy_gain + hit.synergy_bonus,
            );
        }
    }

    /// Passive drift: special and ultimate regenerate, synergy decays while
    /// no combo is running.
    pub fn passive(&mut self, dt: f32, combo_running: bool, tuning: &MeterTuning) {
        self.add(Resource::Special, tuning.special_regen * dt);
        self.add(Resource::Ultimate, tuning.ultimate_regen * dt);
        if !combo_running {
            self.add(Resource::Synergy, -tuning.synergy_decay * dt);
        }
    }
}

// ============================================================================
// Combo Tracker
// ============================================================================

/// Outcome of registering one combo hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboHit {
    /// Combo count after this hit.
    pub count: u32,
    /// Damage scale applied to this hit.
    pub scale: f32,
    /// Floored scaled damage.
    pub scaled_damage: f32,
    /// Bonus synergy earned by this hit (every Nth hit).
    pub synergy_bonus: f32,
}

/// A combo that ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroppedCombo {
    /// Hits in the combo.
    pub count: u32,
    /// Scaled damage dealt.
    pub damage: f32,
}

/// Damage scale for a hit given the hits already in the combo.
#[must_use]
pub fn combo_scale(prior_hits: u32, tuning: &ComboTuning) -> f32 {
    (1.0 - prior_hits as f32 * tuning.decay_per_hit).max(tuning.min_scale)
}

/// Floored damage after combo scaling.
#[must_use]
pub fn scaled_damage(raw_damage: f32, scale: f32) -> f32 {
    // Nudge past float error so 10 * 0.9 floors to 9, not 8.
    (raw_damage * scale + SCALE_EPSILON).floor().max(0.0)
}

/// Hitstun scaled by the combo multiplier, at least one frame.
#[must_use]
pub fn scaled_hitstun(frames: u32, scale: f32) -> u32 {
    ((frames as f32 * scale).round() as u32).max(1)
}

/// Running combo of one attacker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboTracker {
    count: u32,
    damage: f32,
    timeout: f32,
    best_count: u32,
    best_damage: f32,
}

impl ComboTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current combo count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Accumulated scaled damage.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Seconds left before the combo drops.
    #[must_use]
    pub const fn timeout(&self) -> f32 {
        self.timeout
    }

    /// Longest combo this match.
    #[must_use]
    pub const fn best_count(&self) -> u32 {
        self.best_count
    }

    /// Most damage in one combo this match.
    #[must_use]
    pub const fn best_damage(&self) -> f32 {
        self.best_damage
    }

    /// Whether a combo is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.count > 0
    }

    /// Register a landed hit with its pre-scaling damage.
    pub fn register_hit(&mut self, raw_damage: f32, tuning: &ComboTuning) -> ComboHit {
        let scale = combo_scale(self.count, tuning);
        let scaled_damage = scaled_damage(raw_damage, scale);

        self.count += 1;
        self.damage += scaled_damage;
        self.timeout = tuning.timeout;
        self.best_count = self.best_count.max(self.count);
        self.best_damage = self.best_damage.max(self.damage);

        let synergy_bonus = if self.count % tuning.bonus_interval.max(1) == 0 {
            tuning.bonus_synergy
        } else {
            0.0
        };

        ComboHit {
            count: self.count,
            scale,
            scaled_damage,
            synergy_bonus,
        }
    }

    /// Count down the timeout; returns the combo if it dropped.
    pub fn tick(&mut self, dt: f32) -> Option<DroppedCombo> {
        if self.count == 0 {
            return None;
        }
        self.timeout -= dt;
        if self.timeout <= TIMEOUT_EPSILON {
            self.drop_combo()
        } else {
            None
        }
    }

    /// End the combo immediately (the attacker was hit).
    pub fn drop_combo(&mut self) -> Option<DroppedCombo> {
        if self.count == 0 {
            return None;
        }
        let dropped = DroppedCombo {
            count: self.count,
            damage: self.damage,
        };
        self.count = 0;
        self.damage = 0.0;
        self.timeout = 0.0;
        Some(dropped)
    }

    /// Clear everything including bests.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FRAME_DT;
    use proptest::prelude::*;

    #[test]
    fn test_first_hit_unscaled() {
        let mut combo = ComboTracker::new();
        let hit = combo.register_hit(8.0, &ComboTuning::default());
        assert_eq!(hit.scale, 1.0);
        assert_eq!(hit.scaled_damage, 8.0);
        assert_eq!(combo.count(), 1);
    }

    #[test]
    fn test_light_string_scaling() {
        let tuning = ComboTuning::default();
        let mut combo = ComboTracker::new();
        let mut last = None;
        for raw in [8.0, 9.0, 10.0, 11.0, 14.0] {
            last = Some(combo.register_hit(raw, &tuning));
        }
        let fifth = last.expect("hit");
        assert_eq!(combo.count(), 5);
        assert!((fifth.scale - 0.8).abs() < 1e-6);
        assert_eq!(fifth.scaled_damage, 11.0);
        // 8 + 8 + 9 + 9 + 11
        assert_eq!(combo.damage(), 45.0);
        assert_eq!(fifth.synergy_bonus, 20.0);
    }

    #[test]
    fn test_scale_floor() {
        let tuning = ComboTuning::default();
        assert!((combo_scale(14, &tuning) - 0.3).abs() < 1e-6);
        assert!((combo_scale(40, &tuning) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_hitstun_minimum() {
        assert_eq!(scaled_hitstun(12, 0.8), 10);
        assert_eq!(scaled_hitstun(1, 0.3), 1);
    }

    #[test]
    fn test_drop_on_timeout() {
        let tuning = ComboTuning::default();
        let mut combo = ComboTracker::new();
        combo.register_hit(10.0, &tuning);
        assert!(combo.tick(1.0).is_none());
        let dropped = combo.tick(1.0).expect("dropped");
        assert_eq!(dropped.count, 1);
        assert_eq!(combo.count(), 0);
        assert_eq!(combo.damage(), 0.0);
        assert_eq!(combo.best_count(), 1);
    }

    #[test]
    fn test_meter_clamp_and_cost() {
        let mut meters = Meters::default();
        meters.add(Resource::Special, 150.0);
        assert_eq!(meters.special, METER_MAX);
        assert!(meters.can_afford(&MeterCost::special(50.0)));
        assert!(!meters.can_afford(&MeterCost::ultimate(100.0)));
        meters.spend(&MeterCost::special(50.0));
        assert_eq!(meters.special, 50.0);
        let err = meters.check_cost(&MeterCost::ultimate(100.0));
        assert!(matches!(
            err,
            Err(Rejection::InsufficientResource {
                resource: Resource::Ultimate,
                ..
            })
        ));
    }

    #[test]
    fn test_synergy_gated() {
        let tuning = MeterTuning::default();
        let hit = ComboHit {
            count: 5,
            scale: 0.8,
            scaled_damage: 10.0,
            synergy_bonus: 20.0,
        };
        let mut meters = Meters::default();
        meters.gain_from_hit(&hit, false, &tuning);
        assert_eq!(meters.synergy, 0.0);
        assert_eq!(meters.special, 5.0);
        meters.gain_from_hit(&hit, true, &tuning);
        assert_eq!(meters.synergy, 22.5);
    }

    #[test]
    fn test_passive_drift() {
        let tuning = MeterTuning::default();
        let mut meters = Meters {
            special: 0.0,
            ultimate: 0.0,
            synergy: 10.0,
        };
        meters.passive(2.0, false, &tuning);
        assert_eq!(meters.special, 2.0);
        assert_eq!(meters.ultimate, 1.0);
        assert_eq!(meters.synergy, 9.0);
        meters.passive(2.0, true, &tuning);
        assert_eq!(meters.synergy, 9.0);
    }

    proptest! {
        #[test]
        fn prop_decay_monotonic(raw in 1.0f32..200.0, count in 0u32..40) {
            let tuning = ComboTuning::default();
            let now = scaled_damage(raw, combo_scale(count, &tuning));
            let next = scaled_damage(raw, combo_scale(count + 1, &tuning));
            prop_assert!(next <= now);
            prop_assert!(next >= (raw * 0.3).floor() - 1.0);
        }

        #[test]
        fn prop_timeout_resets(hits in 1usize..30, raw in 1.0f32..50.0) {
            let tuning = ComboTuning::default();
            let mut combo = ComboTracker::new();
            for _ in 0..hits {
                combo.register_hit(raw, &tuning);
            }
            let frames = (tuning.timeout / FRAME_DT).ceil() as usize;
            for _ in 0..frames {
                combo.tick(FRAME_DT);
            }
            combo.tick(FRAME_DT);
            prop_assert_eq!(combo.count(), 0);
            prop_assert_eq!(combo.damage(), 0.0);
        }
    }
}
