//! Hit resolution between attack hitboxes and combatant hurtboxes.
//!
//! Provides:
//! - Persistent spherical hurtboxes, one per registered combatant
//! - Ephemeral hitboxes, one per attacker, with a frame-based expiry
//! - Overlap tests, per-defender hit cooldown and per-hitbox struck lists
//! - Final damage and knockback from attacker/defender stats
//!
//! The engine never touches combatant HP. It only reads positions and emits
//! immutable [`HitResolved`] records for the match to apply.

use ahash::AHashMap;
use arena_common::{CombatantId, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::moves::MoveId;

/// Lower bound on the defense divisor.
const MIN_DEFENSE_DIVISOR: f32 = 0.7;

/// Default defender-side cooldown after being hit, in frames.
pub const DEFAULT_HIT_COOLDOWN_FRAMES: u32 = 6;

/// Default hurtbox radius.
pub const DEFAULT_HURTBOX_RADIUS: f32 = 0.5;

// ============================================================================
// Stats and Boxes
// ============================================================================

/// Stats read by hit resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitStats {
    /// Body weight (knockback resistance ratio).
    pub weight: f32,
    /// Attack power multiplier, within [0.8, 1.2].
    pub power: f32,
    /// Defense multiplier, within [0.8, 1.2].
    pub defense: f32,
}

impl Default for HitStats {
    fn default() -> Self {
        Self {
            weight: 100.0,
            power: 1.0,
            defense: 1.0,
        }
    }
}

impl HitStats {
    /// Create stats, clamping power and defense into [0.8, 1.2].
    #[must_use]
    pub fn new(weight: f32, power: f32, defense: f32) -> Self {
        Self {
            weight: weight.max(1.0),
            power: power.clamp(0.8, 1.2),
            defense: defense.clamp(0.8, 1.2),
        }
    }
}

/// Parameters of a hitbox, supplied by the attack state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxSpec {
    /// Owning combatant.
    pub attacker: CombatantId,
    /// Move that spawned the hitbox.
    pub move_id: MoveId,
    /// Damage before mitigation.
    pub damage: f32,
    /// World-space knockback.
    pub knockback: Vec3,
    /// World-space center.
    pub position: Vec3,
    /// Sphere radius.
    pub radius: f32,
    /// Frames the hitbox stays live.
    pub active_frames: u32,
    /// Hit-stop frames on contact.
    pub hit_stop_frames: u32,
    /// Hitstun frames inflicted.
    pub hitstun_frames: u32,
}

#[derive(Debug, Clone)]
struct LiveHitbox {
    spec: HitboxSpec,
    created_frame: u64,
    expiry_frame: u64,
    struck: Vec<CombatantId>,
}

#[derive(Debug, Clone)]
struct Hurtbox {
    owner: CombatantId,
    stats: HitStats,
    position: Vec3,
    radius: f32,
    cooldown_until: u64,
    hittable: bool,
}

/// A confirmed hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResolved {
    /// Attacking combatant.
    pub attacker: CombatantId,
    /// Defending combatant.
    pub defender: CombatantId,
    /// Move that landed.
    pub move_id: MoveId,
    /// Damage after power/defense.
    pub damage: f32,
    /// Knockback after defense/weight.
    pub knockback: Vec3,
    /// Contact point.
    pub position: Vec3,
    /// Hit-stop frames.
    pub hit_stop_frames: u32,
    /// Hitstun frames before combo scaling.
    pub hitstun_frames: u32,
    /// Engine frame on which the hit resolved.
    pub frame: u64,
}

/// Final damage for a hit.
#[must_use]
pub fn final_damage(base: f32, attacker: &HitStats, defender: &HitStats) -> f32 {
    base * attacker.power / (2.0 - defender.defense).max(MIN_DEFENSE_DIVISOR)
}

/// Final knockback for a hit.
#[must_use]
pub fn final_knockback(knockback: Vec3, attacker: &HitStats, defender: &HitStats) -> Vec3 {
    let ratio = (attacker.weight / defender.weight.max(f32::EPSILON)).clamp(0.5, 1.5);
    knockback * defender.defense * ratio
}

// ============================================================================
// Engine
// ============================================================================

/// Spatial hit-test engine.
#[derive(Debug, Clone)]
pub struct HitResolutionEngine {
    frame: u64,
    hurtboxes: Vec<Hurtbox>,
    index: AHashMap<CombatantId, usize>,
    hitboxes: Vec<LiveHitbox>,
    hit_cooldown_frames: u32,
}

impl Default for HitResolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HitResolutionEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: 0,
            hurtboxes: Vec::new(),
            index: AHashMap::new(),
            hitboxes: Vec::new(),
            hit_cooldown_frames: DEFAULT_HIT_COOLDOWN_FRAMES,
        }
    }

    /// Set the defender-side cooldown.
    #[must_use]
    pub fn with_hit_cooldown(mut self, frames: u32) -> Self {
        self.hit_cooldown_frames = frames;
        self
    }

    /// Current engine frame.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Register a combatant's hurtbox. Registering an id twice overwrites it.
    pub fn register_combatant(
        &mut self,
        id: CombatantId,
        stats: HitStats,
        position: Vec3,
        radius: f32,
    ) {
        let hurtbox = Hurtbox {
            owner: id,
            stats,
            position,
            radius: radius.max(0.0),
            cooldown_until: 0,
            hittable: true,
        };
        if let Some(&slot) = self.index.get(&id) {
            warn!("Combatant {} registered twice, overwriting hurtbox", id);
            self.hurtboxes[slot] = hurtbox;
        } else {
            self.index.insert(id, self.hurtboxes.len());
            self.hurtboxes.push(hurtbox);
        }
    }

    /// Whether an id is registered.
    #[must_use]
    pub fn is_registered(&self, id: CombatantId) -> bool {
        self.index.contains_key(&id)
    }

    /// Replace a combatant's stats (transformations).
    pub fn set_stats(&mut self, id: CombatantId, stats: HitStats) {
        if let Some(&slot) = self.index.get(&id) {
            self.hurtboxes[slot].stats = stats;
        }
    }

    /// Registered stats of a combatant.
    #[must_use]
    pub fn stats(&self, id: CombatantId) -> Option<HitStats> {
        self.index.get(&id).map(|&slot| self.hurtboxes[slot].stats)
    }

    /// Sync a hurtbox position.
    pub fn update_hurtbox(&mut self, id: CombatantId, position: Vec3) {
        match self.index.get(&id) {
            Some(&slot) => self.hurtboxes[slot].position = position,
            None => debug!("Hurtbox update for unregistered {}", id),
        }
    }

    /// Mark a hurtbox as intangible (invincibility, cinematics, KO).
    /// Intangible hurtboxes are skipped without consuming the hitbox.
    pub fn set_hittable(&mut self, id: CombatantId, hittable: bool) {
        if let Some(&slot) = self.index.get(&id) {
            self.hurtboxes[slot].hittable = hittable;
        }
    }

    /// Whether a hurtbox can currently be struck.
    #[must_use]
    pub fn is_hittable(&self, id: CombatantId) -> bool {
        self.index
            .get(&id)
            .is_some_and(|&slot| self.hurtboxes[slot].hittable)
    }

    /// Hurtbox position of a combatant.
    #[must_use]
    pub fn hurtbox_position(&self, id: CombatantId) -> Option<Vec3> {
        self.index.get(&id).map(|&slot| self.hurtboxes[slot].position)
    }

    /// Spawn a hitbox, replacing any live hitbox of the same attacker.
    pub fn create_hitbox(&mut self, spec: HitboxSpec) {
        self.hitboxes.retain(|h| h.spec.attacker != spec.attacker);
        let expiry_frame = self.frame + u64::from(spec.active_frames.max(1));
        debug!(
            "Hitbox {:?} for {} live until frame {}",
            spec.move_id, spec.attacker, expiry_frame
        );
        self.hitboxes.push(LiveHitbox {
            spec,
            created_frame: self.frame,
            expiry_frame,
            struck: Vec::new(),
        });
    }

    /// Remove an attacker's hitbox (attack cancelled).
    pub fn remove_hitbox(&mut self, attacker: CombatantId) {
        self.hitboxes.retain(|h| h.spec.attacker != attacker);
    }

    /// Whether an attacker has a live hitbox.
    #[must_use]
    pub fn has_hitbox(&self, attacker: CombatantId) -> bool {
        self.hitboxes.iter().any(|h| h.spec.attacker == attacker)
    }

    /// Number of live hitboxes.
    #[must_use]
    pub fn hitbox_count(&self) -> usize {
        self.hitboxes.len()
    }

    /// Frame a live hitbox was created on.
    #[must_use]
    pub fn hitbox_created_frame(&self, attacker: CombatantId) -> Option<u64> {
        self.hitboxes
            .iter()
            .find(|h| h.spec.attacker == attacker)
            .map(|h| h.created_frame)
    }

    /// Drop every hitbox.
    pub fn clear_hitboxes(&mut self) {
        self.hitboxes.clear();
    }

    /// Drop hitboxes, reset cooldowns and the frame counter. Registrations stay.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.hitboxes.clear();
        for hurtbox in &mut self.hurtboxes {
            hurtbox.cooldown_until = 0;
        }
    }

    /// Advance one frame: expire hitboxes, then resolve overlaps.
    ///
    /// Hitboxes are tested in creation order against hurtboxes in
    /// registration order, so results are reproducible.
    pub fn tick(&mut self) -> Vec<HitResolved> {
        self.frame += 1;
        let frame = self.frame;
        self.hitboxes.retain(|h| frame <= h.expiry_frame);

        let mut results = Vec::new();
        for hitbox in &mut self.hitboxes {
            let spec = hitbox.spec;
            let Some(attacker_stats) = self
                .index
                .get(&spec.attacker)
                .map(|&slot| self.hurtboxes[slot].stats)
            else {
                continue;
            };

            for hurtbox in &mut self.hurtboxes {
                if hurtbox.owner == spec.attacker
                    || !hurtbox.hittable
                    || frame < hurtbox.cooldown_until
                    || hitbox.struck.contains(&hurtbox.owner)
                {
                    continue;
                }

                let offset = hurtbox.position - spec.position;
                let reach = spec.radius + hurtbox.radius;
                if offset.length_squared() >= reach * reach {
                    continue;
                }

                let contact = spec.position + offset.normalize_or_zero() * spec.radius;
                let hit = HitResolved {
                    attacker: spec.attacker,
                    defender: hurtbox.owner,
                    move_id: spec.move_id,
                    damage: final_damage(spec.damage, &attacker_stats, &hurtbox.stats),
                    knockback: final_knockback(spec.knockback, &attacker_stats, &hurtbox.stats),
                    position: contact,
                    hit_stop_frames: spec.hit_stop_frames,
                    hitstun_frames: spec.hitstun_frames,
                    frame,
                };
                debug!(
                    "{} hit {} with {:?} for {:.1}",
                    hit.attacker, hit.defender, hit.move_id, hit.damage
                );

                hurtbox.cooldown_until = frame + u64::from(self.hit_cooldown_frames);
                hitbox.struck.push(hurtbox.owner);
                results.push(hit);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec(attacker: CombatantId, position: Vec3) -> HitboxSpec {
        HitboxSpec {
            attacker,
            move_id: MoveId::Light1,
            damage: 8.0,
            knockback: Vec3::new(1.0, 0.0, 0.0),
            position,
            radius: 0.6,
            active_frames: 5,
            hit_stop_frames: 3,
            hitstun_frames: 12,
        }
    }

    fn two_fighters() -> (HitResolutionEngine, CombatantId, CombatantId) {
        let mut engine = HitResolutionEngine::new();
        let a = CombatantId::new();
        let b = CombatantId::new();
        engine.register_combatant(a, HitStats::default(), Vec3::ZERO, 0.5);
        engine.register_combatant(b, HitStats::default(), Vec3::new(1.0, 0.0, 0.0), 0.5);
        (engine, a, b)
    }

    #[test]
    fn test_light1_damage_example() {
        let (mut engine, a, b) = two_fighters();
        engine.create_hitbox(spec(a, Vec3::new(0.9, 0.0, 0.0)));
        let hits = engine.tick();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].attacker, a);
        assert_eq!(hits[0].defender, b);
        assert!((hits[0].damage - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_damage_formula() {
        let strong = HitStats::new(100.0, 1.2, 1.0);
        let tough = HitStats::new(100.0, 1.0, 1.2);
        // 10 * 1.2 / (2 - 1.2) = 15
        assert!((final_damage(10.0, &strong, &tough) - 15.0).abs() < 1e-4);
        let weak = HitStats::new(100.0, 0.8, 0.8);
        // 10 * 1.0 / 1.2
        assert!((final_damage(10.0, &HitStats::default(), &weak) - 10.0 / 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_knockback_weight_ratio_clamped() {
        let heavy = HitStats::new(400.0, 1.0, 1.0);
        let light = HitStats::new(50.0, 1.0, 1.0);
        let kb = final_knockback(Vec3::new(2.0, 0.0, 0.0), &heavy, &light);
        assert!((kb.x - 3.0).abs() < 1e-6);
        let kb = final_knockback(Vec3::new(2.0, 0.0, 0.0), &light, &heavy);
        assert!((kb.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stats_clamped() {
        let stats = HitStats::new(100.0, 3.0, 0.1);
        assert_eq!(stats.power, 1.2);
        assert_eq!(stats.defense, 0.8);
    }

    #[test]
    fn test_no_overlap_no_hit() {
        let (mut engine, a, _) = two_fighters();
        engine.create_hitbox(spec(a, Vec3::new(-2.0, 0.0, 0.0)));
        assert!(engine.tick().is_empty());
    }

    #[test]
    fn test_one_hit_per_window() {
        let (mut engine, a, _) = two_fighters();
        let mut long = spec(a, Vec3::new(0.9, 0.0, 0.0));
        long.active_frames = 30;
        engine.create_hitbox(long);
        let total: usize = (0..30).map(|_| engine.tick().len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_defender_cooldown_blocks_second_attacker_window() {
        let (mut engine, a, _) = two_fighters();
        engine.create_hitbox(spec(a, Vec3::new(0.9, 0.0, 0.0)));
        assert_eq!(engine.tick().len(), 1);
        // New hitbox from the same attacker inside the cooldown.
        let mut second = spec(a, Vec3::new(0.9, 0.0, 0.0));
        second.active_frames = 10;
        engine.create_hitbox(second);
        assert!(engine.tick().is_empty());
        for _ in 0..4 {
            assert!(engine.tick().is_empty());
        }
        // Cooldown is over; the replacement hitbox is still live.
        assert_eq!(engine.tick().len(), 1);
    }

    #[test]
    fn test_hitbox_expires() {
        let (mut engine, a, _) = two_fighters();
        engine.create_hitbox(spec(a, Vec3::new(-5.0, 0.0, 0.0)));
        for _ in 0..5 {
            engine.tick();
            assert!(engine.has_hitbox(a));
        }
        engine.tick();
        assert!(!engine.has_hitbox(a));
    }

    #[test]
    fn test_replacement_hitbox_restamps_creation_frame() {
        let (mut engine, a, b) = two_fighters();
        assert_eq!(engine.hitbox_created_frame(a), None);
        engine.create_hitbox(spec(a, Vec3::new(-5.0, 0.0, 0.0)));
        assert_eq!(engine.hitbox_created_frame(a), Some(0));
        engine.tick();
        engine.tick();
        engine.create_hitbox(spec(a, Vec3::new(-5.0, 0.0, 0.0)));
        assert_eq!(engine.hitbox_count(), 1);
        assert_eq!(engine.hitbox_created_frame(a), Some(engine.frame()));
        assert_eq!(engine.hitbox_created_frame(b), None);
    }

    #[test]
    fn test_mutual_hits_both_resolve() {
        let (mut engine, a, b) = two_fighters();
        engine.create_hitbox(spec(a, Vec3::new(0.9, 0.0, 0.0)));
        engine.create_hitbox(spec(b, Vec3::new(0.1, 0.0, 0.0)));
        let hits = engine.tick();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].attacker, a);
        assert_eq!(hits[1].attacker, b);
    }

    #[test]
    fn test_intangible_defender_keeps_hitbox_live() {
        let (mut engine, a, b) = two_fighters();
        engine.set_hittable(b, false);
        engine.create_hitbox(spec(a, Vec3::new(0.9, 0.0, 0.0)));
        assert!(engine.tick().is_empty());
        assert!(engine.tick().is_empty());

        engine.set_hittable(b, true);
        assert!(engine.is_hittable(b));
        let hits = engine.tick();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].defender, b);
    }

    #[test]
    fn test_duplicate_registration_overwrites() {
        let (mut engine, a, _) = two_fighters();
        engine.register_combatant(a, HitStats::new(80.0, 1.1, 0.9), Vec3::ZERO, 0.5);
        assert_eq!(engine.stats(a).map(|s| s.weight), Some(80.0));
        assert_eq!(engine.hurtboxes.len(), 2);
    }

    #[test]
    fn test_contact_point_on_hitbox_surface() {
        let (mut engine, a, _) = two_fighters();
        engine.create_hitbox(spec(a, Vec3::new(0.2, 0.0, 0.0)));
        let hits = engine.tick();
        assert!((hits[0].position.x - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_id_queries() {
        let engine = HitResolutionEngine::new();
        let ghost = CombatantId::new();
        assert!(engine.stats(ghost).is_none());
        assert!(engine.hurtbox_position(ghost).is_none());
    }

    proptest! {
        #[test]
        fn prop_never_hits_self(
            x in -3.0f32..3.0,
            y in -3.0f32..3.0,
            radius in 0.1f32..4.0,
        ) {
            let mut engine = HitResolutionEngine::new();
            let a = CombatantId::new();
            let b = CombatantId::new();
            engine.register_combatant(a, HitStats::default(), Vec3::new(x, y, 0.0), 0.5);
            engine.register_combatant(b, HitStats::default(), Vec3::new(y, x, 0.0), 0.5);
            let mut hitbox = spec(a, Vec3::ZERO);
            hitbox.radius = radius;
            engine.create_hitbox(hitbox);
            for _ in 0..6 {
                prop_assert!(engine.tick().iter().all(|hit| hit.attacker != hit.defender));
            }
        }
    }
}
