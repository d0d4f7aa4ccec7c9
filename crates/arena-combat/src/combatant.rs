//! Fighter definitions and per-match combatant state.

use arena_common::{CombatantId, DataError, FighterId, SchemaVersion, Spatial, Vec3};
use serde::{Deserialize, Serialize};

use crate::attack_state::{AttackState, AttackStateMachine, InputOutcome, MoveContext};
use crate::chain::ComboChainGraph;
use crate::combo::{ComboTracker, Meters};
use crate::error::Rejection;
use crate::hit_resolution::{HitStats, HitboxSpec, DEFAULT_HURTBOX_RADIUS};
use crate::input::InputSymbol;
use crate::moves::{AttackMove, MoveId, MoveTable, MovesetOverride};
use crate::transformation::{
    Activation, TransformationController, TransformationDefinition, MAX_LEVEL,
};

// ============================================================================
// Fighter Definition
// ============================================================================

/// Base stats of a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterStats {
    /// Maximum HP.
    pub max_hp: f32,
    /// Body weight.
    pub weight: f32,
    /// Attack power multiplier, within [0.8, 1.2].
    pub power: f32,
    /// Defense multiplier, within [0.8, 1.2].
    pub defense: f32,
    /// Walk speed (units per second).
    pub walk_speed: f32,
    /// Jump power.
    pub jump_power: f32,
}

impl Default for FighterStats {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            weight: 100.0,
            power: 1.0,
            defense: 1.0,
            walk_speed: 5.0,
            jump_power: 10.0,
        }
    }
}

/// Static description of a fighter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterDefinition {
    /// Roster id.
    pub id: FighterId,
    /// Display name.
    pub name: String,
    /// Base stats.
    #[serde(default)]
    pub stats: FighterStats,
    /// Hurtbox radius.
    #[serde(default = "default_hurtbox_radius")]
    pub hurtbox_radius: f32,
    /// Fighter-specific move replacements.
    #[serde(default)]
    pub moveset: Option<MovesetOverride>,
    /// Transformation tiers.
    #[serde(default)]
    pub transformations: Vec<TransformationDefinition>,
}

fn default_hurtbox_radius() -> f32 {
    DEFAULT_HURTBOX_RADIUS
}

impl FighterDefinition {
    /// Create a fighter with default stats.
    #[must_use]
    pub fn new(id: FighterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stats: FighterStats::default(),
            hurtbox_radius: DEFAULT_HURTBOX_RADIUS,
            moveset: None,
            transformations: Vec::new(),
        }
    }

    /// Set base stats.
    #[must_use]
    pub fn with_stats(mut self, stats: FighterStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set a fighter-specific moveset.
    #[must_use]
    pub fn with_moveset(mut self, moveset: MovesetOverride) -> Self {
        self.moveset = Some(moveset);
        self
    }

    /// Add a transformation tier.
    #[must_use]
    pub fn with_transformation(mut self, definition: TransformationDefinition) -> Self {
        self.transformations.push(definition);
        self
    }

    /// Check stats and tiers.
    pub fn validate(&self) -> Result<(), DataError> {
        let invalid = |reason: &str| DataError::InvalidFighter {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        let stats = &self.stats;
        if !(stats.max_hp > 0.0 && stats.weight > 0.0) {
            return Err(invalid("max HP and weight must be positive"));
        }
        if !(0.8..=1.2).contains(&stats.power) || !(0.8..=1.2).contains(&stats.defense) {
            return Err(invalid("power and defense must be within [0.8, 1.2]"));
        }
        if self.hurtbox_radius <= 0.0 {
            return Err(invalid("hurtbox radius must be positive"));
        }
        for (i, tier) in self.transformations.iter().enumerate() {
            if tier.level == 0 || tier.level > MAX_LEVEL {
                return Err(invalid("transformation levels must be 1 or 2"));
            }
            if self.transformations[..i].iter().any(|t| t.level == tier.level) {
                return Err(invalid("transformation level defined twice"));
            }
            if let Some(moveset) = &tier.moveset {
                moveset.validate()?;
            }
        }
        if let Some(moveset) = &self.moveset {
            moveset.validate()?;
        }
        Ok(())
    }
}

/// Stats after transformation multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    /// Body weight.
    pub weight: f32,
    /// Attack power multiplier.
    pub power: f32,
    /// Defense multiplier.
    pub defense: f32,
    /// Walk speed.
    pub walk_speed: f32,
    /// Jump power.
    pub jump_power: f32,
}

impl EffectiveStats {
    /// Stats read by hit resolution.
    #[must_use]
    pub fn hit_stats(&self) -> HitStats {
        HitStats::new(self.weight, self.power, self.defense)
    }
}

// ============================================================================
// Combat Record
// ============================================================================

/// Per-match statistics handed to progression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatRecord {
    /// Hits landed.
    pub hits_landed: u32,
    /// Damage dealt after scaling.
    pub damage_dealt: f32,
    /// Damage taken.
    pub damage_taken: f32,
    /// Longest combo.
    pub best_combo: u32,
    /// Special and ultimate moves performed.
    pub specials_used: u32,
    /// Transformations activated.
    pub transformations_used: u32,
}

// ============================================================================
// Combatant
// ============================================================================

/// One fighter instance in a match.
#[derive(Debug, Clone)]
pub struct Combatant {
    id: CombatantId,
    definition: FighterDefinition,
    hp: f32,
    meters: Meters,
    machine: AttackStateMachine,
    combo: ComboTracker,
    transformation: TransformationController,
    invincibility_frames: u32,
    spatial: Spatial,
    record: CombatRecord,
}

impl Combatant {
    /// Create a combatant at full HP with empty meters.
    #[must_use]
    pub fn new(id: CombatantId, definition: FighterDefinition) -> Self {
        let transformation = TransformationController::new(definition.transformations.clone());
        Self {
            id,
            hp: definition.stats.max_hp,
            definition,
            meters: Meters::default(),
            machine: AttackStateMachine::new(),
            combo: ComboTracker::new(),
            transformation,
            invincibility_frames: 0,
            spatial: Spatial::default(),
            record: CombatRecord::default(),
        }
    }

    /// Place the combatant.
    #[must_use]
    pub fn with_spatial(mut self, spatial: Spatial) -> Self {
        self.spatial = spatial;
        self
    }

    /// Set the input buffer capacity.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.machine = self.machine.with_buffer_capacity(capacity);
        self
    }

    /// Unlock transformation tiers up to `tier`.
    #[must_use]
    pub fn with_unlocked_tier(mut self, tier: u8) -> Self {
        self.transformation.set_unlocked_tier(tier);
        self
    }

    // === Queries ===

    /// Combatant id.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    /// Fighter definition.
    #[must_use]
    pub fn definition(&self) -> &FighterDefinition {
        &self.definition
    }

    /// Current HP.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum HP.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.definition.stats.max_hp
    }

    /// HP as a fraction of max HP.
    #[must_use]
    pub fn hp_fraction(&self) -> f32 {
        self.hp / self.max_hp()
    }

    /// Whether HP reached zero.
    #[must_use]
    pub fn is_ko(&self) -> bool {
        self.hp <= 0.0
    }

    /// Meter values.
    #[must_use]
    pub const fn meters(&self) -> &Meters {
        &self.meters
    }

    /// Mutable meters (tests, scripted setups).
    pub fn meters_mut(&mut self) -> &mut Meters {
        &mut self.meters
    }

    /// Attack state machine.
    #[must_use]
    pub const fn machine(&self) -> &AttackStateMachine {
        &self.machine
    }

    /// Combo tracker.
    #[must_use]
    pub const fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    /// Transformation controller.
    #[must_use]
    pub const fn transformation(&self) -> &TransformationController {
        &self.transformation
    }

    /// Invincibility frames remaining.
    #[must_use]
    pub const fn invincibility_frames(&self) -> u32 {
        self.invincibility_frames
    }

    /// Spatial state.
    #[must_use]
    pub const fn spatial(&self) -> &Spatial {
        &self.spatial
    }

    /// Match statistics.
    #[must_use]
    pub const fn record(&self) -> &CombatRecord {
        &self.record
    }

    /// Stats with transformation multipliers applied.
    #[must_use]
    pub fn effective_stats(&self) -> EffectiveStats {
        let base = &self.definition.stats;
        let factors = self.transformation.multipliers();
        EffectiveStats {
            weight: base.weight * factors.weight,
            power: base.power * factors.attack_power,
            defense: base.defense * factors.defense,
            walk_speed: base.walk_speed * factors.speed,
            jump_power: base.jump_power * factors.jump,
        }
    }

    /// Whether an incoming hit would land.
    #[must_use]
    pub fn can_be_hit(&self) -> bool {
        !self.is_ko()
            && self.invincibility_frames == 0
            && self.machine.state() != AttackState::Transformation
    }

    /// Whether horizontal movement is locked.
    #[must_use]
    pub fn movement_locked(&self) -> bool {
        self.is_ko() || self.machine.movement_locked()
    }

    /// Effective record of a move for this combatant right now.
    #[must_use]
    pub fn resolve_move<'a>(&'a self, id: MoveId, table: &'a MoveTable) -> &'a AttackMove {
        self.transformation
            .moveset()
            .and_then(|moveset| moveset.get(id))
            .or_else(|| self.definition.moveset.as_ref().and_then(|m| m.get(id)))
            .unwrap_or_else(|| table.get(id))
    }

    /// Hitbox for a move, placed in front of the combatant.
    #[must_use]
    pub fn hitbox_spec(&self, id: MoveId, active_frames: u32, table: &MoveTable) -> HitboxSpec {
        let attack = self.resolve_move(id, table);
        let facing = self.spatial.facing;
        HitboxSpec {
            attacker: self.id,
            move_id: id,
            damage: attack.damage,
            knockback: facing.orient(attack.knockback),
            position: self.spatial.position + facing.orient(Vec3::new(attack.hitbox_reach, 0.0, 0.0)),
            radius: attack.hitbox_radius,
            active_frames,
            hit_stop_frames: attack.hit_stop,
            hitstun_frames: attack.hitstun,
        }
    }

    // === Attack Machine ===

    /// Feed an input to the attack machine.
    pub fn submit_input(
        &mut self,
        symbol: InputSymbol,
        table: &MoveTable,
        chains: &ComboChainGraph,
    ) -> InputOutcome {
        let mut ctx = MoveContext {
            table,
            chains,
            moveset: self.transformation.moveset(),
            fighter_moveset: self.definition.moveset.as_ref(),
            frame_data: self.transformation.frame_data(),
            meters: &mut self.meters,
            grounded: self.spatial.grounded,
        };
        self.machine.submit_input(symbol, &mut ctx)
    }

    /// Advance the attack machine.
    pub fn advance_machine(&mut self, dt: f32, table: &MoveTable, chains: &ComboChainGraph) {
        let mut ctx = MoveContext {
            table,
            chains,
            moveset: self.transformation.moveset(),
            fighter_moveset: self.definition.moveset.as_ref(),
            frame_data: self.transformation.frame_data(),
            meters: &mut self.meters,
            grounded: self.spatial.grounded,
        };
        self.machine.advance(dt, &mut ctx);
    }

    pub(crate) fn machine_mut(&mut self) -> &mut AttackStateMachine {
        &mut self.machine
    }

    pub(crate) fn combo_mut(&mut self) -> &mut ComboTracker {
        &mut self.combo
    }

    pub(crate) fn transformation_mut(&mut self) -> &mut TransformationController {
        &mut self.transformation
    }

    pub(crate) fn record_mut(&mut self) -> &mut CombatRecord {
        &mut self.record
    }

    /// Activate a transformation tier through the controller with this
    /// combatant's meters.
    pub(crate) fn activate_transformation(
        &mut self,
        level: u8,
    ) -> Result<Activation, Rejection> {
        let combo_damage = self.combo.damage();
        self.transformation
            .activate(level, &mut self.meters, combo_damage)
    }

    // === Mutation ===

    /// Subtract damage from HP (clamped at zero); returns the HP removed.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0.0)).clamp(0.0, self.max_hp());
        before - self.hp
    }

    /// Grant invincibility, keeping the longer of the old and new windows.
    pub fn grant_invincibility(&mut self, frames: u32) {
        self.invincibility_frames = self.invincibility_frames.max(frames);
    }

    /// Count down per-frame timers.
    pub(crate) fn tick_invincibility(&mut self) {
        self.invincibility_frames = self.invincibility_frames.saturating_sub(1);
    }

    /// Replace spatial state (movement layer).
    pub fn set_spatial(&mut self, spatial: Spatial) {
        self.spatial = spatial;
    }

    /// Mutable spatial state.
    pub fn spatial_mut(&mut self) -> &mut Spatial {
        &mut self.spatial
    }

    /// Restore full HP, empty meters and idle state. Unlocks are kept.
    pub fn reset(&mut self, spatial: Spatial) {
        self.hp = self.max_hp();
        self.meters = Meters::default();
        self.machine.reset();
        self.combo.reset();
        self.transformation.reset();
        self.invincibility_frames = 0;
        self.spatial = spatial;
        self.record = CombatRecord::default();
    }

    /// Plain serializable view of this combatant.
    #[must_use]
    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            version: SchemaVersion::COMBATANT_SNAPSHOT,
            id: self.id,
            fighter: self.definition.id,
            name: self.definition.name.clone(),
            hp: self.hp,
            max_hp: self.max_hp(),
            meters: self.meters,
            transformation_level: self.transformation.level(),
            transformation_remaining: self.transformation.remaining(),
            hitstun_frames: self.machine.hitstun_frames(),
            invincibility_frames: self.invincibility_frames,
            attack_state: self.machine.state(),
            current_move: self.machine.current().map(|attack| attack.move_id),
            combo_count: self.combo.count(),
            combo_damage: self.combo.damage(),
            spatial: self.spatial,
            record: self.record.clone(),
        }
    }
}

/// Serializable state of one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    /// Snapshot schema version.
    pub version: SchemaVersion,
    /// Combatant id.
    pub id: CombatantId,
    /// Fighter roster id.
    pub fighter: FighterId,
    /// Fighter name.
    pub name: String,
    /// Current HP.
    pub hp: f32,
    /// Maximum HP.
    pub max_hp: f32,
    /// Meter values.
    pub meters: Meters,
    /// Active transformation tier.
    pub transformation_level: u8,
    /// Seconds left in the active form.
    pub transformation_remaining: Option<f32>,
    /// Hitstun frames remaining.
    pub hitstun_frames: u32,
    /// Invincibility frames remaining.
    pub invincibility_frames: u32,
    /// Attack state.
    pub attack_state: AttackState,
    /// Move in progress.
    pub current_move: Option<MoveId>,
    /// Running combo count.
    pub combo_count: u32,
    /// Running combo damage.
    pub combo_damage: f32,
    /// Spatial state.
    pub spatial: Spatial,
    /// Match statistics.
    pub record: CombatRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::StatMultipliers;
    use arena_common::Facing;

    fn fighter() -> FighterDefinition {
        FighterDefinition::new(FighterId::new(1), "Kael").with_transformation(
            TransformationDefinition::new(1, "Ascended").with_multipliers(StatMultipliers {
                attack_power: 1.1,
                weight: 1.5,
                ..StatMultipliers::IDENTITY
            }),
        )
    }

    #[test]
    fn test_new_combatant_full_hp() {
        let combatant = Combatant::new(CombatantId::new(), fighter());
        assert_eq!(combatant.hp(), 100.0);
        assert_eq!(combatant.meters().total(), 0.0);
        assert!(combatant.can_be_hit());
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut combatant = Combatant::new(CombatantId::new(), fighter());
        assert_eq!(combatant.apply_damage(30.0), 30.0);
        assert_eq!(combatant.apply_damage(500.0), 70.0);
        assert_eq!(combatant.hp(), 0.0);
        assert!(combatant.is_ko());
        assert!(!combatant.can_be_hit());
        assert_eq!(combatant.apply_damage(-10.0), 0.0);
    }

    #[test]
    fn test_effective_stats_follow_transformation() {
        let mut combatant = Combatant::new(CombatantId::new(), fighter()).with_unlocked_tier(1);
        combatant.meters_mut().synergy = 100.0;
        combatant.activate_transformation(1).expect("activate");
        let stats = combatant.effective_stats();
        assert!((stats.power - 1.1).abs() < 1e-6);
        assert!((stats.weight - 150.0).abs() < 1e-4);
    }

    #[test]
    fn test_hitbox_faces_forward() {
        let table = MoveTable::standard();
        let spatial = Spatial::at(Vec3::new(2.0, 0.0, 0.0), Facing::Left);
        let combatant = Combatant::new(CombatantId::new(), fighter()).with_spatial(spatial);
        let spec = combatant.hitbox_spec(MoveId::Light5, 6, &table);
        assert!(spec.position.x < 2.0);
        assert!(spec.knockback.x < 0.0);
        assert_eq!(spec.damage, 14.0);
    }

    #[test]
    fn test_fighter_moveset_overrides_table() {
        let table = MoveTable::standard();
        let heavy = table.get(MoveId::Heavy1).clone();
        let stronger = crate::moves::AttackMove {
            damage: 30.0,
            ..heavy
        };
        let definition = fighter().with_moveset(MovesetOverride::new().with_move(stronger));
        let combatant = Combatant::new(CombatantId::new(), definition);
        assert_eq!(combatant.resolve_move(MoveId::Heavy1, &table).damage, 30.0);
        assert_eq!(combatant.resolve_move(MoveId::Light1, &table).damage, 8.0);
    }

    #[test]
    fn test_validate_rejects_bad_tiers() {
        let definition = fighter().with_transformation(TransformationDefinition::new(1, "Again"));
        assert!(matches!(
            definition.validate(),
            Err(DataError::InvalidFighter { .. })
        ));
        assert!(fighter().validate().is_ok());
    }

    #[test]
    fn test_snapshot_serializes() {
        let combatant = Combatant::new(CombatantId::new(), fighter());
        let snapshot = combatant.snapshot();
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: CombatantSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
        assert_eq!(back.version, SchemaVersion::COMBATANT_SNAPSHOT);
    }
}
