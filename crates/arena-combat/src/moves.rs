//! Static attack data.
//!
//! This module provides:
//! - The closed set of move identifiers
//! - Move categories and their derived flags
//! - Per-move frame data, damage, hitstun and knockback
//! - Phase timing derived from a move and frame-data multipliers
//! - A validated lookup table, built in code or loaded from RON

use arena_common::{DataError, SchemaVersion, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Move Identifiers
// ============================================================================

/// Identifier of an attack move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveId {
    /// First light hit.
    Light1,
    /// Second light hit.
    Light2,
    /// Third light hit.
    Light3,
    /// Fourth light hit.
    Light4,
    /// Light string finisher.
    Light5,
    /// First heavy hit.
    Heavy1,
    /// Heavy follow-up.
    Heavy2,
    /// Grounded launcher.
    Launcher,
    /// First aerial light.
    AirLight1,
    /// Second aerial light.
    AirLight2,
    /// Third aerial light.
    AirLight3,
    /// Aerial heavy.
    AirHeavy,
    /// Aerial slam that forces grounding.
    Slam,
    /// Special attack (costs special meter).
    Special,
    /// Ultimate attack (costs ultimate meter).
    Ultimate,
    /// Dodge with invincibility.
    Dodge,
}

impl MoveId {
    /// Number of moves.
    pub const COUNT: usize = 16;

    /// All moves in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Light1,
        Self::Light2,
        Self::Light3,
        Self::Light4,
        Self::Light5,
        Self::Heavy1,
        Self::Heavy2,
        Self::Launcher,
        Self::AirLight1,
        Self::AirLight2,
        Self::AirLight3,
        Self::AirHeavy,
        Self::Slam,
        Self::Special,
        Self::Ultimate,
        Self::Dodge,
    ];

    /// Index into per-move arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for MoveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

// ============================================================================
// Move Categories
// ============================================================================

/// Broad category of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveCategory {
    /// Fast grounded strike.
    Light,
    /// Slow grounded strike.
    Heavy,
    /// Airborne strike.
    Aerial,
    /// Sends the defender airborne.
    Launcher,
    /// Airborne strike that ends on the ground.
    Slam,
    /// Meter-costing special.
    Special,
    /// Meter-costing ultimate.
    Ultimate,
    /// Non-damaging utility (dodge).
    Utility,
}

impl MoveCategory {
    /// Whether horizontal movement is locked until the cancel window opens.
    #[must_use]
    pub const fn locks_movement(self) -> bool {
        matches!(self, Self::Heavy | Self::Special | Self::Ultimate)
    }

    /// Whether moves of this category are performed in the air.
    #[must_use]
    pub const fn is_airborne(self) -> bool {
        matches!(self, Self::Aerial | Self::Slam)
    }

    /// Whether moves of this category spawn a hitbox.
    #[must_use]
    pub const fn deals_damage(self) -> bool {
        !matches!(self, Self::Utility)
    }
}

// ============================================================================
// Meter Cost
// ============================================================================

/// Meter consumed when a move starts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeterCost {
    /// Special meter cost.
    #[serde(default)]
    pub special: f32,
    /// Ultimate meter cost.
    #[serde(default)]
    pub ultimate: f32,
}

impl MeterCost {
    /// No cost.
    pub const FREE: Self = Self {
        special: 0.0,
        ultimate: 0.0,
    };

    /// Cost in special meter.
    #[must_use]
    pub const fn special(amount: f32) -> Self {
        Self {
            special: amount,
            ultimate: 0.0,
        }
    }

    /// Cost in ultimate meter.
    #[must_use]
    pub const fn ultimate(amount: f32) -> Self {
        Self {
            special: 0.0,
            ultimate: amount,
        }
    }

    /// Whether the move costs anything.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.special <= 0.0 && self.ultimate <= 0.0
    }
}

// ============================================================================
// Attack Move
// ============================================================================

/// Static data for one move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackMove {
    /// Move identifier.
    pub id: MoveId,
    /// Move category.
    pub category: MoveCategory,
    /// Base damage before mitigation.
    pub damage: f32,
    /// Total duration in seconds.
    pub duration: f32,
    /// Fraction of the duration after which a cancel is legal.
    pub cancel_window: f32,
    /// Hitstun inflicted, in frames.
    pub hitstun: u32,
    /// Knockback, forward-relative (x forward, y up).
    pub knockback: Vec3,
    /// Hit-stop frames on contact.
    #[serde(default = "default_hit_stop")]
    pub hit_stop: u32,
    /// Hitbox radius.
    #[serde(default = "default_hitbox_radius")]
    pub hitbox_radius: f32,
    /// Hitbox distance in front of the attacker.
    #[serde(default = "default_hitbox_reach")]
    pub hitbox_reach: f32,
    /// Meter consumed on start.
    #[serde(default)]
    pub cost: MeterCost,
}

fn default_hit_stop() -> u32 {
    4
}

fn default_hitbox_radius() -> f32 {
    0.6
}

fn default_hitbox_reach() -> f32 {
    0.9
}

impl AttackMove {
    /// Create a move with default hitbox geometry and no cost.
    #[must_use]
    pub fn new(id: MoveId, category: MoveCategory, damage: f32, duration: f32) -> Self {
        Self {
            id,
            category,
            damage,
            duration,
            cancel_window: 0.6,
            hitstun: 12,
            knockback: Vec3::new(1.0, 0.0, 0.0),
            hit_stop: default_hit_stop(),
            hitbox_radius: default_hitbox_radius(),
            hitbox_reach: default_hitbox_reach(),
            cost: MeterCost::FREE,
        }
    }

    /// Set the cancel window fraction.
    #[must_use]
    pub fn with_cancel_window(mut self, fraction: f32) -> Self {
        self.cancel_window = fraction;
        self
    }

    /// Set hitstun frames.
    #[must_use]
    pub fn with_hitstun(mut self, frames: u32) -> Self {
        self.hitstun = frames;
        self
    }

    /// Set forward-relative knockback.
    #[must_use]
    pub fn with_knockback(mut self, forward: f32, up: f32) -> Self {
        self.knockback = Vec3::new(forward, up, 0.0);
        self
    }

    /// Set hit-stop frames.
    #[must_use]
    pub fn with_hit_stop(mut self, frames: u32) -> Self {
        self.hit_stop = frames;
        self
    }

    /// Set hitbox geometry.
    #[must_use]
    pub fn with_hitbox(mut self, radius: f32, reach: f32) -> Self {
        self.hitbox_radius = radius;
        self.hitbox_reach = reach;
        self
    }

    /// Set meter cost.
    #[must_use]
    pub fn with_cost(mut self, cost: MeterCost) -> Self {
        self.cost = cost;
        self
    }

    /// Whether this move sends the defender airborne.
    #[must_use]
    pub fn is_launcher(&self) -> bool {
        self.category == MoveCategory::Launcher
    }

    /// Whether this move is performed in the air.
    #[must_use]
    pub fn is_aerial(&self) -> bool {
        self.category.is_airborne()
    }

    /// Whether this move forces grounding.
    #[must_use]
    pub fn is_slam(&self) -> bool {
        self.category == MoveCategory::Slam
    }

    fn validate(&self) -> Result<(), DataError> {
        let reason = if !(self.duration.is_finite() && self.duration > 0.0) {
            Some("duration must be positive")
        } else if !(0.0..=1.0).contains(&self.cancel_window) {
            Some("cancel window must be within [0, 1]")
        } else if !(self.damage.is_finite() && self.damage >= 0.0) {
            Some("damage must be non-negative")
        } else if self.hitbox_radius <= 0.0 {
            Some("hitbox radius must be positive")
        } else if self.cost.special < 0.0 || self.cost.ultimate < 0.0 {
            Some("cost must be non-negative")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(DataError::InvalidMove {
                id: self.id.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Frame Data
// ============================================================================

/// Fraction of a move's duration at which STARTUP ends.
pub const STARTUP_END: f32 = 0.2;

/// Fraction of a move's duration at which ACTIVE ends.
pub const ACTIVE_END: f32 = 0.6;

/// Multipliers applied to phase lengths (transformations override these).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDataMultipliers {
    /// Startup phase length multiplier.
    pub startup: f32,
    /// Active phase length multiplier.
    pub active: f32,
    /// Recovery phase length multiplier.
    pub recovery: f32,
    /// Playback speed (higher is faster).
    pub animation_speed: f32,
}

impl Default for FrameDataMultipliers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FrameDataMultipliers {
    /// Unchanged frame data.
    pub const IDENTITY: Self = Self {
        startup: 1.0,
        active: 1.0,
        recovery: 1.0,
        animation_speed: 1.0,
    };
}

/// Phase lengths for one instance of a move, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    /// Startup length.
    pub startup: f32,
    /// Active length.
    pub active: f32,
    /// Recovery length.
    pub recovery: f32,
    /// Elapsed time at which cancels become legal.
    pub cancel_at: f32,
}

impl PhaseTimings {
    /// Compute timings for a move under frame-data multipliers.
    #[must_use]
    pub fn for_move(attack: &AttackMove, frame_data: &FrameDataMultipliers) -> Self {
        let speed = frame_data.animation_speed.max(0.1);
        let startup = attack.duration * STARTUP_END * frame_data.startup.max(0.0) / speed;
        let active = (attack.duration * (ACTIVE_END - STARTUP_END) * frame_data.active / speed)
            .max(f32::EPSILON);
        let recovery = attack.duration * (1.0 - ACTIVE_END) * frame_data.recovery.max(0.0) / speed;
        let total = startup + active + recovery;
        Self {
            startup,
            active,
            recovery,
            cancel_at: total * attack.cancel_window,
        }
    }

    /// Total length.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.startup + self.active + self.recovery
    }

    /// Elapsed time at which ACTIVE begins.
    #[must_use]
    pub fn active_start(&self) -> f32 {
        self.startup
    }

    /// Elapsed time at which RECOVERY begins.
    #[must_use]
    pub fn recovery_start(&self) -> f32 {
        self.startup + self.active
    }
}

// ============================================================================
// Move Table
// ============================================================================

/// On-disk form of a move table.
#[derive(Debug, Serialize, Deserialize)]
struct MoveDocument {
    version: SchemaVersion,
    moves: Vec<AttackMove>,
}

/// Lookup table with exactly one entry per [`MoveId`].
#[derive(Debug, Clone, PartialEq)]
pub struct MoveTable {
    moves: Vec<AttackMove>,
}

impl Default for MoveTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl MoveTable {
    /// Build a table from records, validating coverage and values.
    pub fn from_moves(records: Vec<AttackMove>) -> Result<Self, DataError> {
        let mut slots: Vec<Option<AttackMove>> = vec![None; MoveId::COUNT];
        for record in records {
            record.validate()?;
            let slot = &mut slots[record.id.index()];
            if slot.is_some() {
                return Err(DataError::DuplicateMove(record.id.to_string()));
            }
            *slot = Some(record);
        }

        let mut moves = Vec::with_capacity(MoveId::COUNT);
        for (id, slot) in MoveId::ALL.iter().zip(slots) {
            match slot {
                Some(record) => moves.push(record),
                None => return Err(DataError::MissingMove(id.to_string())),
            }
        }
        Ok(Self { moves })
    }

    /// Parse and validate a table from a versioned RON document.
    pub fn from_ron(text: &str) -> Result<Self, DataError> {
        let document: MoveDocument = ron::from_str(text)?;
        if !SchemaVersion::MOVE_DATA.can_read(&document.version) {
            return Err(DataError::UnsupportedVersion {
                found: document.version.to_string(),
                supported: SchemaVersion::MOVE_DATA.to_string(),
            });
        }
        Self::from_moves(document.moves)
    }

    /// Serialize the table to RON, stamped with the move data version.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        let document = MoveDocument {
            version: SchemaVersion::MOVE_DATA,
            moves: self.moves.clone(),
        };
        ron::ser::to_string_pretty(&document, ron::ser::PrettyConfig::default())
    }

    /// Look up a move.
    #[must_use]
    pub fn get(&self, id: MoveId) -> &AttackMove {
        &self.moves[id.index()]
    }

    /// Iterate all moves in table order.
    pub fn iter(&self) -> impl Iterator<Item = &AttackMove> {
        self.moves.iter()
    }

    /// The built-in move set.
    #[must_use]
    pub fn standard() -> Self {
        use MoveCategory as C;
        use MoveId as M;

        let records = vec![
            AttackMove::new(M::Light1, C::Light, 8.0, 0.30)
                .with_cancel_window(0.5)
                .with_hitstun(12)
                .with_knockback(1.0, 0.0)
                .with_hit_stop(3),
            AttackMove::new(M::Light2, C::Light, 9.0, 0.30)
                .with_cancel_window(0.5)
                .with_hitstun(12)
                .with_knockback(1.0, 0.0)
                .with_hit_stop(3),
            AttackMove::new(M::Light3, C::Light, 10.0, 0.32)
                .with_cancel_window(0.5)
                .with_hitstun(14)
                .with_knockback(1.5, 0.0),
            AttackMove::new(M::Light4, C::Light, 11.0, 0.34)
                .with_cancel_window(0.55)
                .with_hitstun(14)
                .with_knockback(1.5, 0.0),
            AttackMove::new(M::Light5, C::Light, 14.0, 0.45)
                .with_cancel_window(0.7)
                .with_hitstun(20)
                .with_knockback(4.0, 1.0)
                .with_hit_stop(6)
                .with_hitbox(0.7, 1.0),
            AttackMove::new(M::Heavy1, C::Heavy, 16.0, 0.55)
                .with_cancel_window(0.6)
                .with_hitstun(22)
                .with_knockback(3.0, 0.5)
                .with_hit_stop(6)
                .with_hitbox(0.75, 1.0),
            AttackMove::new(M::Heavy2, C::Heavy, 20.0, 0.65)
                .with_cancel_window(0.65)
                .with_hitstun(26)
                .with_knockback(4.5, 1.0)
                .with_hit_stop(8)
                .with_hitbox(0.8, 1.1),
            AttackMove::new(M::Launcher, C::Launcher, 12.0, 0.50)
                .with_cancel_window(0.55)
                .with_hitstun(30)
                .with_knockback(0.5, 8.0)
                .with_hit_stop(6),
            AttackMove::new(M::AirLight1, C::Aerial, 7.0, 0.28)
                .with_cancel_window(0.5)
                .with_hitstun(14)
                .with_knockback(0.5, 1.0)
                .with_hit_stop(3),
            AttackMove::new(M::AirLight2, C::Aerial, 8.0, 0.28)
                .with_cancel_window(0.5)
                .with_hitstun(14)
                .with_knockback(0.5, 1.0)
                .with_hit_stop(3),
            AttackMove::new(M::AirLight3, C::Aerial, 9.0, 0.30)
                .with_cancel_window(0.5)
                .with_hitstun(16)
                .with_knockback(0.8, 1.5),
            AttackMove::new(M::AirHeavy, C::Aerial, 14.0, 0.45)
                .with_cancel_window(0.6)
                .with_hitstun(20)
                .with_knockback(2.0, 2.0)
                .with_hit_stop(6)
                .with_hitbox(0.75, 1.0),
            AttackMove::new(M::Slam, C::Slam, 18.0, 0.50)
                .with_cancel_window(0.7)
                .with_hitstun(24)
                .with_knockback(1.0, -8.0)
                .with_hit_stop(8)
                .with_hitbox(0.9, 0.6),
            AttackMove::new(M::Special, C::Special, 25.0, 0.70)
                .with_cancel_window(0.75)
                .with_hitstun(30)
                .with_knockback(6.0, 2.0)
                .with_hit_stop(10)
                .with_hitbox(1.0, 1.4)
                .with_cost(MeterCost::special(50.0)),
            AttackMove::new(M::Ultimate, C::Ultimate, 45.0, 1.20)
                .with_cancel_window(0.85)
                .with_hitstun(45)
                .with_knockback(10.0, 4.0)
                .with_hit_stop(16)
                .with_hitbox(1.4, 1.6)
                .with_cost(MeterCost::ultimate(100.0)),
            AttackMove::new(M::Dodge, C::Utility, 0.0, 0.35)
                .with_cancel_window(0.6)
                .with_hitstun(0)
                .with_knockback(0.0, 0.0)
                .with_hit_stop(0),
        ];

        // Records are listed in `MoveId::ALL` order.
        debug_assert!(records.iter().map(|m| m.id).eq(MoveId::ALL));
        Self { moves: records }
    }
}

// ============================================================================
// Moveset Override
// ============================================================================

/// Replacement records for selected moves (transformations, fighter variants).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovesetOverride {
    /// Replacement records; at most one per id.
    pub moves: Vec<AttackMove>,
}

impl MovesetOverride {
    /// Create an empty override.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an override record.
    #[must_use]
    pub fn with_move(mut self, record: AttackMove) -> Self {
        self.moves.retain(|m| m.id != record.id);
        self.moves.push(record);
        self
    }

    /// Find the override for an id.
    #[must_use]
    pub fn get(&self, id: MoveId) -> Option<&AttackMove> {
        self.moves.iter().find(|m| m.id == id)
    }

    /// Whether no moves are overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Check every record against the move validation rules.
    pub fn validate(&self) -> Result<(), DataError> {
        for record in &self.moves {
            record.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_covers_every_move() {
        let table = MoveTable::standard();
        for id in MoveId::ALL {
            assert_eq!(table.get(id).id, id);
        }
    }

    #[test]
    fn test_standard_table_passes_validation() {
        let records: Vec<AttackMove> = MoveTable::standard().iter().cloned().collect();
        assert!(MoveTable::from_moves(records).is_ok());
    }

    #[test]
    fn test_light1_damage() {
        let table = MoveTable::standard();
        assert_eq!(table.get(MoveId::Light1).damage, 8.0);
    }

    #[test]
    fn test_category_flags() {
        let table = MoveTable::standard();
        assert!(table.get(MoveId::Launcher).is_launcher());
        assert!(table.get(MoveId::AirLight2).is_aerial());
        assert!(table.get(MoveId::Slam).is_slam());
        assert!(table.get(MoveId::Slam).is_aerial());
        assert!(MoveCategory::Heavy.locks_movement());
        assert!(!MoveCategory::Light.locks_movement());
        assert!(!MoveCategory::Utility.deals_damage());
    }

    #[test]
    fn test_phase_timings_identity() {
        let attack = AttackMove::new(MoveId::Light1, MoveCategory::Light, 8.0, 1.0)
            .with_cancel_window(0.5);
        let timings = PhaseTimings::for_move(&attack, &FrameDataMultipliers::IDENTITY);
        assert!((timings.active_start() - 0.2).abs() < 1e-6);
        assert!((timings.recovery_start() - 0.6).abs() < 1e-6);
        assert!((timings.total() - 1.0).abs() < 1e-6);
        assert!((timings.cancel_at - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_phase_timings_faster_animation() {
        let attack = AttackMove::new(MoveId::Heavy1, MoveCategory::Heavy, 16.0, 1.0);
        let frame_data = FrameDataMultipliers {
            animation_speed: 2.0,
            ..FrameDataMultipliers::IDENTITY
        };
        let timings = PhaseTimings::for_move(&attack, &frame_data);
        assert!((timings.total() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_move_rejected() {
        let records: Vec<AttackMove> = MoveTable::standard()
            .iter()
            .filter(|m| m.id != MoveId::Slam)
            .cloned()
            .collect();
        let err = MoveTable::from_moves(records);
        assert!(matches!(err, Err(DataError::MissingMove(_))));
    }

    #[test]
    fn test_duplicate_move_rejected() {
        let mut records: Vec<AttackMove> = MoveTable::standard().iter().cloned().collect();
        records.push(records[0].clone());
        let err = MoveTable::from_moves(records);
        assert!(matches!(err, Err(DataError::DuplicateMove(_))));
    }

    #[test]
    fn test_invalid_cancel_window_rejected() {
        let mut records: Vec<AttackMove> = MoveTable::standard().iter().cloned().collect();
        records[2].cancel_window = 1.5;
        let err = MoveTable::from_moves(records);
        assert!(matches!(err, Err(DataError::InvalidMove { .. })));
    }

    #[test]
    fn test_ron_reload_matches() {
        let table = MoveTable::standard();
        let text = table.to_ron().expect("serialize");
        let loaded = MoveTable::from_ron(&text).expect("parse");
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_ron_stamps_version() {
        let text = MoveTable::standard().to_ron().expect("serialize");
        assert!(text.contains("version"));
        assert!(text.contains("major: 1"));
    }

    #[test]
    fn test_ron_unknown_id_is_error() {
        let text = "(version: (major: 1, minor: 0, patch: 0), moves: [(id: Hadouken, \
                    category: Special, damage: 1.0, duration: 1.0, cancel_window: 0.5, \
                    hitstun: 1, knockback: (1.0, 0.0, 0.0))])";
        assert!(matches!(MoveTable::from_ron(text), Err(DataError::Parse(_))));
    }

    #[test]
    fn test_ron_newer_major_version_rejected() {
        let text = "(version: (major: 2, minor: 0, patch: 0), moves: [])";
        assert!(matches!(
            MoveTable::from_ron(text),
            Err(DataError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_moveset_override_replaces() {
        let stronger = AttackMove::new(MoveId::Special, MoveCategory::Special, 40.0, 0.7);
        let moveset = MovesetOverride::new().with_move(stronger.clone());
        assert_eq!(moveset.get(MoveId::Special), Some(&stronger));
        assert_eq!(moveset.get(MoveId::Light1), None);
    }
}
