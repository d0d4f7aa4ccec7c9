//! ID types for combatants and fighter definitions.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for combatant IDs.
static COMBATANT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one fighter instance in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(u64);

impl CombatantId {
    /// Creates a new unique combatant ID.
    #[must_use]
    pub fn new() -> Self {
        Self(COMBATANT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a combatant ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid combatant ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) combatant ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "combatant#{}", self.0)
    }
}

/// Identifier of a fighter definition in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FighterId(u32);

impl FighterId {
    /// Creates a fighter ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}
