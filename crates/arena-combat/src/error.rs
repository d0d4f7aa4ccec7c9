//! Rejection taxonomy for combat operations.
//!
//! None of these are faults: every rejected operation leaves the match
//! untouched and the caller decides whether to surface it (usually as a
//! disabled UI affordance).

use arena_common::CombatantId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::InputCategory;
use crate::moves::MoveId;

/// Meter resources that gate moves and transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// Special meter.
    Special,
    /// Ultimate meter.
    Ultimate,
    /// Synergy/transformation meter.
    Synergy,
    /// Accumulated combo damage (optional transformation gate).
    ComboDamage,
}

/// Why a combat operation was turned down.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// Input symbol not recognised.
    #[error("unrecognised input: {0}")]
    InvalidInput(String),

    /// The combatant cannot act right now (hitstun, KO, match not running).
    #[error("combatant cannot act in state {state}")]
    NotActionable {
        /// State the combatant was in.
        state: String,
    },

    /// Input buffer is full; the newest input is discarded.
    #[error("input buffer full (capacity {capacity})")]
    BufferFull {
        /// Buffer capacity.
        capacity: usize,
    },

    /// Current move has no chain edge for this input.
    #[error("no chain from {from:?} on {input:?}")]
    NoChain {
        /// Move being cancelled.
        from: MoveId,
        /// Input category that found no edge.
        input: InputCategory,
    },

    /// Move requires grounding or airborne state the combatant is not in.
    #[error("{0:?} is not available in the current stance")]
    WrongStance(MoveId),

    /// A meter is below the required threshold.
    #[error("insufficient {resource:?}: need {required}, have {available}")]
    InsufficientResource {
        /// Resource that is short.
        resource: Resource,
        /// Amount required.
        required: f32,
        /// Amount available.
        available: f32,
    },

    /// A transformation is already active.
    #[error("transformation already active at level {level}")]
    AlreadyTransformed {
        /// Active level.
        level: u8,
    },

    /// The requested transformation tier is not unlocked or not defined.
    #[error("transformation level {level} is locked")]
    TierLocked {
        /// Requested level.
        level: u8,
    },

    /// Transformation is cooling down.
    #[error("transformation on cooldown: {remaining}s remaining")]
    OnCooldown {
        /// Seconds remaining.
        remaining: f32,
    },

    /// The id was never registered.
    #[error("unknown combatant: {0}")]
    UnknownCombatant(CombatantId),
}

impl Rejection {
    /// Whether this rejection is the "illegal state transition" class.
    #[must_use]
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::NotActionable { .. } | Self::BufferFull { .. } | Self::NoChain { .. }
        )
    }

    /// Whether this rejection is the "insufficient resource" class.
    #[must_use]
    pub fn is_resource_shortage(&self) -> bool {
        matches!(self, Self::InsufficientResource { .. })
    }
}
