//! # Arena Combat
//!
//! Combat core for Project Arena.
//!
//! This crate provides the frame-accurate combat layer of a 2.5D fighter:
//! - Fixed-rate frame clock
//! - Move table and combo chain graph (RON-loadable, validated)
//! - Per-combatant attack state machine with input buffering
//! - Hit resolution (hitbox/hurtbox overlap, damage and knockback)
//! - Combo tracking and special/ultimate/synergy meters
//! - Transformation tiers gated by the synergy meter
//! - Match state manager with round timer and win evaluation
//! - Typed event bus and feel-effects coordinator
//! - TOML tuning configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod attack_state;
pub mod chain;
pub mod clock;
pub mod combatant;
pub mod combo;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod hit_resolution;
pub mod input;
pub mod match_state;
pub mod moves;
pub mod transformation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attack_state::*;
    pub use crate::chain::*;
    pub use crate::clock::*;
    pub use crate::combatant::*;
    pub use crate::combo::*;
    pub use crate::config::*;
    pub use crate::effects::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::hit_resolution::*;
    pub use crate::input::*;
    pub use crate::match_state::*;
    pub use crate::moves::*;
    pub use crate::transformation::*;
}

pub use prelude::*;
