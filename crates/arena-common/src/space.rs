//! Spatial helpers shared by combat and movement.
//!
//! The arena is 2.5D: `x` runs along the stage, `y` is up, `z` is depth and
//! is only used for presentation offsets.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Direction a combatant is facing along the stage axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing towards negative x.
    Left,
    /// Facing towards positive x.
    #[default]
    Right,
}

impl Facing {
    /// Sign of the facing along the x axis.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The opposite facing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Facing that looks from `from` towards `to`.
    #[must_use]
    pub fn towards(from: Vec3, to: Vec3) -> Self {
        if to.x < from.x {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Converts a forward-relative vector (x forward, y up) into world space.
    #[must_use]
    pub fn orient(self, local: Vec3) -> Vec3 {
        Vec3::new(local.x * self.sign(), local.y, local.z)
    }
}

/// Spatial state of a combatant, written by the movement layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spatial {
    /// World position.
    pub position: Vec3,
    /// World velocity.
    pub velocity: Vec3,
    /// Facing direction.
    pub facing: Facing,
    /// Whether the combatant stands on the ground.
    pub grounded: bool,
}

impl Default for Spatial {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            facing: Facing::Right,
            grounded: true,
        }
    }
}

impl Spatial {
    /// Creates grounded spatial state at a position.
    #[must_use]
    pub fn at(position: Vec3, facing: Facing) -> Self {
        Self {
            position,
            facing,
            ..Self::default()
        }
    }
}
