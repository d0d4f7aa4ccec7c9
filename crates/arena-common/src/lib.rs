//! # Arena Common
//!
//! Common types, utilities, and shared abstractions for Project Arena.
//!
//! This crate provides foundational types used across the arena crates:
//! - ID types (CombatantId, FighterId)
//! - Facing and spatial state for 2.5D combatants
//! - Version information for snapshots
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod space;
pub mod version;

pub use glam::Vec3;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::space::*;
    pub use crate::version::*;
    pub use glam::Vec3;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combatant_id_generation() {
        let id1 = CombatantId::new();
        let id2 = CombatantId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!CombatantId::NULL.is_valid());
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = SchemaVersion::new(1, 0, 0);
        let v2 = SchemaVersion::new(1, 1, 0);
        let v3 = SchemaVersion::new(2, 0, 0);

        assert!(v2.is_compatible_with(&v1));
        assert!(!v1.is_compatible_with(&v3));
        assert!(v1.can_read(&v2));
    }

    #[test]
    fn test_facing_orient() {
        let local = Vec3::new(2.0, 1.0, 0.0);
        assert_eq!(Facing::Right.orient(local), Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(Facing::Left.orient(local), Vec3::new(-2.0, 1.0, 0.0));
        assert_eq!(Facing::Left.flipped(), Facing::Right);
    }

    #[test]
    fn test_facing_towards() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 0.0, 0.0);
        assert_eq!(Facing::towards(a, b), Facing::Right);
        assert_eq!(Facing::towards(b, a), Facing::Left);
    }

    proptest::proptest! {
        #[test]
        fn prop_orient_flip_mirrors_x(x in -10.0f32..10.0, y in -10.0f32..10.0) {
            let local = Vec3::new(x, y, 0.0);
            let right = Facing::Right.orient(local);
            let left = Facing::Left.orient(local);
            proptest::prop_assert_eq!(right.x, -left.x);
            proptest::prop_assert_eq!(right.y, left.y);
        }
    }
}
