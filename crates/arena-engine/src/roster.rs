//! Built-in fighters for the demo match.

use arena_combat::{
    ActivationRequirements, AttackMove, FighterDefinition, FighterStats, FrameDataMultipliers,
    MatchEntrant, MeterCost, MoveCategory, MoveId, MovesetOverride, StatMultipliers,
    TransformationDefinition,
};
use arena_common::FighterId;

/// Balanced striker with a fast first form and an aggressive second form.
#[must_use]
pub fn kael() -> FighterDefinition {
    let ascended = TransformationDefinition::new(1, "Ascended")
        .with_multipliers(StatMultipliers {
            speed: 1.15,
            attack_power: 1.15,
            ..StatMultipliers::IDENTITY
        })
        .with_frame_data(FrameDataMultipliers {
            startup: 0.85,
            active: 1.0,
            recovery: 0.85,
            animation_speed: 1.15,
        })
        .with_duration(Some(20.0));

    let apex = TransformationDefinition::new(2, "Apex")
        .with_multipliers(StatMultipliers {
            speed: 1.25,
            attack_power: 1.3,
            defense: 1.1,
            ..StatMultipliers::IDENTITY
        })
        .with_moveset(MovesetOverride::new().with_move(
            AttackMove::new(MoveId::Special, MoveCategory::Special, 32.0, 0.65)
                .with_cancel_window(0.75)
                .with_hitstun(32)
                .with_knockback(7.0, 2.5)
                .with_hit_stop(12)
                .with_hitbox(1.1, 1.5)
                .with_cost(MeterCost::special(50.0)),
        ))
        .with_requirements(ActivationRequirements {
            min_combo_damage: Some(40.0),
            ..ActivationRequirements::default()
        })
        .with_duration(Some(15.0))
        .with_hp_threshold(0.1);

    FighterDefinition::new(FighterId::new(1), "Kael")
        .with_transformation(ascended)
        .with_transformation(apex)
}

/// Slow heavyweight whose heavy opener hits harder.
#[must_use]
pub fn brakka() -> FighterDefinition {
    let ironhide = TransformationDefinition::new(1, "Ironhide")
        .with_multipliers(StatMultipliers {
            weight: 1.3,
            defense: 1.25,
            speed: 0.9,
            ..StatMultipliers::IDENTITY
        })
        .with_duration(None)
        .with_hp_threshold(0.25);

    FighterDefinition::new(FighterId::new(2), "Brakka")
        .with_stats(FighterStats {
            max_hp: 120.0,
            weight: 130.0,
            power: 1.1,
            defense: 1.15,
            walk_speed: 4.0,
            jump_power: 8.0,
        })
        .with_moveset(MovesetOverride::new().with_move(
            AttackMove::new(MoveId::Heavy1, MoveCategory::Heavy, 19.0, 0.65)
                .with_cancel_window(0.6)
                .with_hitstun(24)
                .with_knockback(3.5, 0.5)
                .with_hit_stop(7)
                .with_hitbox(0.8, 1.1),
        ))
        .with_transformation(ironhide)
}

/// The demo pairing, both with every tier unlocked.
#[must_use]
pub fn demo_entrants() -> [MatchEntrant; 2] {
    [
        MatchEntrant::new(kael()).with_unlocked_tier(2),
        MatchEntrant::new(brakka()).with_unlocked_tier(1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_validates() {
        assert!(kael().validate().is_ok());
        assert!(brakka().validate().is_ok());
    }

    #[test]
    fn test_roster_ids_distinct() {
        assert_ne!(kael().id, brakka().id);
        assert_eq!(kael().transformations.len(), 2);
    }
}
