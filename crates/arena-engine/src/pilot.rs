//! Scripted pilots standing in for players.
//!
//! The combat core never moves anyone; a pilot is the movement layer for
//! one combatant. Each frame it walks toward the opponent, carries
//! knockback velocity, lands airborne fighters and picks inputs on a
//! fixed cadence. Everything is deterministic, so a demo match replays
//! identically.

use arena_combat::{InputOutcome, InputSymbol, MatchState, Resource, FRAME_DT, METER_MAX};
use arena_common::{CombatantId, Facing};
use tracing::trace;

/// Distance at which a pilot stops walking and starts attacking.
const ENGAGE_RANGE: f32 = 1.4;

/// Downward acceleration applied to airborne fighters.
const GRAVITY: f32 = 30.0;

/// Horizontal velocity kept per frame.
const DAMPING: f32 = 0.85;

/// Stage extends this far either side of the origin.
const STAGE_HALF_WIDTH: f32 = 8.0;

/// Special meter needed before a pilot spends it.
const SPECIAL_THRESHOLD: f32 = 50.0;

/// Default frames between decisions.
const DEFAULT_INTERVAL: u32 = 8;

/// Deterministic driver for one combatant.
#[derive(Debug, Clone)]
pub struct Pilot {
    id: CombatantId,
    pattern: Vec<InputSymbol>,
    cursor: usize,
    interval: u32,
    cooldown: u32,
    inputs_sent: u32,
}

impl Pilot {
    /// Create a pilot cycling through `pattern` when it has nothing better to do.
    #[must_use]
    pub fn new(id: CombatantId, pattern: Vec<InputSymbol>) -> Self {
        Self {
            id,
            pattern,
            cursor: 0,
            interval: DEFAULT_INTERVAL,
            cooldown: 0,
            inputs_sent: 0,
        }
    }

    /// Set the frames between decisions.
    #[must_use]
    pub fn with_interval(mut self, frames: u32) -> Self {
        self.interval = frames.max(1);
        self
    }

    /// Combatant this pilot drives.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    /// Inputs submitted so far.
    #[must_use]
    pub const fn inputs_sent(&self) -> u32 {
        self.inputs_sent
    }

    /// Run one frame of movement and input. Call before each fixed step.
    pub fn drive(&mut self, state: &mut MatchState) {
        let Some(distance) = self.move_body(state) else {
            return;
        };
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return;
        }
        if distance > ENGAGE_RANGE + 0.3 {
            return;
        }

        let symbol = self.choose(state);
        let outcome = state.submit_input(self.id, symbol);
        trace!("{} pressed {:?}: {:?}", self.id, symbol, outcome);
        if !matches!(outcome, InputOutcome::Rejected(_)) {
            self.inputs_sent += 1;
        }
        self.cooldown = self.interval;
    }

    /// Integrate the body and return the distance to the opponent.
    fn move_body(&self, state: &mut MatchState) -> Option<f32> {
        let me = state.combatant(self.id)?;
        let target = state.opponent(self.id)?.spatial().position;
        let walk_speed = me.effective_stats().walk_speed;
        let attacking = me.machine().state().is_attacking();
        let locked = me.movement_locked();
        let mut spatial = *me.spatial();

        spatial.position += spatial.velocity * FRAME_DT;
        spatial.velocity.x *= DAMPING;
        spatial.velocity.z = 0.0;

        if spatial.grounded {
            spatial.velocity.y = spatial.velocity.y.max(0.0);
            if spatial.velocity.y > 0.0 {
                spatial.grounded = false;
            }
        } else {
            spatial.velocity.y -= GRAVITY * FRAME_DT;
        }
        if spatial.position.y <= 0.0 {
            spatial.position.y = 0.0;
            if !attacking {
                spatial.grounded = true;
                spatial.velocity.y = 0.0;
            }
        }

        let gap = target.x - spatial.position.x;
        if !locked {
            spatial.facing = Facing::towards(spatial.position, target);
            if gap.abs() > ENGAGE_RANGE {
                spatial.position.x += spatial.facing.sign() * walk_speed * FRAME_DT;
            }
        }
        spatial.position.x = spatial.position.x.clamp(-STAGE_HALF_WIDTH, STAGE_HALF_WIDTH);

        let distance = (target.x - spatial.position.x).abs();
        state.set_spatial(self.id, spatial);
        Some(distance)
    }

    fn choose(&mut self, state: &MatchState) -> InputSymbol {
        if (1..=2).any(|level| state.can_activate(self.id, level)) {
            return InputSymbol::Transform;
        }
        if let Some(me) = state.combatant(self.id) {
            let meters = me.meters();
            if meters.get(Resource::Ultimate) >= METER_MAX {
                return InputSymbol::UltimateAttack;
            }
            if meters.get(Resource::Special) >= SPECIAL_THRESHOLD {
                return InputSymbol::SpecialAttack;
            }
        }
        if self.pattern.is_empty() {
            return InputSymbol::LightAttack;
        }
        let symbol = self.pattern[self.cursor % self.pattern.len()];
        self.cursor = self.cursor.wrapping_add(1);
        symbol
    }
}

/// Pattern for a rushdown pilot: light strings into heavies.
#[must_use]
pub fn striker_pattern() -> Vec<InputSymbol> {
    use InputSymbol as I;
    vec![I::LightAttack, I::LightAttack, I::LightAttack, I::HeavyAttack, I::Dodge]
}

/// Pattern for a slow pilot: heavies and launchers.
#[must_use]
pub fn bruiser_pattern() -> Vec<InputSymbol> {
    use InputSymbol as I;
    vec![I::HeavyAttack, I::HeavyAttack, I::LightAttack, I::LauncherAttack]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster;
    use arena_combat::CombatConfig;
    use arena_common::Vec3;

    fn state() -> MatchState {
        MatchState::new(CombatConfig::default(), roster::demo_entrants()).expect("match")
    }

    #[test]
    fn test_pilot_closes_distance() {
        let mut state = state();
        let [a, _] = state.ids();
        state.start();
        let start = state.combatant(a).map(|c| c.spatial().position.x);

        let mut pilot = Pilot::new(a, striker_pattern());
        for _ in 0..10 {
            pilot.drive(&mut state);
            state.update(FRAME_DT);
        }
        let end = state.combatant(a).map(|c| c.spatial().position.x);
        assert!(end > start);
        assert_eq!(state.combatant(a).map(|c| c.spatial().facing), Some(Facing::Right));
    }

    #[test]
    fn test_pilot_attacks_in_range() {
        let mut state = state();
        let [a, b] = state.ids();
        state.set_position(b, Vec3::new(-1.0, 0.0, 0.0));
        state.set_position(a, Vec3::ZERO);
        state.start();

        let mut pilot = Pilot::new(a, striker_pattern());
        for _ in 0..30 {
            pilot.drive(&mut state);
            state.update(FRAME_DT);
        }
        assert!(pilot.inputs_sent() > 0);
        assert!(state.combatant(b).is_some_and(|c| c.hp() < c.max_hp()));
    }

    #[test]
    fn test_pilot_prefers_special_with_meter() {
        let mut state = state();
        let [a, _] = state.ids();
        if let Some(meters) = state.meters_mut(a) {
            meters.special = 60.0;
        }
        let mut pilot = Pilot::new(a, striker_pattern());
        assert_eq!(pilot.choose(&state), InputSymbol::SpecialAttack);
    }

    #[test]
    fn test_pilot_cycles_pattern() {
        let state = state();
        let [a, _] = state.ids();
        let mut pilot = Pilot::new(a, vec![InputSymbol::HeavyAttack, InputSymbol::Dodge]);
        assert_eq!(pilot.choose(&state), InputSymbol::HeavyAttack);
        assert_eq!(pilot.choose(&state), InputSymbol::Dodge);
        assert_eq!(pilot.choose(&state), InputSymbol::HeavyAttack);
    }

    #[test]
    fn test_idle_pilot_lands() {
        let mut state = state();
        let [a, _] = state.ids();
        state.start();
        if let Some(mut spatial) = state.combatant(a).map(|c| *c.spatial()) {
            spatial.position.y = 0.5;
            spatial.grounded = false;
            state.set_spatial(a, spatial);
        }
        let mut pilot = Pilot::new(a, Vec::new());
        for _ in 0..30 {
            pilot.drive(&mut state);
        }
        let spatial = state.combatant(a).map(|c| *c.spatial()).unwrap_or_default();
        assert!(spatial.grounded);
        assert_eq!(spatial.position.y, 0.0);
    }
}
