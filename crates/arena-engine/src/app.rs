//! Demo match lifecycle.
//!
//! Loads tuning, builds the roster, then runs a scripted match at the fixed
//! frame rate while a feel-effects coordinator and a logger listen on the
//! event bus.

use anyhow::{anyhow, bail, Result};
use std::path::Path;
use tracing::{debug, info, trace};

use arena_combat::{
    seconds_to_frames, CombatConfig, CombatEvent, CombatEventHandler, FeelEffects, MatchResult,
    MatchState, MatchStatus, FRAME_DT,
};

use crate::pilot::{bruiser_pattern, striker_pattern, Pilot};
use crate::roster;

/// Events buffered between drains.
const EVENT_CAPACITY: usize = 1024;

/// Combos at least this long are logged at info level.
const NOTABLE_COMBO: u32 = 3;

/// Counters gathered from the event stream.
#[derive(Debug, Clone, Copy, Default)]
struct DemoStats {
    hits: u32,
    specials: u32,
    transformations: u32,
    longest_combo: u32,
}

impl DemoStats {
    fn record(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::HitLanded {
                attacker,
                defender,
                move_id,
                damage,
                combo_count,
                defender_hp,
                ..
            } => {
                self.hits += 1;
                self.longest_combo = self.longest_combo.max(*combo_count);
                debug!(
                    "{attacker} hit {defender} with {move_id:?} for {damage:.1} \
                     (combo {combo_count}, {defender_hp:.1} HP left)"
                );
            },
            CombatEvent::ComboDropped {
                combatant,
                count,
                damage,
            } if *count >= NOTABLE_COMBO => {
                info!("{combatant} finished a {count}-hit combo for {damage:.1}");
            },
            CombatEvent::SpecialMoveUsed {
                combatant,
                move_id,
            } => {
                self.specials += 1;
                info!("{combatant} used {move_id:?}");
            },
            CombatEvent::TransformationActivated {
                combatant,
                level,
                name,
                ..
            } => {
                self.transformations += 1;
                info!("{combatant} transformed into {name} (tier {level})");
            },
            CombatEvent::TransformationReverted {
                combatant,
                level,
                reason,
            } => {
                info!("{combatant} reverted from tier {level} ({reason:?})");
            },
            other => trace!("event: {}", other.name()),
        }
    }
}

/// Run the demo with the configuration at `config_path`.
pub fn run(config_path: &Path) -> Result<MatchResult> {
    let config = CombatConfig::load_from(config_path);

    info!("Configuration loaded:");
    info!("  Round time: {}s", config.match_tuning.round_time);
    info!("  Combo timeout: {}s", config.combo.timeout);
    info!("  Hit cooldown: {} frames", config.hit.hit_cooldown_frames);
    info!("  Screen shake: {}", config.feel.screen_shake);

    run_demo(&config)
}

/// Play one scripted match to completion.
pub fn run_demo(config: &CombatConfig) -> Result<MatchResult> {
    let mut state = MatchState::new(config.clone(), roster::demo_entrants())?;
    let events = state.subscribe(EVENT_CAPACITY);
    let mut effects = FeelEffects::new(config.feel.clone());
    let mut stats = DemoStats::default();

    let [first, second] = state.ids();
    let mut pilots = [
        Pilot::new(first, striker_pattern()).with_interval(7),
        Pilot::new(second, bruiser_pattern()).with_interval(11),
    ];

    if !state.start() {
        bail!("match refused to start");
    }

    let max_frames = u64::from(seconds_to_frames(config.match_tuning.round_time)) + 1;
    let mut cues = 0usize;
    while state.status() != MatchStatus::Ended && state.frame() < max_frames {
        for pilot in &mut pilots {
            pilot.drive(&mut state);
        }
        state.update(FRAME_DT);
        effects.update(FRAME_DT);

        for event in events.try_iter() {
            effects.handle(&event);
            stats.record(&event);
        }
        cues += effects.drain_cues().len();
    }

    let result = state
        .result()
        .cloned()
        .ok_or_else(|| anyhow!("match did not finish within {max_frames} frames"))?;

    info!(
        "{} hits, {} specials, {} transformations, longest combo {}",
        stats.hits, stats.specials, stats.transformations, stats.longest_combo
    );
    info!(
        "{} feel cues ({} legendary), {} + {} inputs",
        cues,
        effects.legendary_count(),
        pilots[0].inputs_sent(),
        pilots[1].inputs_sent()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_combat::WinReason;

    #[test]
    fn test_demo_match_finishes() {
        let result = run_demo(&CombatConfig::default()).expect("demo");
        assert_eq!(result.combatants.len(), 2);
        assert!(result.combatant(result.winner).is_some());
        assert!(result.elapsed > 0.0);
        if result.reason == WinReason::Ko {
            assert!(result.combatants.iter().any(|c| c.snapshot.hp == 0.0));
        }
    }

    #[test]
    fn test_demo_is_deterministic() {
        let summary = |result: &MatchResult| {
            let winner_slot = result
                .combatants
                .iter()
                .position(|c| c.snapshot.id == result.winner);
            let hp: Vec<f32> = result.combatants.iter().map(|c| c.snapshot.hp).collect();
            (winner_slot, result.reason, result.elapsed, hp)
        };
        let first = run_demo(&CombatConfig::default()).expect("demo");
        let second = run_demo(&CombatConfig::default()).expect("demo");
        assert_eq!(summary(&first), summary(&second));
    }

    #[test]
    fn test_run_reads_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arena.toml");
        std::fs::write(&path, "[match]\nround_time = 10.0\n").expect("write");

        let result = run(&path).expect("demo");
        assert!(result.elapsed < 10.01);
    }

    #[test]
    fn test_run_without_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(&dir.path().join("missing.toml")).expect("demo");
        assert!(result.elapsed < 99.01);
    }
}
