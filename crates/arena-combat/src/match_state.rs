//! Match lifecycle and the ordered per-frame combat tick.
//!
//! `MatchState` is the single source of truth for one match: both
//! combatants, the hit resolution engine, the round timer and the event bus.
//! It is the only writer of HP.
//!
//! Each logical frame runs in a fixed order:
//! 1. attack machines (combatant 1 then 2), hitbox creation and countdowns
//! 2. hit resolution
//! 3. resolved hits applied to HP, hitstun, combos and meters
//! 4. round timer and win evaluation
//! 5. transformation timers

use arena_common::{CombatantId, DataError, Facing, SchemaVersion, Spatial, Vec3};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::attack_state::{AttackState, InputOutcome, MachineEvent};
use crate::chain::ComboChainGraph;
use crate::clock::{frames_to_seconds, seconds_to_frames, FrameClock, FRAME_DT};
use crate::combatant::{CombatRecord, Combatant, CombatantSnapshot, FighterDefinition};
use crate::combo::{scaled_hitstun, Meters};
use crate::config::CombatConfig;
use crate::error::Rejection;
use crate::events::{CombatEvent, EventBus};
use crate::hit_resolution::{HitResolutionEngine, HitResolved};
use crate::input::InputSymbol;
use crate::moves::{MoveCategory, MoveTable};
use crate::transformation::{Activation, RevertReason};

/// Distance of each starting position from the arena centre.
const START_OFFSET: f32 = 2.0;

// ============================================================================
// Status and Results
// ============================================================================

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Set up, waiting for `start`.
    #[default]
    Starting,
    /// Running.
    Active,
    /// Paused; updates are ignored.
    Paused,
    /// Over. Terminal until `reset`.
    Ended,
}

impl MatchStatus {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

/// How a match was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// The loser's HP reached zero.
    Ko,
    /// The round timer ran out.
    TimeLimit,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ko => write!(f, "KO"),
            Self::TimeLimit => write!(f, "Time Limit"),
        }
    }
}

/// Final state and score of one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantResult {
    /// State at match end.
    pub snapshot: CombatantSnapshot,
    /// Progression score.
    pub score: f32,
}

/// Hand-off value for the save/progression layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Schema version.
    pub version: SchemaVersion,
    /// Winning combatant.
    pub winner: CombatantId,
    /// How the match was won.
    pub reason: WinReason,
    /// Seconds of match time played.
    pub elapsed: f32,
    /// Seconds left on the round timer.
    pub time_remaining: f32,
    /// Both combatants, in slot order.
    pub combatants: Vec<CombatantResult>,
}

impl MatchResult {
    /// Result entry of a combatant.
    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantResult> {
        self.combatants.iter().find(|c| c.snapshot.id == id)
    }

    /// Score of a combatant.
    #[must_use]
    pub fn score(&self, id: CombatantId) -> Option<f32> {
        self.combatant(id).map(|c| c.score)
    }
}

/// Score from match statistics: damage dealt x10, best combo x50 and, for
/// the winner, remaining HP x5.
#[must_use]
pub fn match_score(record: &CombatRecord, winner_hp: Option<f32>) -> f32 {
    record.damage_dealt * 10.0 + record.best_combo as f32 * 50.0 + winner_hp.unwrap_or(0.0) * 5.0
}

// ============================================================================
// Setup
// ============================================================================

/// One side of a match.
#[derive(Debug, Clone)]
pub struct MatchEntrant {
    /// Fighter to play.
    pub definition: FighterDefinition,
    /// Highest transformation tier unlocked by progression.
    pub unlocked_tier: u8,
    /// Starting placement; defaults to the slot's side of the arena.
    pub spatial: Option<Spatial>,
}

impl MatchEntrant {
    /// Enter a fighter with no transformations unlocked.
    #[must_use]
    pub fn new(definition: FighterDefinition) -> Self {
        Self {
            definition,
            unlocked_tier: 0,
            spatial: None,
        }
    }

    /// Unlock transformation tiers up to `tier`.
    #[must_use]
    pub fn with_unlocked_tier(mut self, tier: u8) -> Self {
        self.unlocked_tier = tier;
        self
    }

    /// Set the starting placement.
    #[must_use]
    pub fn with_spatial(mut self, spatial: Spatial) -> Self {
        self.spatial = Some(spatial);
        self
    }
}

/// Default placement of a slot: slot 0 left facing right, slot 1 right
/// facing left.
fn slot_spatial(slot: usize) -> Spatial {
    if slot == 0 {
        Spatial::at(Vec3::new(-START_OFFSET, 0.0, 0.0), Facing::Right)
    } else {
        Spatial::at(Vec3::new(START_OFFSET, 0.0, 0.0), Facing::Left)
    }
}

// ============================================================================
// Match State
// ============================================================================

/// State of one two-combatant match.
#[derive(Debug)]
pub struct MatchState {
    config: CombatConfig,
    table: MoveTable,
    chains: ComboChainGraph,
    combatants: [Combatant; 2],
    start_spatials: [Spatial; 2],
    engine: HitResolutionEngine,
    clock: FrameClock,
    events: EventBus,
    status: MatchStatus,
    remaining_frames: u32,
    elapsed_frames: u64,
    winner: Option<CombatantId>,
    reason: Option<WinReason>,
    result: Option<MatchResult>,
}

impl MatchState {
    /// Set up a match with the standard move table and chain graph.
    pub fn new(config: CombatConfig, entrants: [MatchEntrant; 2]) -> Result<Self, DataError> {
        Self::with_data(
            config,
            MoveTable::standard(),
            ComboChainGraph::standard(),
            entrants,
        )
    }

    /// Set up a match with custom move data.
    pub fn with_data(
        config: CombatConfig,
        table: MoveTable,
        chains: ComboChainGraph,
        entrants: [MatchEntrant; 2],
    ) -> Result<Self, DataError> {
        chains.validate(&table)?;
        for entrant in &entrants {
            entrant.definition.validate()?;
        }

        let mut engine =
            HitResolutionEngine::new().with_hit_cooldown(config.hit.hit_cooldown_frames);
        let [first, second] = entrants;
        let start_spatials = [
            first.spatial.unwrap_or_else(|| slot_spatial(0)),
            second.spatial.unwrap_or_else(|| slot_spatial(1)),
        ];
        let combatants = [
            Self::spawn(first, start_spatials[0], &config),
            Self::spawn(second, start_spatials[1], &config),
        ];
        for combatant in &combatants {
            engine.register_combatant(
                combatant.id(),
                combatant.effective_stats().hit_stats(),
                combatant.spatial().position,
                combatant.definition().hurtbox_radius,
            );
        }

        info!(
            "Match set up: {} vs {}",
            combatants[0].definition().name,
            combatants[1].definition().name
        );

        Ok(Self {
            clock: FrameClock::new().with_max_delta(config.match_tuning.max_delta),
            remaining_frames: seconds_to_frames(config.match_tuning.round_time),
            config,
            table,
            chains,
            combatants,
            start_spatials,
            engine,
            events: EventBus::default(),
            status: MatchStatus::Starting,
            elapsed_frames: 0,
            winner: None,
            reason: None,
            result: None,
        })
    }

    fn spawn(entrant: MatchEntrant, spatial: Spatial, config: &CombatConfig) -> Combatant {
        Combatant::new(CombatantId::new(), entrant.definition)
            .with_spatial(spatial)
            .with_buffer_capacity(config.input.buffer_capacity)
            .with_unlocked_tier(entrant.unlocked_tier)
    }

    // === Queries ===

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Combatant ids in slot order.
    #[must_use]
    pub fn ids(&self) -> [CombatantId; 2] {
        [self.combatants[0].id(), self.combatants[1].id()]
    }

    /// Seconds left on the round timer.
    #[must_use]
    pub fn round_timer(&self) -> f32 {
        frames_to_seconds(self.remaining_frames)
    }

    /// Seconds of match time played.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_frames as f32 * FRAME_DT
    }

    /// Logical frames played.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.elapsed_frames
    }

    /// Winner, once the match ended.
    #[must_use]
    pub const fn winner(&self) -> Option<CombatantId> {
        self.winner
    }

    /// Win reason, once the match ended.
    #[must_use]
    pub const fn reason(&self) -> Option<WinReason> {
        self.reason
    }

    /// Final result, once the match ended.
    #[must_use]
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Move table in use.
    #[must_use]
    pub const fn move_table(&self) -> &MoveTable {
        &self.table
    }

    /// Chain graph in use.
    #[must_use]
    pub const fn chains(&self) -> &ComboChainGraph {
        &self.chains
    }

    /// Hit resolution engine (read-only).
    #[must_use]
    pub const fn engine(&self) -> &HitResolutionEngine {
        &self.engine
    }

    /// A combatant by id.
    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.slot(id).map(|slot| &self.combatants[slot])
    }

    /// The other combatant.
    #[must_use]
    pub fn opponent(&self, id: CombatantId) -> Option<&Combatant> {
        self.slot(id).map(|slot| &self.combatants[1 - slot])
    }

    /// Serializable snapshot of a combatant.
    #[must_use]
    pub fn snapshot(&self, id: CombatantId) -> Option<CombatantSnapshot> {
        self.combatant(id).map(Combatant::snapshot)
    }

    /// Whether the movement layer must ignore horizontal input.
    #[must_use]
    pub fn movement_locked(&self, id: CombatantId) -> Option<bool> {
        self.combatant(id).map(Combatant::movement_locked)
    }

    /// Mutable meters of a combatant (scripted setups and tests).
    pub fn meters_mut(&mut self, id: CombatantId) -> Option<&mut Meters> {
        let slot = self.slot(id)?;
        Some(self.combatants[slot].meters_mut())
    }

    fn slot(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id() == id)
    }

    // === Events ===

    /// Subscribe to combat events through a bounded channel.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<CombatEvent> {
        self.events.subscribe(capacity)
    }

    /// Drain the match's own event queue (the most recent events).
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    // === Lifecycle ===

    /// Begin the round. Only valid from `Starting`.
    pub fn start(&mut self) -> bool {
        if self.status != MatchStatus::Starting {
            return false;
        }
        self.status = MatchStatus::Active;
        info!("Match started ({}s round)", self.config.match_tuning.round_time);
        self.events.publish(CombatEvent::MatchStarted {
            round_time: self.round_timer(),
        });
        true
    }

    /// Pause a running match.
    pub fn pause(&mut self) -> bool {
        if self.status != MatchStatus::Active {
            return false;
        }
        self.status = MatchStatus::Paused;
        info!("Match paused");
        self.events.publish(CombatEvent::MatchPaused);
        true
    }

    /// Resume a paused match.
    pub fn resume(&mut self) -> bool {
        if self.status != MatchStatus::Paused {
            return false;
        }
        self.status = MatchStatus::Active;
        info!("Match resumed");
        self.events.publish(CombatEvent::MatchResumed);
        true
    }

    /// End the match. Only the first call takes effect; returns whether this
    /// call did.
    pub fn end(&mut self, winner: CombatantId, reason: WinReason) -> bool {
        if self.status == MatchStatus::Ended {
            debug!("Match already ended, ignoring end({}, {})", winner, reason);
            return false;
        }
        if self.slot(winner).is_none() {
            warn!("end() called with unknown winner {}", winner);
            return false;
        }

        self.status = MatchStatus::Ended;
        self.winner = Some(winner);
        self.reason = Some(reason);

        for slot in 0..2 {
            if let Some(level) =
                self.combatants[slot].transformation_mut().revert(RevertReason::MatchEnd)
            {
                self.refresh_stats(slot);
                self.events.publish(CombatEvent::TransformationReverted {
                    combatant: self.combatants[slot].id(),
                    level,
                    reason: RevertReason::MatchEnd,
                });
            }
        }
        self.engine.clear_hitboxes();

        let result = self.build_result();
        info!(
            "Match ended: {} wins by {} after {:.2}s",
            winner, reason, result.elapsed
        );
        self.result = Some(result.clone());
        self.events.publish(CombatEvent::MatchEnded(Box::new(result)));
        true
    }

    /// Restore both combatants and the timer for a rematch.
    pub fn reset(&mut self) {
        for slot in 0..2 {
            self.combatants[slot].reset(self.start_spatials[slot]);
        }
        self.engine.reset();
        for combatant in &self.combatants {
            self.engine.update_hurtbox(combatant.id(), combatant.spatial().position);
            self.engine
                .set_stats(combatant.id(), combatant.effective_stats().hit_stats());
            self.engine.set_hittable(combatant.id(), true);
        }
        self.clock.reset();
        self.status = MatchStatus::Starting;
        self.remaining_frames = seconds_to_frames(self.config.match_tuning.round_time);
        self.elapsed_frames = 0;
        self.winner = None;
        self.reason = None;
        self.result = None;
        info!("Match reset");
    }

    fn build_result(&self) -> MatchResult {
        let combatants = self
            .combatants
            .iter()
            .map(|c| {
                let winner_hp = (self.winner == Some(c.id())).then_some(c.hp());
                CombatantResult {
                    snapshot: c.snapshot(),
                    score: match_score(c.record(), winner_hp),
                }
            })
            .collect();
        MatchResult {
            version: SchemaVersion::MATCH_RESULT,
            winner: self.winner.unwrap_or(CombatantId::NULL),
            reason: self.reason.unwrap_or(WinReason::Ko),
            elapsed: self.elapsed(),
            time_remaining: self.round_timer(),
            combatants,
        }
    }

    // === Input and Movement ===

    /// Feed one input symbol for a combatant.
    pub fn submit_input(&mut self, id: CombatantId, symbol: InputSymbol) -> InputOutcome {
        let Some(slot) = self.slot(id) else {
            return InputOutcome::Rejected(Rejection::UnknownCombatant(id));
        };
        if self.status != MatchStatus::Active {
            return InputOutcome::Rejected(Rejection::NotActionable {
                state: format!("match {}", self.status.name()),
            });
        }
        if self.combatants[slot].is_ko() {
            return InputOutcome::Rejected(Rejection::NotActionable {
                state: "KO".to_string(),
            });
        }

        if symbol == InputSymbol::Transform {
            return self.transform_input(slot);
        }

        let outcome = self.combatants[slot].submit_input(symbol, &self.table, &self.chains);
        if let InputOutcome::Rejected(rejection) = &outcome {
            debug!("{} input {} rejected: {}", id, symbol.name(), rejection);
        }
        self.process_machine_events(slot);
        outcome
    }

    /// Feed a raw input name. Unknown names are a no-op rejection.
    pub fn submit_raw_input(&mut self, id: CombatantId, name: &str) -> InputOutcome {
        match name.parse::<InputSymbol>() {
            Ok(symbol) => self.submit_input(id, symbol),
            Err(rejection) => {
                debug!("{} sent unknown input {:?}", id, name);
                InputOutcome::Rejected(rejection)
            },
        }
    }

    /// The transform button: activate the highest tier that is ready.
    fn transform_input(&mut self, slot: usize) -> InputOutcome {
        let combatant = &self.combatants[slot];
        let id = combatant.id();
        let unlocked = combatant.transformation().unlocked_tier();
        let target = (1..=unlocked)
            .rev()
            .find(|&level| self.can_activate(id, level))
            .unwrap_or(1);
        match self.activate(id, target) {
            Ok(Activation::Activated(level)) => InputOutcome::Transformed(level),
            Ok(_) => InputOutcome::Ignored,
            Err(rejection) => InputOutcome::Rejected(rejection),
        }
    }

    /// Replace a combatant's spatial state (movement layer write path).
    pub fn set_spatial(&mut self, id: CombatantId, spatial: Spatial) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        self.combatants[slot].set_spatial(spatial);
        self.engine.update_hurtbox(id, spatial.position);
        true
    }

    /// Move a combatant, keeping velocity, facing and grounding.
    pub fn set_position(&mut self, id: CombatantId, position: Vec3) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        self.combatants[slot].spatial_mut().position = position;
        self.engine.update_hurtbox(id, position);
        true
    }

    // === Transformation ===

    /// Whether a tier could be activated now.
    #[must_use]
    pub fn can_activate(&self, id: CombatantId, level: u8) -> bool {
        self.slot(id).is_some_and(|slot| {
            let c = &self.combatants[slot];
            self.check_actionable(slot, level).is_ok()
                && c.transformation()
                    .can_activate(level, c.meters(), c.combo().damage())
        })
    }

    /// Match and stance gates shared by every activation path. Hitstun
    /// blocks transforming but not a manual revert.
    fn check_actionable(&self, slot: usize, level: u8) -> Result<(), Rejection> {
        if self.status != MatchStatus::Active {
            return Err(Rejection::NotActionable {
                state: format!("match {}", self.status.name()),
            });
        }
        let state = self.combatants[slot].machine().state();
        if level > 0 && state == AttackState::Hitstun {
            return Err(Rejection::NotActionable {
                state: state.name().to_string(),
            });
        }
        Ok(())
    }

    /// Activate a transformation tier. Level 0 ends an active form.
    pub fn activate(&mut self, id: CombatantId, level: u8) -> Result<Activation, Rejection> {
        let slot = self.slot(id).ok_or(Rejection::UnknownCombatant(id))?;
        self.check_actionable(slot, level)?;

        let activation = self.combatants[slot].activate_transformation(level)?;
        match activation {
            Activation::Activated(level) => {
                let combatant = &mut self.combatants[slot];
                combatant
                    .machine_mut()
                    .enter_transformation(self.config.transform.cinematic_frames);
                combatant.record_mut().transformations_used += 1;
                let (name, duration) = combatant
                    .transformation()
                    .active()
                    .map(|d| (d.name.clone(), d.duration))
                    .unwrap_or_default();
                self.process_machine_events(slot);
                self.refresh_stats(slot);
                self.events.publish(CombatEvent::TransformationActivated {
                    combatant: id,
                    level,
                    name,
                    duration,
                });
            },
            Activation::Reverted(level) => {
                self.refresh_stats(slot);
                self.events.publish(CombatEvent::TransformationReverted {
                    combatant: id,
                    level,
                    reason: RevertReason::Manual,
                });
            },
            Activation::Unchanged => {},
        }
        Ok(activation)
    }

    fn refresh_stats(&mut self, slot: usize) {
        let combatant = &self.combatants[slot];
        self.engine
            .set_stats(combatant.id(), combatant.effective_stats().hit_stats());
    }

    // === Tick ===

    /// Advance by wall-clock time. No-op unless the match is active.
    pub fn update(&mut self, dt: f32) {
        if self.status != MatchStatus::Active {
            return;
        }
        let frames = self.clock.advance(dt);
        for _ in 0..frames {
            self.step();
            if self.status != MatchStatus::Active {
                break;
            }
        }
    }

    fn step(&mut self) {
        self.elapsed_frames += 1;

        // 1. Attack machines, hitboxes and countdowns.
        for slot in 0..2 {
            self.combatants[slot].advance_machine(FRAME_DT, &self.table, &self.chains);
            self.process_machine_events(slot);
            self.tick_combatant(slot);
        }

        // 2. Hit resolution.
        for combatant in &self.combatants {
            self.engine.set_hittable(combatant.id(), combatant.can_be_hit());
        }
        let hits = self.engine.tick();

        // 3. Apply hits.
        for hit in &hits {
            self.apply_hit(hit);
        }

        // 4. Timer and win condition.
        self.remaining_frames = self.remaining_frames.saturating_sub(1);
        if self.evaluate_win() {
            return;
        }

        // 5. Transformation timers.
        for slot in 0..2 {
            self.update_transformation(slot);
        }
    }

    fn tick_combatant(&mut self, slot: usize) {
        let combatant = &mut self.combatants[slot];
        combatant.tick_invincibility();
        let dropped = combatant.combo_mut().tick(FRAME_DT);
        let combo_running = combatant.combo().is_active();
        combatant
            .meters_mut()
            .passive(FRAME_DT, combo_running, &self.config.meter);

        let id = combatant.id();
        self.engine.update_hurtbox(id, combatant.spatial().position);
        if let Some(dropped) = dropped {
            debug!("{} combo of {} dropped", id, dropped.count);
            self.events.publish(CombatEvent::ComboDropped {
                combatant: id,
                count: dropped.count,
                damage: dropped.damage,
            });
        }
    }

    fn process_machine_events(&mut self, slot: usize) {
        let id = self.combatants[slot].id();
        let events = self.combatants[slot].machine_mut().drain_events();
        for event in events {
            match event {
                MachineEvent::StateChanged { from, to } => {
                    self.events.publish(CombatEvent::AttackStateChanged {
                        combatant: id,
                        from,
                        to,
                    });
                },
                MachineEvent::AttackStarted {
                    move_id,
                    chained_from,
                    ..
                } => {
                    let category = self.combatants[slot]
                        .resolve_move(move_id, &self.table)
                        .category;
                    if category.is_airborne() {
                        self.combatants[slot].spatial_mut().grounded = false;
                    }
                    self.events.publish(CombatEvent::AttackStarted {
                        combatant: id,
                        move_id,
                        chained_from,
                    });
                    if matches!(category, MoveCategory::Special | MoveCategory::Ultimate) {
                        self.combatants[slot].record_mut().specials_used += 1;
                        self.events.publish(CombatEvent::SpecialMoveUsed {
                            combatant: id,
                            move_id,
                        });
                    }
                },
                MachineEvent::HitboxRequested {
                    move_id,
                    active_frames,
                } => {
                    let spec =
                        self.combatants[slot].hitbox_spec(move_id, active_frames, &self.table);
                    self.engine.create_hitbox(spec);
                },
                MachineEvent::InvincibilityGranted { frames } => {
                    self.combatants[slot].grant_invincibility(frames);
                },
                MachineEvent::AttackFinished { move_id } => {
                    if self.combatants[slot].resolve_move(move_id, &self.table).is_slam() {
                        self.combatants[slot].spatial_mut().grounded = true;
                    }
                },
                MachineEvent::AttackCancelled { .. } => {
                    self.engine.remove_hitbox(id);
                },
            }
        }
    }

    fn apply_hit(&mut self, hit: &HitResolved) {
        let (Some(attacker), Some(defender)) = (self.slot(hit.attacker), self.slot(hit.defender))
        else {
            warn!("Hit between unknown combatants {} -> {}", hit.attacker, hit.defender);
            return;
        };
        if self.combatants[attacker].is_ko() || !self.combatants[defender].can_be_hit() {
            debug!("Hit {} -> {} discarded", hit.attacker, hit.defender);
            return;
        }

        // Being hit breaks the defender's own combo.
        if let Some(dropped) = self.combatants[defender].combo_mut().drop_combo() {
            self.events.publish(CombatEvent::ComboDropped {
                combatant: hit.defender,
                count: dropped.count,
                damage: dropped.damage,
            });
        }

        let combo_hit = self.combatants[attacker]
            .combo_mut()
            .register_hit(hit.damage, &self.config.combo);

        let hitstun = scaled_hitstun(hit.hitstun_frames, combo_hit.scale);
        let target = &mut self.combatants[defender];
        let removed = target.apply_damage(combo_hit.scaled_damage);
        target.machine_mut().enter_hitstun(hitstun);
        target.grant_invincibility(self.config.match_tuning.invincibility_frames);
        target.record_mut().damage_taken += removed;
        target.spatial_mut().velocity = hit.knockback;
        let defender_hp = target.hp();
        let defender_weight = target.effective_stats().weight;
        self.process_machine_events(defender);

        let source = &mut self.combatants[attacker];
        let synergy_allowed = !source.transformation().is_transformed();
        source
            .meters_mut()
            .gain_from_hit(&combo_hit, synergy_allowed, &self.config.meter);
        let record = source.record_mut();
        record.hits_landed += 1;
        record.damage_dealt += removed;
        record.best_combo = record.best_combo.max(combo_hit.count);

        debug!(
            "{} hit {} with {:?}: {} damage (combo {}, x{:.2}), HP {}",
            hit.attacker,
            hit.defender,
            hit.move_id,
            combo_hit.scaled_damage,
            combo_hit.count,
            combo_hit.scale,
            defender_hp
        );
        self.events.publish(CombatEvent::HitLanded {
            attacker: hit.attacker,
            defender: hit.defender,
            move_id: hit.move_id,
            damage: combo_hit.scaled_damage,
            knockback: hit.knockback,
            position: hit.position,
            hit_stop_frames: hit.hit_stop_frames,
            hitstun_frames: hitstun,
            combo_count: combo_hit.count,
            defender_weight,
            defender_hp,
        });
    }

    /// Check KO and time-out; ends the match and returns true if decided.
    fn evaluate_win(&mut self) -> bool {
        let [first, second] = self.ids();
        let decision = match (self.combatants[0].is_ko(), self.combatants[1].is_ko()) {
            (true, true) => Some((self.meter_tiebreak(), WinReason::Ko)),
            (true, false) => Some((second, WinReason::Ko)),
            (false, true) => Some((first, WinReason::Ko)),
            (false, false) if self.remaining_frames == 0 => {
                Some((self.time_limit_winner(), WinReason::TimeLimit))
            },
            (false, false) => None,
        };
        match decision {
            Some((winner, reason)) => self.end(winner, reason),
            None => false,
        }
    }

    /// Higher HP, then higher total meter, then combatant 1.
    fn time_limit_winner(&self) -> CombatantId {
        let [a, b] = &self.combatants;
        if a.hp() > b.hp() {
            a.id()
        } else if b.hp() > a.hp() {
            b.id()
        } else {
            self.meter_tiebreak()
        }
    }

    /// Higher total meter, then combatant 1.
    fn meter_tiebreak(&self) -> CombatantId {
        let [a, b] = &self.combatants;
        if b.meters().total() > a.meters().total() {
            b.id()
        } else {
            a.id()
        }
    }

    fn update_transformation(&mut self, slot: usize) {
        let combatant = &mut self.combatants[slot];
        let hp_fraction = combatant.hp_fraction();
        let Some((level, reason)) = combatant
            .transformation_mut()
            .update(FRAME_DT, hp_fraction)
        else {
            return;
        };
        let id = combatant.id();
        self.refresh_stats(slot);
        self.events.publish(CombatEvent::TransformationReverted {
            combatant: id,
            level,
            reason,
        });
    }
}
