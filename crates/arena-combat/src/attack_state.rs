//! Per-combatant attack state machine.
//!
//! Drives one combatant through `Idle -> Startup -> Active -> Recovery -> Idle`
//! with the side states `Hitstun` and `Transformation`. Input is either acted
//! on immediately, chained through the [`ComboChainGraph`] once the cancel
//! window opens, or held in a small FIFO buffer.
//!
//! The machine does not own meters or move data. Each call receives a
//! [`MoveContext`] that lends it the tables and the combatant's meters, and
//! side effects (hitbox requests, cancellations) are queued as
//! [`MachineEvent`]s for the owner to drain.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::chain::ComboChainGraph;
use crate::clock::{seconds_to_frames, FrameClock, FRAME_DT};
use crate::combo::Meters;
use crate::error::Rejection;
use crate::input::{InputCategory, InputSymbol};
use crate::moves::{
    AttackMove, FrameDataMultipliers, MeterCost, MoveCategory, MoveId, MoveTable,
    MovesetOverride, PhaseTimings,
};

/// Elapsed-time comparisons tolerate this much float error.
const TIME_EPSILON: f32 = 1e-5;

/// Default input buffer capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2;

// ============================================================================
// States and Outcomes
// ============================================================================

/// Attack state of one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackState {
    /// No attack; free to act.
    #[default]
    Idle,
    /// Wind-up before the hitbox appears.
    Startup,
    /// Hitbox is live.
    Active,
    /// Wind-down after the hitbox.
    Recovery,
    /// Forced non-actionable state after being hit.
    Hitstun,
    /// Transformation cinematic.
    Transformation,
}

impl AttackState {
    /// Whether an attack is in progress.
    #[must_use]
    pub const fn is_attacking(self) -> bool {
        matches!(self, Self::Startup | Self::Active | Self::Recovery)
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Startup => "Startup",
            Self::Active => "Active",
            Self::Recovery => "Recovery",
            Self::Hitstun => "Hitstun",
            Self::Transformation => "Transformation",
        }
    }
}

/// Result of submitting an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputOutcome {
    /// A fresh attack started.
    Started(MoveId),
    /// The current attack was cancelled into a chained move.
    Chained {
        /// Move that was cancelled.
        from: MoveId,
        /// Move that started.
        to: MoveId,
    },
    /// Held until the cancel window or the end of the current state.
    Buffered,
    /// The transform button activated a transformation tier.
    Transformed(u8),
    /// Not a combat input in this state (movement, idle jump).
    Ignored,
    /// Turned down; nothing changed.
    Rejected(Rejection),
}

impl InputOutcome {
    /// Whether a move started.
    #[must_use]
    pub fn started_move(&self) -> Option<MoveId> {
        match self {
            Self::Started(id) | Self::Chained { to: id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Why an attack was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// Cancelled into a chained move.
    Chain,
    /// Interrupted by being hit.
    Hitstun,
    /// Interrupted by a transformation.
    Transformation,
}

/// Side effects produced by the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// State transition.
    StateChanged {
        /// Previous state.
        from: AttackState,
        /// New state.
        to: AttackState,
    },
    /// An attack began; its meter cost has already been paid.
    AttackStarted {
        /// Move started.
        move_id: MoveId,
        /// Move it was chained from, if any.
        chained_from: Option<MoveId>,
        /// Meter paid.
        cost: MeterCost,
    },
    /// First frame of ACTIVE: spawn the hitbox. Sent once per attack.
    HitboxRequested {
        /// Move whose hitbox to spawn.
        move_id: MoveId,
        /// Frames the hitbox stays live.
        active_frames: u32,
    },
    /// A non-damaging move entered ACTIVE and grants invincibility.
    InvincibilityGranted {
        /// Frames of invincibility.
        frames: u32,
    },
    /// Attack ran to completion.
    AttackFinished {
        /// Move that finished.
        move_id: MoveId,
    },
    /// Attack was cut short.
    AttackCancelled {
        /// Move that was cut.
        move_id: MoveId,
        /// Elapsed seconds at the cut.
        elapsed: f32,
        /// Cancel offset of the cut move.
        cancel_at: f32,
        /// Why it was cut.
        reason: CancelReason,
    },
}

// ============================================================================
// Move Context
// ============================================================================

/// Everything the machine borrows for one call.
#[derive(Debug)]
pub struct MoveContext<'a> {
    /// Base move data.
    pub table: &'a MoveTable,
    /// Legal cancels.
    pub chains: &'a ComboChainGraph,
    /// Transformation moveset override, checked first.
    pub moveset: Option<&'a MovesetOverride>,
    /// Fighter-specific moveset override, checked second.
    pub fighter_moveset: Option<&'a MovesetOverride>,
    /// Active frame-data multipliers.
    pub frame_data: FrameDataMultipliers,
    /// Meters that pay move costs.
    pub meters: &'a mut Meters,
    /// Whether the combatant stands on the ground.
    pub grounded: bool,
}

impl<'a> MoveContext<'a> {
    /// Effective record of a move after overrides.
    #[must_use]
    pub fn resolve(&self, id: MoveId) -> &'a AttackMove {
        self.moveset
            .and_then(|moveset| moveset.get(id))
            .or_else(|| self.fighter_moveset.and_then(|moveset| moveset.get(id)))
            .unwrap_or_else(|| self.table.get(id))
    }
}

/// The attack currently in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentAttack {
    /// Move being performed.
    pub move_id: MoveId,
    /// Move category.
    pub category: MoveCategory,
    /// Seconds since the attack started.
    pub elapsed: f32,
    /// Phase lengths for this instance.
    pub timings: PhaseTimings,
    /// Whether a cancel is legal.
    pub cancelable: bool,
    /// Whether the ACTIVE entry effect (hitbox) has fired.
    pub active_fired: bool,
}

impl CurrentAttack {
    fn phase(&self) -> Option<AttackState> {
        let t = self.elapsed + TIME_EPSILON;
        if t < self.timings.active_start() {
            Some(AttackState::Startup)
        } else if t < self.timings.recovery_start() {
            Some(AttackState::Active)
        } else if t < self.timings.total() {
            Some(AttackState::Recovery)
        } else {
            None
        }
    }
}

// ============================================================================
// Attack State Machine
// ============================================================================

/// Attack state machine of one combatant.
#[derive(Debug, Clone)]
pub struct AttackStateMachine {
    state: AttackState,
    clock: FrameClock,
    current: Option<CurrentAttack>,
    buffer: VecDeque<InputCategory>,
    buffer_capacity: usize,
    hitstun_frames: u32,
    transformation_frames: u32,
    events: Vec<MachineEvent>,
}

impl Default for AttackStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackStateMachine {
    /// Create an idle machine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AttackState::Idle,
            clock: FrameClock::new(),
            current: None,
            buffer: VecDeque::with_capacity(DEFAULT_BUFFER_CAPACITY),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            hitstun_frames: 0,
            transformation_frames: 0,
            events: Vec::new(),
        }
    }

    /// Set the input buffer capacity (at least 1).
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AttackState {
        self.state
    }

    /// Attack in progress, if any.
    #[must_use]
    pub fn current(&self) -> Option<&CurrentAttack> {
        self.current.as_ref()
    }

    /// Buffered input categories, oldest first.
    pub fn buffered(&self) -> impl Iterator<Item = InputCategory> + '_ {
        self.buffer.iter().copied()
    }

    /// Hitstun frames remaining.
    #[must_use]
    pub const fn hitstun_frames(&self) -> u32 {
        self.hitstun_frames
    }

    /// Transformation cinematic frames remaining.
    #[must_use]
    pub const fn transformation_frames(&self) -> u32 {
        self.transformation_frames
    }

    /// Frames this machine has advanced.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Whether horizontal movement input is locked.
    #[must_use]
    pub fn movement_locked(&self) -> bool {
        match self.state {
            AttackState::Hitstun | AttackState::Transformation => true,
            _ => self
                .current
                .as_ref()
                .is_some_and(|attack| attack.category.locks_movement() && !attack.cancelable),
        }
    }

    /// Take queued events.
    pub fn drain_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Return to idle, dropping the attack, buffer, timers and events.
    pub fn reset(&mut self) {
        let capacity = self.buffer_capacity;
        *self = Self::new().with_buffer_capacity(capacity);
    }

    // === Input ===

    /// Submit one input symbol.
    pub fn submit_input(&mut self, symbol: InputSymbol, ctx: &mut MoveContext<'_>) -> InputOutcome {
        let Some(category) = symbol.category() else {
            return InputOutcome::Ignored;
        };

        match self.state {
            AttackState::Hitstun => InputOutcome::Rejected(Rejection::NotActionable {
                state: self.state.name().to_string(),
            }),
            AttackState::Transformation => self.buffer_input(category),
            AttackState::Idle => self.start_fresh(category, ctx),
            AttackState::Startup | AttackState::Active | AttackState::Recovery => {
                let cancel_from = self
                    .current
                    .as_ref()
                    .filter(|attack| attack.cancelable)
                    .map(|attack| attack.move_id);
                match cancel_from {
                    Some(from) => match ctx.chains.next(from, category) {
                        Some(to) => match self.begin(to, Some(from), ctx) {
                            Ok(()) => InputOutcome::Chained { from, to },
                            Err(rejection) => InputOutcome::Rejected(rejection),
                        },
                        None => InputOutcome::Rejected(Rejection::NoChain {
                            from,
                            input: category,
                        }),
                    },
                    None => self.buffer_input(category),
                }
            },
        }
    }

    fn buffer_input(&mut self, category: InputCategory) -> InputOutcome {
        if self.buffer.len() >= self.buffer_capacity {
            return InputOutcome::Rejected(Rejection::BufferFull {
                capacity: self.buffer_capacity,
            });
        }
        self.buffer.push_back(category);
        InputOutcome::Buffered
    }

    /// Map an input to its base move and start it.
    fn start_fresh(&mut self, category: InputCategory, ctx: &mut MoveContext<'_>) -> InputOutcome {
        let move_id = match category {
            InputCategory::Light if ctx.grounded => MoveId::Light1,
            InputCategory::Light => MoveId::AirLight1,
            InputCategory::Heavy if ctx.grounded => MoveId::Heavy1,
            InputCategory::Heavy => MoveId::AirHeavy,
            InputCategory::Launcher if ctx.grounded => MoveId::Launcher,
            InputCategory::Launcher => {
                return InputOutcome::Rejected(Rejection::WrongStance(MoveId::Launcher));
            },
            InputCategory::Special => MoveId::Special,
            InputCategory::Ultimate => MoveId::Ultimate,
            InputCategory::Dodge => MoveId::Dodge,
            InputCategory::Jump => return InputOutcome::Ignored,
        };

        match self.begin(move_id, None, ctx) {
            Ok(()) => InputOutcome::Started(move_id),
            Err(rejection) => InputOutcome::Rejected(rejection),
        }
    }

    /// Start a move, paying its cost. The previous attack, if any, is
    /// cancelled into it.
    fn begin(
        &mut self,
        move_id: MoveId,
        chained_from: Option<MoveId>,
        ctx: &mut MoveContext<'_>,
    ) -> Result<(), Rejection> {
        let attack = ctx.resolve(move_id);
        ctx.meters.check_cost(&attack.cost)?;

        let cost = attack.cost;
        let category = attack.category;
        let timings = PhaseTimings::for_move(attack, &ctx.frame_data);
        ctx.meters.spend(&cost);

        if chained_from.is_some() {
            self.cancel_current(CancelReason::Chain);
        }

        debug!("Attack {:?} started (chained from {:?})", move_id, chained_from);
        self.current = Some(CurrentAttack {
            move_id,
            category,
            elapsed: 0.0,
            timings,
            cancelable: false,
            active_fired: false,
        });
        self.events.push(MachineEvent::AttackStarted {
            move_id,
            chained_from,
            cost,
        });
        self.set_state(AttackState::Startup);
        Ok(())
    }

    fn cancel_current(&mut self, reason: CancelReason) {
        if let Some(attack) = self.current.take() {
            self.events.push(MachineEvent::AttackCancelled {
                move_id: attack.move_id,
                elapsed: attack.elapsed,
                cancel_at: attack.timings.cancel_at,
                reason,
            });
        }
    }

    fn set_state(&mut self, to: AttackState) {
        if self.state != to {
            self.events.push(MachineEvent::StateChanged {
                from: self.state,
                to,
            });
            self.state = to;
        }
    }

    // === Side States ===

    /// Enter hitstun, discarding any attack and buffered input.
    pub fn enter_hitstun(&mut self, frames: u32) {
        self.cancel_current(CancelReason::Hitstun);
        self.buffer.clear();
        self.transformation_frames = 0;
        self.hitstun_frames = frames.max(1);
        self.set_state(AttackState::Hitstun);
    }

    /// Enter the transformation cinematic. Buffered input is kept and
    /// replayed on exit.
    pub fn enter_transformation(&mut self, frames: u32) {
        self.cancel_current(CancelReason::Transformation);
        self.hitstun_frames = 0;
        self.transformation_frames = frames.max(1);
        self.set_state(AttackState::Transformation);
    }

    // === Tick ===

    /// Advance by wall-clock time; runs one step per elapsed logical frame.
    pub fn advance(&mut self, dt: f32, ctx: &mut MoveContext<'_>) {
        let frames = self.clock.advance(dt);
        for _ in 0..frames {
            self.step(ctx);
        }
    }

    fn step(&mut self, ctx: &mut MoveContext<'_>) {
        match self.state {
            AttackState::Idle => {},
            AttackState::Hitstun => {
                self.hitstun_frames = self.hitstun_frames.saturating_sub(1);
                if self.hitstun_frames == 0 {
                    self.set_state(AttackState::Idle);
                }
            },
            AttackState::Transformation => {
                self.transformation_frames = self.transformation_frames.saturating_sub(1);
                if self.transformation_frames == 0 {
                    self.set_state(AttackState::Idle);
                    self.replay_buffer(ctx);
                }
            },
            AttackState::Startup | AttackState::Active | AttackState::Recovery => {
                self.step_attack(ctx);
            },
        }
    }

    fn step_attack(&mut self, ctx: &mut MoveContext<'_>) {
        let Some(attack) = self.current.as_mut() else {
            self.set_state(AttackState::Idle);
            return;
        };
        attack.elapsed += FRAME_DT;
        let move_id = attack.move_id;

        // ACTIVE entry fires once, even if a short phase was stepped over.
        let mut entry = None;
        if !attack.active_fired && attack.elapsed + TIME_EPSILON >= attack.timings.active_start() {
            attack.active_fired = true;
            let frames = seconds_to_frames(attack.timings.active).max(1);
            entry = Some(if attack.category.deals_damage() {
                MachineEvent::HitboxRequested {
                    move_id,
                    active_frames: frames,
                }
            } else {
                MachineEvent::InvincibilityGranted { frames }
            });
        }

        let opened = !attack.cancelable && attack.elapsed + TIME_EPSILON >= attack.timings.cancel_at;
        if opened {
            attack.cancelable = true;
        }
        let phase = attack.phase();

        match phase {
            Some(phase) => self.set_state(phase),
            None => self.set_state(AttackState::Recovery),
        }
        if let Some(event) = entry {
            self.events.push(event);
        }

        if opened && self.consume_buffer_at_cancel(move_id, ctx) {
            return;
        }

        if phase.is_none() {
            self.current = None;
            debug!("Attack {:?} finished", move_id);
            self.events.push(MachineEvent::AttackFinished { move_id });
            self.set_state(AttackState::Idle);
            self.replay_buffer(ctx);
        }
    }

    /// Chain the oldest buffered input that has an edge; others are dropped.
    fn consume_buffer_at_cancel(&mut self, from: MoveId, ctx: &mut MoveContext<'_>) -> bool {
        while let Some(category) = self.buffer.pop_front() {
            if let Some(to) = ctx.chains.next(from, category) {
                if self.begin(to, Some(from), ctx).is_ok() {
                    return true;
                }
            }
        }
        false
    }

    /// Start a fresh attack from the oldest usable buffered input.
    fn replay_buffer(&mut self, ctx: &mut MoveContext<'_>) {
        while let Some(category) = self.buffer.pop_front() {
            if self.start_fresh(category, ctx).started_move().is_some() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Rig {
        table: MoveTable,
        chains: ComboChainGraph,
        meters: Meters,
        grounded: bool,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                table: MoveTable::standard(),
                chains: ComboChainGraph::standard(),
                meters: Meters::default(),
                grounded: true,
            }
        }

        fn ctx(&mut self) -> MoveContext<'_> {
            MoveContext {
                table: &self.table,
                chains: &self.chains,
                moveset: None,
                fighter_moveset: None,
                frame_data: FrameDataMultipliers::IDENTITY,
                meters: &mut self.meters,
                grounded: self.grounded,
            }
        }
    }

    fn run_frames(machine: &mut AttackStateMachine, rig: &mut Rig, frames: u32) {
        for _ in 0..frames {
            machine.advance(FRAME_DT, &mut rig.ctx());
        }
    }

    #[test]
    fn test_light_starts_light1() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        let outcome = machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        assert_eq!(outcome, InputOutcome::Started(MoveId::Light1));
        assert_eq!(machine.state(), AttackState::Startup);
    }

    #[test]
    fn test_airborne_light_starts_aerial() {
        let mut rig = Rig::new();
        rig.grounded = false;
        let mut machine = AttackStateMachine::new();
        let outcome = machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        assert_eq!(outcome, InputOutcome::Started(MoveId::AirLight1));
        let outcome = machine.submit_input(InputSymbol::LauncherAttack, &mut rig.ctx());
        assert_eq!(outcome, InputOutcome::Buffered);
    }

    #[test]
    fn test_launcher_needs_ground() {
        let mut rig = Rig::new();
        rig.grounded = false;
        let mut machine = AttackStateMachine::new();
        let outcome = machine.submit_input(InputSymbol::LauncherAttack, &mut rig.ctx());
        assert_eq!(
            outcome,
            InputOutcome::Rejected(Rejection::WrongStance(MoveId::Launcher))
        );
        assert_eq!(machine.state(), AttackState::Idle);
    }

    #[test]
    fn test_full_attack_cycle() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        machine.drain_events();

        // Light1 lasts 0.30s = 18 frames: startup 3.6, active to 10.8.
        run_frames(&mut machine, &mut rig, 4);
        assert_eq!(machine.state(), AttackState::Active);
        let events = machine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            MachineEvent::HitboxRequested {
                move_id: MoveId::Light1,
                ..
            }
        )));

        run_frames(&mut machine, &mut rig, 7);
        assert_eq!(machine.state(), AttackState::Recovery);

        run_frames(&mut machine, &mut rig, 7);
        assert_eq!(machine.state(), AttackState::Idle);
        assert!(machine.current().is_none());
        let events = machine.drain_events();
        assert!(events.contains(&MachineEvent::AttackFinished {
            move_id: MoveId::Light1
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, MachineEvent::HitboxRequested { .. })));
    }

    #[test]
    fn test_input_before_window_is_buffered_then_chained() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        let outcome = machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        assert_eq!(outcome, InputOutcome::Buffered);

        // Cancel window at 0.15s = 9 frames.
        run_frames(&mut machine, &mut rig, 8);
        assert_eq!(machine.current().map(|a| a.move_id), Some(MoveId::Light1));
        run_frames(&mut machine, &mut rig, 1);
        assert_eq!(machine.current().map(|a| a.move_id), Some(MoveId::Light2));
        assert_eq!(machine.buffered().count(), 0);
    }

    #[test]
    fn test_cancelable_input_chains_immediately() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        run_frames(&mut machine, &mut rig, 10);
        let outcome = machine.submit_input(InputSymbol::HeavyAttack, &mut rig.ctx());
        assert_eq!(
            outcome,
            InputOutcome::Chained {
                from: MoveId::Light1,
                to: MoveId::Heavy1
            }
        );
    }

    #[test]
    fn test_unmatched_chain_dropped() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::LauncherAttack, &mut rig.ctx());
        run_frames(&mut machine, &mut rig, 20);
        let outcome = machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        assert!(matches!(
            outcome,
            InputOutcome::Rejected(Rejection::NoChain { .. })
        ));
        assert_eq!(machine.current().map(|a| a.move_id), Some(MoveId::Launcher));
        assert_eq!(machine.buffered().count(), 0);
    }

    #[test]
    fn test_buffer_overflow_drops_newest() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        machine.submit_input(InputSymbol::HeavyAttack, &mut rig.ctx());
        let outcome = machine.submit_input(InputSymbol::Dodge, &mut rig.ctx());
        assert_eq!(
            outcome,
            InputOutcome::Rejected(Rejection::BufferFull { capacity: 2 })
        );
        let buffered: Vec<_> = machine.buffered().collect();
        assert_eq!(buffered, vec![InputCategory::Light, InputCategory::Heavy]);
    }

    #[test]
    fn test_special_requires_meter() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        let outcome = machine.submit_input(InputSymbol::SpecialAttack, &mut rig.ctx());
        assert!(matches!(
            outcome,
            InputOutcome::Rejected(Rejection::InsufficientResource { .. })
        ));
        assert_eq!(machine.state(), AttackState::Idle);

        rig.meters.special = 60.0;
        let outcome = machine.submit_input(InputSymbol::SpecialAttack, &mut rig.ctx());
        assert_eq!(outcome, InputOutcome::Started(MoveId::Special));
        assert!((rig.meters.special - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_heavy_locks_movement_until_cancel() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::HeavyAttack, &mut rig.ctx());
        assert!(machine.movement_locked());
        // Heavy1: 0.55s, cancel at 0.33s = ~20 frames.
        run_frames(&mut machine, &mut rig, 21);
        assert!(!machine.movement_locked());

        let mut light = AttackStateMachine::new();
        light.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        assert!(!light.movement_locked());
    }

    #[test]
    fn test_hitstun_discards_attack_and_blocks_input() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        machine.drain_events();

        machine.enter_hitstun(3);
        assert_eq!(machine.state(), AttackState::Hitstun);
        assert!(machine.current().is_none());
        assert_eq!(machine.buffered().count(), 0);
        assert!(machine.drain_events().iter().any(|e| matches!(
            e,
            MachineEvent::AttackCancelled {
                reason: CancelReason::Hitstun,
                ..
            }
        )));

        let outcome = machine.submit_input(InputSymbol::LightAttack, &mut rig.ctx());
        assert!(matches!(
            outcome,
            InputOutcome::Rejected(Rejection::NotActionable { .. })
        ));

        run_frames(&mut machine, &mut rig, 3);
        assert_eq!(machine.state(), AttackState::Idle);
    }

    #[test]
    fn test_transformation_replays_buffer() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.enter_transformation(5);
        let outcome = machine.submit_input(InputSymbol::HeavyAttack, &mut rig.ctx());
        assert_eq!(outcome, InputOutcome::Buffered);
        run_frames(&mut machine, &mut rig, 4);
        assert_eq!(machine.state(), AttackState::Transformation);
        run_frames(&mut machine, &mut rig, 1);
        assert_eq!(machine.current().map(|a| a.move_id), Some(MoveId::Heavy1));
    }

    #[test]
    fn test_dodge_grants_invincibility() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        machine.submit_input(InputSymbol::Dodge, &mut rig.ctx());
        run_frames(&mut machine, &mut rig, 6);
        let events = machine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, MachineEvent::InvincibilityGranted { frames } if *frames > 0)));
        assert!(!events
            .iter()
            .any(|e| matches!(e, MachineEvent::HitboxRequested { .. })));
    }

    #[test]
    fn test_movement_symbols_ignored() {
        let mut rig = Rig::new();
        let mut machine = AttackStateMachine::new();
        for symbol in [InputSymbol::MoveLeft, InputSymbol::Transform, InputSymbol::Jump] {
            assert_eq!(machine.submit_input(symbol, &mut rig.ctx()), InputOutcome::Ignored);
        }
    }

    fn symbol_strategy() -> impl Strategy<Value = InputSymbol> {
        prop::sample::select(InputSymbol::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_single_attack_and_cancel_window(
            steps in prop::collection::vec((prop::option::of(symbol_strategy()), 0u32..4), 1..200),
            special in 0.0f32..100.0,
        ) {
            let mut rig = Rig::new();
            rig.meters.special = special;
            let mut machine = AttackStateMachine::new();

            for (symbol, frames) in steps {
                if let Some(symbol) = symbol {
                    machine.submit_input(symbol, &mut rig.ctx());
                }
                run_frames(&mut machine, &mut rig, frames);

                let attacking = machine.state().is_attacking();
                prop_assert_eq!(attacking, machine.current().is_some());

                for event in machine.drain_events() {
                    if let MachineEvent::AttackCancelled {
                        reason: CancelReason::Chain,
                        elapsed,
                        cancel_at,
                        ..
                    } = event
                    {
                        prop_assert!(elapsed + 1e-4 >= cancel_at);
                    }
                }
            }
        }
    }
}
