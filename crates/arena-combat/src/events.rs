//! Typed combat events and the publish/subscribe bus.
//!
//! The match publishes; presentation, audio and progression subscribe
//! read-only. Nothing a subscriber does can reach back into combat state.

use arena_common::{CombatantId, Vec3};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::attack_state::AttackState;
use crate::match_state::MatchResult;
use crate::moves::MoveId;
use crate::transformation::RevertReason;

/// Events emitted by the combat core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// The round began.
    MatchStarted {
        /// Round length in seconds.
        round_time: f32,
    },
    /// The match was paused.
    MatchPaused,
    /// The match resumed.
    MatchResumed,
    /// A combatant's attack state changed.
    AttackStateChanged {
        /// Combatant.
        combatant: CombatantId,
        /// Previous state.
        from: AttackState,
        /// New state.
        to: AttackState,
    },
    /// A combatant started a move.
    AttackStarted {
        /// Combatant.
        combatant: CombatantId,
        /// Move started.
        move_id: MoveId,
        /// Move it was chained from.
        chained_from: Option<MoveId>,
    },
    /// A hit was applied.
    HitLanded {
        /// Attacker.
        attacker: CombatantId,
        /// Defender.
        defender: CombatantId,
        /// Move that landed.
        move_id: MoveId,
        /// Damage after combo scaling.
        damage: f32,
        /// Knockback applied.
        knockback: Vec3,
        /// Contact point.
        position: Vec3,
        /// Hit-stop frames.
        hit_stop_frames: u32,
        /// Hitstun frames applied.
        hitstun_frames: u32,
        /// Attacker combo count after the hit.
        combo_count: u32,
        /// Defender weight (feel effects scale by it).
        defender_weight: f32,
        /// Defender HP after the hit.
        defender_hp: f32,
    },
    /// A combo ended (timeout or the attacker got hit).
    ComboDropped {
        /// Combatant whose combo ended.
        combatant: CombatantId,
        /// Hits in the combo.
        count: u32,
        /// Scaled damage dealt.
        damage: f32,
    },
    /// A special or ultimate move started.
    SpecialMoveUsed {
        /// Combatant.
        combatant: CombatantId,
        /// Move used.
        move_id: MoveId,
    },
    /// A transformation tier became active.
    TransformationActivated {
        /// Combatant.
        combatant: CombatantId,
        /// Tier.
        level: u8,
        /// Tier name.
        name: String,
        /// Seconds it lasts.
        duration: Option<f32>,
    },
    /// A transformation ended.
    TransformationReverted {
        /// Combatant.
        combatant: CombatantId,
        /// Tier that ended.
        level: u8,
        /// Why it ended.
        reason: RevertReason,
    },
    /// The match ended.
    MatchEnded(Box<MatchResult>),
}

impl CombatEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MatchStarted { .. } => "match_started",
            Self::MatchPaused => "match_paused",
            Self::MatchResumed => "match_resumed",
            Self::AttackStateChanged { .. } => "attack_state_changed",
            Self::AttackStarted { .. } => "attack_started",
            Self::HitLanded { .. } => "hit_landed",
            Self::ComboDropped { .. } => "combo_dropped",
            Self::SpecialMoveUsed { .. } => "special_move_used",
            Self::TransformationActivated { .. } => "transformation_activated",
            Self::TransformationReverted { .. } => "transformation_reverted",
            Self::MatchEnded(_) => "match_ended",
        }
    }
}

/// Read-only consumer of combat events.
pub trait CombatEventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &CombatEvent);
}

/// Event bus with a local queue and any number of subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for the local queue
    sender: Sender<CombatEvent>,
    /// Receiver for the local queue
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
    /// Subscriber channels
    subscribers: Vec<Sender<CombatEvent>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            subscribers: Vec::new(),
        }
    }

    /// Adds a subscriber with its own bounded channel.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<CombatEvent> {
        let (sender, receiver) = bounded(capacity.max(1));
        self.subscribers.push(sender);
        receiver
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publishes an event to the local queue and every subscriber.
    ///
    /// The local queue keeps the newest `capacity` events: when it is full
    /// the oldest pending event is discarded to make room.
    pub fn publish(&mut self, event: CombatEvent) {
        // Non-blocking send; a full subscriber drops the event, a closed one
        // is forgotten.
        self.subscribers.retain(|subscriber| {
            !matches!(
                subscriber.try_send(event.clone()),
                Err(TrySendError::Disconnected(_))
            )
        });
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            let _ = self.receiver.try_recv();
            let _ = self.sender.try_send(event);
        }
    }

    /// Drains all pending events from the local queue.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events in the local queue.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
