//! State broadcasting for external consumers.
//!
//! Two channels: a watch channel always holding the latest [`CombatState`]
//! snapshot (a new subscriber reads the current state immediately via
//! `borrow()`, then observes every mutation), and a broadcast channel of
//! discrete [`SessionEvent`]s for combat logs.
//! Consumers are read-only; publishing is best-effort and never blocks the
//! worker.

use tokio::sync::{broadcast, watch};

use combat_core::{
    ActionId, ActionOutcome, CombatState, EntityId, GateDirection, TimestampMs,
};

/// Discrete happenings published alongside snapshot updates.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A queued action was applied by the resolver.
    ActionExecuted {
        outcome: ActionOutcome,
        at: TimestampMs,
    },
    /// A queue request failed validation; the state did not change.
    ActionRejected {
        entity: EntityId,
        action: ActionId,
        reason: String,
        at: TimestampMs,
    },
    /// Continuous movement crossed a gate and the room-movement request
    /// went out.
    TransitionRequested {
        direction: GateDirection,
        at: TimestampMs,
    },
    /// The collaborator confirmed the transition; room-local entities were
    /// cleared.
    TransitionCompleted {
        direction: GateDirection,
        room: String,
        cleared: usize,
        at: TimestampMs,
    },
    /// The collaborator rejected or failed the transition; the registry was
    /// left untouched.
    TransitionFailed {
        direction: GateDirection,
        error: String,
        at: TimestampMs,
    },
}

/// Publish side of the subscription interface.
pub struct StateBroadcaster {
    snapshot_tx: watch::Sender<CombatState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl StateBroadcaster {
    pub fn new(initial: CombatState, event_capacity: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(initial);
        let (event_tx, _) = broadcast::channel(event_capacity);
        Self {
            snapshot_tx,
            event_tx,
        }
    }

    /// Replace the published snapshot. Succeeds with or without subscribers.
    pub fn publish_snapshot(&self, state: CombatState) {
        self.snapshot_tx.send_replace(state);
    }

    /// Publish a discrete event. Best-effort: with no subscribers the event
    /// is simply dropped.
    pub fn publish_event(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!(target: "combat_runtime::events", "no event subscribers");
        }
    }

    /// Subscribe to snapshots. The receiver's `borrow()` yields the current
    /// snapshot immediately; `changed()` resolves on every later mutation.
    pub fn subscribe_state(&self) -> watch::Receiver<CombatState> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }
}

impl Clone for StateBroadcaster {
    fn clone(&self) -> Self {
        Self {
            snapshot_tx: self.snapshot_tx.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}
