//! Pending-action storage for the tick scheduler.
//!
//! The queue only stores and orders entries; validation and cooldown
//! stamping happen in the engine so rejected requests leave no trace here.

use std::fmt;

use crate::state::{ActionId, EntityId, RoomPosition, TimestampMs};

/// Monotonic identifier for a queued action, usable for cancellation.
/// Doubles as the insertion-order tie-breaker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One accepted action waiting for its execution time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedAction {
    pub ticket: Ticket,
    pub entity: EntityId,
    pub action: ActionId,
    pub target: Option<EntityId>,
    pub target_position: Option<RoomPosition>,
    pub queued_at: TimestampMs,
    pub executes_at: TimestampMs,
}

/// Reasons a queue request is rejected. The registry and queue are left
/// untouched in every case.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("unknown action {0}")]
    UnknownAction(ActionId),

    #[error("entity {0} is defeated")]
    EntityDefeated(EntityId),

    #[error("action {action} restricted to the player")]
    RestrictedAction { action: ActionId },

    #[error("action {action} on cooldown until {ready_at}")]
    OnCooldown {
        action: ActionId,
        ready_at: TimestampMs,
    },

    #[error("entity {0} already has a queued action")]
    EntityBusy(EntityId),

    #[error("action {action} requires a target")]
    MissingTarget { action: ActionId },

    #[error("action {action} requires a target position")]
    MissingTargetPosition { action: ActionId },

    #[error("target {0} is not a valid target")]
    InvalidTarget(EntityId),

    #[error("target {target} out of range ({distance:.1} > {range:.1})")]
    TargetOutOfRange {
        target: EntityId,
        range: f32,
        distance: f32,
    },
}

/// Pending actions keyed by computed execution time.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    entries: Vec<QueuedAction>,
    next_ticket: u64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-action-in-flight check.
    pub fn has_pending(&self, entity: &EntityId) -> bool {
        self.entries.iter().any(|entry| &entry.entity == entity)
    }

    /// Insert an already-validated request and hand back its ticket.
    pub fn push(
        &mut self,
        entity: EntityId,
        action: ActionId,
        target: Option<EntityId>,
        target_position: Option<RoomPosition>,
        queued_at: TimestampMs,
        executes_at: TimestampMs,
    ) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.entries.push(QueuedAction {
            ticket,
            entity,
            action,
            target,
            target_position,
            queued_at,
            executes_at,
        });
        ticket
    }

    /// Remove a not-yet-executed entry. No-op (false) if the ticket is
    /// absent; the cooldown charged at queue time is not refunded.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.ticket != ticket);
        self.entries.len() != before
    }

    /// Remove and return every entry due at `now`, in ascending
    /// `executes_at` order with ties broken by insertion order.
    pub fn drain_ready(&mut self, now: TimestampMs) -> Vec<QueuedAction> {
        let mut ready: Vec<QueuedAction> = Vec::new();
        self.entries.retain(|entry| {
            if entry.executes_at <= now {
                ready.push(entry.clone());
                false
            } else {
                true
            }
        });
        ready.sort_by_key(|entry| (entry.executes_at, entry.ticket));
        ready
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in execution order, for snapshots.
    pub fn ordered(&self) -> Vec<QueuedAction> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|entry| (entry.executes_at, entry.ticket));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_at(queue: &mut ActionQueue, entity: &str, executes_at: u64) -> Ticket {
        queue.push(
            entity.into(),
            "basic_attack".into(),
            None,
            None,
            TimestampMs(0),
            TimestampMs(executes_at),
        )
    }

    #[test]
    fn drains_in_execution_order_with_ticket_tie_break() {
        let mut queue = ActionQueue::new();
        let late = push_at(&mut queue, "a", 300);
        let early = push_at(&mut queue, "b", 100);
        let tied = push_at(&mut queue, "c", 300);

        let ready = queue.drain_ready(TimestampMs(300));
        let tickets: Vec<Ticket> = ready.iter().map(|entry| entry.ticket).collect();
        assert_eq!(tickets, vec![early, late, tied]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_leaves_future_entries() {
        let mut queue = ActionQueue::new();
        push_at(&mut queue, "a", 100);
        let future = push_at(&mut queue, "b", 500);

        let ready = queue.drain_ready(TimestampMs(200));
        assert_eq!(ready.len(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.ordered()[0].ticket, future);
    }

    #[test]
    fn cancel_on_absent_ticket_is_a_noop() {
        let mut queue = ActionQueue::new();
        push_at(&mut queue, "a", 100);

        assert!(!queue.cancel(Ticket(999)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn cancel_removes_only_the_named_entry() {
        let mut queue = ActionQueue::new();
        let first = push_at(&mut queue, "a", 100);
        push_at(&mut queue, "b", 200);

        assert!(queue.cancel(first));
        assert_eq!(queue.len(), 1);
        assert!(!queue.has_pending(&"a".into()));
        assert!(queue.has_pending(&"b".into()));
    }
}
