//! Cloneable façade for issuing commands to the session.
//!
//! [`SessionHandle`] hides the channel plumbing and offers async helpers
//! for driving the engine or subscribing to its output. Validation failures
//! on the queue paths come back as `false`, matching how a UI presents a
//! synchronous rejection; `Err` means the session itself is gone.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use combat_core::{
    ActionDefinition, ActionId, CombatEntity, CombatState, EntityId, EntityPatch, GateDirection,
    RoomPosition, Ticket, catalog::ids, gate,
};

use crate::errors::{Result, SessionError};
use crate::events::{SessionEvent, StateBroadcaster};
use crate::worker::Command;

/// Client-facing handle to interact with a room session.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    broadcaster: StateBroadcaster,
}

impl SessionHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, broadcaster: StateBroadcaster) -> Self {
        Self {
            command_tx,
            broadcaster,
        }
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::CommandChannelClosed)
    }

    /// Ask the worker to stop. Used by `Session::shutdown`.
    pub(crate) async fn send_shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx.await.map_err(SessionError::ReplyChannelClosed)
    }

    // ========================================================================
    // Registry commands
    // ========================================================================

    /// Insert an entity, replacing any record with the same id.
    pub async fn add_entity(&self, entity: CombatEntity) -> Result<()> {
        self.send(Command::AddEntity(entity)).await
    }

    /// Merge a partial update; false if the id is unknown.
    pub async fn update_entity(&self, id: EntityId, patch: EntityPatch) -> Result<bool> {
        self.request(|reply| Command::UpdateEntity { id, patch, reply })
            .await
    }

    pub async fn remove_entity(&self, id: EntityId) -> Result<bool> {
        self.request(|reply| Command::RemoveEntity { id, reply }).await
    }

    /// Select an entity for the UI, or clear with `None`.
    pub async fn select_entity(&self, id: Option<EntityId>) -> Result<bool> {
        self.request(|reply| Command::SelectEntity { id, reply }).await
    }

    // ========================================================================
    // Scheduler commands
    // ========================================================================

    /// Queue an action. `false` on any validation failure (unknown ids,
    /// cooldown, busy entity, bad target) — the queue is left unchanged.
    pub async fn queue_action(
        &self,
        entity: EntityId,
        action: ActionId,
        target: Option<EntityId>,
        target_position: Option<RoomPosition>,
    ) -> Result<bool> {
        self.request(|reply| Command::QueueAction {
            entity,
            action,
            target,
            target_position,
            reply,
        })
        .await
    }

    /// Queue a scheduled move to `position`.
    pub async fn queue_move_action(
        &self,
        entity: EntityId,
        position: RoomPosition,
    ) -> Result<bool> {
        self.queue_action(entity, ActionId::new(ids::MOVE), None, Some(position))
            .await
    }

    /// Cancel a pending queue entry. No-op (false) if the ticket is gone;
    /// the cooldown charged at queue time stays spent.
    pub async fn cancel_action(&self, ticket: Ticket) -> Result<bool> {
        self.request(|reply| Command::CancelAction { ticket, reply })
            .await
    }

    /// Close distance and attack: the two-step schedule for out-of-range
    /// targets. Queues an approach move, waits out its execution time, then
    /// queues the attack. There is no scheduler-side chaining; a target
    /// already in range is attacked directly.
    pub async fn engage(
        &self,
        entity: EntityId,
        action: ActionId,
        target: EntityId,
    ) -> Result<bool> {
        if self
            .queue_action(entity.clone(), action.clone(), Some(target.clone()), None)
            .await?
        {
            return Ok(true);
        }

        let plan = {
            let entity = entity.clone();
            let action = action.clone();
            let target = target.clone();
            self.request(|reply| Command::ApproachPlan {
                entity,
                action,
                target,
                reply,
            })
            .await?
        };
        let Some(plan) = plan else {
            return Ok(false);
        };

        if !self.queue_move_action(entity.clone(), plan.position).await? {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_millis(plan.delay_ms)).await;
        self.queue_action(entity, action, Some(target), None).await
    }

    // ========================================================================
    // Positioning
    // ========================================================================

    /// One frame of continuous movement input. Fire-and-forget; gate
    /// crossings surface as [`SessionEvent`]s.
    pub async fn movement_input(&self, entity: EntityId, vx: f32, vy: f32) -> Result<()> {
        self.send(Command::MovementInput { entity, vx, vy }).await
    }

    /// Where an entrant lands after travelling `direction` (room center
    /// when the direction is unknown). Pure lookup, no round-trip.
    pub fn entry_position(direction: Option<GateDirection>) -> RoomPosition {
        gate::entry_position(direction)
    }

    // ========================================================================
    // Read paths
    // ========================================================================

    /// Actions the entity could queue right now (off cooldown, usable by
    /// its kind).
    pub async fn available_actions(&self, entity: EntityId) -> Result<Vec<ActionDefinition>> {
        self.request(|reply| Command::AvailableActions { entity, reply })
            .await
    }

    /// Legal targets of `action` for `entity`, in stable id order.
    pub async fn valid_targets(
        &self,
        entity: EntityId,
        action: ActionId,
    ) -> Result<Vec<EntityId>> {
        self.request(|reply| Command::ValidTargets {
            entity,
            action,
            reply,
        })
        .await
    }

    /// Euclidean distance between two entities, if both exist.
    pub async fn distance_between(&self, a: EntityId, b: EntityId) -> Result<Option<f32>> {
        self.request(|reply| Command::DistanceBetween { a, b, reply })
            .await
    }

    /// Current state snapshot (read-only clone).
    pub async fn snapshot(&self) -> Result<CombatState> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Subscribe to snapshots: `borrow()` yields the current state
    /// immediately, `changed()` resolves after every mutation. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe_state(&self) -> watch::Receiver<CombatState> {
        self.broadcaster.subscribe_state()
    }

    /// Subscribe to discrete session events (executions, rejections,
    /// transitions).
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcaster.subscribe_events()
    }
}
