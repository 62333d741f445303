//! Simulation worker that owns the authoritative [`RoomEngine`].
//!
//! Receives commands from [`SessionHandle`](crate::SessionHandle), drives
//! the fixed-period tick loop while actions are pending, runs the room
//! transition round-trip on a side task, and publishes every mutation
//! through the [`StateBroadcaster`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error};

use combat_core::{
    ActionDefinition, ActionId, ApproachPlan, CombatEntity, CombatState, EntityId, EntityPatch,
    GateDirection, MovementOutcome, RoomEngine, RoomPosition, Ticket, TimestampMs,
    fallback_roster,
};

use crate::events::{SessionEvent, StateBroadcaster};
use crate::gateway::{RoomDescriptor, RoomGateway, RoomMoveRequest};

/// Commands accepted by the simulation worker.
pub(crate) enum Command {
    AddEntity(CombatEntity),
    UpdateEntity {
        id: EntityId,
        patch: EntityPatch,
        reply: oneshot::Sender<bool>,
    },
    RemoveEntity {
        id: EntityId,
        reply: oneshot::Sender<bool>,
    },
    SelectEntity {
        id: Option<EntityId>,
        reply: oneshot::Sender<bool>,
    },
    QueueAction {
        entity: EntityId,
        action: ActionId,
        target: Option<EntityId>,
        target_position: Option<RoomPosition>,
        reply: oneshot::Sender<bool>,
    },
    CancelAction {
        ticket: Ticket,
        reply: oneshot::Sender<bool>,
    },
    MovementInput {
        entity: EntityId,
        vx: f32,
        vy: f32,
    },
    AvailableActions {
        entity: EntityId,
        reply: oneshot::Sender<Vec<ActionDefinition>>,
    },
    ValidTargets {
        entity: EntityId,
        action: ActionId,
        reply: oneshot::Sender<Vec<EntityId>>,
    },
    DistanceBetween {
        a: EntityId,
        b: EntityId,
        reply: oneshot::Sender<Option<f32>>,
    },
    ApproachPlan {
        entity: EntityId,
        action: ActionId,
        target: EntityId,
        reply: oneshot::Sender<Option<ApproachPlan>>,
    },
    Snapshot {
        reply: oneshot::Sender<CombatState>,
    },
    Shutdown,
}

/// Result of the asynchronous room-movement round-trip, fed back to the
/// worker so the registry is only ever touched from its own loop.
pub(crate) enum TransitionResolution {
    Confirmed {
        direction: GateDirection,
        room: RoomDescriptor,
    },
    Failed {
        direction: GateDirection,
        error: String,
    },
}

/// Monotonic per-session clock.
///
/// Backed by `tokio::time::Instant` so paused test time drives cooldowns
/// and the gate debounce exactly like wall time.
#[derive(Clone, Copy, Debug)]
struct SessionClock {
    origin: time::Instant,
}

impl SessionClock {
    fn start() -> Self {
        Self {
            origin: time::Instant::now(),
        }
    }

    fn now(&self) -> TimestampMs {
        TimestampMs(self.origin.elapsed().as_millis() as u64)
    }
}

/// Background task processing session commands. Single writer: nothing else
/// holds the engine.
pub(crate) struct SessionWorker {
    engine: RoomEngine,
    gateway: Arc<dyn RoomGateway>,
    broadcaster: StateBroadcaster,
    command_rx: mpsc::Receiver<Command>,
    transition_tx: mpsc::Sender<TransitionResolution>,
    transition_rx: mpsc::Receiver<TransitionResolution>,
    ticker: Option<Interval>,
    tick_period: Duration,
    use_fallback_roster: bool,
    clock: SessionClock,
}

impl SessionWorker {
    pub(crate) fn new(
        engine: RoomEngine,
        gateway: Arc<dyn RoomGateway>,
        broadcaster: StateBroadcaster,
        command_rx: mpsc::Receiver<Command>,
        use_fallback_roster: bool,
    ) -> Self {
        let tick_period = Duration::from_millis(engine.config().tick_period_ms);
        let (transition_tx, transition_rx) = mpsc::channel(8);
        Self {
            engine,
            gateway,
            broadcaster,
            command_rx,
            transition_tx,
            transition_rx,
            ticker: None,
            tick_period,
            use_fallback_roster,
            clock: SessionClock::start(),
        }
    }

    /// Main worker loop.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                maybe_cmd = self.command_rx.recv() => {
                    match maybe_cmd {
                        Some(Command::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }
                Some(resolution) = self.transition_rx.recv() => {
                    self.handle_transition(resolution);
                }
                _ = next_tick(&mut self.ticker) => {
                    self.on_tick();
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::AddEntity(entity) => {
                self.engine.add_entity(entity);
                self.publish_snapshot();
            }
            Command::UpdateEntity { id, patch, reply } => {
                let updated = self.engine.update_entity(&id, &patch);
                if updated {
                    self.publish_snapshot();
                }
                let _ = reply.send(updated);
            }
            Command::RemoveEntity { id, reply } => {
                let removed = self.engine.remove_entity(&id);
                if removed {
                    self.publish_snapshot();
                }
                let _ = reply.send(removed);
            }
            Command::SelectEntity { id, reply } => {
                let selected = self.engine.select_entity(id);
                if selected {
                    self.publish_snapshot();
                }
                let _ = reply.send(selected);
            }
            Command::QueueAction {
                entity,
                action,
                target,
                target_position,
                reply,
            } => {
                let accepted = self.queue_action(entity, action, target, target_position);
                let _ = reply.send(accepted);
            }
            Command::CancelAction { ticket, reply } => {
                let cancelled = self.engine.cancel_action(ticket);
                if cancelled {
                    self.publish_snapshot();
                }
                let _ = reply.send(cancelled);
            }
            Command::MovementInput { entity, vx, vy } => self.movement_input(entity, vx, vy),
            Command::AvailableActions { entity, reply } => {
                let now = self.clock.now();
                let _ = reply.send(self.engine.available_actions(now, &entity));
            }
            Command::ValidTargets {
                entity,
                action,
                reply,
            } => {
                let _ = reply.send(self.engine.valid_targets(&entity, &action));
            }
            Command::DistanceBetween { a, b, reply } => {
                let _ = reply.send(self.engine.distance_between(&a, &b));
            }
            Command::ApproachPlan {
                entity,
                action,
                target,
                reply,
            } => {
                let _ = reply.send(self.engine.approach_plan(&entity, &action, &target));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            // Intercepted by run(); nothing to do here.
            Command::Shutdown => {}
        }
    }

    /// Queue path: rejection reasons surface as `false` plus a debug log and
    /// a rejection event, never as an error.
    fn queue_action(
        &mut self,
        entity: EntityId,
        action: ActionId,
        target: Option<EntityId>,
        target_position: Option<RoomPosition>,
    ) -> bool {
        let now = self.clock.now();
        match self
            .engine
            .queue_action(now, &entity, &action, target, target_position)
        {
            Ok(_ticket) => {
                self.ensure_ticker();
                self.publish_snapshot();
                true
            }
            Err(reason) => {
                debug!(
                    target: "combat_runtime::worker",
                    %entity,
                    %action,
                    %reason,
                    "queue request rejected"
                );
                self.broadcaster.publish_event(SessionEvent::ActionRejected {
                    entity,
                    action,
                    reason: reason.to_string(),
                    at: now,
                });
                false
            }
        }
    }

    fn movement_input(&mut self, entity: EntityId, vx: f32, vy: f32) {
        let now = self.clock.now();
        match self.engine.movement_input(now, &entity, vx, vy) {
            MovementOutcome::Moved { .. } => self.publish_snapshot(),
            MovementOutcome::TransitionRequested(direction) => {
                self.publish_snapshot();
                self.broadcaster
                    .publish_event(SessionEvent::TransitionRequested { direction, at: now });
                self.spawn_transition(direction);
            }
            MovementOutcome::Ignored => {}
        }
    }

    /// Run the gateway round-trip off the worker loop; the resolution comes
    /// back as a message so this loop stays the single writer.
    fn spawn_transition(&self, direction: GateDirection) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.transition_tx.clone();
        tokio::spawn(async move {
            let request = RoomMoveRequest {
                direction,
                debug: false,
            };
            let resolution = match gateway.request_move(request).await {
                Ok(room) => TransitionResolution::Confirmed { direction, room },
                Err(error) => TransitionResolution::Failed {
                    direction,
                    error: error.to_string(),
                },
            };
            let _ = tx.send(resolution).await;
        });
    }

    fn handle_transition(&mut self, resolution: TransitionResolution) {
        let now = self.clock.now();
        match resolution {
            TransitionResolution::Confirmed { direction, room } => {
                let cleared = self.engine.complete_transition(Some(direction), room.exits);
                if self.use_fallback_roster {
                    self.engine.ingest_roster(fallback_roster(room.flags));
                }
                debug!(
                    target: "combat_runtime::worker",
                    %direction,
                    room = %room.id,
                    cleared,
                    "room transition confirmed"
                );
                self.broadcaster
                    .publish_event(SessionEvent::TransitionCompleted {
                        direction,
                        room: room.id,
                        cleared,
                        at: now,
                    });
                self.publish_snapshot();
            }
            TransitionResolution::Failed { direction, error } => {
                error!(
                    target: "combat_runtime::worker",
                    %direction,
                    %error,
                    "room transition failed"
                );
                self.broadcaster.publish_event(SessionEvent::TransitionFailed {
                    direction,
                    error,
                    at: now,
                });
            }
        }
    }

    fn on_tick(&mut self) {
        let now = self.clock.now();
        let outcomes = self.engine.tick(now);
        if !outcomes.is_empty() {
            for outcome in outcomes {
                self.broadcaster
                    .publish_event(SessionEvent::ActionExecuted { outcome, at: now });
            }
            self.publish_snapshot();
        }
        // Idle optimization: stop rescheduling once the queue runs dry; the
        // next accepted queue request restarts the loop.
        if self.engine.queue_is_empty() {
            self.ticker = None;
        }
    }

    fn ensure_ticker(&mut self) {
        if self.ticker.is_none() {
            let mut interval = time::interval(self.tick_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.ticker = Some(interval);
        }
    }

    fn publish_snapshot(&self) {
        self.broadcaster.publish_snapshot(self.engine.snapshot());
    }
}

/// Resolves on the next scheduler tick, or never while the loop is dormant.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
