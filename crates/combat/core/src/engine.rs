//! Authoritative reducer for one room session.
//!
//! [`RoomEngine`] owns the registry, catalogue, queue, and gate state, and
//! exposes the operations the runtime drives. It is single-writer by
//! construction: the runtime worker holds the only instance and external
//! consumers see cloned snapshots. Every time-dependent call takes `now`
//! explicitly so behavior is reproducible in tests.

use crate::catalog::{ActionCatalog, ActionDefinition, ActionKind, ids};
use crate::combat::{ActionOutcome, resolver};
use crate::config::EngineConfig;
use crate::gate::{GateController, GateDirection, GateExits, entry_position};
use crate::movement::{facing_from_displacement, hard_clamp, soft_clamp, step};
use crate::queue::{ActionQueue, QueueError, Ticket};
use crate::rng::RollOracle;
use crate::state::{
    ActionId, CombatEntity, CombatState, EntityId, EntityKind, EntityPatch, EntityRegistry,
    RoomPosition, TimestampMs,
};
use crate::targeting;

/// Effect of one frame of continuous movement input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementOutcome {
    /// Ordinary movement; position already soft-clamped.
    Moved { position: RoomPosition },
    /// The frame crossed a gate and armed the debouncer; the caller owns
    /// the asynchronous room-movement request.
    TransitionRequested(GateDirection),
    /// Unknown or defeated entity, or zero input vector.
    Ignored,
}

/// Caller-side plan for the two-step move-then-attack pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApproachPlan {
    /// Where to move: just under the action's range from the target.
    pub position: RoomPosition,
    /// How long to wait before issuing the attack, approximating the
    /// move's execution time.
    pub delay_ms: u64,
}

pub struct RoomEngine {
    config: EngineConfig,
    catalog: ActionCatalog,
    registry: EntityRegistry,
    queue: ActionQueue,
    gate: GateController,
    roller: Box<dyn RollOracle>,
}

impl RoomEngine {
    pub fn new(
        config: EngineConfig,
        catalog: ActionCatalog,
        exits: GateExits,
        roller: Box<dyn RollOracle>,
    ) -> Self {
        let gate = GateController::new(exits, config.gate_debounce_ms);
        Self {
            config,
            catalog,
            registry: EntityRegistry::new(),
            queue: ActionQueue::new(),
            gate,
            roller,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    // ========================================================================
    // Registry operations
    // ========================================================================

    pub fn add_entity(&mut self, entity: CombatEntity) {
        self.registry.add(entity);
    }

    pub fn ingest_roster(&mut self, roster: Vec<CombatEntity>) {
        for entity in roster {
            self.registry.add(entity);
        }
    }

    pub fn update_entity(&mut self, id: &EntityId, patch: &EntityPatch) -> bool {
        self.registry.update(id, patch)
    }

    pub fn remove_entity(&mut self, id: &EntityId) -> bool {
        self.registry.remove(id).is_some()
    }

    pub fn select_entity(&mut self, id: Option<EntityId>) -> bool {
        self.registry.select(id)
    }

    // ========================================================================
    // Scheduler
    // ========================================================================

    /// Validate and enqueue an action request.
    ///
    /// On acceptance the cooldown is stamped immediately — queue time, not
    /// completion — locking out repeat input for the full window even if the
    /// entry is later cancelled. Rejections mutate nothing.
    pub fn queue_action(
        &mut self,
        now: TimestampMs,
        entity_id: &EntityId,
        action_id: &ActionId,
        target: Option<EntityId>,
        target_position: Option<RoomPosition>,
    ) -> Result<Ticket, QueueError> {
        let entity = self
            .registry
            .get(entity_id)
            .ok_or_else(|| QueueError::UnknownEntity(entity_id.clone()))?;
        if !entity.is_alive() {
            return Err(QueueError::EntityDefeated(entity_id.clone()));
        }
        let def = self
            .catalog
            .get(action_id)
            .ok_or_else(|| QueueError::UnknownAction(action_id.clone()))?;
        if !def.usable_by(entity.kind) {
            return Err(QueueError::RestrictedAction {
                action: action_id.clone(),
            });
        }
        if !entity.cooldown_ready(action_id, def.cooldown_ms, now) {
            let ready_at = entity.cooldowns[action_id] + def.cooldown_ms;
            return Err(QueueError::OnCooldown {
                action: action_id.clone(),
                ready_at,
            });
        }
        if self.queue.has_pending(entity_id) {
            return Err(QueueError::EntityBusy(entity_id.clone()));
        }

        match def.kind {
            ActionKind::Move => {
                if target_position.is_none() {
                    return Err(QueueError::MissingTargetPosition {
                        action: action_id.clone(),
                    });
                }
            }
            ActionKind::Attack => {
                let target_id = target
                    .as_ref()
                    .ok_or_else(|| QueueError::MissingTarget {
                        action: action_id.clone(),
                    })?;
                let defender = self
                    .registry
                    .get(target_id)
                    .ok_or_else(|| QueueError::InvalidTarget(target_id.clone()))?;
                if !defender.is_alive() || !entity.kind.may_attack(defender.kind) {
                    return Err(QueueError::InvalidTarget(target_id.clone()));
                }
                let gap = targeting::distance(entity.position, defender.position);
                if gap > def.range {
                    return Err(QueueError::TargetOutOfRange {
                        target: target_id.clone(),
                        range: def.range,
                        distance: gap,
                    });
                }
            }
            ActionKind::Ability => {
                if let Some(target_id) = target.as_ref() {
                    let recipient = self
                        .registry
                        .get(target_id)
                        .ok_or_else(|| QueueError::InvalidTarget(target_id.clone()))?;
                    if !targeting::is_valid_target(entity, recipient, def) {
                        return Err(QueueError::InvalidTarget(target_id.clone()));
                    }
                }
            }
        }

        let executes_at = now + def.execution_ms;
        let action = action_id.clone();
        if let Some(entity) = self.registry.get_mut(entity_id) {
            entity.stamp_cooldown(action.clone(), now);
        }
        Ok(self.queue.push(
            entity_id.clone(),
            action,
            target,
            target_position,
            now,
            executes_at,
        ))
    }

    /// Queue a scheduled move to `position`.
    pub fn queue_move(
        &mut self,
        now: TimestampMs,
        entity_id: &EntityId,
        position: RoomPosition,
    ) -> Result<Ticket, QueueError> {
        self.queue_action(now, entity_id, &ActionId::new(ids::MOVE), None, Some(position))
    }

    /// Cancel a pending entry. No cooldown refund.
    pub fn cancel_action(&mut self, ticket: Ticket) -> bool {
        self.queue.cancel(ticket)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// One scheduler pass: execute every entry due at `now`, ascending
    /// `executes_at`, ties by insertion order. Entries whose entity (or live
    /// attack target) has vanished are dropped silently.
    pub fn tick(&mut self, now: TimestampMs) -> Vec<ActionOutcome> {
        let ready = self.queue.drain_ready(now);
        let mut outcomes = Vec::with_capacity(ready.len());
        for entry in &ready {
            let Some(def) = self.catalog.get(&entry.action).cloned() else {
                continue;
            };
            if let Some(outcome) = resolver::execute(
                &mut self.registry,
                &def,
                entry,
                now,
                self.gate.exits(),
                self.roller.as_mut(),
            ) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    // ========================================================================
    // Read paths
    // ========================================================================

    pub fn available_actions(&self, now: TimestampMs, entity_id: &EntityId) -> Vec<ActionDefinition> {
        match self.registry.get(entity_id) {
            Some(entity) => self.catalog.available_for(entity, now),
            None => Vec::new(),
        }
    }

    pub fn valid_targets(&self, entity_id: &EntityId, action_id: &ActionId) -> Vec<EntityId> {
        match self.catalog.get(action_id) {
            Some(def) => targeting::valid_targets(&self.registry, entity_id, def),
            None => Vec::new(),
        }
    }

    pub fn distance_between(&self, a: &EntityId, b: &EntityId) -> Option<f32> {
        let a = self.registry.get(a)?;
        let b = self.registry.get(b)?;
        Some(targeting::distance(a.position, b.position))
    }

    /// Plan the caller-side move half of move-then-attack. `None` when the
    /// ids are unknown or the target is already in range (attack directly).
    pub fn approach_plan(
        &self,
        entity_id: &EntityId,
        action_id: &ActionId,
        target_id: &EntityId,
    ) -> Option<ApproachPlan> {
        let entity = self.registry.get(entity_id)?;
        let target = self.registry.get(target_id)?;
        let def = self.catalog.get(action_id)?;
        let move_def = self.catalog.get(&ActionId::new(ids::MOVE))?;

        if targeting::is_in_range(entity.position, target.position, def.range) {
            return None;
        }
        Some(ApproachPlan {
            position: targeting::approach_position(
                entity.position,
                target.position,
                def.range,
                self.config.approach_buffer,
            ),
            delay_ms: move_def.execution_ms + self.config.tick_period_ms,
        })
    }

    pub fn snapshot(&self) -> CombatState {
        CombatState {
            entities: self.registry.sorted_entities(),
            action_queue: self.queue.ordered(),
            is_in_combat: self.registry.in_combat(),
            combat_started_at: self.registry.combat_started_at(),
            selected: self.registry.selected().cloned(),
        }
    }

    // ========================================================================
    // Tactical positioning & gates
    // ========================================================================

    /// Apply one frame of continuous movement input.
    ///
    /// A gate crossing that passes the debouncer returns
    /// [`MovementOutcome::TransitionRequested`]; the entity keeps its
    /// overshoot position (hard-clamped) until the transition completes. A
    /// crossing dropped by the debouncer degrades to ordinary wall-clamped
    /// movement.
    pub fn movement_input(
        &mut self,
        now: TimestampMs,
        entity_id: &EntityId,
        vx: f32,
        vy: f32,
    ) -> MovementOutcome {
        if vx == 0.0 && vy == 0.0 {
            return MovementOutcome::Ignored;
        }
        let speed = self.config.move_speed;
        let Some(entity) = self.registry.get_mut(entity_id) else {
            return MovementOutcome::Ignored;
        };
        if !entity.is_alive() {
            return MovementOutcome::Ignored;
        }
        let candidate = step(entity.position, vx, vy, speed);
        let facing = facing_from_displacement(vx, vy);

        if let Some(direction) = self.gate.evaluate(now, candidate, vx, vy) {
            entity.position = hard_clamp(candidate);
            if let Some(facing) = facing {
                entity.facing = facing;
            }
            return MovementOutcome::TransitionRequested(direction);
        }

        let position = soft_clamp(candidate);
        entity.position = position;
        if let Some(facing) = facing {
            entity.facing = facing;
        }
        MovementOutcome::Moved { position }
    }

    /// Commit a confirmed room transition: clear room-local entities, swap
    /// in the new room's exits, and place the player at the entry point
    /// opposite the travel direction. Safe to call twice for a duplicate
    /// confirmation — clearing an already-cleared roster is a no-op.
    pub fn complete_transition(
        &mut self,
        direction: Option<GateDirection>,
        exits: GateExits,
    ) -> usize {
        let cleared = self.registry.clear_room_locals();
        self.gate.set_exits(exits);

        let entry = entry_position(direction);
        let player_id = self
            .registry
            .iter()
            .find(|e| e.kind == EntityKind::Player)
            .map(|e| e.id.clone());
        if let Some(id) = player_id
            && let Some(player) = self.registry.get_mut(&id)
        {
            player.position = entry;
        }
        cleared
    }

    pub fn entry_position(direction: Option<GateDirection>) -> RoomPosition {
        entry_position(direction)
    }
}
