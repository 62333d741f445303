//! Authoritative combat state representation.
//!
//! This module owns the combatant records, the registry that holds them, and
//! the externally visible snapshot type. Runtime layers clone or query this
//! state but mutate it exclusively through the engine.
mod entity;
mod registry;

pub use entity::{
    ActionId, CombatEntity, EntityId, EntityKind, EntityPatch, RoomPosition, TimestampMs,
    WeaponRef,
};
pub use registry::EntityRegistry;

use crate::queue::QueuedAction;

/// Externally visible snapshot of a room session.
///
/// Entities are emitted in stable id order and the queue in execution order,
/// so consecutive snapshots diff cleanly on the consumer side.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    pub entities: Vec<CombatEntity>,
    pub action_queue: Vec<QueuedAction>,
    pub is_in_combat: bool,
    pub combat_started_at: Option<TimestampMs>,
    pub selected: Option<EntityId>,
}
