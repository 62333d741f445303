//! Target selection and range validation.
//!
//! Shared by the UI read path (picking a target) and the queue validation
//! path, so both agree on what counts as a legal target.

use crate::catalog::{ActionDefinition, ActionKind};
use crate::state::{CombatEntity, EntityId, EntityRegistry, RoomPosition};

pub fn distance(a: RoomPosition, b: RoomPosition) -> f32 {
    a.distance_to(b)
}

pub fn is_in_range(a: RoomPosition, b: RoomPosition, range: f32) -> bool {
    distance(a, b) <= range
}

/// Whether `target` is a legal target of `action` for `source`.
///
/// Excludes self and the defeated, enforces range, and for attacks applies
/// the faction rule: player-aligned attacks hostile, hostile attacks
/// player-aligned, neutral is never automatically targeted. Abilities reach
/// the caster's own side instead.
pub fn is_valid_target(
    source: &CombatEntity,
    target: &CombatEntity,
    action: &ActionDefinition,
) -> bool {
    if source.id == target.id || !target.is_alive() {
        return false;
    }
    if !is_in_range(source.position, target.position, action.range) {
        return false;
    }
    match action.kind {
        ActionKind::Attack => source.kind.may_attack(target.kind),
        ActionKind::Ability => {
            (source.kind.is_player_aligned() && target.kind.is_player_aligned())
                || (source.kind.is_hostile() && target.kind.is_hostile())
        }
        ActionKind::Move => false,
    }
}

/// All legal targets of `action` for `entity`, in stable id order.
pub fn valid_targets(
    registry: &EntityRegistry,
    entity: &EntityId,
    action: &ActionDefinition,
) -> Vec<EntityId> {
    let Some(source) = registry.get(entity) else {
        return Vec::new();
    };
    let mut targets: Vec<EntityId> = registry
        .iter()
        .filter(|candidate| is_valid_target(source, candidate, action))
        .map(|candidate| candidate.id.clone())
        .collect();
    targets.sort();
    targets
}

/// Position on the line toward `target` that closes to just under `range`.
///
/// Used by the caller-side move-then-attack pattern: the buffer keeps the
/// attacker from stopping exactly on the range boundary where a rounding
/// wobble would re-fail the range check.
pub fn approach_position(
    from: RoomPosition,
    target: RoomPosition,
    range: f32,
    buffer: f32,
) -> RoomPosition {
    let gap = distance(from, target);
    let stop_at = (range - buffer).max(0.0);
    if gap <= stop_at || gap == 0.0 {
        return from;
    }
    let t = (gap - stop_at) / gap;
    RoomPosition::new(from.x + (target.x - from.x) * t, from.y + (target.y - from.y) * t)
}
