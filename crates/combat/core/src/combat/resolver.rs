//! Applies queued actions to the entity registry.

use crate::catalog::{ActionDefinition, ActionKind};
use crate::gate::{GateExits, permits_overshoot};
use crate::movement::{facing_from_displacement, hard_clamp, soft_clamp};
use crate::queue::QueuedAction;
use crate::rng::RollOracle;
use crate::state::{EntityId, EntityRegistry, RoomPosition, TimestampMs};

use super::damage::attack_damage;
use super::hit::check_hit;

/// Outcome of an attack attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackOutcome {
    Hit,
    Miss,
}

/// Result of a resolved attack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResult {
    pub outcome: AttackOutcome,
    /// Damage dealt (None on a miss).
    pub damage: Option<u32>,
    /// Whether the hit reduced the target to 0 hp.
    pub target_defeated: bool,
}

/// Effect applied by one executed queue entry, published for UI combat logs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionOutcome {
    Moved {
        entity: EntityId,
        position: RoomPosition,
    },
    Attacked {
        attacker: EntityId,
        target: EntityId,
        result: AttackResult,
    },
    Healed {
        entity: EntityId,
        amount: u32,
        hp: u32,
    },
}

/// Execute one due queue entry against the registry.
///
/// Returns `None` when the entry is silently dropped: its entity (or, for an
/// attack, its live target) no longer exists. That is a no-op by design, not
/// an error.
pub fn execute(
    registry: &mut EntityRegistry,
    def: &ActionDefinition,
    queued: &QueuedAction,
    now: TimestampMs,
    exits: GateExits,
    roller: &mut dyn RollOracle,
) -> Option<ActionOutcome> {
    if !registry.get(&queued.entity).is_some_and(|e| e.is_alive()) {
        return None;
    }

    let outcome = match def.kind {
        ActionKind::Move => execute_move(registry, queued, exits)?,
        ActionKind::Attack => execute_attack(registry, def, queued, now, roller)?,
        ActionKind::Ability => execute_ability(registry, def, queued)?,
    };

    if let Some(entity) = registry.get_mut(&queued.entity) {
        entity.last_action = Some(queued.action.clone());
    }
    registry.refresh_combat_flag();

    Some(outcome)
}

/// Scheduled moves are wall-clamped like continuous movement, except that a
/// landing inside a gate band may briefly overshoot into the extended bound
/// so a door-crossing move can poke through before the gate controller
/// normalizes it.
fn execute_move(
    registry: &mut EntityRegistry,
    queued: &QueuedAction,
    exits: GateExits,
) -> Option<ActionOutcome> {
    let target = queued.target_position?;
    let entity = registry.get_mut(&queued.entity)?;

    let overshoot = hard_clamp(target);
    let landing = if permits_overshoot(overshoot, exits) {
        overshoot
    } else {
        soft_clamp(overshoot)
    };
    let dx = landing.x - entity.position.x;
    let dy = landing.y - entity.position.y;
    if let Some(facing) = facing_from_displacement(dx, dy) {
        entity.facing = facing;
    }
    entity.position = landing;

    Some(ActionOutcome::Moved {
        entity: queued.entity.clone(),
        position: landing,
    })
}

fn execute_attack(
    registry: &mut EntityRegistry,
    def: &ActionDefinition,
    queued: &QueuedAction,
    now: TimestampMs,
    roller: &mut dyn RollOracle,
) -> Option<ActionOutcome> {
    let target_id = queued.target.clone()?;
    // The target may have died or left since queue time; that drops the
    // attack, it does not error.
    if !registry.get(&target_id).is_some_and(|t| t.is_alive()) {
        return None;
    }

    let attacker = registry.get(&queued.entity)?.clone();
    let defender = registry.get(&target_id)?;

    let roll = roller.roll_unit();
    let result = if check_hit(&attacker, defender, roll) {
        let damage = attack_damage(&attacker, defender, def.damage_multiplier.unwrap_or(1.0));
        let target = registry.get_mut(&target_id)?;
        target.apply_damage(damage);
        AttackResult {
            outcome: AttackOutcome::Hit,
            damage: Some(damage),
            target_defeated: target.defeated,
        }
    } else {
        AttackResult {
            outcome: AttackOutcome::Miss,
            damage: None,
            target_defeated: false,
        }
    };

    registry.note_attack(now);

    Some(ActionOutcome::Attacked {
        attacker: queued.entity.clone(),
        target: target_id,
        result,
    })
}

/// Ability effects dispatch on the action id, so new abilities extend this
/// match without touching the scheduler.
fn execute_ability(
    registry: &mut EntityRegistry,
    def: &ActionDefinition,
    queued: &QueuedAction,
) -> Option<ActionOutcome> {
    match def.id.as_str() {
        crate::catalog::ids::HEAL => {
            let amount = def.heal_amount.unwrap_or(0);
            // Heal the designated ally if one was given, otherwise self.
            let recipient = queued.target.clone().unwrap_or_else(|| queued.entity.clone());
            let entity = registry.get_mut(&recipient)?;
            if !entity.is_alive() {
                return None;
            }
            let hp = entity.heal(amount);
            Some(ActionOutcome::Healed {
                entity: recipient,
                amount,
                hp,
            })
        }
        _ => None,
    }
}
