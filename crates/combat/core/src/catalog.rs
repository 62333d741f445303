//! Static catalogue of action definitions.
//!
//! The table is fixed at construction; there is no dynamic add/remove. The
//! engine consults it for cooldowns, execution latency, range, and damage
//! scaling.

use std::collections::HashMap;

use crate::state::{ActionId, CombatEntity, EntityKind, TimestampMs};

/// Closed set of action categories the resolver dispatches on.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionKind {
    Move,
    Attack,
    Ability,
}

/// Immutable description of one action kind.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDefinition {
    pub id: ActionId,
    pub name: String,
    pub kind: ActionKind,
    /// Minimum interval between uses by the same entity.
    pub cooldown_ms: u64,
    /// Latency between acceptance and the application of the effect.
    pub execution_ms: u64,
    /// Reach in room-space units. 0 for self-targeted or positional actions.
    pub range: f32,
    /// Scales the attacker's attack stat for attack-kind actions.
    pub damage_multiplier: Option<f32>,
    /// Restored hp for healing abilities.
    pub heal_amount: Option<u32>,
    /// Higher-tier actions only the player may use.
    pub player_only: bool,
}

impl ActionDefinition {
    pub fn usable_by(&self, kind: EntityKind) -> bool {
        !self.player_only || kind == EntityKind::Player
    }
}

/// Action ids shipped with the standard catalogue.
pub mod ids {
    pub const MOVE: &str = "move";
    pub const BASIC_ATTACK: &str = "basic_attack";
    pub const POWER_STRIKE: &str = "power_strike";
    pub const HEAL: &str = "heal";
}

/// Fixed action table, loaded once at session construction.
#[derive(Clone, Debug)]
pub struct ActionCatalog {
    actions: HashMap<ActionId, ActionDefinition>,
}

impl ActionCatalog {
    pub fn new(definitions: Vec<ActionDefinition>) -> Self {
        let actions = definitions
            .into_iter()
            .map(|def| (def.id.clone(), def))
            .collect();
        Self { actions }
    }

    /// The default playable table: `move`, `basic_attack`, and the
    /// player-only `power_strike` / `heal` tiers.
    pub fn standard() -> Self {
        Self::new(vec![
            ActionDefinition {
                id: ActionId::new(ids::MOVE),
                name: "Move".into(),
                kind: ActionKind::Move,
                cooldown_ms: 0,
                execution_ms: 400,
                range: 0.0,
                damage_multiplier: None,
                heal_amount: None,
                player_only: false,
            },
            ActionDefinition {
                id: ActionId::new(ids::BASIC_ATTACK),
                name: "Attack".into(),
                kind: ActionKind::Attack,
                cooldown_ms: 1200,
                execution_ms: 600,
                range: 12.0,
                damage_multiplier: Some(1.0),
                heal_amount: None,
                player_only: false,
            },
            ActionDefinition {
                id: ActionId::new(ids::POWER_STRIKE),
                name: "Power Strike".into(),
                kind: ActionKind::Attack,
                cooldown_ms: 4000,
                execution_ms: 900,
                range: 14.0,
                damage_multiplier: Some(1.8),
                heal_amount: None,
                player_only: true,
            },
            ActionDefinition {
                id: ActionId::new(ids::HEAL),
                name: "Heal".into(),
                kind: ActionKind::Ability,
                cooldown_ms: 6000,
                execution_ms: 500,
                range: 0.0,
                damage_multiplier: None,
                heal_amount: Some(25),
                player_only: true,
            },
        ])
    }

    pub fn get(&self, id: &ActionId) -> Option<&ActionDefinition> {
        self.actions.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }

    /// Actions `entity` could queue at `now`: usable by its kind and off
    /// cooldown. Sorted by id for stable UI ordering.
    pub fn available_for(&self, entity: &CombatEntity, now: TimestampMs) -> Vec<ActionDefinition> {
        let mut available: Vec<ActionDefinition> = self
            .actions
            .values()
            .filter(|def| def.usable_by(entity.kind))
            .filter(|def| entity.cooldown_ready(&def.id, def.cooldown_ms, now))
            .cloned()
            .collect();
        available.sort_by(|a, b| a.id.cmp(&b.id));
        available
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_the_baseline_actions() {
        let catalog = ActionCatalog::standard();
        assert!(catalog.get(&ActionId::new(ids::MOVE)).is_some());
        assert!(catalog.get(&ActionId::new(ids::BASIC_ATTACK)).is_some());
    }

    #[test]
    fn player_only_tiers_are_hidden_from_mobs() {
        let catalog = ActionCatalog::standard();
        let goblin = CombatEntity::new("g1", "Goblin", EntityKind::Hostile);

        let available = catalog.available_for(&goblin, TimestampMs(0));
        assert!(available.iter().all(|def| !def.player_only));
        assert!(available.iter().any(|def| def.id.as_str() == ids::BASIC_ATTACK));
    }

    #[test]
    fn cooling_down_action_is_filtered_out() {
        let catalog = ActionCatalog::standard();
        let mut player = CombatEntity::new("p1", "Hero", EntityKind::Player);
        player.stamp_cooldown(ActionId::new(ids::BASIC_ATTACK), TimestampMs(1000));

        let available = catalog.available_for(&player, TimestampMs(1500));
        assert!(available.iter().all(|def| def.id.as_str() != ids::BASIC_ATTACK));

        let available = catalog.available_for(&player, TimestampMs(2200));
        assert!(available.iter().any(|def| def.id.as_str() == ids::BASIC_ATTACK));
    }
}
