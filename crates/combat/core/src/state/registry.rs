//! Single-writer registry of combatants and combat bookkeeping.

use std::collections::HashMap;

use super::entity::{CombatEntity, EntityId, EntityPatch, TimestampMs};

/// Owns every combatant record in the current room.
///
/// Mutation happens only through the engine; consumers observe the registry
/// via cloned snapshots.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRegistry {
    entities: HashMap<EntityId, CombatEntity>,
    selected: Option<EntityId>,
    in_combat: bool,
    combat_started_at: Option<TimestampMs>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, replacing any existing record with the same id.
    pub fn add(&mut self, entity: CombatEntity) {
        self.entities.insert(entity.id.clone(), entity);
        self.refresh_combat_flag();
    }

    /// Merge a partial update into an existing entity. Returns false if the
    /// id is unknown.
    pub fn update(&mut self, id: &EntityId, patch: &EntityPatch) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        patch.apply(entity);
        self.refresh_combat_flag();
        true
    }

    /// Remove an entity, clearing the selection if it pointed at it.
    pub fn remove(&mut self, id: &EntityId) -> Option<CombatEntity> {
        let removed = self.entities.remove(id);
        if removed.is_some() {
            if self.selected.as_ref() == Some(id) {
                self.selected = None;
            }
            self.refresh_combat_flag();
        }
        removed
    }

    pub fn get(&self, id: &EntityId) -> Option<&CombatEntity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut CombatEntity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Select an entity (or clear the selection with `None`). Selecting an
    /// unknown id is rejected.
    pub fn select(&mut self, id: Option<EntityId>) -> bool {
        match id {
            Some(id) if !self.entities.contains_key(&id) => false,
            other => {
                self.selected = other;
                true
            }
        }
    }

    pub fn selected(&self) -> Option<&EntityId> {
        self.selected.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn in_combat(&self) -> bool {
        self.in_combat
    }

    pub fn combat_started_at(&self) -> Option<TimestampMs> {
        self.combat_started_at
    }

    fn has_live_hostile(&self) -> bool {
        self.entities
            .values()
            .any(|e| e.kind.is_hostile() && e.is_alive())
    }

    fn has_live_player_aligned(&self) -> bool {
        self.entities
            .values()
            .any(|e| e.kind.is_player_aligned() && e.is_alive())
    }

    /// Mark combat as active after an executed attack.
    pub fn note_attack(&mut self, now: TimestampMs) {
        if !self.in_combat {
            self.in_combat = true;
            self.combat_started_at = Some(now);
        }
    }

    /// Clear the combat flag once either side has no living members.
    /// Called after every mutation.
    pub fn refresh_combat_flag(&mut self) {
        if self.in_combat && !(self.has_live_hostile() && self.has_live_player_aligned()) {
            self.in_combat = false;
            self.combat_started_at = None;
        }
    }

    /// Drop every room-local entity (everything but the player). Returns how
    /// many were removed; clearing an already-cleared roster is a no-op.
    pub fn clear_room_locals(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|_, e| !e.kind.is_room_local());
        if let Some(selected) = &self.selected
            && !self.entities.contains_key(selected)
        {
            self.selected = None;
        }
        self.refresh_combat_flag();
        before - self.entities.len()
    }

    /// Entities in stable id order, for deterministic snapshots.
    pub fn sorted_entities(&self) -> Vec<CombatEntity> {
        let mut entities: Vec<CombatEntity> = self.entities.values().cloned().collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::entity::EntityKind;

    fn registry_with(entities: Vec<CombatEntity>) -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        for entity in entities {
            registry.add(entity);
        }
        registry
    }

    #[test]
    fn add_replaces_same_id() {
        let mut registry = registry_with(vec![
            CombatEntity::new("p1", "Hero", EntityKind::Player).with_hp(30),
        ]);
        registry.add(CombatEntity::new("p1", "Hero", EntityKind::Player).with_hp(50));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"p1".into()).unwrap().max_hp, 50);
    }

    #[test]
    fn remove_clears_selection() {
        let mut registry = registry_with(vec![
            CombatEntity::new("p1", "Hero", EntityKind::Player),
            CombatEntity::new("g1", "Goblin", EntityKind::Hostile),
        ]);
        assert!(registry.select(Some("g1".into())));

        registry.remove(&"g1".into());
        assert_eq!(registry.selected(), None);
    }

    #[test]
    fn selecting_unknown_entity_is_rejected() {
        let mut registry = registry_with(vec![]);
        assert!(!registry.select(Some("ghost".into())));
        assert!(registry.select(None));
    }

    #[test]
    fn combat_flag_clears_when_hostiles_die() {
        let mut registry = registry_with(vec![
            CombatEntity::new("p1", "Hero", EntityKind::Player).with_hp(30),
            CombatEntity::new("g1", "Goblin", EntityKind::Hostile).with_hp(10),
        ]);
        registry.note_attack(TimestampMs(100));
        assert!(registry.in_combat());
        assert_eq!(registry.combat_started_at(), Some(TimestampMs(100)));

        registry.get_mut(&"g1".into()).unwrap().apply_damage(10);
        registry.refresh_combat_flag();
        assert!(!registry.in_combat());
        assert_eq!(registry.combat_started_at(), None);
    }

    #[test]
    fn clear_room_locals_keeps_player_and_is_idempotent() {
        let mut registry = registry_with(vec![
            CombatEntity::new("p1", "Hero", EntityKind::Player),
            CombatEntity::new("g1", "Goblin", EntityKind::Hostile),
            CombatEntity::new("chest", "Chest", EntityKind::Neutral),
        ]);

        assert_eq!(registry.clear_room_locals(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.clear_room_locals(), 0);
    }
}
