//! Combatant records and their identity/position primitives.

use std::collections::HashMap;
use std::fmt;

use crate::config::EngineConfig;

/// Unique identifier for any combatant tracked in the registry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an action definition in the catalogue.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds on the session clock.
///
/// The engine never reads a wall clock; callers stamp every time-dependent
/// operation with the current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimestampMs(pub u64);

impl TimestampMs {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::ops::Add<u64> for TimestampMs {
    type Output = TimestampMs;
    fn add(self, rhs: u64) -> TimestampMs {
        TimestampMs(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Closed set of combatant alignments.
///
/// Alignment drives automatic targeting: player-aligned entities attack
/// hostiles and vice versa; neutrals are never valid automatic targets.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    /// The controllable player character. Persists across rooms.
    #[default]
    Player,
    /// Mobs that fight the player's side.
    Hostile,
    /// Bystanders, vendors, loot containers.
    Neutral,
    /// Companions fighting on the player's side.
    Ally,
}

impl EntityKind {
    /// Player side of the combat relation (player + companions).
    #[inline]
    pub fn is_player_aligned(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Ally)
    }

    #[inline]
    pub fn is_hostile(self) -> bool {
        matches!(self, EntityKind::Hostile)
    }

    /// Whether `self` may automatically target `other` with an attack.
    pub fn may_attack(self, other: EntityKind) -> bool {
        match self {
            EntityKind::Player | EntityKind::Ally => other.is_hostile(),
            EntityKind::Hostile => other.is_player_aligned(),
            EntityKind::Neutral => false,
        }
    }

    /// Room-local entities are cleared from the registry on a confirmed
    /// room transition; the player carries over.
    #[inline]
    pub fn is_room_local(self) -> bool {
        !matches!(self, EntityKind::Player)
    }
}

/// Continuous room-local position in percentage space, nominally [0,100].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomPosition {
    pub x: f32,
    pub y: f32,
}

impl RoomPosition {
    pub const CENTER: Self = Self { x: 50.0, y: 50.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: RoomPosition) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamp both axes to `[lo, hi]`.
    pub fn clamped(self, lo: f32, hi: f32) -> Self {
        Self {
            x: self.x.clamp(lo, hi),
            y: self.y.clamp(lo, hi),
        }
    }
}

impl fmt::Display for RoomPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1},{:.1})", self.x, self.y)
    }
}

/// Reference to an equipped weapon owned by an external item system.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponRef(pub String);

/// Complete combatant state.
///
/// Owned exclusively by the [`EntityRegistry`](super::EntityRegistry); the
/// runtime mutates it only through engine operations and hands read-only
/// snapshots to consumers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatEntity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,

    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub accuracy: u32,
    pub evasion: u32,
    pub level: u32,

    pub position: RoomPosition,
    /// Degrees in [0,360), 0 = north, clockwise positive.
    pub facing: f32,

    /// Per-action timestamps of the most recent use, stamped at queue time.
    pub cooldowns: HashMap<ActionId, TimestampMs>,

    pub equipped_weapon: Option<WeaponRef>,
    /// Label of the last executed action, for UI display.
    pub last_action: Option<ActionId>,

    /// Terminal state reached when hp hits 0. Defeated entities stay in the
    /// registry as inert records until removed.
    pub defeated: bool,
}

impl CombatEntity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            hp: 10,
            max_hp: 10,
            attack: 5,
            defense: 0,
            speed: 5,
            accuracy: 10,
            evasion: 5,
            level: 1,
            position: RoomPosition::CENTER,
            facing: 0.0,
            cooldowns: HashMap::new(),
            equipped_weapon: None,
            last_action: None,
            defeated: false,
        }
    }

    pub fn with_hp(mut self, max_hp: u32) -> Self {
        self.max_hp = max_hp;
        self.hp = max_hp;
        self
    }

    pub fn with_stats(mut self, attack: u32, defense: u32, accuracy: u32, evasion: u32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self.accuracy = accuracy;
        self.evasion = evasion;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_position(mut self, position: RoomPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponRef) -> Self {
        self.equipped_weapon = Some(weapon);
        self
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.defeated && self.hp > 0
    }

    /// Whether `action` is off cooldown at `now`.
    pub fn cooldown_ready(&self, action: &ActionId, cooldown_ms: u64, now: TimestampMs) -> bool {
        match self.cooldowns.get(action) {
            Some(&last_used) => now >= last_used + cooldown_ms,
            None => true,
        }
    }

    /// Stamp the cooldown for `action`. Called at queue time, not completion.
    pub fn stamp_cooldown(&mut self, action: ActionId, now: TimestampMs) {
        self.cooldowns.insert(action, now);
    }

    /// Subtract damage, clamping at 0; crossing 0 is a terminal defeat.
    /// Returns the hp after application.
    pub fn apply_damage(&mut self, damage: u32) -> u32 {
        self.hp = self.hp.saturating_sub(damage);
        if self.hp == 0 {
            self.defeated = true;
        }
        self.hp
    }

    /// Restore hp, clamped to `max_hp`. Returns the hp after application.
    pub fn heal(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp
    }
}

/// Partial update for [`CombatEntity`].
///
/// Fields are explicit options rather than ad hoc presence checks; `None`
/// leaves the field untouched. `equipped_weapon` is doubly optional so the
/// weapon can be cleared.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityPatch {
    pub name: Option<String>,
    pub kind: Option<EntityKind>,
    pub hp: Option<u32>,
    pub max_hp: Option<u32>,
    pub attack: Option<u32>,
    pub defense: Option<u32>,
    pub speed: Option<u32>,
    pub accuracy: Option<u32>,
    pub evasion: Option<u32>,
    pub level: Option<u32>,
    pub position: Option<RoomPosition>,
    pub facing: Option<f32>,
    pub equipped_weapon: Option<Option<WeaponRef>>,
}

impl EntityPatch {
    /// Merge the patch into `entity`, re-clamping hp into `[0, max_hp]`.
    pub fn apply(&self, entity: &mut CombatEntity) {
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        if let Some(kind) = self.kind {
            entity.kind = kind;
        }
        if let Some(max_hp) = self.max_hp {
            entity.max_hp = max_hp;
        }
        if let Some(hp) = self.hp {
            entity.hp = hp;
        }
        if let Some(attack) = self.attack {
            entity.attack = attack;
        }
        if let Some(defense) = self.defense {
            entity.defense = defense;
        }
        if let Some(speed) = self.speed {
            entity.speed = speed;
        }
        if let Some(accuracy) = self.accuracy {
            entity.accuracy = accuracy;
        }
        if let Some(evasion) = self.evasion {
            entity.evasion = evasion;
        }
        if let Some(level) = self.level {
            entity.level = level;
        }
        if let Some(position) = self.position {
            entity.position = position.clamped(EngineConfig::HARD_MIN, EngineConfig::HARD_MAX);
        }
        if let Some(facing) = self.facing {
            entity.facing = facing.rem_euclid(360.0);
        }
        if let Some(weapon) = &self.equipped_weapon {
            entity.equipped_weapon = weapon.clone();
        }

        entity.hp = entity.hp.min(entity.max_hp);
        if entity.hp == 0 {
            entity.defeated = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_ready_without_prior_use() {
        let entity = CombatEntity::new("e1", "Test", EntityKind::Player);
        assert!(entity.cooldown_ready(&ActionId::new("basic_attack"), 1200, TimestampMs(0)));
    }

    #[test]
    fn cooldown_blocks_until_window_elapses() {
        let mut entity = CombatEntity::new("e1", "Test", EntityKind::Player);
        let attack = ActionId::new("basic_attack");
        entity.stamp_cooldown(attack.clone(), TimestampMs(1000));

        assert!(!entity.cooldown_ready(&attack, 1200, TimestampMs(2199)));
        assert!(entity.cooldown_ready(&attack, 1200, TimestampMs(2200)));
    }

    #[test]
    fn damage_at_zero_hp_is_terminal() {
        let mut entity = CombatEntity::new("e1", "Test", EntityKind::Hostile).with_hp(8);
        assert_eq!(entity.apply_damage(12), 0);
        assert!(entity.defeated);
        assert!(!entity.is_alive());
    }

    #[test]
    fn heal_clamps_to_max_hp() {
        let mut entity = CombatEntity::new("e1", "Test", EntityKind::Player).with_hp(30);
        entity.apply_damage(10);
        assert_eq!(entity.heal(50), 30);
    }

    #[test]
    fn patch_merges_and_reclamps_hp() {
        let mut entity = CombatEntity::new("e1", "Test", EntityKind::Player).with_hp(30);
        let patch = EntityPatch {
            hp: Some(80),
            max_hp: Some(40),
            ..Default::default()
        };
        patch.apply(&mut entity);
        assert_eq!(entity.hp, 40);
        assert_eq!(entity.max_hp, 40);
    }

    #[test]
    fn patch_can_clear_weapon() {
        let mut entity = CombatEntity::new("e1", "Test", EntityKind::Player)
            .with_weapon(WeaponRef("rusty_sword".into()));
        let patch = EntityPatch {
            equipped_weapon: Some(None),
            ..Default::default()
        };
        patch.apply(&mut entity);
        assert!(entity.equipped_weapon.is_none());
    }
}
