//! Deterministic combat and positioning rules for a room-based dungeon game.
//!
//! `combat-core` defines the canonical rules (entities, action catalogue,
//! queue, combat resolution, targeting, tactical positioning, gate
//! transitions) and exposes pure APIs reusable by the runtime and offline
//! tools. All state mutation flows through [`engine::RoomEngine`]; every
//! time-dependent operation takes an explicit [`TimestampMs`], and randomness
//! enters only through [`rng::RollOracle`], so the crate is fully
//! deterministic and unit-testable without a clock.
pub mod catalog;
pub mod combat;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod gate;
pub mod movement;
pub mod queue;
pub mod rng;
pub mod state;
pub mod targeting;

pub use catalog::{ActionCatalog, ActionDefinition, ActionKind};
pub use combat::{ActionOutcome, AttackOutcome, AttackResult};
pub use config::EngineConfig;
pub use engine::{ApproachPlan, MovementOutcome, RoomEngine};
pub use fallback::{RoomFlags, fallback_roster};
pub use gate::{GateDebounce, GateDirection, GateExits, entry_position};
pub use queue::{ActionQueue, QueueError, QueuedAction, Ticket};
pub use rng::{FixedRoller, RollOracle, SplitMixRoller};
pub use state::{
    ActionId, CombatEntity, CombatState, EntityId, EntityKind, EntityPatch, EntityRegistry,
    RoomPosition, TimestampMs, WeaponRef,
};
