//! Degraded-mode roster generation.
//!
//! When the external tactical-data feed is unavailable, a deterministic
//! placeholder roster keeps the engine exercisable. Seeded purely by the
//! room flags, so the same room always produces the same stand-ins.

use crate::rng::{RollOracle, SplitMixRoller, mix_seed};
use crate::state::{CombatEntity, EntityKind, RoomPosition};

/// Room attributes relevant to roster generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomFlags {
    pub has_loot: bool,
    pub is_safe: bool,
}

impl RoomFlags {
    fn seed(self) -> u64 {
        mix_seed(
            0x6761_7465_726f_6f6d,
            (self.has_loot as u64) << 1 | self.is_safe as u64,
        )
    }
}

/// Minimal placeholder roster for a room with the given flags.
///
/// Safe rooms get a lone bystander; unsafe rooms get two low-level lurkers
/// with lightly varied stats. Loot rooms add a neutral cache either way.
pub fn fallback_roster(flags: RoomFlags) -> Vec<CombatEntity> {
    let mut roller = SplitMixRoller::new(flags.seed());
    let mut roster = Vec::new();

    if flags.is_safe {
        roster.push(
            CombatEntity::new("fallback_keeper", "Keeper", EntityKind::Neutral)
                .with_hp(12)
                .with_position(RoomPosition::new(30.0, 35.0)),
        );
    } else {
        for index in 0..2u32 {
            let level = 1 + (roller.roll_unit() * 3.0) as u32;
            let hp = 18 + (roller.roll_unit() * 14.0) as u32;
            let x = 25.0 + roller.roll_unit() * 50.0;
            let y = 25.0 + roller.roll_unit() * 50.0;
            roster.push(
                CombatEntity::new(
                    format!("fallback_lurker_{}", index + 1),
                    "Lurker",
                    EntityKind::Hostile,
                )
                .with_hp(hp)
                .with_stats(4 + level, 2, 8, 4)
                .with_level(level)
                .with_position(RoomPosition::new(x, y)),
            );
        }
    }

    if flags.has_loot {
        roster.push(
            CombatEntity::new("fallback_cache", "Cache", EntityKind::Neutral)
                .with_hp(6)
                .with_position(RoomPosition::new(70.0, 65.0)),
        );
    }

    roster
}
