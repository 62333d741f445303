//! Damage calculation.

use crate::state::CombatEntity;

/// Damage dealt by a landed attack.
///
/// ```text
/// raw = attack * multiplier + level * 0.1 - defense * 0.5
/// damage = max(1, floor(raw))
/// ```
///
/// A landed hit always deals at least 1 point, however armored the target.
pub fn attack_damage(attacker: &CombatEntity, defender: &CombatEntity, multiplier: f32) -> u32 {
    let raw = attacker.attack as f32 * multiplier + attacker.level as f32 * 0.1
        - defender.defense as f32 * 0.5;
    (raw.floor() as i64).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityKind;

    #[test]
    fn matches_the_reference_scenario() {
        // attack 18, level 5 vs defense 12: 18 + 0.5 - 6 = 12.5 -> 12
        let attacker = CombatEntity::new("a", "Attacker", EntityKind::Player)
            .with_stats(18, 0, 10, 0)
            .with_level(5);
        let defender =
            CombatEntity::new("d", "Defender", EntityKind::Hostile).with_stats(0, 12, 0, 0);

        assert_eq!(attack_damage(&attacker, &defender, 1.0), 12);
    }

    #[test]
    fn heavy_armor_still_takes_one_point() {
        let attacker = CombatEntity::new("a", "Attacker", EntityKind::Player)
            .with_stats(1, 0, 10, 0)
            .with_level(1);
        let defender =
            CombatEntity::new("d", "Defender", EntityKind::Hostile).with_stats(0, 200, 0, 0);

        assert_eq!(attack_damage(&attacker, &defender, 1.0), 1);
    }

    #[test]
    fn multiplier_scales_the_attack_stat() {
        let attacker = CombatEntity::new("a", "Attacker", EntityKind::Player)
            .with_stats(10, 0, 10, 0)
            .with_level(1);
        let defender =
            CombatEntity::new("d", "Defender", EntityKind::Hostile).with_stats(0, 0, 0, 0);

        // 10 * 1.8 + 0.1 = 18.1 -> 18
        assert_eq!(attack_damage(&attacker, &defender, 1.8), 18);
    }
}
