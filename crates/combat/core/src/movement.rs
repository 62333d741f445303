//! Continuous tactical movement rules.
//!
//! Per-frame input moves an entity along a normalized vector at a fixed
//! speed, independent of the tick scheduler. Ordinary movement is walled
//! into the soft band; only gate-triggering movement may exceed it.

use crate::config::EngineConfig;
use crate::state::RoomPosition;

/// Facing angle for a displacement, in degrees [0,360), 0 = north,
/// clockwise positive. `None` for a zero-length displacement (facing is
/// then left unchanged).
pub fn facing_from_displacement(dx: f32, dy: f32) -> Option<f32> {
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    // Screen-space y grows southward, so north is -y.
    let degrees = dx.atan2(-dy).to_degrees();
    Some(degrees.rem_euclid(360.0))
}

/// Candidate position for one frame of input, before any wall handling.
pub fn step(position: RoomPosition, vx: f32, vy: f32, speed: f32) -> RoomPosition {
    RoomPosition::new(position.x + vx * speed, position.y + vy * speed)
}

/// Ordinary movement walls: impassable outside the soft band.
pub fn soft_clamp(position: RoomPosition) -> RoomPosition {
    position.clamped(EngineConfig::SOFT_MIN, EngineConfig::SOFT_MAX)
}

/// Extended bound for transition overshoot and scheduled moves.
pub fn hard_clamp(position: RoomPosition) -> RoomPosition {
    position.clamped(EngineConfig::HARD_MIN, EngineConfig::HARD_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_matches_the_compass() {
        assert!((facing_from_displacement(0.0, -1.0).unwrap() - 0.0).abs() < 1e-3); // north
        assert!((facing_from_displacement(1.0, 0.0).unwrap() - 90.0).abs() < 1e-3); // east
        assert!((facing_from_displacement(0.0, 1.0).unwrap() - 180.0).abs() < 1e-3); // south
        assert!((facing_from_displacement(-1.0, 0.0).unwrap() - 270.0).abs() < 1e-3); // west
    }

    #[test]
    fn zero_displacement_keeps_facing() {
        assert_eq!(facing_from_displacement(0.0, 0.0), None);
    }

    #[test]
    fn soft_clamp_walls_off_the_border() {
        let candidate = step(RoomPosition::new(94.5, 20.0), 1.0, 0.0, 1.8);
        assert_eq!(soft_clamp(candidate), RoomPosition::new(95.0, 20.0));
    }
}
