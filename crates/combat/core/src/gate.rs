//! Boundary gates and the transition debouncer.
//!
//! Each room exposes up to four directional gates spanning the middle third
//! of the perpendicular axis. Crossing one through continuous movement
//! requests a room transition; the two-state debouncer guards against
//! re-triggering while a request is in flight or freshly completed.

use bitflags::bitflags;

use crate::config::EngineConfig;
use crate::state::{RoomPosition, TimestampMs};

/// Exit direction through a room boundary.
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
pub enum GateDirection {
    North,
    South,
    East,
    West,
}

impl GateDirection {
    pub fn opposite(self) -> Self {
        match self {
            GateDirection::North => GateDirection::South,
            GateDirection::South => GateDirection::North,
            GateDirection::East => GateDirection::West,
            GateDirection::West => GateDirection::East,
        }
    }

    fn exit_bit(self) -> GateExits {
        match self {
            GateDirection::North => GateExits::NORTH,
            GateDirection::South => GateExits::SOUTH,
            GateDirection::East => GateExits::EAST,
            GateDirection::West => GateExits::WEST,
        }
    }
}

bitflags! {
    /// Which boundaries of the current room carry a gate.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GateExits: u8 {
        const NORTH = 1 << 0;
        const SOUTH = 1 << 1;
        const EAST = 1 << 2;
        const WEST = 1 << 3;
    }
}

impl GateExits {
    pub const ALL: Self = Self::all();
}

impl Default for GateExits {
    fn default() -> Self {
        Self::ALL
    }
}

/// Two-state transition debouncer.
///
/// One explicit state machine instead of a latch boolean plus a timer, so
/// the in-flight guard and the cooldown window cannot disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GateDebounce {
    Idle,
    Cooldown { until: TimestampMs },
}

impl GateDebounce {
    /// Arm the debouncer for a trigger at `now`. Returns false (and changes
    /// nothing) while a previous trigger's window is still running.
    pub fn try_arm(&mut self, now: TimestampMs, window_ms: u64) -> bool {
        match *self {
            GateDebounce::Cooldown { until } if now < until => false,
            _ => {
                *self = GateDebounce::Cooldown {
                    until: now + window_ms,
                };
                true
            }
        }
    }
}

impl Default for GateDebounce {
    fn default() -> Self {
        GateDebounce::Idle
    }
}

/// Gate crossing test for one frame of movement.
///
/// A crossing requires all three of: the movement vector pointing out the
/// exit, the candidate coordinate past the boundary threshold, and the
/// perpendicular coordinate inside the gate band. The direction-of-travel
/// requirement keeps a wall graze from triggering while moving parallel to
/// the boundary.
pub fn detect_crossing(candidate: RoomPosition, vx: f32, vy: f32, exits: GateExits) -> Option<GateDirection> {
    let band = |coord: f32| (EngineConfig::GATE_BAND_MIN..=EngineConfig::GATE_BAND_MAX).contains(&coord);

    if exits.contains(GateExits::NORTH)
        && vy < 0.0
        && candidate.y <= EngineConfig::GATE_LOW_EDGE
        && band(candidate.x)
    {
        return Some(GateDirection::North);
    }
    if exits.contains(GateExits::SOUTH)
        && vy > 0.0
        && candidate.y >= EngineConfig::GATE_HIGH_EDGE
        && band(candidate.x)
    {
        return Some(GateDirection::South);
    }
    if exits.contains(GateExits::EAST)
        && vx > 0.0
        && candidate.x >= EngineConfig::GATE_HIGH_EDGE
        && band(candidate.y)
    {
        return Some(GateDirection::East);
    }
    if exits.contains(GateExits::WEST)
        && vx < 0.0
        && candidate.x <= EngineConfig::GATE_LOW_EDGE
        && band(candidate.y)
    {
        return Some(GateDirection::West);
    }
    None
}

/// Gate state for the current room: which exits exist plus the debouncer.
#[derive(Clone, Debug, Default)]
pub struct GateController {
    exits: GateExits,
    debounce: GateDebounce,
    window_ms: u64,
}

impl GateController {
    pub fn new(exits: GateExits, window_ms: u64) -> Self {
        Self {
            exits,
            debounce: GateDebounce::Idle,
            window_ms,
        }
    }

    pub fn exits(&self) -> GateExits {
        self.exits
    }

    /// Swap in the new room's exits after a confirmed transition. The
    /// debounce window keeps running so arrival next to the entry gate
    /// cannot bounce straight back.
    pub fn set_exits(&mut self, exits: GateExits) {
        self.exits = exits;
    }

    /// Evaluate one frame of movement against the gates. Returns the
    /// direction to transition through, or `None` for ordinary movement —
    /// including crossings silently dropped by the debouncer.
    pub fn evaluate(
        &mut self,
        now: TimestampMs,
        candidate: RoomPosition,
        vx: f32,
        vy: f32,
    ) -> Option<GateDirection> {
        let direction = detect_crossing(candidate, vx, vy, self.exits)?;
        self.debounce.try_arm(now, self.window_ms).then_some(direction)
    }
}

/// Whether `position` is a legal door-crossing overshoot: past a soft wall,
/// inside the gate band, with a gate actually on that boundary. Scheduled
/// moves landing anywhere else stay wall-clamped.
pub fn permits_overshoot(position: RoomPosition, exits: GateExits) -> bool {
    let band = |coord: f32| (EngineConfig::GATE_BAND_MIN..=EngineConfig::GATE_BAND_MAX).contains(&coord);

    (exits.contains(GateExits::NORTH) && position.y < EngineConfig::SOFT_MIN && band(position.x))
        || (exits.contains(GateExits::SOUTH)
            && position.y > EngineConfig::SOFT_MAX
            && band(position.x))
        || (exits.contains(GateExits::EAST)
            && position.x > EngineConfig::SOFT_MAX
            && band(position.y))
        || (exits.contains(GateExits::WEST)
            && position.x < EngineConfig::SOFT_MIN
            && band(position.y))
}

/// Where an entrant lands in the new room: near the edge opposite the
/// direction of travel, centered on the gate band.
pub fn entry_position(direction: Option<GateDirection>) -> RoomPosition {
    match direction {
        Some(GateDirection::North) => RoomPosition::new(50.0, 88.0),
        Some(GateDirection::South) => RoomPosition::new(50.0, 12.0),
        Some(GateDirection::East) => RoomPosition::new(12.0, 50.0),
        Some(GateDirection::West) => RoomPosition::new(88.0, 50.0),
        None => RoomPosition::CENTER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn east_crossing_requires_band_threshold_and_direction() {
        let exits = GateExits::ALL;

        // All three conditions hold.
        assert_eq!(
            detect_crossing(RoomPosition::new(96.0, 50.0), 1.0, 0.0, exits),
            Some(GateDirection::East)
        );
        // Outside the perpendicular band.
        assert_eq!(detect_crossing(RoomPosition::new(96.0, 20.0), 1.0, 0.0, exits), None);
        // Not past the threshold.
        assert_eq!(detect_crossing(RoomPosition::new(90.0, 50.0), 1.0, 0.0, exits), None);
        // Grazing the wall while moving parallel to it.
        assert_eq!(detect_crossing(RoomPosition::new(96.0, 50.0), 0.0, 1.0, exits), None);
    }

    #[test]
    fn missing_exit_never_triggers() {
        let exits = GateExits::NORTH | GateExits::SOUTH;
        assert_eq!(detect_crossing(RoomPosition::new(96.0, 50.0), 1.0, 0.0, exits), None);
    }

    #[test]
    fn debouncer_arms_once_per_window() {
        let mut debounce = GateDebounce::Idle;
        assert!(debounce.try_arm(TimestampMs(1000), 2000));
        assert!(!debounce.try_arm(TimestampMs(1500), 2000));
        assert!(!debounce.try_arm(TimestampMs(2999), 2000));
        assert!(debounce.try_arm(TimestampMs(3000), 2000));
    }

    #[test]
    fn controller_drops_retrigger_within_window() {
        let mut controller = GateController::new(GateExits::ALL, 2000);
        let candidate = RoomPosition::new(96.0, 50.0);

        assert_eq!(
            controller.evaluate(TimestampMs(0), candidate, 1.0, 0.0),
            Some(GateDirection::East)
        );
        assert_eq!(controller.evaluate(TimestampMs(500), candidate, 1.0, 0.0), None);
        assert_eq!(
            controller.evaluate(TimestampMs(2000), candidate, 1.0, 0.0),
            Some(GateDirection::East)
        );
    }

    #[test]
    fn overshoot_is_only_allowed_through_a_gate() {
        assert!(permits_overshoot(RoomPosition::new(103.0, 50.0), GateExits::ALL));
        // Outside the band, or without an east gate, the wall holds.
        assert!(!permits_overshoot(RoomPosition::new(103.0, 20.0), GateExits::ALL));
        assert!(!permits_overshoot(
            RoomPosition::new(103.0, 50.0),
            GateExits::NORTH | GateExits::SOUTH
        ));
        // Interior positions never count as overshoot.
        assert!(!permits_overshoot(RoomPosition::new(50.0, 50.0), GateExits::ALL));
    }

    #[test]
    fn entry_lands_on_the_opposite_edge() {
        assert_eq!(entry_position(Some(GateDirection::North)), RoomPosition::new(50.0, 88.0));
        assert_eq!(entry_position(Some(GateDirection::East)), RoomPosition::new(12.0, 50.0));
        assert_eq!(entry_position(None), RoomPosition::CENTER);
    }
}
