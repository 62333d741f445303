/// Engine tuning constants and per-session parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Fixed scheduler tick period in milliseconds.
    pub tick_period_ms: u64,
    /// Distance covered by one frame of continuous movement input, in
    /// room-space units.
    pub move_speed: f32,
    /// Re-trigger guard window for gate transitions, in milliseconds.
    pub gate_debounce_ms: u64,
    /// Margin left under weapon range when computing an approach position
    /// for the caller-side move-then-attack pattern.
    pub approach_buffer: f32,
}

impl EngineConfig {
    // ===== room geometry (room-space percentage coordinates) =====
    /// Walls for ordinary movement: positions stay within this band.
    pub const SOFT_MIN: f32 = 5.0;
    pub const SOFT_MAX: f32 = 95.0;
    /// Extended bound for scheduled moves and door-crossing overshoot.
    pub const HARD_MIN: f32 = -10.0;
    pub const HARD_MAX: f32 = 110.0;
    /// Gates span the middle third of the perpendicular axis.
    pub const GATE_BAND_MIN: f32 = 40.0;
    pub const GATE_BAND_MAX: f32 = 60.0;
    /// Boundary thresholds along the axis of travel.
    pub const GATE_LOW_EDGE: f32 = 5.0;
    pub const GATE_HIGH_EDGE: f32 = 95.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;
    pub const DEFAULT_MOVE_SPEED: f32 = 1.8;
    pub const DEFAULT_GATE_DEBOUNCE_MS: u64 = 2000;
    pub const DEFAULT_APPROACH_BUFFER: f32 = 2.0;

    pub fn new() -> Self {
        Self {
            tick_period_ms: Self::DEFAULT_TICK_PERIOD_MS,
            move_speed: Self::DEFAULT_MOVE_SPEED,
            gate_debounce_ms: Self::DEFAULT_GATE_DEBOUNCE_MS,
            approach_buffer: Self::DEFAULT_APPROACH_BUFFER,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
