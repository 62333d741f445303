//! Entropy-backed roll source for live sessions.
//!
//! The core stays deterministic; this adapter is where real randomness
//! enters. Tests swap in [`combat_core::FixedRoller`] or
//! [`combat_core::SplitMixRoller`] instead.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use combat_core::RollOracle;

pub struct EntropyRoller {
    rng: SmallRng,
}

impl EntropyRoller {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl Default for EntropyRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl RollOracle for EntropyRoller {
    fn roll_unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}
