//! Caller-owned generation state: the rng stream and the run's pity counters.

use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;

use crate::config::PityRule;
use crate::mapgen::seed::level_rng;
use crate::spawning::PityState;

/// Everything random or stateful a generation call touches.
///
/// Pity counters persist across [`GenerationContext::enter_level`] calls, so one context
/// can drive a whole run of levels.
#[derive(Clone, Debug)]
pub struct GenerationContext {
    pub seed: u64,
    pub depth: u32,
    pub rng: ChaCha8Rng,
    pub pity: PityState,
}

impl GenerationContext {
    pub fn new(seed: u64, depth: u32, pity_rules: &BTreeMap<String, PityRule>) -> Self {
        Self { seed, depth, rng: level_rng(seed, depth), pity: PityState::new(pity_rules.clone()) }
    }

    /// Reseeds the rng for `depth` of the same run, keeping pity counters.
    pub fn enter_level(&mut self, depth: u32) {
        self.depth = depth;
        self.rng = level_rng(self.seed, depth);
    }
}
