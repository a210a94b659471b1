//! Many independent levels at once, for sampling and regression harnesses.

use std::ops::RangeInclusive;

use rayon::prelude::*;

use crate::config::GenerationConfig;
use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::pipeline::{Level, generate, generate_with_context};

/// One level per seed, generated in parallel. Output order follows `seeds`.
pub fn generate_batch(
    seeds: &[u64],
    depth: u32,
    config: &GenerationConfig,
) -> Vec<Result<Level, GenerationError>> {
    seeds.par_iter().map(|&seed| generate(seed, depth, config)).collect()
}

/// Consecutive depths of one run sharing a single context, so pity carries between levels.
pub fn generate_run(
    seed: u64,
    depths: RangeInclusive<u32>,
    config: &GenerationConfig,
) -> Result<Vec<Level>, GenerationError> {
    let mut context = GenerationContext::new(seed, *depths.start(), &config.pity);
    let mut levels = Vec::new();
    for depth in depths {
        context.enter_level(depth);
        levels.push(generate_with_context(&mut context, config)?);
    }
    Ok(levels)
}
