use std::collections::{BTreeMap, BTreeSet};

use levelgen::config::{PityRule, default_bands};
use levelgen::spawning::{ChanceTable, PityState, TagFilter};
use levelgen::{EntityKind, GenerationConfig, SpeciesEntry, SpeciesId, TileKind, generate};
use proptest::{
    arbitrary::any,
    test_runner::{Config as ProptestConfig, TestCaseError, TestRunner},
};

fn check_level(seed: u64, depth: u32, config: &GenerationConfig) -> Result<(), String> {
    let level = generate(seed, depth, config).map_err(|error| error.to_string())?;
    let map = &level.map;

    if !level.report.completable {
        return Err(format!("seed {seed} depth {depth}: stairs unreachable"));
    }
    if map.count_tiles(TileKind::DownStairs) != 1 {
        return Err(format!("seed {seed} depth {depth}: stairs count"));
    }

    let mut occupied = BTreeSet::new();
    for entity in &map.entities {
        if !occupied.insert(entity.pos) {
            return Err(format!("seed {seed} depth {depth}: shared tile {:?}", entity.pos));
        }
        if map.tile_at(entity.pos) != TileKind::Floor {
            return Err(format!("seed {seed} depth {depth}: entity off floor at {:?}", entity.pos));
        }
    }

    for room in &map.rooms {
        let placed: u32 = map
            .entities
            .iter()
            .filter(|entity| entity.room == room.id && entity.kind == EntityKind::Monster)
            .map(|entity| entity.etp)
            .sum();
        let budget = room.audit.map_or(0, |audit| audit.budget);
        if placed > budget {
            return Err(format!("seed {seed} depth {depth}: {} over budget", room.id));
        }
    }

    if !level.report.passed {
        return Err(format!("seed {seed} depth {depth}: {:?}", level.report.violations));
    }
    Ok(())
}

#[test]
fn test_fuzz_generated_levels_hold_structural_invariants() {
    let config = GenerationConfig::default();
    let mut runner = TestRunner::new(ProptestConfig::with_cases(48));
    let inputs = (any::<u64>(), 1_u32..=12);

    runner
        .run(&inputs, |(seed, depth)| {
            check_level(seed, depth, &config).map_err(TestCaseError::fail)?;
            Ok(())
        })
        .expect("generated levels should preserve invariants");
}

#[test]
fn test_fuzz_pity_boost_and_reset() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(64));
    let inputs = (0_u32..8, 100_u32..400, 1_u32..200);

    runner
        .run(&inputs, |(threshold, multiplier_percent, weight)| {
            let band = &default_bands()[0];
            let entry = SpeciesEntry {
                id: SpeciesId::new("tonic"),
                category: "healing".to_string(),
                weight,
                min_depth: 1,
                max_depth: 10,
                bands: Vec::new(),
                tags: Vec::new(),
                etp: 0,
                depth_growth_percent: 0,
            };
            let table = ChanceTable::build(&[entry], 1, band, &TagFilter::None);
            let base = table.weight_of("tonic").unwrap_or(0);

            let mut pity = PityState::new(BTreeMap::from([(
                "healing".to_string(),
                PityRule { threshold, multiplier_percent },
            )]));
            for _ in 0..threshold {
                let multipliers = pity.begin_cycle();
                if table.with_pity(&multipliers).weight_of("tonic") != Some(base) {
                    return Err(TestCaseError::fail("boost applied before the threshold"));
                }
            }

            let boosted = table.with_pity(&pity.begin_cycle()).weight_of("tonic").unwrap_or(0);
            if boosted < base * u64::from(multiplier_percent) / 100 {
                return Err(TestCaseError::fail(format!("weight {boosted} below boosted floor")));
            }

            pity.record_success("healing");
            if pity.counter("healing") != 0 {
                return Err(TestCaseError::fail("success did not reset the counter"));
            }
            Ok(())
        })
        .expect("pity should boost past the threshold and reset on success");
}
