//! Level pipeline: build, gate on reachability, populate, then check invariants.

use tracing::{debug, info, warn};

use crate::config::{Band, GenerationConfig};
use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::invariants::InvariantChecker;
use crate::mapgen::{Map, MapBuilder, RoomAudit};
use crate::reachability;
use crate::report::{LevelReport, ReportInputs};
use crate::spawning::{
    BudgetAllocator, ChanceTable, Occupancy, Placer, RoomSpawnPlan, SpawnPlanner, TagFilter,
};
use crate::types::{EntityKind, PlacementFailure};

#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub map: Map,
    pub report: LevelReport,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopulationOutcome {
    pub plans: Vec<RoomSpawnPlan>,
    pub failures: Vec<PlacementFailure>,
}

/// Generates one level from nothing but `seed`, `depth`, and `config`.
pub fn generate(
    seed: u64,
    depth: u32,
    config: &GenerationConfig,
) -> Result<Level, GenerationError> {
    let mut context = GenerationContext::new(seed, depth, &config.pity);
    generate_with_context(&mut context, config)
}

/// Generates the level at `context.depth`, drawing every roll from the context.
///
/// A failed reachability gate still returns the map, with population skipped and the
/// report marked as failed.
pub fn generate_with_context(
    context: &mut GenerationContext,
    config: &GenerationConfig,
) -> Result<Level, GenerationError> {
    let seed = context.seed;
    let depth = context.depth;
    config.validate(depth)?;
    let band = config.band_for_depth(depth)?;

    let mut map = MapBuilder::new(&config.map).build(&mut context.rng, depth).map_err(|failure| {
        warn!(seed, depth, %failure, "map construction failed");
        GenerationError::Failure { seed, depth, failure }
    })?;

    let reachability = reachability::validate(&map);
    debug!(
        walkable = reachability.walkable_tiles,
        closed = reachability.closed.reachable_tiles,
        open = reachability.open.reachable_tiles,
        completable = reachability.completable,
        "validated reachability"
    );

    let failures = if reachability.completable {
        populate(&mut map, band, config, context).failures
    } else {
        warn!(seed, depth, "stairs unreachable with secrets closed; skipping population");
        Vec::new()
    };

    let invariants = InvariantChecker::new(&config.invariants)
        .with_coverage_floor(config.map.min_closed_coverage_percent)
        .with_placement_failures(&failures)
        .check(&map, &reachability);
    for violation in &invariants.violations {
        warn!(seed, depth, %violation, "structural invariant violated");
    }

    let report = LevelReport::assemble(ReportInputs {
        seed,
        band: &band.name,
        map: &map,
        reachability: &reachability,
        invariants,
        failures,
    });
    info!(
        seed,
        depth,
        band = %band.name,
        rooms = report.room_count,
        monsters = report.monster_count,
        items = report.item_count,
        passed = report.passed,
        "generated level"
    );

    Ok(Level { map, report })
}

/// Plans and places monsters and items room by room, annotating each planned room.
pub fn populate(
    map: &mut Map,
    band: &Band,
    config: &GenerationConfig,
    context: &mut GenerationContext,
) -> PopulationOutcome {
    let depth = map.depth;
    let catalog = &config.catalog;
    let monsters = ChanceTable::build(&catalog.monsters, depth, band, &TagFilter::None);
    let loot =
        ChanceTable::build(&catalog.items, depth, band, &TagFilter::any(&config.items.loot_tags));
    let reward_filter = TagFilter::Any(vec![config.items.vault_reward_tag.clone()]);
    let rewards = ChanceTable::build(&catalog.items, depth, band, &reward_filter);
    debug!(
        monsters = monsters.len(),
        loot = loot.len(),
        rewards = rewards.len(),
        "built chance tables"
    );

    let allocator = BudgetAllocator::new(&config.budget);
    let planner = SpawnPlanner::new(&config.budget, &config.items);
    let placer = Placer::new(&config.placement);
    let mut occupancy = Occupancy::from_map(map);
    let mut outcome = PopulationOutcome::default();
    let mut carry = None;

    for index in 0..map.rooms.len() {
        let room = map.rooms[index].clone();
        if (room.id == map.spawn_room && !config.placement.plan_spawn_room)
            || (room.id == map.stairs_room && !config.placement.plan_stairs_room)
        {
            continue;
        }

        let multipliers = context.pity.begin_cycle();
        if !multipliers.is_neutral() {
            debug!(
                room = %room.id,
                boosted = ?multipliers.boosted().collect::<Vec<_>>(),
                "pity boost"
            );
        }

        let budget = allocator.budget(&room, depth, band, carry);
        let mut plan = planner.plan(&room, &monsters.with_pity(&multipliers), budget, context);
        planner.plan_items(
            &mut plan,
            &room,
            &loot.with_pity(&multipliers),
            &rewards.with_pity(&multipliers),
            context,
        );
        carry = allocator.carry_out(budget, plan.planned_etp());

        let placed = placer.place(map, &room, &plan, &mut occupancy, &mut context.rng);
        let placed_monsters =
            placed.placed.iter().filter(|entity| entity.kind == EntityKind::Monster);
        let audit = RoomAudit {
            budget,
            planned_etp: plan.planned_etp(),
            placed_etp: placed_monsters.clone().map(|entity| entity.etp).sum(),
            monsters: placed_monsters.count() as u32,
            items: placed.placed.iter().filter(|entity| entity.kind == EntityKind::Item).count()
                as u32,
        };
        debug!(room = %room.id, ?audit, failures = placed.failures.len(), "populated room");

        map.rooms[index].audit = Some(audit);
        map.entities.extend(placed.placed);
        outcome.failures.extend(placed.failures);
        outcome.plans.push(plan);
    }

    debug!(
        occupied = occupancy.len(),
        rooms = outcome.plans.len(),
        failures = outcome.failures.len(),
        "population done"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::keys;
    use crate::config::SizeRange;

    #[test]
    fn same_seed_and_depth_repeat_exactly() {
        let config = GenerationConfig::default();
        let first = generate(99, 2, &config).expect("level");
        let second = generate(99, 2, &config).expect("level");
        assert_eq!(first, second);
    }

    #[test]
    fn spawn_and_stairs_rooms_are_skipped_by_default() {
        let level = generate(5, 4, &GenerationConfig::default()).expect("level");
        let map = &level.map;
        assert!(map.rooms[map.spawn_room.0].audit.is_none());
        assert!(map.rooms[map.stairs_room.0].audit.is_none());
        assert!(map.entities.iter().all(|entity| entity.room != map.spawn_room));
    }

    #[test]
    fn planning_spawn_rooms_can_be_enabled() {
        let mut config = GenerationConfig::default();
        config.placement.plan_spawn_room = true;
        let level = generate(5, 4, &config).expect("level");
        assert!(level.map.rooms[level.map.spawn_room.0].audit.is_some());
    }

    #[test]
    fn planning_stairs_rooms_can_be_enabled() {
        let mut config = GenerationConfig::default();
        config.placement.plan_stairs_room = true;
        let level = generate(5, 4, &config).expect("level");
        let map = &level.map;
        assert_ne!(map.stairs_room, map.spawn_room);
        assert!(map.rooms[map.stairs_room.0].audit.is_some());
        assert!(map.rooms[map.spawn_room.0].audit.is_none());
    }

    #[test]
    fn room_budget_failure_surfaces_as_an_error() {
        let mut config = GenerationConfig::default();
        config.map.max_attempts = 1;
        config.map.room_count = SizeRange::new(6, 8);
        let error = generate(3, 1, &config).expect_err("one attempt cannot fit six rooms");
        assert!(matches!(error, GenerationError::Failure { seed: 3, depth: 1, .. }));
    }

    #[test]
    fn invalid_depth_is_a_config_error() {
        let error = generate(3, 0, &GenerationConfig::default()).expect_err("depth zero");
        assert!(matches!(error, GenerationError::Config(_)));
    }

    #[test]
    fn rollover_carries_leftover_budget_forward() {
        let mut config = GenerationConfig::default();
        config.budget.max_monsters_per_room = 1;
        config.catalog.monsters.retain(|entry| entry.id.as_str() == keys::CAVE_RAT);
        let budgets = |level: &Level| -> Vec<u32> {
            level.map.rooms.iter().filter_map(|room| room.audit).map(|audit| audit.budget).collect()
        };

        let baseline = budgets(&generate(17, 2, &config).expect("level"));
        config.budget.rollover = true;
        let rolled = budgets(&generate(17, 2, &config).expect("level"));

        assert!(baseline.len() >= 2);
        assert_eq!(rolled.len(), baseline.len());
        assert_eq!(rolled[0], baseline[0]);
        assert_eq!(rolled[1], baseline[1] + baseline[0] - 1);
    }
}
