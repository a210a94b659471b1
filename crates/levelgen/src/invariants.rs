//! Post-generation checks.
//!
//! Structural violations fail the run even though a map exists. Statistical warnings are
//! only recorded for balance tooling to trend.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::InvariantParams;
use crate::mapgen::Map;
use crate::reachability::ReachabilityReport;
use crate::types::{EntityKind, PlacementFailure, Pos, RoomId, SpeciesId, TileKind};

#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("expected exactly one down stairs tile, found {found}")]
    StairsCount { found: usize },

    #[error("stairs are not reachable from spawn with secrets closed")]
    NotCompletable,

    #[error("{count} entities share tile {pos:?}")]
    DoubleOccupancy { pos: Pos, count: usize },

    #[error("'{species}' stands on {tile:?} at {pos:?}")]
    BlockedTile { species: SpeciesId, pos: Pos, tile: TileKind },

    #[error("'{species}' occupies reserved tile {pos:?}")]
    ReservedTile { species: SpeciesId, pos: Pos },

    #[error("{room} spends {placed_etp} ETP against a budget of {budget}")]
    BudgetOverrun { room: RoomId, budget: u32, placed_etp: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    WalkableOutOfRange { percent: f64, min: u32, max: u32 },
    LowClosedCoverage { percent: f64, floor: u32 },
    MonsterDensity { room: RoomId, monsters: u32, area: u32, max_percent: u32 },
    PlacementFailures { count: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalkableOutOfRange { percent, min, max } => {
                write!(f, "walkable {percent:.1}% outside {min}..={max}%")
            }
            Self::LowClosedCoverage { percent, floor } => {
                write!(f, "closed-pass coverage {percent:.1}% below {floor}%")
            }
            Self::MonsterDensity { room, monsters, area, max_percent } => {
                write!(f, "{room} holds {monsters} monsters on {area} tiles (max {max_percent}%)")
            }
            Self::PlacementFailures { count } => write!(f, "{count} entities could not be placed"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InvariantReport {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl InvariantReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

pub struct InvariantChecker<'a> {
    params: &'a InvariantParams,
    coverage_floor_percent: u32,
    placement_failures: &'a [PlacementFailure],
}

impl<'a> InvariantChecker<'a> {
    pub fn new(params: &'a InvariantParams) -> Self {
        Self { params, coverage_floor_percent: 0, placement_failures: &[] }
    }

    pub fn with_coverage_floor(mut self, percent: u32) -> Self {
        self.coverage_floor_percent = percent;
        self
    }

    pub fn with_placement_failures(mut self, failures: &'a [PlacementFailure]) -> Self {
        self.placement_failures = failures;
        self
    }

    pub fn check(&self, map: &Map, reachability: &ReachabilityReport) -> InvariantReport {
        let mut report = InvariantReport::default();
        self.check_structure(map, reachability, &mut report.violations);
        self.check_statistics(map, reachability, &mut report.warnings);
        report
    }

    fn check_structure(
        &self,
        map: &Map,
        reachability: &ReachabilityReport,
        violations: &mut Vec<Violation>,
    ) {
        let stairs = map.count_tiles(TileKind::DownStairs);
        if stairs != 1 {
            violations.push(Violation::StairsCount { found: stairs });
        }
        if !reachability.completable {
            violations.push(Violation::NotCompletable);
        }

        let mut per_tile: BTreeMap<Pos, usize> = BTreeMap::new();
        for entity in &map.entities {
            *per_tile.entry(entity.pos).or_default() += 1;

            let tile = map.tile_at(entity.pos);
            if tile != TileKind::Floor {
                violations.push(Violation::BlockedTile {
                    species: entity.species.clone(),
                    pos: entity.pos,
                    tile,
                });
                continue;
            }
            let on_vault_slot =
                map.rooms.iter().any(|room| room.vault_slot == Some(entity.pos));
            let on_trap = map.traps.iter().any(|trap| trap.pos == entity.pos);
            if on_trap || (on_vault_slot && !entity.vault_reward) {
                violations.push(Violation::ReservedTile {
                    species: entity.species.clone(),
                    pos: entity.pos,
                });
            }
        }
        violations.extend(
            per_tile
                .into_iter()
                .filter(|&(_, count)| count > 1)
                .map(|(pos, count)| Violation::DoubleOccupancy { pos, count }),
        );

        for room in &map.rooms {
            let budget = room.audit.map_or(0, |audit| audit.budget);
            let placed_etp: u32 = map
                .entities
                .iter()
                .filter(|entity| entity.room == room.id && entity.kind == EntityKind::Monster)
                .map(|entity| entity.etp)
                .sum();
            if placed_etp > budget {
                violations.push(Violation::BudgetOverrun { room: room.id, budget, placed_etp });
            }
        }
    }

    fn check_statistics(
        &self,
        map: &Map,
        reachability: &ReachabilityReport,
        warnings: &mut Vec<Warning>,
    ) {
        let min = self.params.min_walkable_percent;
        let max = self.params.max_walkable_percent;
        let percent = reachability.walkable_percent;
        if percent < f64::from(min) || percent > f64::from(max) {
            warnings.push(Warning::WalkableOutOfRange { percent, min, max });
        }

        let closed = reachability.closed.reachable_percent;
        if closed < f64::from(self.coverage_floor_percent) {
            warnings.push(Warning::LowClosedCoverage {
                percent: closed,
                floor: self.coverage_floor_percent,
            });
        }

        let max_percent = self.params.max_monster_density_percent;
        for room in &map.rooms {
            let monsters = map
                .entities
                .iter()
                .filter(|entity| entity.room == room.id && entity.kind == EntityKind::Monster)
                .count() as u32;
            let area = room.area();
            if u64::from(monsters) * 100 > u64::from(max_percent) * u64::from(area) {
                warnings.push(Warning::MonsterDensity {
                    room: room.id,
                    monsters,
                    area,
                    max_percent,
                });
            }
        }

        if !self.placement_failures.is_empty() {
            warnings.push(Warning::PlacementFailures { count: self.placement_failures.len() });
        }
    }
}
