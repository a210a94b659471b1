//! Flat, field-keyed level summaries for regression and balance tooling.

use serde::Serialize;

use crate::invariants::{InvariantReport, Violation, Warning};
use crate::mapgen::{Map, Room};
use crate::reachability::ReachabilityReport;
use crate::types::{EntityKind, PlacementFailure, RoomDesignation};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoomReport {
    pub id: usize,
    pub designation: RoomDesignation,
    pub area: u32,
    /// False for rooms skipped by population (spawn, stairs, or a failed gate).
    pub planned: bool,
    pub budget: u32,
    pub planned_etp: u32,
    pub placed_etp: u32,
    pub monsters: u32,
    pub items: u32,
}

impl RoomReport {
    fn from_room(room: &Room) -> Self {
        let audit = room.audit.unwrap_or_default();
        Self {
            id: room.id.0,
            designation: room.designation,
            area: room.area(),
            planned: room.audit.is_some(),
            budget: audit.budget,
            planned_etp: audit.planned_etp,
            placed_etp: audit.placed_etp,
            monsters: audit.monsters,
            items: audit.items,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelReport {
    pub seed: u64,
    pub depth: u32,
    pub band: String,
    pub width: usize,
    pub height: usize,
    pub room_count: usize,
    pub total_tiles: usize,
    pub walkable_tiles: usize,
    pub walkable_percent: f64,
    pub closed_reachable_tiles: usize,
    pub closed_reachable_percent: f64,
    pub open_reachable_tiles: usize,
    pub open_reachable_percent: f64,
    pub completable: bool,
    pub secret_doors: usize,
    pub traps: usize,
    pub vaults: usize,
    pub monster_count: usize,
    pub item_count: usize,
    pub total_placed_etp: u32,
    pub placement_failure_count: usize,
    pub placement_failures: Vec<PlacementFailure>,
    pub rooms: Vec<RoomReport>,
    pub passed: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    /// Hex xxh3 of the map's canonical bytes.
    pub fingerprint: String,
}

pub(crate) struct ReportInputs<'a> {
    pub(crate) seed: u64,
    pub(crate) band: &'a str,
    pub(crate) map: &'a Map,
    pub(crate) reachability: &'a ReachabilityReport,
    pub(crate) invariants: InvariantReport,
    pub(crate) failures: Vec<PlacementFailure>,
}

impl LevelReport {
    pub(crate) fn assemble(inputs: ReportInputs<'_>) -> Self {
        let ReportInputs { seed, band, map, reachability, invariants, failures } = inputs;
        let count_kind =
            |kind: EntityKind| map.entities.iter().filter(|entity| entity.kind == kind).count();

        Self {
            seed,
            depth: map.depth,
            band: band.to_string(),
            width: map.width,
            height: map.height,
            room_count: map.rooms.len(),
            total_tiles: reachability.total_tiles,
            walkable_tiles: reachability.walkable_tiles,
            walkable_percent: reachability.walkable_percent,
            closed_reachable_tiles: reachability.closed.reachable_tiles,
            closed_reachable_percent: reachability.closed.reachable_percent,
            open_reachable_tiles: reachability.open.reachable_tiles,
            open_reachable_percent: reachability.open.reachable_percent,
            completable: reachability.completable,
            secret_doors: map.secret_doors.len(),
            traps: map.traps.len(),
            vaults: map
                .rooms
                .iter()
                .filter(|room| room.designation == RoomDesignation::Vault)
                .count(),
            monster_count: count_kind(EntityKind::Monster),
            item_count: count_kind(EntityKind::Item),
            total_placed_etp: map
                .entities
                .iter()
                .filter(|entity| entity.kind == EntityKind::Monster)
                .map(|entity| entity.etp)
                .sum(),
            placement_failure_count: failures.len(),
            placement_failures: failures,
            rooms: map.rooms.iter().map(RoomReport::from_room).collect(),
            passed: invariants.passed(),
            violations: invariants.violations,
            warnings: invariants.warnings,
            fingerprint: format!("{:016x}", map.fingerprint()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
