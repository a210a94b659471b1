//! Walkable-tile connectivity from the spawn point.
//!
//! Two flood fills run over the same grid: one with every secret door closed (what a
//! player can reach before discovering anything) and one with every secret open. The
//! level is completable only when the closed pass reaches the down stairs.

use std::collections::VecDeque;

use serde::Serialize;

use crate::mapgen::Map;
use crate::mapgen::grid::{in_bounds, tile_index};
use crate::types::{Pos, Tile, TileKind};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PassReport {
    pub reachable_tiles: usize,
    /// Share of all walkable tiles, 0..=100.
    pub reachable_percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReachabilityReport {
    pub total_tiles: usize,
    /// Tiles passable once every secret is open.
    pub walkable_tiles: usize,
    pub walkable_percent: f64,
    pub closed: PassReport,
    pub open: PassReport,
    /// Stairs reachable with secrets closed.
    pub completable: bool,
    pub stairs_reachable_when_open: bool,
}

pub fn validate(map: &Map) -> ReachabilityReport {
    let walkable_tiles =
        map.tiles.iter().filter(|tile| tile.kind.is_passable_when_open()).count();
    let total_tiles = map.tiles.len();

    let closed = flood(&map.tiles, map.width, map.height, map.spawn, TileKind::is_walkable);
    let open = flood(&map.tiles, map.width, map.height, map.spawn, TileKind::is_passable_when_open);

    let stairs_index = map.in_bounds(map.stairs).then(|| tile_index(map.width, map.stairs));
    let reached = |visited: &[bool]| stairs_index.is_some_and(|index| visited[index]);

    ReachabilityReport {
        total_tiles,
        walkable_tiles,
        walkable_percent: percent(walkable_tiles, total_tiles),
        closed: pass_report(&closed, walkable_tiles),
        open: pass_report(&open, walkable_tiles),
        completable: reached(&closed) && map.tile_at(map.stairs) == TileKind::DownStairs,
        stairs_reachable_when_open: reached(&open),
    }
}

/// Breadth-first fill from `start`; the returned mask is indexed like the tile grid.
pub(crate) fn flood(
    tiles: &[Tile],
    width: usize,
    height: usize,
    start: Pos,
    passable: impl Fn(TileKind) -> bool,
) -> Vec<bool> {
    let mut visited = vec![false; tiles.len()];
    if !in_bounds(width, height, start) || !passable(tiles[tile_index(width, start)].kind) {
        return visited;
    }

    visited[tile_index(width, start)] = true;
    let mut open = VecDeque::from([start]);
    while let Some(pos) = open.pop_front() {
        for next in pos.neighbors() {
            if !in_bounds(width, height, next) {
                continue;
            }
            let index = tile_index(width, next);
            if visited[index] || !passable(tiles[index].kind) {
                continue;
            }
            visited[index] = true;
            open.push_back(next);
        }
    }
    visited
}

pub(crate) fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

fn pass_report(visited: &[bool], walkable_tiles: usize) -> PassReport {
    let reachable_tiles = visited.iter().filter(|&&seen| seen).count();
    PassReport { reachable_tiles, reachable_percent: percent(reachable_tiles, walkable_tiles) }
}
