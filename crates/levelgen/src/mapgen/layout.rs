//! Room placement and corridor carving for the base level topology.

use std::cmp::Ordering;
use std::collections::VecDeque;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

use crate::config::{CorridorStyle, MapParams};
use crate::error::GenerationFailure;
use crate::types::{Pos, RoomId, Tile, TileKind};

use super::grid::{tile_index, wall_grid};
use super::model::{Room, RoomRect};
use super::seed::{roll_u32, roll_usize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Layout {
    pub(super) tiles: Vec<Tile>,
    pub(super) rooms: Vec<Room>,
    pub(super) attempts: u32,
}

pub(super) fn carve_layout(
    rng: &mut ChaCha8Rng,
    params: &MapParams,
) -> Result<Layout, GenerationFailure> {
    let width = params.width;
    let height = params.height;
    let mut tiles = wall_grid(width, height);
    let target_room_count = roll_u32(rng, params.room_count.min, params.room_count.max) as usize;

    let mut rooms: Vec<Room> = Vec::with_capacity(target_room_count);
    let mut attempts = 0_u32;
    while attempts < params.max_attempts && rooms.len() < target_room_count {
        attempts += 1;

        let room_width =
            roll_usize(rng, params.room_width.min as usize, params.room_width.max as usize);
        let room_height =
            roll_usize(rng, params.room_height.min as usize, params.room_height.max as usize);
        let x = roll_usize(rng, 1, width - room_width - 1);
        let y = roll_usize(rng, 1, height - room_height - 1);
        let candidate = RoomRect { x, y, width: room_width, height: room_height };

        let candidate_with_margin = candidate.expanded(params.room_margin);
        if rooms.iter().any(|existing| {
            existing.rect.expanded(params.room_margin).intersects(&candidate_with_margin)
        }) {
            continue;
        }

        carve_room(&mut tiles, width, candidate);
        let id = RoomId(rooms.len());
        rooms.push(Room::new(id, candidate));
        if id.0 > 0 {
            let previous = RoomId(id.0 - 1);
            connect_rooms(
                &mut tiles,
                width,
                &mut rooms,
                (previous, id),
                rng,
                params.corridor_style,
            );
        }
    }

    let required = params.room_count.min as usize;
    if rooms.len() < required {
        return Err(GenerationFailure { placed: rooms.len(), required, attempts });
    }

    Ok(Layout { tiles, rooms, attempts })
}

/// Room farthest from `start` in corridor hops; ties go to the later room.
pub(super) fn farthest_room(rooms: &[Room], start: RoomId) -> RoomId {
    let mut distances = vec![u32::MAX; rooms.len()];
    distances[start.0] = 0;
    let mut open = VecDeque::from([start]);
    while let Some(current) = open.pop_front() {
        let next_distance = distances[current.0] + 1;
        for &neighbor in &rooms[current.0].connections {
            if distances[neighbor.0] == u32::MAX {
                distances[neighbor.0] = next_distance;
                open.push_back(neighbor);
            }
        }
    }

    let mut best = start;
    let mut best_distance = 0_u32;
    for (index, &distance) in distances.iter().enumerate() {
        if distance != u32::MAX && distance >= best_distance {
            best = RoomId(index);
            best_distance = distance;
        }
    }
    best
}

fn carve_room(tiles: &mut [Tile], width: usize, room: RoomRect) {
    for pos in room.positions() {
        tiles[tile_index(width, pos)].kind = TileKind::Floor;
    }
}

fn connect_rooms(
    tiles: &mut [Tile],
    width: usize,
    rooms: &mut [Room],
    (from, to): (RoomId, RoomId),
    rng: &mut ChaCha8Rng,
    style: CorridorStyle,
) {
    let start = rooms[from.0].center;
    let end = rooms[to.0].center;
    let horizontal_first = match style {
        CorridorStyle::HorizontalFirst => true,
        CorridorStyle::VerticalFirst => false,
        CorridorStyle::LeastCrossing if start.x == end.x || start.y == end.y => true,
        CorridorStyle::LeastCrossing => {
            let horizontal = crossings(&corridor_path(start, end, true), rooms, from, to);
            let vertical = crossings(&corridor_path(start, end, false), rooms, from, to);
            match horizontal.cmp(&vertical) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => rng.next_u64() & 1 == 0,
            }
        }
    };

    let path = corridor_path(start, end, horizontal_first);
    for &pos in &path {
        let tile = &mut tiles[tile_index(width, pos)];
        if tile.kind == TileKind::Wall {
            tile.kind = TileKind::Floor;
        }
    }

    let mut visited: Vec<RoomId> = Vec::new();
    for &pos in &path {
        if let Some(room) = rooms.iter().find(|room| room.rect.contains(pos))
            && visited.last() != Some(&room.id)
        {
            visited.push(room.id);
        }
    }
    for pair in visited.windows(2) {
        rooms[pair[0].0].connect(pair[1]);
        rooms[pair[1].0].connect(pair[0]);
    }
}

/// Straight when the endpoints share a row or column, otherwise one bend.
fn corridor_path(start: Pos, end: Pos, horizontal_first: bool) -> Vec<Pos> {
    let corner =
        if horizontal_first { Pos { y: start.y, x: end.x } } else { Pos { y: end.y, x: start.x } };
    let mut path = Vec::new();
    walk_line(&mut path, start, corner);
    walk_line(&mut path, corner, end);
    path.dedup();
    path
}

fn walk_line(path: &mut Vec<Pos>, from: Pos, to: Pos) {
    let step_y = (to.y - from.y).signum();
    let step_x = (to.x - from.x).signum();
    let mut pos = from;
    path.push(pos);
    while pos != to {
        pos = Pos { y: pos.y + step_y, x: pos.x + step_x };
        path.push(pos);
    }
}

fn crossings(path: &[Pos], rooms: &[Room], from: RoomId, to: RoomId) -> usize {
    path.iter()
        .filter(|&&pos| {
            rooms.iter().any(|room| room.id != from && room.id != to && room.rect.contains(pos))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::SizeRange;
    use crate::mapgen::seed::level_rng;
    use crate::reachability::flood;

    fn layout_for(seed: u64) -> Layout {
        carve_layout(&mut level_rng(seed, 1), &MapParams::default()).expect("default params fit")
    }

    #[test]
    fn rooms_never_overlap_or_touch() {
        for seed in [1_u64, 42, 1337, 9_001] {
            let layout = layout_for(seed);
            for left in 0..layout.rooms.len() {
                for right in (left + 1)..layout.rooms.len() {
                    let left_rect = layout.rooms[left].rect.expanded(1);
                    let right_rect = layout.rooms[right].rect.expanded(1);
                    assert!(
                        !left_rect.intersects(&right_rect),
                        "rooms must not overlap or touch: {:?} vs {:?}",
                        layout.rooms[left].rect,
                        layout.rooms[right].rect
                    );
                }
            }
        }
    }

    #[test]
    fn room_count_stays_inside_configured_range() {
        let params = MapParams::default();
        for seed in 0..20 {
            let layout = layout_for(seed);
            assert!(params.room_count.contains(layout.rooms.len() as u32), "seed {seed}");
        }
    }

    #[test]
    fn every_floor_tile_is_connected() {
        let params = MapParams::default();
        let layout = layout_for(77);
        let floor: BTreeSet<Pos> = layout
            .tiles
            .iter()
            .filter(|tile| tile.kind == TileKind::Floor)
            .map(|tile| tile.pos)
            .collect();

        let start = layout.rooms[0].center;
        let mut seen = BTreeSet::from([start]);
        let mut open = VecDeque::from([start]);
        while let Some(pos) = open.pop_front() {
            for next in pos.neighbors() {
                if floor.contains(&next) && seen.insert(next) {
                    open.push_back(next);
                }
            }
        }
        assert_eq!(seen.len(), floor.len());
        assert_eq!(layout.tiles.len(), params.width * params.height);
    }

    #[test]
    fn room_graph_reaches_every_room_from_the_first() {
        let layout = layout_for(2_024);
        let mut seen = BTreeSet::from([RoomId(0)]);
        let mut open = VecDeque::from([RoomId(0)]);
        while let Some(current) = open.pop_front() {
            for &neighbor in &layout.rooms[current.0].connections {
                if seen.insert(neighbor) {
                    open.push_back(neighbor);
                }
            }
        }
        assert_eq!(seen.len(), layout.rooms.len());
    }

    #[test]
    fn exhausted_attempt_budget_is_a_generation_failure() {
        let params =
            MapParams { max_attempts: 1, room_count: SizeRange::new(6, 10), ..Default::default() };
        let failure =
            carve_layout(&mut level_rng(5, 1), &params).expect_err("one attempt is too few");
        assert_eq!(failure.required, 6);
        assert_eq!(failure.attempts, 1);
        assert!(failure.placed <= 1);
    }

    #[test]
    fn corridor_paths_bend_at_most_once() {
        let start = Pos { y: 2, x: 3 };
        let end = Pos { y: 6, x: 9 };
        let path = corridor_path(start, end, true);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert_eq!(path.len() as u32, start.x.abs_diff(end.x) + start.y.abs_diff(end.y) + 1);
        assert!(path.contains(&Pos { y: 2, x: 9 }));

        let vertical = corridor_path(start, end, false);
        assert!(vertical.contains(&Pos { y: 6, x: 3 }));
    }

    #[test]
    fn least_crossing_bends_around_rooms_in_the_way() {
        let (width, height) = (30, 15);
        let obstacle = RoomRect { x: 10, y: 1, width: 3, height: 3 };
        for seed in 0..20_u64 {
            let mut tiles = wall_grid(width, height);
            let mut rooms = vec![
                Room::new(RoomId(0), RoomRect { x: 1, y: 1, width: 3, height: 3 }),
                Room::new(RoomId(1), RoomRect { x: 20, y: 10, width: 3, height: 3 }),
                Room::new(RoomId(2), obstacle),
            ];
            carve_room(&mut tiles, width, rooms[0].rect);
            carve_room(&mut tiles, width, rooms[1].rect);

            connect_rooms(
                &mut tiles,
                width,
                &mut rooms,
                (RoomId(0), RoomId(1)),
                &mut level_rng(seed, 1),
                CorridorStyle::LeastCrossing,
            );

            let untouched = obstacle
                .positions()
                .all(|pos| tiles[tile_index(width, pos)].kind == TileKind::Wall);
            assert!(untouched, "seed {seed}: corridor cut through the obstacle");
            assert_eq!(tiles[tile_index(width, Pos { y: 11, x: 2 })].kind, TileKind::Floor);
            let reached = flood(&tiles, width, height, rooms[0].center, TileKind::is_walkable);
            assert!(reached[tile_index(width, rooms[1].center)], "seed {seed}");
            assert_eq!(rooms[0].connections, vec![RoomId(1)]);
            assert!(rooms[2].connections.is_empty());
        }
    }

    #[test]
    fn farthest_room_prefers_later_rooms_on_ties() {
        let mut rooms: Vec<Room> = (0..3)
            .map(|index| {
                Room::new(RoomId(index), RoomRect { x: 1 + index * 8, y: 1, width: 4, height: 4 })
            })
            .collect();
        rooms[0].connect(RoomId(1));
        rooms[1].connect(RoomId(0));
        rooms[0].connect(RoomId(2));
        rooms[2].connect(RoomId(0));

        assert_eq!(farthest_room(&rooms, RoomId(0)), RoomId(2));
    }
}
