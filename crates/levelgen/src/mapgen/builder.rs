//! High-level map construction: layout, stairs, then post-layout features.

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::MapParams;
use crate::error::GenerationFailure;
use crate::types::{Pos, RoomId, TileKind};

use super::features::{
    FeatureContext, designate_vaults, gate_secret_rooms, place_doors, scatter_traps,
};
use super::grid::tile_index;
use super::layout::{carve_layout, farthest_room};
use super::model::Map;

pub struct MapBuilder<'a> {
    params: &'a MapParams,
}

impl<'a> MapBuilder<'a> {
    pub fn new(params: &'a MapParams) -> Self {
        Self { params }
    }

    /// Carves a level using only `rng`; the same rng state always yields the same map.
    pub fn build(&self, rng: &mut ChaCha8Rng, depth: u32) -> Result<Map, GenerationFailure> {
        let params = self.params;
        let mut layout = carve_layout(rng, params)?;

        let spawn_room = RoomId(0);
        let stairs_room = farthest_room(&layout.rooms, spawn_room);
        let spawn = layout.rooms[spawn_room.0].center;
        let stairs = if stairs_room == spawn_room {
            let rect = layout.rooms[stairs_room.0].rect;
            Pos { y: rect.bottom() as i32, x: rect.right() as i32 }
        } else {
            layout.rooms[stairs_room.0].center
        };
        layout.tiles[tile_index(params.width, spawn)].kind = TileKind::UpStairs;
        layout.tiles[tile_index(params.width, stairs)].kind = TileKind::DownStairs;
        debug!(
            rooms = layout.rooms.len(),
            attempts = layout.attempts,
            %spawn_room,
            %stairs_room,
            "carved room layout"
        );

        let mut context = FeatureContext {
            params,
            tiles: &mut layout.tiles,
            rooms: &mut layout.rooms,
            spawn,
            stairs,
            spawn_room,
            stairs_room,
        };
        let doors = place_doors(&mut context);
        let secret_doors = gate_secret_rooms(rng, &mut context);
        let vaults = designate_vaults(rng, &mut context);
        let traps = scatter_traps(rng, &context);
        debug!(
            doors,
            secret_doors = secret_doors.len(),
            vaults,
            traps = traps.len(),
            "placed map features"
        );

        Ok(Map {
            width: params.width,
            height: params.height,
            depth,
            tiles: layout.tiles,
            rooms: layout.rooms,
            spawn,
            stairs,
            spawn_room,
            stairs_room,
            secret_doors,
            traps,
            entities: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeRange;
    use crate::mapgen::seed::level_rng;
    use crate::reachability;
    use crate::types::RoomDesignation;

    fn build(seed: u64, depth: u32) -> Map {
        MapBuilder::new(&MapParams::default())
            .build(&mut level_rng(seed, depth), depth)
            .expect("default params fit")
    }

    #[test]
    fn same_rng_state_builds_the_same_map() {
        assert_eq!(build(4_242, 2), build(4_242, 2));
        assert_ne!(build(4_242, 2).fingerprint(), build(4_243, 2).fingerprint());
    }

    #[test]
    fn exactly_one_down_stairs_and_one_up_stairs() {
        for seed in 0..25 {
            let map = build(seed, 1);
            assert_eq!(map.count_tiles(TileKind::DownStairs), 1, "seed {seed}");
            assert_eq!(map.count_tiles(TileKind::UpStairs), 1, "seed {seed}");
            assert_eq!(map.tile_at(map.stairs), TileKind::DownStairs);
            assert_eq!(map.tile_at(map.spawn), TileKind::UpStairs);
            assert_ne!(map.spawn, map.stairs);
        }
    }

    #[test]
    fn secret_gates_never_cut_off_the_stairs() {
        for seed in 0..40 {
            let map = build(seed, 3);
            let report = reachability::validate(&map);
            assert!(report.completable, "seed {seed}");
            assert!(report.closed.reachable_percent >= 95.0, "seed {seed}");
            for &door in &map.secret_doors {
                assert_eq!(map.tile_at(door), TileKind::SecretDoor);
            }
        }
    }

    #[test]
    fn reserved_rooms_keep_the_normal_designation() {
        for seed in 0..40 {
            let map = build(seed, 2);
            assert_eq!(map.rooms[map.spawn_room.0].designation, RoomDesignation::Normal);
            assert_eq!(map.rooms[map.stairs_room.0].designation, RoomDesignation::Normal);
            let vaults: Vec<_> = map
                .rooms
                .iter()
                .filter(|room| room.designation == RoomDesignation::Vault)
                .collect();
            assert!(vaults.len() <= 1);
            for vault in vaults {
                assert_eq!(vault.vault_slot, Some(vault.center));
            }
        }
    }

    #[test]
    fn traps_stay_on_plain_corridor_floor() {
        for seed in 0..20 {
            let map = build(seed, 4);
            assert!(map.traps.len() <= 3);
            for trap in &map.traps {
                assert_eq!(map.tile_at(trap.pos), TileKind::Floor);
                assert!(map.room_containing(trap.pos).is_none());
            }
        }
    }

    #[test]
    fn single_room_levels_keep_stairs_apart() {
        let params = MapParams {
            room_count: SizeRange::new(1, 1),
            ..MapParams::default()
        };
        let map = MapBuilder::new(&params).build(&mut level_rng(6, 1), 1).expect("one room fits");
        assert_eq!(map.rooms.len(), 1);
        assert_eq!(map.spawn_room, map.stairs_room);
        assert_ne!(map.spawn, map.stairs);
        assert!(reachability::validate(&map).completable);
    }

    #[test]
    fn generation_leaves_every_tile_unexplored() {
        assert!(build(8, 1).tiles.iter().all(|tile| !tile.explored));
    }
}
