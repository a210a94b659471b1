//! Maps spawn plans onto free in-room floor tiles.

use std::collections::BTreeSet;

use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::warn;

use crate::config::PlacementParams;
use crate::mapgen::seed::roll_usize;
use crate::mapgen::{Map, Room};
use crate::types::{EntityKind, PlacedEntity, PlacementFailure, Pos, TileKind};

use super::planner::{PlannedSpawn, RoomSpawnPlan};

/// Tiles already holding an entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Occupancy {
    tiles: BTreeSet<Pos>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds occupancy with every entity already on `map`.
    pub fn from_map(map: &Map) -> Self {
        Self { tiles: map.entities.iter().map(|entity| entity.pos).collect() }
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.tiles.contains(&pos)
    }

    /// Returns false when the tile was already taken.
    pub fn claim(&mut self, pos: Pos) -> bool {
        self.tiles.insert(pos)
    }

    pub(crate) fn len(&self) -> usize {
        self.tiles.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlacementOutcome {
    pub placed: Vec<PlacedEntity>,
    pub failures: Vec<PlacementFailure>,
}

pub struct Placer {
    attempts_per_entity: u32,
}

impl Placer {
    pub fn new(params: &PlacementParams) -> Self {
        Self { attempts_per_entity: params.attempts_per_entity }
    }

    /// Places the vault reward first, then monsters, then loot.
    pub fn place(
        &self,
        map: &Map,
        room: &Room,
        plan: &RoomSpawnPlan,
        occupancy: &mut Occupancy,
        rng: &mut ChaCha8Rng,
    ) -> PlacementOutcome {
        let mut scope = PlacementScope {
            attempts_per_entity: self.attempts_per_entity,
            map,
            room,
            occupancy,
            rng,
            outcome: PlacementOutcome::default(),
        };

        if let Some(reward) = &plan.vault_reward {
            scope.place_unit(reward, EntityKind::Item, true);
        }
        for spawn in &plan.monsters {
            for _ in 0..spawn.count {
                scope.place_unit(spawn, EntityKind::Monster, false);
            }
        }
        for spawn in &plan.items {
            for _ in 0..spawn.count {
                scope.place_unit(spawn, EntityKind::Item, false);
            }
        }
        scope.outcome
    }
}

struct PlacementScope<'a> {
    attempts_per_entity: u32,
    map: &'a Map,
    room: &'a Room,
    occupancy: &'a mut Occupancy,
    rng: &'a mut ChaCha8Rng,
    outcome: PlacementOutcome,
}

impl PlacementScope<'_> {
    fn place_unit(&mut self, spawn: &PlannedSpawn, kind: EntityKind, vault_reward: bool) {
        let room = self.room;
        let mut attempts = 0;
        let mut chosen = None;

        if vault_reward && let Some(slot) = room.vault_slot {
            attempts += 1;
            if self.is_free(slot, true) {
                chosen = Some(slot);
            }
        }

        while chosen.is_none() && attempts < self.attempts_per_entity {
            attempts += 1;
            let pos = Pos {
                y: roll_usize(self.rng, room.rect.y, room.rect.bottom()) as i32,
                x: roll_usize(self.rng, room.rect.x, room.rect.right()) as i32,
            };
            if self.is_free(pos, vault_reward) {
                chosen = Some(pos);
            }
        }

        match chosen {
            Some(pos) => {
                self.occupancy.claim(pos);
                self.outcome.placed.push(PlacedEntity {
                    species: spawn.species.clone(),
                    kind,
                    pos,
                    room: room.id,
                    etp: spawn.etp,
                    vault_reward,
                });
            }
            None => {
                let failure = PlacementFailure {
                    species: spawn.species.clone(),
                    kind,
                    room: room.id,
                    attempts,
                };
                warn!(%failure, "dropping entity");
                self.outcome.failures.push(failure);
            }
        }
    }

    fn is_free(&self, pos: Pos, vault_reward: bool) -> bool {
        if self.map.tile_at(pos) != TileKind::Floor || self.occupancy.is_occupied(pos) {
            return false;
        }
        if self.map.traps.iter().any(|trap| trap.pos == pos) {
            return false;
        }
        vault_reward || self.room.vault_slot != Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::RoomRect;
    use crate::mapgen::grid::{tile_index, wall_grid};
    use crate::mapgen::seed::level_rng;
    use crate::types::{RoomDesignation, RoomId, SpeciesId, Trap, TrapKind, TrapState};

    fn single_room_map(rect: RoomRect) -> Map {
        let width = 12;
        let height = 10;
        let mut tiles = wall_grid(width, height);
        for pos in rect.positions() {
            tiles[tile_index(width, pos)].kind = TileKind::Floor;
        }
        let room = Room::new(RoomId(0), rect);
        Map {
            width,
            height,
            depth: 1,
            tiles,
            spawn: room.center,
            stairs: room.center,
            rooms: vec![room],
            spawn_room: RoomId(0),
            stairs_room: RoomId(0),
            secret_doors: Vec::new(),
            traps: Vec::new(),
            entities: Vec::new(),
        }
    }

    fn monsters(count: u32) -> RoomSpawnPlan {
        let mut plan = RoomSpawnPlan::empty(RoomId(0), 10);
        plan.monsters.push(PlannedSpawn {
            species: SpeciesId::new("goblin"),
            category: "humanoid".to_string(),
            count,
            etp: 2,
        });
        plan
    }

    fn placer() -> Placer {
        Placer::new(&PlacementParams::default())
    }

    #[test]
    fn placed_entities_never_share_a_tile() {
        let map = single_room_map(RoomRect { x: 2, y: 2, width: 3, height: 3 });
        let mut occupancy = Occupancy::new();
        let outcome =
            placer().place(&map, &map.rooms[0], &monsters(5), &mut occupancy, &mut level_rng(1, 1));

        let tiles: BTreeSet<Pos> = outcome.placed.iter().map(|entity| entity.pos).collect();
        assert_eq!(tiles.len(), outcome.placed.len());
        assert_eq!(outcome.placed.len() + outcome.failures.len(), 5);
        assert_eq!(occupancy.len(), outcome.placed.len());
        for entity in &outcome.placed {
            assert_eq!(map.tile_at(entity.pos), TileKind::Floor);
            assert!(map.rooms[0].rect.contains(entity.pos));
        }
    }

    #[test]
    fn room_without_free_floor_reports_a_failure() {
        let mut map = single_room_map(RoomRect { x: 2, y: 2, width: 3, height: 3 });
        for pos in map.rooms[0].rect.positions() {
            map.tiles[tile_index(map.width, pos)].kind = TileKind::Wall;
        }
        let mut rng = level_rng(2, 1);
        let outcome =
            placer().place(&map, &map.rooms[0], &monsters(1), &mut Occupancy::new(), &mut rng);

        assert!(outcome.placed.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].species.as_str(), "goblin");
        assert_eq!(outcome.failures[0].attempts, PlacementParams::default().attempts_per_entity);
    }

    #[test]
    fn reserved_slot_and_traps_are_skipped_by_ordinary_spawns() {
        let mut map = single_room_map(RoomRect { x: 2, y: 2, width: 2, height: 1 });
        map.rooms[0].designation = RoomDesignation::Vault;
        map.rooms[0].vault_slot = Some(Pos { y: 2, x: 2 });
        map.traps.push(Trap {
            pos: Pos { y: 2, x: 3 },
            kind: TrapKind::Pit,
            state: TrapState::Hidden,
        });

        let mut rng = level_rng(3, 1);
        let outcome =
            placer().place(&map, &map.rooms[0], &monsters(1), &mut Occupancy::new(), &mut rng);
        assert!(outcome.placed.is_empty());
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn vault_reward_takes_its_slot_first() {
        let mut map = single_room_map(RoomRect { x: 2, y: 2, width: 4, height: 4 });
        let slot = map.rooms[0].center;
        map.rooms[0].designation = RoomDesignation::Vault;
        map.rooms[0].vault_slot = Some(slot);

        let mut plan = monsters(3);
        plan.vault_reward = Some(PlannedSpawn {
            species: SpeciesId::new("relic"),
            category: "relic".to_string(),
            count: 1,
            etp: 0,
        });
        let outcome =
            placer().place(&map, &map.rooms[0], &plan, &mut Occupancy::new(), &mut level_rng(4, 1));

        let reward = &outcome.placed[0];
        assert!(reward.vault_reward);
        assert_eq!(reward.pos, slot);
        assert_eq!(reward.kind, EntityKind::Item);
        assert!(
            outcome.placed[1..]
                .iter()
                .all(|entity| entity.pos != slot && !entity.vault_reward)
        );
    }

    #[test]
    fn occupancy_from_map_blocks_existing_entities() {
        let mut map = single_room_map(RoomRect { x: 2, y: 2, width: 1, height: 1 });
        map.entities.push(PlacedEntity {
            species: SpeciesId::new("rat"),
            kind: EntityKind::Monster,
            pos: Pos { y: 2, x: 2 },
            room: RoomId(0),
            etp: 1,
            vault_reward: false,
        });
        let mut occupancy = Occupancy::from_map(&map);
        assert!(!occupancy.claim(Pos { y: 2, x: 2 }));

        let outcome =
            placer().place(&map, &map.rooms[0], &monsters(1), &mut occupancy, &mut level_rng(5, 1));
        assert_eq!(outcome.failures.len(), 1);
    }
}
