//! Post-layout map features: doors, secret-gated rooms, vault slots, and traps.

use rand_chacha::ChaCha8Rng;

use crate::config::MapParams;
use crate::reachability::flood;
use crate::types::{Pos, RoomDesignation, RoomId, Tile, TileKind, Trap, TrapKind, TrapState};

use super::grid::{kind_at, tile_index};
use super::model::Room;
use super::seed::{roll_percent, roll_u32, roll_usize};

pub(super) struct FeatureContext<'a> {
    pub(super) params: &'a MapParams,
    pub(super) tiles: &'a mut [Tile],
    pub(super) rooms: &'a mut [Room],
    pub(super) spawn: Pos,
    pub(super) stairs: Pos,
    pub(super) spawn_room: RoomId,
    pub(super) stairs_room: RoomId,
}

impl FeatureContext<'_> {
    fn kind_at(&self, pos: Pos) -> TileKind {
        kind_at(self.tiles, self.params.width, self.params.height, pos)
    }

    fn set_kind(&mut self, pos: Pos, kind: TileKind) {
        self.tiles[tile_index(self.params.width, pos)].kind = kind;
    }

    fn is_reserved_room(&self, id: RoomId) -> bool {
        id == self.spawn_room || id == self.stairs_room
    }
}

/// Marks corridor mouths on each room's perimeter as doors.
///
/// A ring tile becomes a door when the corridor leaves it straight outward and the two
/// ring tiles beside it are solid wall.
pub(super) fn place_doors(context: &mut FeatureContext<'_>) -> usize {
    let mut doors = Vec::new();
    for room in context.rooms.iter() {
        for (pos, outward) in room.rect.perimeter() {
            if context.kind_at(pos) != TileKind::Floor {
                continue;
            }
            let beyond = Pos { y: pos.y + outward.y, x: pos.x + outward.x };
            if !context.kind_at(beyond).is_walkable() {
                continue;
            }
            let sides = if outward.y != 0 {
                [Pos { y: pos.y, x: pos.x - 1 }, Pos { y: pos.y, x: pos.x + 1 }]
            } else {
                [Pos { y: pos.y - 1, x: pos.x }, Pos { y: pos.y + 1, x: pos.x }]
            };
            if sides.iter().all(|&side| context.kind_at(side) == TileKind::Wall) {
                doors.push(pos);
            }
        }
    }

    doors.sort();
    doors.dedup();
    for &pos in &doors {
        context.set_kind(pos, TileKind::Door);
    }
    doors.len()
}

/// Hides the single door of leaf rooms behind a secret door.
///
/// Each conversion is kept only while the stairs stay reachable with secrets closed and
/// the closed-pass coverage stays at or above the configured floor.
pub(super) fn gate_secret_rooms(
    rng: &mut ChaCha8Rng,
    context: &mut FeatureContext<'_>,
) -> Vec<Pos> {
    let mut secret_doors = Vec::new();
    for index in 0..context.rooms.len() {
        if secret_doors.len() >= context.params.max_secret_rooms {
            break;
        }
        let id = context.rooms[index].id;
        let designation = context.rooms[index].designation;
        if context.is_reserved_room(id) || designation != RoomDesignation::Normal {
            continue;
        }
        let Some(door) = single_door(context, &context.rooms[index]) else {
            continue;
        };
        if !roll_percent(rng, context.params.secret_room_chance_percent) {
            continue;
        }

        context.set_kind(door, TileKind::SecretDoor);
        if closed_pass_holds(context) {
            context.rooms[index].designation = RoomDesignation::SecretGated;
            secret_doors.push(door);
        } else {
            context.set_kind(door, TileKind::Door);
        }
    }
    secret_doors
}

/// Reserves the center tile of eligible rooms as a vault reward slot.
pub(super) fn designate_vaults(rng: &mut ChaCha8Rng, context: &mut FeatureContext<'_>) -> usize {
    let mut vaults = 0;
    for index in 0..context.rooms.len() {
        if vaults >= context.params.max_vaults {
            break;
        }
        let room = &context.rooms[index];
        if context.is_reserved_room(room.id) || room.designation != RoomDesignation::Normal {
            continue;
        }
        if !roll_percent(rng, context.params.vault_chance_percent) {
            continue;
        }
        let room = &mut context.rooms[index];
        room.designation = RoomDesignation::Vault;
        room.vault_slot = Some(room.center);
        vaults += 1;
    }
    vaults
}

/// Scatters hidden traps over corridor floor outside every room.
pub(super) fn scatter_traps(rng: &mut ChaCha8Rng, context: &FeatureContext<'_>) -> Vec<Trap> {
    let mut corridor: Vec<Pos> = context
        .tiles
        .iter()
        .filter(|tile| tile.kind == TileKind::Floor)
        .map(|tile| tile.pos)
        .filter(|&pos| !context.rooms.iter().any(|room| room.rect.contains(pos)))
        .collect();
    let target = roll_u32(rng, context.params.traps.min, context.params.traps.max) as usize;
    let mut traps = Vec::with_capacity(target);
    while traps.len() < target && !corridor.is_empty() {
        let pos = corridor.swap_remove(roll_usize(rng, 0, corridor.len() - 1));
        let kind = match roll_u32(rng, 0, 2) {
            0 => TrapKind::Pit,
            1 => TrapKind::Dart,
            _ => TrapKind::Alarm,
        };
        traps.push(Trap { pos, kind, state: TrapState::Hidden });
    }
    traps.sort_by_key(|trap| trap.pos);
    traps
}

fn single_door(context: &FeatureContext<'_>, room: &Room) -> Option<Pos> {
    let mut entrances = room
        .rect
        .perimeter()
        .into_iter()
        .map(|(pos, _)| pos)
        .filter(|&pos| context.kind_at(pos).is_passable_when_open());
    let entrance = entrances.next()?;
    if entrances.next().is_some() || context.kind_at(entrance) != TileKind::Door {
        return None;
    }
    Some(entrance)
}

fn closed_pass_holds(context: &FeatureContext<'_>) -> bool {
    let width = context.params.width;
    let height = context.params.height;
    let reached = flood(context.tiles, width, height, context.spawn, TileKind::is_walkable);
    if !reached[tile_index(width, context.stairs)] {
        return false;
    }

    let reachable = reached.iter().filter(|&&seen| seen).count();
    let walkable = context.tiles.iter().filter(|tile| tile.kind.is_passable_when_open()).count();
    reachable * 100 >= walkable * context.params.min_closed_coverage_percent as usize
}
