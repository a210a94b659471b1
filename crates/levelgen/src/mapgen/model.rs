//! Public data models for generated levels: rooms, the tile map, and its canonical form.

use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

use crate::types::{
    EntityKind, PlacedEntity, Pos, RoomDesignation, RoomId, Tile, TileKind, Trap, TrapKind,
    TrapState,
};

use super::grid::{in_bounds, tile_index};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoomRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl RoomRect {
    pub fn right(self) -> usize {
        self.x + self.width - 1
    }

    pub fn bottom(self) -> usize {
        self.y + self.height - 1
    }

    pub fn area(self) -> u32 {
        (self.width * self.height) as u32
    }

    pub fn center(self) -> Pos {
        Pos { y: (self.y + (self.height / 2)) as i32, x: (self.x + (self.width / 2)) as i32 }
    }

    pub fn expanded(self, margin: usize) -> Self {
        let expanded_x = self.x.saturating_sub(margin);
        let expanded_y = self.y.saturating_sub(margin);
        let expanded_right = self.right().saturating_add(margin);
        let expanded_bottom = self.bottom().saturating_add(margin);
        Self {
            x: expanded_x,
            y: expanded_y,
            width: expanded_right - expanded_x + 1,
            height: expanded_bottom - expanded_y + 1,
        }
    }

    pub fn intersects(self, other: &Self) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    pub fn contains(self, pos: Pos) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return false;
        }
        let px = pos.x as usize;
        let py = pos.y as usize;
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Interior tiles in row-major order.
    pub fn positions(self) -> impl Iterator<Item = Pos> {
        (self.y..=self.bottom()).flat_map(move |y| {
            (self.x..=self.right()).map(move |x| Pos { y: y as i32, x: x as i32 })
        })
    }

    /// Tiles one step outside each edge, corners excluded, paired with the outward step.
    pub(crate) fn perimeter(self) -> Vec<(Pos, Pos)> {
        let top = self.y as i32 - 1;
        let bottom = self.bottom() as i32 + 1;
        let left = self.x as i32 - 1;
        let right = self.right() as i32 + 1;

        let mut ring = Vec::with_capacity(2 * (self.width + self.height));
        for x in self.x..=self.right() {
            let x = x as i32;
            ring.push((Pos { y: top, x }, Pos { y: -1, x: 0 }));
            ring.push((Pos { y: bottom, x }, Pos { y: 1, x: 0 }));
        }
        for y in self.y..=self.bottom() {
            let y = y as i32;
            ring.push((Pos { y, x: left }, Pos { y: 0, x: -1 }));
            ring.push((Pos { y, x: right }, Pos { y: 0, x: 1 }));
        }
        ring
    }
}

/// Per-room population record kept for auditing budgets after the fact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoomAudit {
    pub budget: u32,
    pub planned_etp: u32,
    pub placed_etp: u32,
    pub monsters: u32,
    pub items: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub rect: RoomRect,
    pub center: Pos,
    pub connections: Vec<RoomId>,
    pub designation: RoomDesignation,
    /// Tile held back for the vault reward.
    pub vault_slot: Option<Pos>,
    pub audit: Option<RoomAudit>,
}

impl Room {
    pub fn new(id: RoomId, rect: RoomRect) -> Self {
        Self {
            id,
            rect,
            center: rect.center(),
            connections: Vec::new(),
            designation: RoomDesignation::Normal,
            vault_slot: None,
            audit: None,
        }
    }

    pub fn area(&self) -> u32 {
        self.rect.area()
    }

    pub(crate) fn connect(&mut self, other: RoomId) {
        if other != self.id && !self.connections.contains(&other) {
            self.connections.push(other);
            self.connections.sort();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Map {
    pub width: usize,
    pub height: usize,
    pub depth: u32,
    pub tiles: Vec<Tile>,
    pub rooms: Vec<Room>,
    pub spawn: Pos,
    pub stairs: Pos,
    pub spawn_room: RoomId,
    pub stairs_room: RoomId,
    pub secret_doors: Vec<Pos>,
    pub traps: Vec<Trap>,
    pub entities: Vec<PlacedEntity>,
}

impl Map {
    pub fn tile_at(&self, pos: Pos) -> TileKind {
        if !in_bounds(self.width, self.height, pos) {
            return TileKind::Wall;
        }
        self.tiles[tile_index(self.width, pos)].kind
    }

    pub fn tile(&self, pos: Pos) -> Option<&Tile> {
        in_bounds(self.width, self.height, pos).then(|| &self.tiles[tile_index(self.width, pos)])
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        in_bounds(self.width, self.height, pos)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn count_tiles(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|tile| tile.kind == kind).count()
    }

    pub fn room_containing(&self, pos: Pos) -> Option<&Room> {
        self.rooms.iter().find(|room| room.rect.contains(pos))
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend((self.width as u32).to_le_bytes());
        bytes.extend((self.height as u32).to_le_bytes());
        bytes.extend(self.depth.to_le_bytes());
        for tile in &self.tiles {
            bytes.push(tile.kind.code());
            bytes.push(u8::from(tile.explored));
        }
        push_pos(&mut bytes, self.spawn);
        push_pos(&mut bytes, self.stairs);
        bytes.extend((self.spawn_room.0 as u32).to_le_bytes());
        bytes.extend((self.stairs_room.0 as u32).to_le_bytes());

        bytes.extend((self.rooms.len() as u32).to_le_bytes());
        for room in &self.rooms {
            for value in [room.rect.x, room.rect.y, room.rect.width, room.rect.height] {
                bytes.extend((value as u32).to_le_bytes());
            }
            bytes.push(match room.designation {
                RoomDesignation::Normal => 0,
                RoomDesignation::Vault => 1,
                RoomDesignation::SecretGated => 2,
            });
            bytes.extend((room.connections.len() as u32).to_le_bytes());
            for connection in &room.connections {
                bytes.extend((connection.0 as u32).to_le_bytes());
            }
            if let Some(audit) = room.audit {
                for value in
                    [audit.budget, audit.planned_etp, audit.placed_etp, audit.monsters, audit.items]
                {
                    bytes.extend(value.to_le_bytes());
                }
            }
        }

        bytes.extend((self.secret_doors.len() as u32).to_le_bytes());
        for &pos in &self.secret_doors {
            push_pos(&mut bytes, pos);
        }

        bytes.extend((self.traps.len() as u32).to_le_bytes());
        for trap in &self.traps {
            push_pos(&mut bytes, trap.pos);
            bytes.push(match trap.kind {
                TrapKind::Pit => 0,
                TrapKind::Dart => 1,
                TrapKind::Alarm => 2,
            });
            bytes.push(match trap.state {
                TrapState::Hidden => 0,
                TrapState::Detected => 1,
                TrapState::Disarmed => 2,
            });
        }

        bytes.extend((self.entities.len() as u32).to_le_bytes());
        for entity in &self.entities {
            bytes.extend((entity.species.as_str().len() as u32).to_le_bytes());
            bytes.extend(entity.species.as_str().as_bytes());
            bytes.push(match entity.kind {
                EntityKind::Monster => 0,
                EntityKind::Item => 1,
            });
            push_pos(&mut bytes, entity.pos);
            bytes.extend((entity.room.0 as u32).to_le_bytes());
            bytes.extend(entity.etp.to_le_bytes());
            bytes.push(u8::from(entity.vault_reward));
        }

        bytes
    }

    /// Stable hash of [`Map::canonical_bytes`] for regression comparison.
    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}

fn push_pos(bytes: &mut Vec<u8>, pos: Pos) {
    bytes.extend(pos.y.to_le_bytes());
    bytes.extend(pos.x.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanded_rects_detect_touching_rooms() {
        let left = RoomRect { x: 1, y: 1, width: 4, height: 3 };
        let adjacent = RoomRect { x: 6, y: 1, width: 4, height: 3 };
        let distant = RoomRect { x: 8, y: 1, width: 4, height: 3 };

        assert!(!left.intersects(&adjacent));
        assert!(left.expanded(1).intersects(&adjacent.expanded(1)));
        assert!(!left.expanded(1).intersects(&distant.expanded(1)));
    }

    #[test]
    fn perimeter_skips_corners_and_points_outward() {
        let rect = RoomRect { x: 2, y: 2, width: 3, height: 2 };
        let ring = rect.perimeter();
        assert_eq!(ring.len(), 2 * (3 + 2));
        for (pos, outward) in ring {
            assert!(!rect.contains(pos));
            let inward = Pos { y: pos.y - outward.y, x: pos.x - outward.x };
            assert!(rect.contains(inward), "{pos:?} should border the room");
        }
    }

    #[test]
    fn positions_cover_the_whole_rect() {
        let rect = RoomRect { x: 3, y: 4, width: 5, height: 4 };
        let positions: Vec<_> = rect.positions().collect();
        assert_eq!(positions.len(), rect.area() as usize);
        assert_eq!(positions.first(), Some(&Pos { y: 4, x: 3 }));
        assert_eq!(positions.last(), Some(&Pos { y: 7, x: 7 }));
    }
}
