//! Grid and tile-space primitives shared by carving, reachability, and placement.

use crate::types::{Pos, Tile, TileKind};

pub(crate) fn in_bounds(width: usize, height: usize, pos: Pos) -> bool {
    pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < width && (pos.y as usize) < height
}

pub(crate) fn tile_index(width: usize, pos: Pos) -> usize {
    (pos.y as usize) * width + (pos.x as usize)
}

/// Walled grid with every tile's position filled in.
pub(crate) fn wall_grid(width: usize, height: usize) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            tiles.push(Tile::wall(Pos { y: y as i32, x: x as i32 }));
        }
    }
    tiles
}

/// Out-of-bounds positions read as wall.
pub(crate) fn kind_at(tiles: &[Tile], width: usize, height: usize, pos: Pos) -> TileKind {
    if !in_bounds(width, height, pos) {
        return TileKind::Wall;
    }
    tiles[tile_index(width, pos)].kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_grid_records_row_major_positions() {
        let tiles = wall_grid(5, 3);
        assert_eq!(tiles.len(), 15);
        assert_eq!(tiles[tile_index(5, Pos { y: 2, x: 4 })].pos, Pos { y: 2, x: 4 });
        assert!(tiles.iter().all(|tile| tile.kind == TileKind::Wall && !tile.explored));
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let mut tiles = wall_grid(4, 4);
        tiles[tile_index(4, Pos { y: 1, x: 1 })].kind = TileKind::Floor;
        assert_eq!(kind_at(&tiles, 4, 4, Pos { y: 1, x: 1 }), TileKind::Floor);
        assert_eq!(kind_at(&tiles, 4, 4, Pos { y: -1, x: 1 }), TileKind::Wall);
        assert_eq!(kind_at(&tiles, 4, 4, Pos { y: 1, x: 4 }), TileKind::Wall);
    }
}
