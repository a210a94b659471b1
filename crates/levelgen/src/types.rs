use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    /// Orthogonal neighbors in north, east, south, west order.
    pub fn neighbors(self) -> [Pos; 4] {
        [
            Pos { y: self.y - 1, x: self.x },
            Pos { y: self.y, x: self.x + 1 },
            Pos { y: self.y + 1, x: self.x },
            Pos { y: self.y, x: self.x - 1 },
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    Door,
    SecretDoor,
    UpStairs,
    DownStairs,
}

impl TileKind {
    /// Passable before any secret has been discovered.
    pub fn is_walkable(self) -> bool {
        matches!(self, Self::Floor | Self::Door | Self::UpStairs | Self::DownStairs)
    }

    /// Passable once every secret door is open.
    pub fn is_passable_when_open(self) -> bool {
        self.is_walkable() || self == Self::SecretDoor
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Wall => 0,
            Self::Floor => 1,
            Self::Door => 2,
            Self::SecretDoor => 3,
            Self::UpStairs => 4,
            Self::DownStairs => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: Pos,
    pub kind: TileKind,
    /// Owned by gameplay; generation always leaves it unset.
    pub explored: bool,
}

impl Tile {
    pub fn wall(pos: Pos) -> Self {
        Self { pos, kind: TileKind::Wall, explored: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub usize);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub String);

impl SpeciesId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Monster,
    Item,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomDesignation {
    Normal,
    Vault,
    SecretGated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    Pit,
    Dart,
    Alarm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapState {
    Hidden,
    Detected,
    Disarmed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    pub pos: Pos,
    pub kind: TrapKind,
    pub state: TrapState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub species: SpeciesId,
    pub kind: EntityKind,
    pub pos: Pos,
    pub room: RoomId,
    pub etp: u32,
    pub vault_reward: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementFailure {
    pub species: SpeciesId,
    pub kind: EntityKind,
    pub room: RoomId,
    pub attempts: u32,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not place {:?} '{}' in {} after {} attempts",
            self.kind, self.species, self.room, self.attempts
        )
    }
}
