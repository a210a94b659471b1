//! Procedural map generation split into layout, features, and the builder that composes them.

pub mod model;

mod builder;
mod features;
pub(crate) mod grid;
mod layout;
pub(crate) mod seed;

pub use builder::MapBuilder;
pub use model::{Map, Room, RoomAudit, RoomRect};
pub use seed::{SeedChoice, resolve_seed};
