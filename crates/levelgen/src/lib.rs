//! Procedural dungeon level generation with budgeted, pity-corrected spawning.
//!
//! [`generate`] is the whole pipeline: carve rooms and corridors, gate on reachability,
//! plan and place monsters and items per room, then check invariants and summarize the
//! level in a [`LevelReport`]. Every roll comes from a seeded [`GenerationContext`], so the
//! same seed, depth, and config always produce the same level.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod invariants;
pub mod mapgen;
pub mod pipeline;
pub mod reachability;
pub mod report;
pub mod spawning;
pub mod types;

pub use batch::{generate_batch, generate_run};
pub use catalog::{Catalog, SpeciesEntry};
pub use config::GenerationConfig;
pub use context::GenerationContext;
pub use error::{ConfigError, GenerationError, GenerationFailure};
pub use invariants::{InvariantChecker, InvariantReport, Violation, Warning};
pub use mapgen::{Map, MapBuilder, Room, SeedChoice, resolve_seed};
pub use pipeline::{Level, PopulationOutcome, generate, generate_with_context, populate};
pub use reachability::ReachabilityReport;
pub use report::{LevelReport, RoomReport};
pub use types::*;
