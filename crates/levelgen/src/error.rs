//! Error taxonomy for configuration loading and level generation.
//!
//! Recoverable placement problems and invariant findings are not errors; they are
//! collected into the level report instead (see `invariants`).

use std::path::PathBuf;

use thiserror::Error;

/// Bad or missing balance data. Generation never starts when one of these is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("depth must be at least 1, got {0}")]
    InvalidDepth(u32),

    #[error("invalid map parameters: {0}")]
    InvalidMapParams(String),

    #[error("no band covers depth {0}")]
    NoBandForDepth(u32),

    #[error("invalid band '{band}': {reason}")]
    InvalidBand { band: String, reason: String },

    #[error("catalog has no monster entries")]
    EmptyMonsterCatalog,

    #[error("duplicate species id '{0}' in catalog")]
    DuplicateSpecies(String),

    #[error("invalid catalog entry '{species}': {reason}")]
    InvalidEntry { species: String, reason: String },

    #[error("invalid pity rule for category '{category}': {reason}")]
    InvalidPityRule { category: String, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidParam { field: &'static str, reason: String },
}

/// Room placement ran out of attempts before reaching the minimum room count.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "room placement placed {placed} of at least {required} rooms after {attempts} attempts"
)]
pub struct GenerationFailure {
    pub placed: usize,
    pub required: usize,
    pub attempts: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("level generation failed for seed {seed} at depth {depth}: {failure}")]
    Failure { seed: u64, depth: u32, failure: GenerationFailure },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
