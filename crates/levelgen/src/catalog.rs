//! Species catalog: the read-only balance data spawn tables are built from.
//!
//! The engine never hardcodes what spawns where. Callers inject a [`Catalog`] through
//! [`crate::GenerationConfig`]; [`Catalog::starter`] is only a default data set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::SpeciesId;

pub mod keys {
    pub const CAVE_RAT: &str = "cave_rat";
    pub const GOBLIN: &str = "goblin";
    pub const FERAL_HOUND: &str = "feral_hound";
    pub const BLOOD_ACOLYTE: &str = "blood_acolyte";
    pub const CORRUPTED_GUARD: &str = "corrupted_guard";
    pub const GARGOYLE: &str = "gargoyle";
    pub const LIVING_ARMOR: &str = "living_armor";
    pub const SHADOW_STALKER: &str = "shadow_stalker";
    pub const ABYSSAL_WARDEN: &str = "abyssal_warden";

    pub const WEAPON_RUSTY_SWORD: &str = "weapon_rusty_sword";
    pub const WEAPON_IRON_MACE: &str = "weapon_iron_mace";
    pub const WEAPON_STEEL_LONGSWORD: &str = "weapon_steel_longsword";
    pub const WEAPON_PHASE_DAGGER: &str = "weapon_phase_dagger";
    pub const WEAPON_BLOOD_AXE: &str = "weapon_blood_axe";

    pub const CONSUMABLE_MINOR_HP_POT: &str = "consumable_minor_hp_pot";
    pub const CONSUMABLE_MAJOR_HP_POT: &str = "consumable_major_hp_pot";
    pub const CONSUMABLE_TELEPORT_RUNE: &str = "consumable_teleport_rune";
    pub const CONSUMABLE_SMOKE_BOMB: &str = "consumable_smoke_bomb";
    pub const CONSUMABLE_HASTE_POTION: &str = "consumable_haste_potion";

    pub const PERK_TOUGHNESS: &str = "perk_toughness";
    pub const PERK_IRON_WILL: &str = "perk_iron_will";
    pub const PERK_SHADOW_STEP: &str = "perk_shadow_step";
}

pub const UNBOUNDED_DEPTH: u32 = u32::MAX;
/// Largest base weight an entry may carry.
pub const MAX_WEIGHT: u32 = 1_000_000;

fn unbounded_depth() -> u32 {
    UNBOUNDED_DEPTH
}

/// One selectable species. Items carry an ETP of zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    pub id: SpeciesId,
    /// Pity category this entry counts toward.
    pub category: String,
    pub weight: u32,
    pub min_depth: u32,
    #[serde(default = "unbounded_depth")]
    pub max_depth: u32,
    /// Bands this entry may appear in; empty means every band.
    #[serde(default)]
    pub bands: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub etp: u32,
    /// Weight change per level past `min_depth`, in percent of base weight.
    #[serde(default)]
    pub depth_growth_percent: i32,
}

impl SpeciesEntry {
    pub fn allows_depth(&self, depth: u32) -> bool {
        (self.min_depth..=self.max_depth).contains(&depth)
    }

    pub fn allows_band(&self, band: &str) -> bool {
        self.bands.is_empty() || self.bands.iter().any(|candidate| candidate == band)
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub monsters: Vec<SpeciesEntry>,
    #[serde(default)]
    pub items: Vec<SpeciesEntry>,
}

impl Catalog {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.monsters.is_empty() {
            return Err(ConfigError::EmptyMonsterCatalog);
        }

        let mut seen = BTreeSet::new();
        for entry in self.monsters.iter().chain(&self.items) {
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::DuplicateSpecies(entry.id.0.clone()));
            }
            let invalid = |reason: &str| ConfigError::InvalidEntry {
                species: entry.id.0.clone(),
                reason: reason.to_string(),
            };
            if entry.id.as_str().is_empty() {
                return Err(invalid("species id is empty"));
            }
            if entry.category.is_empty() {
                return Err(invalid("category is empty"));
            }
            if entry.weight == 0 {
                return Err(invalid("weight must be positive"));
            }
            if entry.weight > MAX_WEIGHT {
                return Err(invalid(&format!("weight must not exceed {MAX_WEIGHT}")));
            }
            if entry.min_depth == 0 || entry.min_depth > entry.max_depth {
                return Err(invalid("depth range must be non-empty and start at 1 or deeper"));
            }
        }

        if let Some(entry) = self.monsters.iter().find(|entry| entry.etp == 0) {
            return Err(ConfigError::InvalidEntry {
                species: entry.id.0.clone(),
                reason: "monster ETP must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn starter() -> Self {
        Self {
            monsters: vec![
                monster(keys::CAVE_RAT, "vermin", 50, (1, 5), 1, -15),
                monster(keys::GOBLIN, "humanoid", 60, (1, 4), 2, -10),
                monster(keys::FERAL_HOUND, "beast", 40, (1, 6), 3, 0),
                monster(keys::BLOOD_ACOLYTE, "humanoid", 30, (1, 8), 4, 5),
                monster(keys::CORRUPTED_GUARD, "humanoid", 30, (2, 10), 5, 5),
                monster(keys::GARGOYLE, "construct", 25, (2, 12), 6, 10),
                monster(keys::LIVING_ARMOR, "construct", 20, (3, 14), 7, 10),
                monster(keys::SHADOW_STALKER, "undead", 15, (4, UNBOUNDED_DEPTH), 8, 10),
                SpeciesEntry {
                    bands: vec!["middle".to_string(), "deep".to_string()],
                    ..monster(keys::ABYSSAL_WARDEN, "demon", 5, (5, UNBOUNDED_DEPTH), 14, 15)
                },
            ],
            items: vec![
                item(keys::WEAPON_RUSTY_SWORD, "weapon", 30, (1, 4), &["loot", "weapon"]),
                item(keys::WEAPON_IRON_MACE, "weapon", 25, (2, 8), &["loot", "weapon"]),
                item(keys::WEAPON_PHASE_DAGGER, "weapon", 15, (3, 10), &["loot", "weapon"]),
                item(
                    keys::WEAPON_STEEL_LONGSWORD,
                    "weapon",
                    10,
                    (3, UNBOUNDED_DEPTH),
                    &["loot", "weapon", "vault"],
                ),
                item(
                    keys::WEAPON_BLOOD_AXE,
                    "weapon",
                    6,
                    (5, UNBOUNDED_DEPTH),
                    &["loot", "weapon", "vault"],
                ),
                item(keys::CONSUMABLE_MINOR_HP_POT, "healing", 50, (1, 6), &["loot", "potion"]),
                item(
                    keys::CONSUMABLE_MAJOR_HP_POT,
                    "healing",
                    20,
                    (3, UNBOUNDED_DEPTH),
                    &["loot", "potion"],
                ),
                item(
                    keys::CONSUMABLE_TELEPORT_RUNE,
                    "utility",
                    15,
                    (1, UNBOUNDED_DEPTH),
                    &["loot"],
                ),
                item(keys::CONSUMABLE_SMOKE_BOMB, "utility", 20, (1, UNBOUNDED_DEPTH), &["loot"]),
                item(
                    keys::CONSUMABLE_HASTE_POTION,
                    "utility",
                    10,
                    (2, UNBOUNDED_DEPTH),
                    &["loot", "potion"],
                ),
                item(keys::PERK_TOUGHNESS, "relic", 4, (1, UNBOUNDED_DEPTH), &["vault"]),
                item(keys::PERK_IRON_WILL, "relic", 4, (1, UNBOUNDED_DEPTH), &["vault"]),
                item(keys::PERK_SHADOW_STEP, "relic", 2, (4, UNBOUNDED_DEPTH), &["vault"]),
            ],
        }
    }
}

fn monster(
    id: &str,
    category: &str,
    weight: u32,
    (min_depth, max_depth): (u32, u32),
    etp: u32,
    depth_growth_percent: i32,
) -> SpeciesEntry {
    SpeciesEntry {
        id: SpeciesId::new(id),
        category: category.to_string(),
        weight,
        min_depth,
        max_depth,
        bands: Vec::new(),
        tags: Vec::new(),
        etp,
        depth_growth_percent,
    }
}

fn item(
    id: &str,
    category: &str,
    weight: u32,
    (min_depth, max_depth): (u32, u32),
    tags: &[&str],
) -> SpeciesEntry {
    SpeciesEntry {
        id: SpeciesId::new(id),
        category: category.to_string(),
        weight,
        min_depth,
        max_depth,
        bands: Vec::new(),
        tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
        etp: 0,
        depth_growth_percent: 0,
    }
}
