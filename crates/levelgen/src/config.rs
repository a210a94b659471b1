//! Generation configuration: map shape, bands, budgets, pity rules, and the catalog.
//!
//! Every section has defaults, so a TOML document only needs to name what it changes.
//! [`GenerationConfig::validate`] runs before any generation work starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, UNBOUNDED_DEPTH};
use crate::error::{ConfigError, ConfigResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u32,
    pub max: u32,
}

impl SizeRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn check(self, field: &'static str) -> ConfigResult<()> {
        if self.min > self.max {
            return Err(ConfigError::InvalidParam {
                field,
                reason: format!("min {} exceeds max {}", self.min, self.max),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorStyle {
    HorizontalFirst,
    VerticalFirst,
    #[default]
    LeastCrossing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapParams {
    pub width: usize,
    pub height: usize,
    pub room_count: SizeRange,
    pub room_width: SizeRange,
    pub room_height: SizeRange,
    pub max_attempts: u32,
    /// Minimum wall gap kept around every room when testing overlap.
    pub room_margin: usize,
    pub corridor_style: CorridorStyle,
    pub secret_room_chance_percent: u32,
    pub max_secret_rooms: usize,
    pub vault_chance_percent: u32,
    pub max_vaults: usize,
    pub traps: SizeRange,
    /// Share of walkable tiles that must stay reachable with every secret door closed.
    pub min_closed_coverage_percent: u32,
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            width: 80,
            height: 45,
            room_count: SizeRange::new(6, 10),
            room_width: SizeRange::new(4, 10),
            room_height: SizeRange::new(4, 8),
            max_attempts: 200,
            room_margin: 1,
            corridor_style: CorridorStyle::LeastCrossing,
            secret_room_chance_percent: 35,
            max_secret_rooms: 1,
            vault_chance_percent: 30,
            max_vaults: 1,
            traps: SizeRange::new(1, 3),
            min_closed_coverage_percent: 95,
        }
    }
}

impl MapParams {
    pub fn validate(&self) -> ConfigResult<()> {
        self.room_count.check("map.room_count")?;
        self.room_width.check("map.room_width")?;
        self.room_height.check("map.room_height")?;
        self.traps.check("map.traps")?;

        let invalid = |reason: String| Err(ConfigError::InvalidMapParams(reason));
        if self.room_count.min == 0 {
            return invalid("at least one room is required".to_string());
        }
        if self.room_width.min < 3 || self.room_height.min < 3 {
            return invalid("rooms must be at least 3x3".to_string());
        }
        if self.room_width.max as usize + 2 >= self.width
            || self.room_height.max as usize + 2 >= self.height
        {
            return invalid(format!(
                "largest room {}x{} does not fit a {}x{} map",
                self.room_width.max, self.room_height.max, self.width, self.height
            ));
        }
        if self.room_margin == 0 {
            return invalid("room margin must be at least 1".to_string());
        }
        if self.max_attempts == 0 {
            return invalid("max attempts must be positive".to_string());
        }
        if self.secret_room_chance_percent > 100 || self.vault_chance_percent > 100 {
            return invalid("chances are percentages in 0..=100".to_string());
        }
        if self.min_closed_coverage_percent > 100 {
            return invalid("closed coverage floor is a percentage in 0..=100".to_string());
        }
        Ok(())
    }
}

fn unbounded_depth() -> u32 {
    UNBOUNDED_DEPTH
}

/// A difficulty tier grouping a contiguous depth range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub min_depth: u32,
    #[serde(default = "unbounded_depth")]
    pub max_depth: u32,
    /// ETP per floor tile at the band's first depth, in thousandths.
    pub threat_per_area_milli: u32,
}

impl Band {
    pub fn contains(&self, depth: u32) -> bool {
        (self.min_depth..=self.max_depth).contains(&depth)
    }
}

pub fn default_bands() -> Vec<Band> {
    vec![
        Band {
            name: "shallow".to_string(),
            min_depth: 1,
            max_depth: 3,
            threat_per_area_milli: 250,
        },
        Band { name: "middle".to_string(), min_depth: 4, max_depth: 6, threat_per_area_milli: 350 },
        Band {
            name: "deep".to_string(),
            min_depth: 7,
            max_depth: UNBOUNDED_DEPTH,
            threat_per_area_milli: 450,
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetParams {
    pub min_budget: u32,
    /// Per-area threat growth for each level past the band's first depth, in percent.
    pub depth_scale_percent: u32,
    /// Carry unspent budget into the next planned room.
    pub rollover: bool,
    pub max_monsters_per_room: u32,
}

impl Default for BudgetParams {
    fn default() -> Self {
        Self { min_budget: 2, depth_scale_percent: 10, rollover: false, max_monsters_per_room: 6 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemParams {
    pub per_room: SizeRange,
    /// Ordinary room loot must carry one of these tags; empty allows every item.
    pub loot_tags: Vec<String>,
    pub vault_reward_tag: String,
}

impl Default for ItemParams {
    fn default() -> Self {
        Self {
            per_room: SizeRange::new(0, 2),
            loot_tags: vec!["loot".to_string()],
            vault_reward_tag: "vault".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PityRule {
    /// Dry rooms tolerated before the boost kicks in.
    pub threshold: u32,
    /// Weight multiplier once the threshold is exceeded, in percent.
    pub multiplier_percent: u32,
}

/// Strongest boost a pity rule may apply, in percent.
pub const MAX_PITY_MULTIPLIER_PERCENT: u32 = 10_000;

pub fn default_pity_rules() -> BTreeMap<String, PityRule> {
    BTreeMap::from([
        ("healing".to_string(), PityRule { threshold: 3, multiplier_percent: 200 }),
        ("weapon".to_string(), PityRule { threshold: 4, multiplier_percent: 150 }),
        ("undead".to_string(), PityRule { threshold: 5, multiplier_percent: 200 }),
    ])
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    pub attempts_per_entity: u32,
    pub plan_spawn_room: bool,
    pub plan_stairs_room: bool,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self { attempts_per_entity: 32, plan_spawn_room: false, plan_stairs_room: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvariantParams {
    pub min_walkable_percent: u32,
    pub max_walkable_percent: u32,
    /// Monsters per hundred room tiles before a density warning.
    pub max_monster_density_percent: u32,
}

impl Default for InvariantParams {
    fn default() -> Self {
        Self { min_walkable_percent: 5, max_walkable_percent: 60, max_monster_density_percent: 25 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub map: MapParams,
    pub bands: Vec<Band>,
    pub budget: BudgetParams,
    pub items: ItemParams,
    pub pity: BTreeMap<String, PityRule>,
    pub placement: PlacementParams,
    pub invariants: InvariantParams,
    pub catalog: Catalog,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            map: MapParams::default(),
            bands: default_bands(),
            budget: BudgetParams::default(),
            items: ItemParams::default(),
            pity: default_pity_rules(),
            placement: PlacementParams::default(),
            invariants: InvariantParams::default(),
            catalog: Catalog::starter(),
        }
    }
}

impl GenerationConfig {
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        toml::from_str(source).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let source = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    pub fn band_for_depth(&self, depth: u32) -> ConfigResult<&Band> {
        self.bands
            .iter()
            .find(|band| band.contains(depth))
            .ok_or(ConfigError::NoBandForDepth(depth))
    }

    /// Checks everything a generation call at `depth` depends on.
    pub fn validate(&self, depth: u32) -> ConfigResult<()> {
        if depth == 0 {
            return Err(ConfigError::InvalidDepth(depth));
        }
        self.map.validate()?;
        self.validate_bands()?;
        self.band_for_depth(depth)?;
        self.catalog.validate()?;
        self.items.per_room.check("items.per_room")?;

        for (category, rule) in &self.pity {
            if rule.multiplier_percent < 100 {
                return Err(ConfigError::InvalidPityRule {
                    category: category.clone(),
                    reason: format!(
                        "multiplier {}% would suppress the category",
                        rule.multiplier_percent
                    ),
                });
            }
            if rule.multiplier_percent > MAX_PITY_MULTIPLIER_PERCENT {
                return Err(ConfigError::InvalidPityRule {
                    category: category.clone(),
                    reason: format!(
                        "multiplier {}% exceeds {MAX_PITY_MULTIPLIER_PERCENT}%",
                        rule.multiplier_percent
                    ),
                });
            }
        }

        if self.placement.attempts_per_entity == 0 {
            return Err(ConfigError::InvalidParam {
                field: "placement.attempts_per_entity",
                reason: "must be positive".to_string(),
            });
        }
        if self.budget.max_monsters_per_room == 0 {
            return Err(ConfigError::InvalidParam {
                field: "budget.max_monsters_per_room",
                reason: "must be positive".to_string(),
            });
        }
        if self.invariants.min_walkable_percent > self.invariants.max_walkable_percent {
            return Err(ConfigError::InvalidParam {
                field: "invariants.min_walkable_percent",
                reason: "exceeds max_walkable_percent".to_string(),
            });
        }
        Ok(())
    }

    fn validate_bands(&self) -> ConfigResult<()> {
        for (index, band) in self.bands.iter().enumerate() {
            let invalid = |reason: &str| ConfigError::InvalidBand {
                band: band.name.clone(),
                reason: reason.to_string(),
            };
            if band.name.is_empty() {
                return Err(invalid("name is empty"));
            }
            if band.min_depth == 0 || band.min_depth > band.max_depth {
                return Err(invalid("depth range must be non-empty and start at 1 or deeper"));
            }
            if band.threat_per_area_milli == 0 {
                return Err(invalid("threat per area must be positive"));
            }
            let overlaps = self.bands[..index].iter().any(|earlier| {
                earlier.min_depth <= band.max_depth && band.min_depth <= earlier.max_depth
            });
            if overlaps {
                return Err(invalid("depth range overlaps an earlier band"));
            }
        }
        Ok(())
    }
}
