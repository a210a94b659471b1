//! Weighted chance tables filtered from the catalog by depth, band, and tags.
//!
//! Weights are integers in hundredths so that every platform draws the same entries.

use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::catalog::SpeciesEntry;
use crate::config::Band;
use crate::mapgen::seed::roll_below;
use crate::types::SpeciesId;

use super::pity::PityMultipliers;

/// Depth curves never shrink an eligible entry below this share of its base weight.
const MIN_CURVE_PERCENT: i64 = 10;
/// Depth curves stop growing at this share of the base weight.
const MAX_CURVE_PERCENT: i64 = 100_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagFilter {
    /// Keep every entry.
    None,
    /// Keep entries carrying at least one of the tags.
    Any(Vec<String>),
}

impl TagFilter {
    /// An empty tag list filters nothing.
    pub fn any(tags: &[String]) -> Self {
        if tags.is_empty() { Self::None } else { Self::Any(tags.to_vec()) }
    }

    pub fn accepts(&self, entry: &SpeciesEntry) -> bool {
        match self {
            Self::None => true,
            Self::Any(tags) => entry.has_any_tag(tags),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChanceRow {
    pub species: SpeciesId,
    pub category: String,
    pub etp: u32,
    /// Effective weight in hundredths of the base weight unit.
    pub weight: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChanceTable {
    rows: Vec<ChanceRow>,
}

impl ChanceTable {
    pub fn build(entries: &[SpeciesEntry], depth: u32, band: &Band, filter: &TagFilter) -> Self {
        let mut rows: Vec<ChanceRow> = entries
            .iter()
            .filter(|entry| entry.allows_depth(depth) && entry.allows_band(&band.name))
            .filter(|entry| filter.accepts(entry))
            .map(|entry| ChanceRow {
                species: entry.id.clone(),
                category: entry.category.clone(),
                etp: entry.etp,
                weight: u64::from(entry.weight).saturating_mul(depth_curve_percent(entry, depth)),
            })
            .collect();
        rows.sort_by(|left, right| left.species.cmp(&right.species));
        Self { rows }
    }

    /// Copy with each category's weights scaled by its pity multiplier.
    pub fn with_pity(&self, multipliers: &PityMultipliers) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| ChanceRow {
                weight: row.weight.saturating_mul(u64::from(multipliers.percent(&row.category)))
                    / 100,
                ..row.clone()
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ChanceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.rows.iter().fold(0, |total, row| total.saturating_add(row.weight))
    }

    pub fn weight_of(&self, species: &str) -> Option<u64> {
        self.rows.iter().find(|row| row.species.as_str() == species).map(|row| row.weight)
    }

    /// Weighted draw over the whole table.
    pub(crate) fn draw(&self, rng: &mut ChaCha8Rng) -> Option<&ChanceRow> {
        let pool: Vec<usize> = (0..self.rows.len()).collect();
        draw_index(&self.rows, &pool, rng).map(|slot| &self.rows[pool[slot]])
    }
}

/// Curve in percent: `100 + growth * (depth - min_depth)`, clamped to `[10, 100_000]`.
pub fn depth_curve_percent(entry: &SpeciesEntry, depth: u32) -> u64 {
    let levels_past_min = i64::from(depth.saturating_sub(entry.min_depth));
    let curve = i64::from(entry.depth_growth_percent)
        .saturating_mul(levels_past_min)
        .saturating_add(100);
    curve.clamp(MIN_CURVE_PERCENT, MAX_CURVE_PERCENT) as u64
}

/// Picks a slot of `pool` (indices into `rows`), walking rows in table order.
pub(crate) fn draw_index(
    rows: &[ChanceRow],
    pool: &[usize],
    rng: &mut ChaCha8Rng,
) -> Option<usize> {
    let total = pool.iter().fold(0_u64, |total, &index| total.saturating_add(rows[index].weight));
    if total == 0 {
        return None;
    }
    let mut roll = roll_below(rng, total);
    for (slot, &index) in pool.iter().enumerate() {
        let weight = rows[index].weight;
        if roll < weight {
            return Some(slot);
        }
        roll -= weight;
    }
    None
}
