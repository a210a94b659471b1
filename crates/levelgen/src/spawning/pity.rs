//! Drought correction: per-category counters of rooms since the category last spawned.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::PityRule;

const NEUTRAL_PERCENT: u32 = 100;

/// Weight multipliers for one planning cycle, keyed by category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PityMultipliers {
    percents: BTreeMap<String, u32>,
}

impl PityMultipliers {
    /// Multiplier in percent; categories without a boost read as 100.
    pub fn percent(&self, category: &str) -> u32 {
        self.percents.get(category).copied().unwrap_or(NEUTRAL_PERCENT)
    }

    pub fn is_neutral(&self) -> bool {
        self.percents.values().all(|&percent| percent == NEUTRAL_PERCENT)
    }

    pub fn boosted(&self) -> impl Iterator<Item = (&str, u32)> {
        self.percents
            .iter()
            .filter(|&(_, &percent)| percent != NEUTRAL_PERCENT)
            .map(|(category, &percent)| (category.as_str(), percent))
    }
}

/// Pity counters for one run. Never shared between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PityState {
    counters: BTreeMap<String, u32>,
    rules: BTreeMap<String, PityRule>,
}

impl PityState {
    pub fn new(rules: BTreeMap<String, PityRule>) -> Self {
        let counters = rules.keys().map(|category| (category.clone(), 0)).collect();
        Self { counters, rules }
    }

    /// Counts one more dry room for `category` and returns its weight multiplier.
    ///
    /// Untracked categories are never boosted.
    pub fn update(&mut self, category: &str) -> u32 {
        let (Some(rule), Some(counter)) =
            (self.rules.get(category), self.counters.get_mut(category))
        else {
            return NEUTRAL_PERCENT;
        };
        *counter = counter.saturating_add(1);
        if *counter > rule.threshold { rule.multiplier_percent } else { NEUTRAL_PERCENT }
    }

    pub fn record_success(&mut self, category: &str) {
        if let Some(counter) = self.counters.get_mut(category) {
            *counter = 0;
        }
    }

    /// Advances every tracked category by one room.
    pub fn begin_cycle(&mut self) -> PityMultipliers {
        let categories: Vec<String> = self.rules.keys().cloned().collect();
        let percents = categories
            .into_iter()
            .map(|category| {
                let percent = self.update(&category);
                (category, percent)
            })
            .collect();
        PityMultipliers { percents }
    }

    pub fn counter(&self, category: &str) -> u32 {
        self.counters.get(category).copied().unwrap_or(0)
    }
}
