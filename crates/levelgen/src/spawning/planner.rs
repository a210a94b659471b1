//! Budgeted per-room spawn plans.
//!
//! Monsters are drawn by weight until the budget or the per-room cap runs out. An entry
//! that no longer fits is dropped from the room's pool, so cheaper entries keep their turn.

use serde::Serialize;
use tracing::trace;

use crate::config::{BudgetParams, ItemParams};
use crate::context::GenerationContext;
use crate::mapgen::Room;
use crate::mapgen::seed::roll_u32;
use crate::types::{RoomDesignation, RoomId, SpeciesId};

use super::chance::{ChanceRow, ChanceTable, draw_index};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedSpawn {
    pub species: SpeciesId,
    pub category: String,
    pub count: u32,
    /// Unit cost; zero for items.
    pub etp: u32,
}

impl PlannedSpawn {
    fn from_row(row: &ChanceRow) -> Self {
        Self {
            species: row.species.clone(),
            category: row.category.clone(),
            count: 1,
            etp: row.etp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoomSpawnPlan {
    pub room: RoomId,
    pub budget: u32,
    pub monsters: Vec<PlannedSpawn>,
    pub items: Vec<PlannedSpawn>,
    pub vault_reward: Option<PlannedSpawn>,
}

impl RoomSpawnPlan {
    pub fn empty(room: RoomId, budget: u32) -> Self {
        Self { room, budget, monsters: Vec::new(), items: Vec::new(), vault_reward: None }
    }

    pub fn planned_etp(&self) -> u32 {
        self.monsters.iter().map(|spawn| spawn.count * spawn.etp).sum()
    }

    pub fn monster_count(&self) -> u32 {
        self.monsters.iter().map(|spawn| spawn.count).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|spawn| spawn.count).sum::<u32>()
            + u32::from(self.vault_reward.is_some())
    }
}

pub struct SpawnPlanner<'a> {
    max_monsters_per_room: u32,
    items: &'a ItemParams,
}

impl<'a> SpawnPlanner<'a> {
    pub fn new(budget: &BudgetParams, items: &'a ItemParams) -> Self {
        Self { max_monsters_per_room: budget.max_monsters_per_room, items }
    }

    /// Monster plan for `room`; `table` should already carry this cycle's pity weights.
    pub fn plan(
        &self,
        room: &Room,
        table: &ChanceTable,
        budget: u32,
        context: &mut GenerationContext,
    ) -> RoomSpawnPlan {
        let mut plan = RoomSpawnPlan::empty(room.id, budget);
        let rows = table.rows();
        let mut pool: Vec<usize> =
            (0..rows.len()).filter(|&index| rows[index].weight > 0).collect();
        let mut remaining = budget;
        let mut placed = 0_u32;

        while placed < self.max_monsters_per_room {
            let Some(slot) = draw_index(rows, &pool, &mut context.rng) else {
                break;
            };
            let row = &rows[pool[slot]];
            if row.etp > remaining {
                trace!(room = %room.id, species = %row.species, remaining, "entry no longer fits");
                pool.remove(slot);
                continue;
            }

            remaining -= row.etp;
            placed += 1;
            match plan.monsters.iter_mut().find(|spawn| spawn.species == row.species) {
                Some(spawn) => spawn.count += 1,
                None => plan.monsters.push(PlannedSpawn::from_row(row)),
            }
            context.pity.record_success(&row.category);
        }

        plan
    }

    /// Adds loot drawn with replacement, plus one reward when the room is a vault.
    pub fn plan_items(
        &self,
        plan: &mut RoomSpawnPlan,
        room: &Room,
        loot: &ChanceTable,
        rewards: &ChanceTable,
        context: &mut GenerationContext,
    ) {
        let count = roll_u32(&mut context.rng, self.items.per_room.min, self.items.per_room.max);
        for _ in 0..count {
            let Some(row) = loot.draw(&mut context.rng) else {
                break;
            };
            match plan.items.iter_mut().find(|spawn| spawn.species == row.species) {
                Some(spawn) => spawn.count += 1,
                None => plan.items.push(PlannedSpawn::from_row(row)),
            }
            context.pity.record_success(&row.category);
        }

        if room.designation == RoomDesignation::Vault
            && let Some(row) = rewards.draw(&mut context.rng)
        {
            plan.vault_reward = Some(PlannedSpawn::from_row(row));
            context.pity.record_success(&row.category);
        }
    }
}
