//! Spawn balancing: chance tables, room budgets, pity, planning, and placement.

pub mod budget;
pub mod chance;
pub mod pity;
pub mod placer;
pub mod planner;

pub use budget::BudgetAllocator;
pub use chance::{ChanceRow, ChanceTable, TagFilter, depth_curve_percent};
pub use pity::{PityMultipliers, PityState};
pub use placer::{Occupancy, PlacementOutcome, Placer};
pub use planner::{PlannedSpawn, RoomSpawnPlan, SpawnPlanner};
