//! Per-room threat budgets in ETP.

use crate::config::{Band, BudgetParams};
use crate::mapgen::Room;

pub struct BudgetAllocator<'a> {
    params: &'a BudgetParams,
}

impl<'a> BudgetAllocator<'a> {
    pub fn new(params: &'a BudgetParams) -> Self {
        Self { params }
    }

    /// Threat per floor tile at `depth`, in thousandths of an ETP.
    pub fn per_area_milli(&self, depth: u32, band: &Band) -> u64 {
        let levels_into_band = u64::from(depth.saturating_sub(band.min_depth));
        let scale_percent = 100 + u64::from(self.params.depth_scale_percent) * levels_into_band;
        u64::from(band.threat_per_area_milli) * scale_percent / 100
    }

    pub fn budget(&self, room: &Room, depth: u32, band: &Band, carry_in: Option<u32>) -> u32 {
        self.budget_for_area(room.area(), depth, band, carry_in)
    }

    /// Rounded area budget, floored at the configured minimum, plus any carried budget.
    pub fn budget_for_area(
        &self,
        area: u32,
        depth: u32,
        band: &Band,
        carry_in: Option<u32>,
    ) -> u32 {
        let scaled = (u64::from(area) * self.per_area_milli(depth, band) + 500) / 1_000;
        let base = u32::try_from(scaled).unwrap_or(u32::MAX).max(self.params.min_budget);
        base.saturating_add(carry_in.unwrap_or(0))
    }

    /// Leftover to hand to the next room, if rollover is enabled.
    pub fn carry_out(&self, budget: u32, spent: u32) -> Option<u32> {
        self.params.rollover.then(|| budget.saturating_sub(spent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_bands;
    use crate::mapgen::RoomRect;
    use crate::types::RoomId;

    fn band(threat_per_area_milli: u32) -> Band {
        Band { name: "test".to_string(), min_depth: 1, max_depth: 5, threat_per_area_milli }
    }

    #[test]
    fn area_twenty_at_half_an_etp_per_tile_is_ten() {
        let params = BudgetParams::default();
        let allocator = BudgetAllocator::new(&params);
        let room = Room::new(RoomId(3), RoomRect { x: 2, y: 2, width: 5, height: 4 });
        assert_eq!(allocator.budget(&room, 1, &band(500), None), 10);
    }

    #[test]
    fn deeper_levels_in_a_band_raise_the_rate() {
        let params = BudgetParams { depth_scale_percent: 20, ..Default::default() };
        let allocator = BudgetAllocator::new(&params);
        assert_eq!(allocator.per_area_milli(1, &band(500)), 500);
        assert_eq!(allocator.per_area_milli(3, &band(500)), 700);
        assert_eq!(allocator.budget_for_area(20, 3, &band(500), None), 14);
    }

    #[test]
    fn small_rooms_get_the_minimum_budget() {
        let params = BudgetParams { min_budget: 3, ..Default::default() };
        let allocator = BudgetAllocator::new(&params);
        assert_eq!(allocator.budget_for_area(4, 1, &default_bands()[0], None), 3);
    }

    #[test]
    fn carry_in_is_added_and_rollover_is_opt_in() {
        let params = BudgetParams::default();
        let allocator = BudgetAllocator::new(&params);
        assert_eq!(allocator.budget_for_area(20, 1, &band(500), Some(4)), 14);
        assert_eq!(allocator.carry_out(10, 8), None);

        let rollover = BudgetParams { rollover: true, ..Default::default() };
        assert_eq!(BudgetAllocator::new(&rollover).carry_out(10, 8), Some(2));
    }

    #[test]
    fn rounding_is_half_up() {
        let params = BudgetParams { min_budget: 0, ..Default::default() };
        let allocator = BudgetAllocator::new(&params);
        assert_eq!(allocator.budget_for_area(10, 1, &band(250), None), 3);
        assert_eq!(allocator.budget_for_area(9, 1, &band(250), None), 2);
    }
}
