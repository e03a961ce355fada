//! Mass exchange across connections, metabolism, phagocyte feeding and starvation.

use super::StageCounts;
use crate::geometry::clamp;
use crate::{CellType, ObjectId, ObjectKind, World};
use std::collections::BTreeMap;
use tracing::trace;

/// Fraction of its own mass a cell burns per second.
const METABOLIC_RATE: f64 = 0.0075;

/// Mass a cell of `mass` burns over `dt` seconds.
#[must_use]
pub fn metabolic_cost(mass: f64, dt: f64) -> f64 {
    METABOLIC_RATE * mass * dt
}

/// Balances mass between connected cells, feeds phagocytes and starves light cells.
///
/// All transfers land in a pending-mass table first, so every pair reads the masses
/// the cells had when the tick reached this stage.
#[derive(Debug, Default)]
pub struct NutritionUpdater {
    pending: BTreeMap<ObjectId, f64>,
}

impl NutritionUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, world: &mut World, dt: f64, counts: &mut StageCounts) {
        self.pending.clear();
        self.pending
            .extend(world.cells().iter().map(|(&id, cell)| (id, cell.mass)));

        self.exchange(world, dt);
        self.feed(world, dt, counts);

        for (id, mass) in &self.pending {
            if let Some(cell) = world.cells.get_mut(id) {
                cell.mass = *mass;
            }
        }
        world.mark_indices_stale();

        let min_mass = world.config().min_cell_mass;
        let starving: Vec<ObjectId> = world
            .cells()
            .iter()
            .filter(|(_, cell)| cell.mass < min_mass)
            .map(|(&id, _)| id)
            .collect();
        for id in starving {
            trace!(cell = %id, "cell starved");
            world.convert_to_food(id);
            counts.starved += 1;
        }
    }

    /// Room left for a cell to gain mass this tick.
    fn headroom(max_cell_mass: f64, max_gain: f64, mass: f64, pending: f64) -> f64 {
        (max_cell_mass - pending).min(max_gain - (pending - mass))
    }

    fn exchange(&mut self, world: &World, dt: f64) {
        let config = world.config();
        let max_gain = config.max_nutrition_gain_speed * dt;
        if max_gain <= 0.0 {
            return;
        }
        for (&id, cell) in world.cells() {
            for &partner_id in cell.connections.keys() {
                if partner_id <= id {
                    continue;
                }
                let Some(partner) = world.cell(partner_id) else {
                    continue;
                };
                if cell.mass <= 0.0 || partner.mass <= 0.0 {
                    continue;
                }
                let pending_cell = self.pending.get(&id).copied().unwrap_or(cell.mass);
                let pending_partner = self
                    .pending
                    .get(&partner_id)
                    .copied()
                    .unwrap_or(partner.mass);

                let ratio = cell.mass / partner.mass;
                let priority = cell.genome.root().nutrition_priority;
                let partner_priority = partner.genome.root().nutrition_priority;
                let target = if priority + partner_priority != 0.0 {
                    priority / partner_priority
                } else {
                    1.0
                };
                let factor = if target.is_finite() {
                    (target - ratio) / (target + ratio)
                } else {
                    f64::INFINITY
                };
                if factor.is_nan() {
                    continue;
                }

                let headroom = Self::headroom(config.max_cell_mass, max_gain, cell.mass, pending_cell);
                let partner_headroom =
                    Self::headroom(config.max_cell_mass, max_gain, partner.mass, pending_partner);
                let amount = clamp(
                    clamp(factor * max_gain, -pending_cell, pending_partner),
                    -partner_headroom,
                    headroom,
                );

                self.pending.insert(id, pending_cell + amount);
                self.pending.insert(partner_id, pending_partner - amount);
            }
        }
    }

    fn feed(&mut self, world: &mut World, dt: f64, counts: &mut StageCounts) {
        let max_gain = world.config().max_nutrition_gain_speed * dt;
        let max_cell_mass = world.config().max_cell_mass;
        let ids: Vec<ObjectId> = world.cells().keys().copied().collect();
        for id in ids {
            let Some(cell) = world.cell(id) else {
                continue;
            };
            let pending = self.pending.entry(id).or_insert(cell.mass);
            *pending -= metabolic_cost(cell.mass, dt);
            if cell.genome.root().cell_type != CellType::Phagocyte {
                continue;
            }

            let mut remaining = Self::headroom(max_cell_mass, max_gain, cell.mass, *pending);
            let (center, radius) = (cell.center, cell.radius());
            for food_id in world.point_cast_in(ObjectKind::Food, center, radius) {
                let Some(food) = world.food.get_mut(&food_id) else {
                    continue;
                };
                let eaten = clamp(food.mass, 0.0, remaining);
                if eaten <= 0.0 {
                    continue;
                }
                food.mass -= eaten;
                remaining -= eaten;
                *pending += eaten;
                counts.food_eaten += 1;
            }
        }
    }
}
