//! Fixed-order tick pipeline.

use crate::updater::{
    FoodUpdater, KineticsUpdater, LifecycleUpdater, NutritionUpdater, PositionUpdater,
    StageCounts,
};
use crate::{SimulationError, Tick, World};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

/// Summary emitted after every tick and retained in the history ring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TickSummary {
    pub tick: Tick,
    pub cell_count: usize,
    pub food_count: usize,
    pub splits: usize,
    pub deaths: usize,
    pub food_spawned: usize,
    pub food_expired: usize,
    pub food_eaten: usize,
    pub total_cell_mass: f64,
}

/// Owns a world and the updaters that advance it.
///
/// Each tick runs: index refresh and buffer seeding, kinetics resolve and commit,
/// position integration with index rebuild, lifecycle, nutrition, food.
pub struct Simulation {
    world: World,
    tick: Tick,
    kinetics: KineticsUpdater,
    position: PositionUpdater,
    lifecycle: LifecycleUpdater,
    nutrition: NutritionUpdater,
    food: FoodUpdater,
    history: VecDeque<TickSummary>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("world", &self.world)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl Simulation {
    #[must_use]
    pub fn new(world: World) -> Self {
        let history_capacity = world.config().history_capacity;
        Self {
            world,
            tick: Tick::zero(),
            kinetics: KineticsUpdater::new(),
            position: PositionUpdater::new(),
            lifecycle: LifecycleUpdater::new(),
            nutrition: NutritionUpdater::new(),
            food: FoodUpdater::new(),
            history: VecDeque::with_capacity(history_capacity),
        }
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for tools. Must not be used while a tick is running,
    /// which the borrow checker already guarantees.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Iterate over retained tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    #[must_use]
    pub fn last_summary(&self) -> Option<&TickSummary> {
        self.history.back()
    }

    fn stage_reset(&mut self) -> Result<(), SimulationError> {
        self.world.refresh_indices()?;
        self.kinetics.reset(&self.world);
        Ok(())
    }

    fn stage_kinetics(&mut self, dt: f64) {
        self.kinetics.resolve(&self.world, dt);
        self.kinetics.commit(&mut self.world);
    }

    fn stage_position(&mut self, dt: f64, next_tick: Tick) -> Result<(), SimulationError> {
        self.position.update(&mut self.world, dt, next_tick)
    }

    fn stage_lifecycle(&mut self, dt: f64, counts: &mut StageCounts) {
        self.lifecycle.update(&mut self.world, dt, counts);
    }

    fn stage_nutrition(&mut self, dt: f64, counts: &mut StageCounts) {
        self.nutrition.update(&mut self.world, dt, counts);
    }

    fn stage_food(&mut self, dt: f64, counts: &mut StageCounts) {
        self.food.update(&mut self.world, dt, counts);
    }

    fn stage_history(&mut self, counts: StageCounts) -> TickSummary {
        let summary = TickSummary {
            tick: self.tick,
            cell_count: self.world.cells().len(),
            food_count: self.world.food().len(),
            splits: counts.splits,
            deaths: counts.deaths(),
            food_spawned: counts.food_spawned,
            food_expired: counts.food_expired,
            food_eaten: counts.food_eaten,
            total_cell_mass: self.world.cells().values().map(|cell| cell.mass).sum(),
        };
        let capacity = self.world.config().history_capacity;
        while self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary.clone());
        summary
    }

    /// Advance the world by `dt` seconds of simulated time.
    pub fn tick(&mut self, dt: f64) -> Result<TickSummary, SimulationError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimulationError::InvalidTickLength(dt));
        }
        let next_tick = self.tick.next();
        let mut counts = StageCounts::default();

        self.stage_reset()?;
        self.stage_kinetics(dt);
        self.stage_position(dt, next_tick)?;
        self.stage_lifecycle(dt, &mut counts);
        self.stage_nutrition(dt, &mut counts);
        self.stage_food(dt, &mut counts);

        self.tick = next_tick;
        let summary = self.stage_history(counts);
        debug!(
            tick = summary.tick.0,
            cells = summary.cell_count,
            food = summary.food_count,
            splits = summary.splits,
            deaths = summary.deaths,
            mass = summary.total_cell_mass,
            "tick complete"
        );
        Ok(summary)
    }
}
