//! Per-tick updaters. [`crate::Simulation`] runs them in a fixed order.

mod food;
mod kinetics;
mod lifecycle;
mod nutrition;
mod position;

pub use food::FoodUpdater;
pub use kinetics::{KineticsUpdater, Motion, apply_impulse};
pub use lifecycle::LifecycleUpdater;
pub use nutrition::{NutritionUpdater, metabolic_cost};
pub use position::PositionUpdater;

/// Tallies gathered by the updaters while one tick runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub splits: usize,
    /// Flagellocytes whose tail was blocked by a connection.
    pub blocked: usize,
    pub starved: usize,
    pub food_spawned: usize,
    pub food_expired: usize,
    /// Food items a phagocyte fed from.
    pub food_eaten: usize,
}

impl StageCounts {
    /// Cells that died this tick for any reason.
    #[must_use]
    pub const fn deaths(&self) -> usize {
        self.blocked + self.starved
    }
}
