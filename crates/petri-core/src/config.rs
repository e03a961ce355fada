//! Tunable world and scheduler parameters.

use crate::{Vector2, WorldError};
use petri_index::Aabb;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

/// Static configuration for a Petri world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world in world units.
    pub width: f64,
    /// Height of the world in world units.
    pub height: f64,
    /// Acceleration applied to every cell.
    pub gravity: Vector2,
    /// Fraction of linear and angular speed lost per second.
    pub viscosity: f64,
    /// Radiation level handed to the radiation hook on every split.
    pub radiation: f64,
    pub light_intensity: f64,
    /// Food particles spawned per second per million square units.
    pub food_spawn_rate: f64,
    /// Upper bound a cell may reach by feeding or exchange.
    pub max_cell_mass: f64,
    /// Cells lighter than this starve and turn into food.
    pub min_cell_mass: f64,
    /// Largest mass a cell may gain (or give away) per second.
    pub max_nutrition_gain_speed: f64,
    /// Mass every food particle loses per second.
    pub food_mass_loss: f64,
    /// Food lighter than this disappears.
    pub min_food_mass: f64,
    /// Mass burned per unit of speed deficit per second by flagellocytes.
    pub flagellum_force_cost: f64,
    /// Lower bound of the mass of spawned food.
    pub food_spawn_mass_min: f64,
    /// Upper bound of the mass of spawned food.
    pub food_spawn_mass_max: f64,
    /// Maximum number of recent tick summaries retained in-memory.
    pub history_capacity: usize,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            gravity: Vector2::new(0.0, 4.0),
            viscosity: 0.2,
            radiation: 0.0,
            light_intensity: 0.0,
            food_spawn_rate: 5.0,
            max_cell_mass: 1_200.0,
            min_cell_mass: 30.0,
            max_nutrition_gain_speed: 40.0,
            food_mass_loss: 0.5,
            min_food_mass: 2.0,
            flagellum_force_cost: 0.05,
            food_spawn_mass_min: 40.0,
            food_spawn_mass_max: 80.0,
            history_capacity: 256,
            rng_seed: None,
        }
    }
}

impl WorldConfig {
    /// Validates every field, reporting the first offending one.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(WorldError::InvalidConfig(
                "world dimensions must be positive and finite",
            ));
        }
        if !self.gravity.is_finite() {
            return Err(WorldError::InvalidConfig("gravity must be finite"));
        }
        let non_negative = [
            self.viscosity,
            self.radiation,
            self.light_intensity,
            self.food_spawn_rate,
            self.max_nutrition_gain_speed,
            self.food_mass_loss,
            self.min_food_mass,
            self.flagellum_force_cost,
        ];
        if non_negative.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(WorldError::InvalidConfig(
                "rates, radiation, light and food thresholds must be non-negative and finite",
            ));
        }
        if !(self.min_cell_mass.is_finite() && self.max_cell_mass.is_finite())
            || self.min_cell_mass < 0.0
            || self.min_cell_mass >= self.max_cell_mass
        {
            return Err(WorldError::InvalidConfig(
                "min_cell_mass must be non-negative and below max_cell_mass",
            ));
        }
        if !(self.food_spawn_mass_min.is_finite() && self.food_spawn_mass_max.is_finite())
            || self.food_spawn_mass_min <= 0.0
            || self.food_spawn_mass_min > self.food_spawn_mass_max
        {
            return Err(WorldError::InvalidConfig(
                "food spawn mass range must be positive and ordered",
            ));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }

    /// Rectangle spanned by the world, starting at the origin.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(0.0, 0.0, self.width, self.height)
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Parameters of the real-time tick driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Simulated time advanced by one tick, in milliseconds.
    pub tick_millis: u32,
    /// Most ticks executed by a single catch-up burst.
    pub max_catch_up_ticks: u32,
    /// Simulation speed multiplier applied to elapsed wall-clock time.
    pub speed: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_millis: 16,
            max_catch_up_ticks: 10,
            speed: 1.0,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.tick_millis == 0 {
            return Err(WorldError::InvalidConfig("tick_millis must be non-zero"));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(WorldError::InvalidConfig(
                "speed must be non-negative and finite",
            ));
        }
        Ok(())
    }

    /// Length of one tick in seconds.
    #[must_use]
    pub fn tick_seconds(&self) -> f64 {
        f64::from(self.tick_millis) / 1000.0
    }
}
