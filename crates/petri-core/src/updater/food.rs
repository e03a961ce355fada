use super::StageCounts;
use crate::{Food, ObjectId, Vector2, World};
use rand::Rng;
use tracing::warn;

/// Spawns food at random places and decays existing food.
///
/// Spawning is rate based: the fractional part of the expected spawn count is
/// carried over as debt, so the long-run count is exact for any tick length.
#[derive(Debug, Default)]
pub struct FoodUpdater {
    spawn_debt: f64,
}

impl FoodUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fractional food particles owed to the world.
    #[must_use]
    pub fn spawn_debt(&self) -> f64 {
        self.spawn_debt
    }

    pub fn update(&mut self, world: &mut World, dt: f64, counts: &mut StageCounts) {
        counts.food_spawned += self.spawn(world, dt);
        counts.food_expired += Self::decay(world, dt);
    }

    fn spawn(&mut self, world: &mut World, dt: f64) -> usize {
        let config = world.config();
        let (width, height) = (config.width, config.height);
        let (min_mass, max_mass) = (config.food_spawn_mass_min, config.food_spawn_mass_max);
        let rate = config.food_spawn_rate * width * height / 1_000_000.0;

        self.spawn_debt += rate * dt;
        let due = self.spawn_debt.floor();
        self.spawn_debt -= due;

        let mut spawned = 0;
        for _ in 0..due as usize {
            let rng = world.rng();
            let center = Vector2::new(rng.random::<f64>() * width, rng.random::<f64>() * height);
            let mass = min_mass + rng.random::<f64>() * (max_mass - min_mass);
            match world.add(Food::new(center, mass)) {
                Ok(_) => spawned += 1,
                Err(err) => warn!(?err, "failed to spawn food"),
            }
        }
        spawned
    }

    fn decay(world: &mut World, dt: f64) -> usize {
        let loss = world.config().food_mass_loss * dt;
        let min_mass = world.config().min_food_mass;
        let mut expired: Vec<ObjectId> = Vec::new();
        for (&id, food) in &mut world.food {
            food.mass -= loss;
            if food.mass < min_mass {
                expired.push(id);
            }
        }
        world.mark_indices_stale();
        for &id in &expired {
            world.remove(id);
        }
        expired.len()
    }
}
