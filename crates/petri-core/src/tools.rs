//! World edits issued by interactive tools between ticks.

use crate::{Cell, Genome, ObjectId, ObjectKind, SimulationError, Vector2, World};

/// Place a resting sample-genome cell at `point`.
pub fn add_cell_at(world: &mut World, point: Vector2, mass: f64) -> Result<ObjectId, SimulationError> {
    let genome = Genome::sample(world.rng());
    let id = world.add(Cell::new(point, Vector2::ZERO, mass, 0.0, 0.0, genome))?;
    Ok(id)
}

/// Remove the lowest-id cell under `point`, if any.
pub fn remove_cell_at(world: &mut World, point: Vector2) -> Result<Option<ObjectId>, SimulationError> {
    world.refresh_indices()?;
    let Some(&id) = world.point_cast_in(ObjectKind::Cell, point, 0.0).first() else {
        return Ok(None);
    };
    world.remove(id);
    Ok(Some(id))
}
