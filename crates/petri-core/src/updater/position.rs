use crate::{SimulationError, Tick, World};

/// Integrates cell positions and orientation, damps speeds and rebuilds the indices.
#[derive(Debug, Default)]
pub struct PositionUpdater;

impl PositionUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Fails with the first cell whose integrated position is not finite.
    pub fn update(&mut self, world: &mut World, dt: f64, tick: Tick) -> Result<(), SimulationError> {
        let viscosity = world.config().viscosity;
        for (&id, cell) in &mut world.cells {
            cell.center = cell.center + cell.speed * dt;
            cell.angle += cell.angular_speed * dt;
            cell.speed = cell.speed - cell.speed * (viscosity * dt);
            cell.angular_speed -= cell.angular_speed * viscosity * dt;
            if !cell.center.is_finite() {
                return Err(SimulationError::NonFinitePosition { cell: id, tick });
            }
        }
        world.mark_indices_stale();
        world.rebuild_indices()?;
        Ok(())
    }
}
