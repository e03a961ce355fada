//! Factories for ready-made worlds.

use crate::{Cell, Genome, ObjectId, Vector2, Wall, World, WorldConfig, WorldError};

/// Mass of each seed cell in [`demo`].
pub const DEMO_CELL_MASS: f64 = 400.0;

/// Where [`demo`] places its seed cells.
pub const DEMO_CELL_CENTERS: [Vector2; 3] = [
    Vector2::new(50.0, 50.0),
    Vector2::new(200.0, 120.0),
    Vector2::new(200.0, 300.0),
];

/// Add four walls tracing the world's perimeter. Returns their ids.
pub fn add_perimeter(world: &mut World) -> Result<[ObjectId; 4], WorldError> {
    let (width, height) = (world.config().width, world.config().height);
    let corners = [
        Vector2::new(0.0, 0.0),
        Vector2::new(0.0, height),
        Vector2::new(width, height),
        Vector2::new(width, 0.0),
    ];
    let mut ids = [ObjectId::UNASSIGNED; 4];
    for (slot, id) in ids.iter_mut().enumerate() {
        *id = world.add(Wall::new(corners[slot], corners[(slot + 1) % 4]))?;
    }
    Ok(ids)
}

/// Empty world enclosed by perimeter walls.
pub fn bounded(config: WorldConfig) -> Result<World, WorldError> {
    let mut world = World::new(config)?;
    add_perimeter(&mut world)?;
    Ok(world)
}

/// Enclosed world seeded with three resting sample cells.
pub fn demo(config: WorldConfig) -> Result<World, WorldError> {
    let mut world = World::new(config)?;
    for center in DEMO_CELL_CENTERS {
        let genome = Genome::sample(world.rng());
        world.add(Cell::new(center, Vector2::ZERO, DEMO_CELL_MASS, 0.0, 0.0, genome))?;
    }
    add_perimeter(&mut world)?;
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellType, ObjectKind};

    fn seeded() -> WorldConfig {
        WorldConfig {
            rng_seed: Some(7),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn bounded_world_has_a_closed_perimeter() {
        let world = bounded(seeded()).expect("world");
        assert_eq!(world.walls().len(), 4);
        assert!(world.cells().is_empty());
        for wall in world.walls().values() {
            let shared = world
                .walls()
                .values()
                .filter(|other| other.a == wall.b)
                .count();
            assert_eq!(shared, 1, "every wall end starts another wall");
        }
    }

    #[test]
    fn demo_world_matches_the_classic_layout() {
        let mut world = demo(seeded()).expect("world");
        assert_eq!(world.cells().len(), 3);
        assert_eq!(world.walls().len(), 4);
        for (cell, center) in world.cells().values().zip(DEMO_CELL_CENTERS) {
            assert_eq!(cell.center, center);
            assert_eq!(cell.mass, DEMO_CELL_MASS);
            assert_eq!(cell.genome.root().cell_type, CellType::Flagellocyte);
            assert_eq!(cell.genome.root().split_mass, 350.0);
        }
        world.rebuild_indices().expect("indices");
        let hits = world.point_cast(Vector2::new(0.0, 300.0), 1.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ObjectKind::Wall);
    }

    #[test]
    fn demo_pigments_follow_the_seed() {
        let first = demo(seeded()).expect("world");
        let second = demo(seeded()).expect("world");
        let pigments = |world: &World| {
            world
                .cells()
                .values()
                .map(|cell| cell.genome.root().pigments)
                .collect::<Vec<_>>()
        };
        assert_eq!(pigments(&first), pigments(&second));
    }
}
