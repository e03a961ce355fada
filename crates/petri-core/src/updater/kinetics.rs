//! Force resolution: gravity, wall and cell contacts, connection tension.
//!
//! Every cell's new motion is resolved from a read-only view of the world into a
//! buffer, then committed in one pass, so no cell observes a half-updated neighbour.

use crate::geometry::{circle_circle_intersections, clamp, project_point_onto_line};
use crate::{Cell, ObjectId, ObjectKind, Vector2, World};
use rayon::prelude::*;
use std::f64::consts::{FRAC_PI_4, PI};
use tracing::warn;

/// Strings a single connection is split into.
const STRING_COUNT: usize = 4;
const STRING_SPACING: f64 = PI / 24.0;
/// How far inside the rim connection strings are anchored.
const STICKINESS_DEPTH: f64 = 3.0;

/// Linear and angular speed of one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub speed: Vector2,
    pub angular_speed: f64,
}

impl Motion {
    #[must_use]
    pub fn of(cell: &Cell) -> Self {
        Self {
            speed: cell.speed,
            angular_speed: cell.angular_speed,
        }
    }

    /// Apply `direction` at `origin` to a body centred at `center`.
    ///
    /// The share spent on rotation grows with the perpendicular offset of `origin`
    /// from the line of action through the centre; the rest translates the body.
    pub fn apply_impulse(&mut self, center: Vector2, radius: f64, origin: Vector2, direction: Vector2) {
        let magnitude = direction.length();
        if magnitude == 0.0 || !magnitude.is_finite() {
            return;
        }
        let lever = center.to(origin).cross(direction.unit());
        let translation = 1.0 / ((lever / radius).powi(2) + 1.0);
        let rotation = 1.0 - translation;
        self.speed = self.speed + direction * translation;
        if lever != 0.0 {
            self.angular_speed += (magnitude / lever).atan() * rotation;
        }
    }
}

/// Apply an impulse straight to a live cell's speeds.
pub fn apply_impulse(cell: &mut Cell, origin: Vector2, direction: Vector2) {
    let mut motion = Motion::of(cell);
    motion.apply_impulse(cell.center, cell.radius(), origin, direction);
    cell.speed = motion.speed;
    cell.angular_speed = motion.angular_speed;
}

/// Scales contact response with penetration depth; softer bodies respond less to
/// shallow contacts.
fn hardness_coefficient(hardness: f64, depth: f64) -> f64 {
    clamp(2.0 * (1.0 - hardness) * (depth - 0.5) + 1.0, 0.0, 1.0)
}

/// Resolves contact and tension forces into buffered speeds, then commits them.
#[derive(Debug, Default)]
pub struct KineticsUpdater {
    buffer: Vec<(ObjectId, Motion)>,
}

impl KineticsUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the buffer from the current speeds of every cell.
    pub fn reset(&mut self, world: &World) {
        self.buffer.clear();
        self.buffer
            .extend(world.cells().iter().map(|(&id, cell)| (id, Motion::of(cell))));
    }

    /// Resolve all forces acting on buffered cells. Reads the world only.
    pub fn resolve(&mut self, world: &World, dt: f64) {
        let resolved: Vec<Motion> = self
            .buffer
            .par_iter()
            .map(|&(id, seed)| match world.cell(id) {
                Some(cell) => resolve_cell(world, cell, seed, dt),
                None => seed,
            })
            .collect();
        for (slot, motion) in self.buffer.iter_mut().zip(resolved) {
            slot.1 = motion;
        }
    }

    /// Write buffered speeds back onto the cells and empty the buffer.
    pub fn commit(&mut self, world: &mut World) {
        for (id, motion) in self.buffer.drain(..) {
            if let Some(cell) = world.cells.get_mut(&id) {
                cell.speed = motion.speed;
                cell.angular_speed = motion.angular_speed;
            }
        }
    }

    /// Buffered motion of a cell between [`Self::resolve`] and [`Self::commit`].
    #[must_use]
    pub fn buffered(&self, id: ObjectId) -> Option<Motion> {
        self.buffer
            .binary_search_by_key(&id, |&(key, _)| key)
            .ok()
            .map(|slot| self.buffer[slot].1)
    }

    /// Reset, resolve and commit in one call.
    pub fn update(&mut self, world: &mut World, dt: f64) {
        self.reset(world);
        self.resolve(world, dt);
        self.commit(world);
    }
}

fn resolve_cell(world: &World, cell: &Cell, seed: Motion, dt: f64) -> Motion {
    let mut motion = seed;
    let radius = cell.radius();
    let hardness = cell.genome.root().hardness;

    motion.speed = motion.speed + world.config().gravity * dt;

    for wall_id in world.circle_cast_in(ObjectKind::Wall, cell.center, radius) {
        let Some(wall) = world.wall(wall_id) else {
            continue;
        };
        let projection = project_point_onto_line(cell.center, wall.segment());
        let distance = cell.center.distance(projection);
        let normal = projection.to(cell.center).unit();
        let depth = clamp(1.0 - distance / radius, 0.0, 1.0);
        let incoming = motion.speed;

        motion.speed = motion.speed
            + normal * ((radius - distance) * (1.0 + hardness) * hardness_coefficient(hardness, depth) * dt);

        let normal_speed = incoming.dot(normal);
        if depth > 0.5 && normal_speed < 0.0 {
            let alignment = (-incoming).unit().dot(normal);
            let attenuation = if alignment < FRAC_PI_4.cos() { 0.0 } else { alignment };
            motion.speed = motion.speed + normal * (-normal_speed * (1.0 + hardness) * attenuation);
        }
    }

    for other_id in world.circle_cast_in(ObjectKind::Cell, cell.center, radius) {
        if other_id == cell.id {
            continue;
        }
        let Some(other) = world.cell(other_id) else {
            continue;
        };
        let intersections =
            circle_circle_intersections(cell.center, radius, other.center, other.radius());
        let pivot = match intersections.as_slice() {
            [first, second] => first.midpoint(*second),
            _ => cell.center.midpoint(other.center),
        };
        let distance = pivot.distance(cell.center);
        let depth = clamp(1.0 - distance / radius, 0.0, 1.0);
        let mass_sum = cell.mass + other.mass;
        let share = if mass_sum > 0.0 { other.mass / mass_sum } else { 0.5 };
        let mean_hardness = (hardness + other.genome.root().hardness) / 2.0;
        let push = pivot.to(cell.center).unit() * (radius - distance);
        motion.speed = motion.speed
            + push * (share * (1.0 + mean_hardness) * hardness_coefficient(mean_hardness, depth) * dt);
    }

    for (&partner_id, connection) in &cell.connections {
        let Some(partner) = world.cell(partner_id) else {
            warn!(cell = %cell.id, partner = %partner_id, "connection references a missing cell");
            continue;
        };
        let Some(partner_side) = partner.connections.get(&cell.id) else {
            warn!(cell = %cell.id, partner = %partner_id, "connection is not reciprocated");
            continue;
        };
        let partner_radius = partner.radius();
        for string in 0..STRING_COUNT {
            let offset = string as f64 * STRING_SPACING - 1.5 * STRING_SPACING;
            let origin = cell.center
                + Vector2::from_angle(cell.angle + connection.angle + offset)
                    * (radius - STICKINESS_DEPTH);
            let destination = partner.center
                + Vector2::from_angle(partner.angle + partner_side.angle - offset)
                    * (partner_radius - STICKINESS_DEPTH);
            let direction = origin.to(destination) / STRING_COUNT as f64 * dt;
            motion.apply_impulse(cell.center, radius, origin, direction);
        }
    }

    motion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Genome, GenomeNode, Wall, WorldConfig};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn still_world() -> World {
        World::new(WorldConfig {
            gravity: Vector2::ZERO,
            viscosity: 0.0,
            rng_seed: Some(5),
            ..WorldConfig::default()
        })
        .expect("world")
    }

    fn hard_genome(hardness: f64) -> Genome {
        Genome::from_node(GenomeNode {
            hardness,
            split_mass: 10_000.0,
            ..GenomeNode::default()
        })
    }

    #[test]
    fn impulse_through_the_centre_only_translates() {
        let mut motion = Motion::default();
        let center = Vector2::new(10.0, 10.0);
        motion.apply_impulse(center, 5.0, center, Vector2::new(2.0, 0.0));
        assert_eq!(motion.speed, Vector2::new(2.0, 0.0));
        assert_eq!(motion.angular_speed, 0.0);

        motion.apply_impulse(center, 5.0, Vector2::new(20.0, 0.0), Vector2::ZERO);
        assert_eq!(motion.speed, Vector2::new(2.0, 0.0));
    }

    #[test]
    fn off_centre_impulse_spins_the_body() {
        let mut motion = Motion::default();
        // Pushing +y at the +x rim turns the body towards +angle.
        motion.apply_impulse(Vector2::ZERO, 5.0, Vector2::new(5.0, 0.0), Vector2::new(0.0, 1.0));
        assert!(approx_eq(motion.speed.y, 0.5, 1e-12));
        assert!(approx_eq(motion.angular_speed, (0.2f64).atan() * 0.5, 1e-12));

        let mut mirrored = Motion::default();
        mirrored.apply_impulse(Vector2::ZERO, 5.0, Vector2::new(-5.0, 0.0), Vector2::new(0.0, 1.0));
        assert!(approx_eq(mirrored.angular_speed, -motion.angular_speed, 1e-12));
    }

    #[test]
    fn gravity_accumulates_into_the_buffer() {
        let mut world = World::new(WorldConfig {
            rng_seed: Some(5),
            ..WorldConfig::default()
        })
        .expect("world");
        let id = world
            .add(Cell::new(Vector2::new(400.0, 300.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("cell");
        world.rebuild_indices().expect("indices");

        let mut kinetics = KineticsUpdater::new();
        kinetics.reset(&world);
        kinetics.resolve(&world, 0.5);
        let buffered = kinetics.buffered(id).expect("buffered");
        assert!(approx_eq(buffered.speed.y, 2.0, 1e-12));
        assert_eq!(world.cell(id).expect("cell").speed, Vector2::ZERO);

        kinetics.commit(&mut world);
        assert!(approx_eq(world.cell(id).expect("cell").speed.y, 2.0, 1e-12));
        assert!(kinetics.buffered(id).is_none());
    }

    #[test]
    fn deep_wall_contact_reverses_the_normal_speed() {
        let mut world = still_world();
        world
            .add(Wall::new(Vector2::new(100.0, 0.0), Vector2::new(100.0, 200.0)))
            .expect("wall");
        let id = world
            .add(Cell::new(
                Vector2::new(95.0, 100.0),
                Vector2::new(10.0, 0.0),
                400.0,
                0.0,
                0.0,
                hard_genome(0.6),
            ))
            .expect("cell");
        world.rebuild_indices().expect("indices");

        KineticsUpdater::new().update(&mut world, 0.016);
        let speed = world.cell(id).expect("cell").speed;
        // Restitution 15 * 1.6 * 0.016 plus a bounce of 10 * 1.6.
        assert!(approx_eq(speed.x, 10.0 - 0.384 - 16.0, 1e-9));
        assert!(approx_eq(speed.y, 0.0, 1e-12));
    }

    #[test]
    fn shallow_glancing_contact_does_not_bounce() {
        let mut world = still_world();
        world
            .add(Wall::new(Vector2::new(100.0, 0.0), Vector2::new(100.0, 200.0)))
            .expect("wall");
        let id = world
            .add(Cell::new(
                Vector2::new(85.0, 100.0),
                Vector2::new(1.0, 0.0),
                400.0,
                0.0,
                0.0,
                hard_genome(1.0),
            ))
            .expect("cell");
        world.rebuild_indices().expect("indices");

        KineticsUpdater::new().update(&mut world, 0.1);
        let speed = world.cell(id).expect("cell").speed;
        // depth 0.25: restitution only, 5 * 2 * 1 * 0.1.
        assert!(approx_eq(speed.x, 0.0, 1e-12));
    }

    #[test]
    fn overlapping_cells_push_each_other_apart() {
        let mut world = still_world();
        let left = world
            .add(Cell::new(Vector2::new(100.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, hard_genome(0.0)))
            .expect("left");
        let right = world
            .add(Cell::new(Vector2::new(110.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, hard_genome(0.0)))
            .expect("right");
        world.rebuild_indices().expect("indices");

        KineticsUpdater::new().update(&mut world, 0.1);
        let left_speed = world.cell(left).expect("left").speed;
        let right_speed = world.cell(right).expect("right").speed;
        assert!(approx_eq(left_speed.x, -0.25, 1e-9));
        assert!(approx_eq(right_speed.x, 0.25, 1e-9));
        assert!(approx_eq(left_speed.y, 0.0, 1e-9));
    }

    #[test]
    fn separated_cells_ignore_each_other() {
        let mut world = still_world();
        let id = world
            .add(Cell::new(Vector2::new(100.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("cell");
        world
            .add(Cell::new(Vector2::new(121.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("cell");
        world.rebuild_indices().expect("indices");
        KineticsUpdater::new().update(&mut world, 0.1);
        assert_eq!(world.cell(id).expect("cell").speed, Vector2::ZERO);
    }

    #[test]
    fn connection_tension_pulls_partners_together() {
        let mut world = still_world();
        let left = world
            .add(Cell::new(Vector2::new(100.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("left");
        let right = world
            .add(Cell::new(Vector2::new(150.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("right");
        assert!(world.connect(left, right, 0.0, PI));
        world.rebuild_indices().expect("indices");

        KineticsUpdater::new().update(&mut world, 0.1);
        let left_cell = world.cell(left).expect("left");
        let right_cell = world.cell(right).expect("right");
        assert!(left_cell.speed.x > 0.0);
        assert!(right_cell.speed.x < 0.0);
        assert!(approx_eq(left_cell.speed.x, -right_cell.speed.x, 1e-9));
        assert!(approx_eq(left_cell.angular_speed, 0.0, 1e-9));
    }

    #[test]
    fn one_sided_connection_is_ignored() {
        let mut world = still_world();
        let left = world
            .add(Cell::new(Vector2::new(100.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("left");
        let right = world
            .add(Cell::new(Vector2::new(150.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("right");
        world
            .cell_mut(left)
            .expect("left")
            .connections
            .insert(right, crate::Connection::new(0.0, right));
        world.rebuild_indices().expect("indices");

        KineticsUpdater::new().update(&mut world, 0.1);
        assert_eq!(world.cell(left).expect("left").speed, Vector2::ZERO);
    }
}
