//! Aging, propulsion, blocked-tail deaths and genome-driven splitting.

use super::{StageCounts, apply_impulse};
use crate::geometry::wrap_unsigned_angle;
use crate::{Cell, CellType, Connection, ObjectId, Vector2, World};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use tracing::trace;

/// Half-width of the cone behind a flagellocyte that must stay free of connections.
const TAIL_CONE: f64 = PI / 12.0;
/// Tolerance around the split line used to classify inherited connections.
const SPLIT_LINE_MARGIN: f64 = PI / 15.0;
/// Anchor shift applied when both children inherit the same connection.
const SHARED_ANCHOR_SHIFT: f64 = PI / 6.0;

/// Ages cells, runs type-specific behaviour and performs splits.
#[derive(Debug, Default)]
pub struct LifecycleUpdater;

impl LifecycleUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Visit every cell alive at the start of the call, in ascending id order.
    /// Children created here are first visited on the next tick.
    pub fn update(&mut self, world: &mut World, dt: f64, counts: &mut StageCounts) {
        let ids: Vec<ObjectId> = world.cells().keys().copied().collect();
        let cost = world.config().flagellum_force_cost;
        for id in ids {
            let Some(cell) = world.cells.get_mut(&id) else {
                continue;
            };
            cell.age += dt;
            if cell.genome.root().cell_type == CellType::Flagellocyte && propel(cell, cost, dt) {
                trace!(cell = %id, "flagellum blocked by a connection");
                world.convert_to_food(id);
                counts.blocked += 1;
                continue;
            }
            world.mark_indices_stale();

            let splits = world
                .cell(id)
                .is_some_and(|cell| cell.mass > cell.genome.root().split_mass);
            if splits && let Some((first, second)) = split(world, id) {
                trace!(parent = %id, %first, %second, "cell split");
                counts.splits += 1;
            }
        }
    }
}

/// Push the cell towards its flagellum speed and pay for it in mass. Returns true
/// when a connection sits in the cone directly behind the cell.
fn propel(cell: &mut Cell, cost: f64, dt: f64) -> bool {
    let facing = Vector2::from_angle(cell.angle);
    let target = facing * cell.genome.root().flagellum_force;
    let deficit = target - cell.speed;
    let force = facing * (facing.dot(deficit) * dt);
    let center = cell.center;
    apply_impulse(cell, center, force);
    cell.mass -= deficit.length() * cost * dt;

    cell.connections
        .values()
        .any(|connection| (wrap_unsigned_angle(connection.angle) - PI).abs() < TAIL_CONE)
}

/// Replace the cell by two children as its genome prescribes. Returns the child ids.
fn split(world: &mut World, id: ObjectId) -> Option<(ObjectId, ObjectId)> {
    let parent = world.cell(id)?.clone();
    let node = parent.genome.root().clone();

    let split_normal = parent.angle + node.split_angle + FRAC_PI_2;
    let centers = [
        parent.center + Vector2::from_angle(split_normal - FRAC_PI_2),
        parent.center + Vector2::from_angle(split_normal + FRAC_PI_2),
    ];
    let mut genomes = [parent.genome.subtree(0), parent.genome.subtree(1)];
    for genome in &mut genomes {
        world.irradiate(genome);
    }

    let mut children = [ObjectId::UNASSIGNED; 2];
    for (slot, genome) in genomes.into_iter().enumerate() {
        let child = Cell::new(
            centers[slot],
            parent.speed,
            parent.mass / 2.0,
            parent.angle + node.split_angle + node.child_angles[slot],
            0.0,
            genome,
        );
        children[slot] = world.add(child).ok()?;
    }

    if node.stick_on_split {
        world.connect(
            children[0],
            children[1],
            (-node.child_angles[0] + 3.0 * PI) % TAU,
            (-node.child_angles[1] + TAU) % TAU,
        );
    }

    let both_keep = node.keep_connections[0] && node.keep_connections[1];
    for slot in 0..2 {
        if !node.keep_connections[slot] {
            continue;
        }
        let child = children[slot];
        for connection in parent.connections.values() {
            let Some(partner_angle) = world
                .cell(connection.partner)
                .and_then(|partner| partner.connections.get(&id))
                .map(|back| back.angle)
            else {
                continue;
            };

            let mut relative = node.split_angle - connection.angle + FRAC_PI_2;
            if slot == 1 {
                relative += PI;
            }
            relative %= TAU;
            let narrow = (SPLIT_LINE_MARGIN..=PI - SPLIT_LINE_MARGIN).contains(&relative);
            let broad = (-SPLIT_LINE_MARGIN..=PI + SPLIT_LINE_MARGIN).contains(&relative);

            let shift = if narrow || (broad && !both_keep) {
                0.0
            } else if broad {
                let mut shift = if slot == 0 {
                    SHARED_ANCHOR_SHIFT
                } else {
                    -SHARED_ANCHOR_SHIFT
                };
                if (node.split_angle - connection.angle + FRAC_PI_2).abs() > SPLIT_LINE_MARGIN {
                    shift = -shift;
                }
                shift
            } else {
                continue;
            };

            let child_angle =
                (connection.angle - node.split_angle - node.child_angles[slot] + shift + TAU) % TAU;
            attach(world, child, child_angle, connection.partner, partner_angle + shift);
        }
    }

    world.remove(id);
    Some((children[0], children[1]))
}

fn attach(world: &mut World, child: ObjectId, child_angle: f64, partner: ObjectId, partner_angle: f64) {
    if let Some(cell) = world.cells.get_mut(&partner) {
        cell.connections
            .insert(child, Connection::new(partner_angle, child));
    }
    if let Some(cell) = world.cells.get_mut(&child) {
        cell.connections
            .insert(partner, Connection::new(child_angle, partner));
    }
}
