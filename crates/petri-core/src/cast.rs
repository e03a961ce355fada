//! Ray, circle and point casts over the world's collision indices.
//!
//! Each cast asks the category index for box-overlap candidates and then confirms them
//! with exact geometry. Composite casts report walls first, then cells, then food.

use crate::geometry::{
    line_circle_intersections, lines_intersection, project_point_onto_line,
    segment_overlaps_circle,
};
use crate::{ObjectId, ObjectKey, ObjectKind, Vector2, World};
use ordered_float::OrderedFloat;
use petri_index::{Aabb, CollisionIndex, KdIndex};

/// Slack that keeps points projected onto a wall endpoint inside the wall's span.
pub const POINT_CAST_SLACK: f64 = 1e-5;

const CATEGORY_ORDER: [ObjectKind; 3] = [ObjectKind::Wall, ObjectKind::Cell, ObjectKind::Food];

/// Distance along the segment `start -> end` to the first boundary crossing of a
/// circle, or zero when `start` already lies inside it.
fn circle_entry_distance(center: Vector2, radius: f64, start: Vector2, end: Vector2) -> Option<f64> {
    if start.distance(center) <= radius {
        return Some(0.0);
    }
    line_circle_intersections(center, radius, start, end)
        .first()
        .map(|hit| start.distance(*hit))
        .or_else(|| (end.distance(center) <= radius).then(|| start.distance(end)))
}

impl World {
    fn index_for(&self, kind: ObjectKind) -> &KdIndex<ObjectId> {
        let indices = self.indices();
        match kind {
            ObjectKind::Wall => &indices.walls,
            ObjectKind::Cell => &indices.cells,
            ObjectKind::Food => &indices.food,
        }
    }

    /// Centre and radius of a live round object.
    fn disc(&self, kind: ObjectKind, id: ObjectId) -> Option<(Vector2, f64)> {
        match kind {
            ObjectKind::Cell => self.cell(id).map(|cell| (cell.center, cell.radius())),
            ObjectKind::Food => self.food_item(id).map(|food| (food.center, food.radius())),
            ObjectKind::Wall => None,
        }
    }

    /// Objects of one category crossed by the segment `start -> end`, nearest first.
    #[must_use]
    pub fn ray_cast_in(&self, kind: ObjectKind, start: Vector2, end: Vector2) -> Vec<ObjectId> {
        let query = Aabb::from_corners((start.x, start.y), (end.x, end.y));
        let mut hits: Vec<(OrderedFloat<f64>, ObjectId)> = self
            .index_for(kind)
            .candidates(&query)
            .into_iter()
            .filter_map(|id| {
                let distance = match kind {
                    ObjectKind::Wall => {
                        let wall = self.wall(id)?;
                        let hit = lines_intersection((start, end), wall.segment())?;
                        start.distance(hit)
                    }
                    ObjectKind::Cell | ObjectKind::Food => {
                        let (center, radius) = self.disc(kind, id)?;
                        circle_entry_distance(center, radius, start, end)?
                    }
                };
                Some((OrderedFloat(distance), id))
            })
            .collect();
        hits.sort();
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Objects of one category overlapping the circle, in ascending id order.
    #[must_use]
    pub fn circle_cast_in(&self, kind: ObjectKind, center: Vector2, radius: f64) -> Vec<ObjectId> {
        let query = Aabb::around(center.x, center.y, radius);
        self.index_for(kind)
            .candidates(&query)
            .into_iter()
            .filter(|&id| match kind {
                ObjectKind::Wall => self
                    .wall(id)
                    .is_some_and(|wall| segment_overlaps_circle(center, radius, wall.a, wall.b)),
                ObjectKind::Cell | ObjectKind::Food => self
                    .disc(kind, id)
                    .is_some_and(|(other, other_radius)| {
                        center.distance(other) <= radius + other_radius
                    }),
            })
            .collect()
    }

    /// Objects of one category within `tolerance` of `point`, in ascending id order.
    #[must_use]
    pub fn point_cast_in(&self, kind: ObjectKind, point: Vector2, tolerance: f64) -> Vec<ObjectId> {
        let query = Aabb::around(point.x, point.y, tolerance).expanded(POINT_CAST_SLACK);
        self.index_for(kind)
            .candidates(&query)
            .into_iter()
            .filter(|&id| match kind {
                ObjectKind::Wall => self.wall(id).is_some_and(|wall| {
                    let projected = project_point_onto_line(point, wall.segment());
                    let span = Aabb::from_corners((wall.a.x, wall.a.y), (wall.b.x, wall.b.y))
                        .expanded(POINT_CAST_SLACK);
                    point.distance(projected) <= tolerance
                        && projected.x >= span.min_x
                        && projected.x <= span.max_x
                        && projected.y >= span.min_y
                        && projected.y <= span.max_y
                }),
                ObjectKind::Cell | ObjectKind::Food => self
                    .disc(kind, id)
                    .is_some_and(|(center, radius)| point.distance(center) <= radius + tolerance),
            })
            .collect()
    }

    /// Every object crossed by the segment: walls, then cells, then food.
    #[must_use]
    pub fn ray_cast(&self, start: Vector2, end: Vector2) -> Vec<ObjectKey> {
        CATEGORY_ORDER
            .iter()
            .flat_map(|&kind| {
                self.ray_cast_in(kind, start, end)
                    .into_iter()
                    .map(move |id| ObjectKey::new(kind, id))
            })
            .collect()
    }

    /// Every object overlapping the circle: walls, then cells, then food.
    #[must_use]
    pub fn circle_cast(&self, center: Vector2, radius: f64) -> Vec<ObjectKey> {
        CATEGORY_ORDER
            .iter()
            .flat_map(|&kind| {
                self.circle_cast_in(kind, center, radius)
                    .into_iter()
                    .map(move |id| ObjectKey::new(kind, id))
            })
            .collect()
    }

    /// Every object within `tolerance` of `point`: walls, then cells, then food.
    #[must_use]
    pub fn point_cast(&self, point: Vector2, tolerance: f64) -> Vec<ObjectKey> {
        CATEGORY_ORDER
            .iter()
            .flat_map(|&kind| {
                self.point_cast_in(kind, point, tolerance)
                    .into_iter()
                    .map(move |id| ObjectKey::new(kind, id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Food, Genome, Wall, WorldConfig};

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    fn populated() -> (World, ObjectId, ObjectId, ObjectId, ObjectId) {
        let mut world = World::new(WorldConfig {
            rng_seed: Some(3),
            ..WorldConfig::default()
        })
        .expect("world");
        let wall = world.add(Wall::new(v(100.0, 0.0), v(100.0, 200.0))).expect("wall");
        let near = world
            .add(Cell::new(v(50.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("near cell");
        let far = world
            .add(Cell::new(v(20.0, 100.0), Vector2::ZERO, 100.0, 0.0, 0.0, Genome::null()))
            .expect("far cell");
        let food = world.add(Food::new(v(70.0, 100.0), 50.0)).expect("food");
        world.rebuild_indices().expect("indices");
        (world, wall, near, far, food)
    }

    #[test]
    fn ray_cast_groups_by_category_and_sorts_by_distance() {
        let (world, wall, near, far, food) = populated();
        let hits = world.ray_cast(v(150.0, 100.0), v(0.0, 100.0));
        assert_eq!(
            hits,
            vec![
                ObjectKey::new(ObjectKind::Wall, wall),
                ObjectKey::new(ObjectKind::Cell, near),
                ObjectKey::new(ObjectKind::Cell, far),
                ObjectKey::new(ObjectKind::Food, food),
            ]
        );
        assert!(world.ray_cast(v(0.0, 300.0), v(150.0, 300.0)).is_empty());
    }

    #[test]
    fn circle_cast_uses_true_overlap() {
        let (world, wall, near, _, food) = populated();
        let hits = world.circle_cast(v(85.0, 100.0), 16.0);
        assert_eq!(
            hits,
            vec![
                ObjectKey::new(ObjectKind::Wall, wall),
                ObjectKey::new(ObjectKind::Food, food),
            ]
        );
        // The boxes overlap at the near cell's corner, the circles do not.
        assert!(world.circle_cast_in(ObjectKind::Cell, v(59.0, 109.0), 2.0).is_empty());
        assert_eq!(world.circle_cast_in(ObjectKind::Cell, v(59.0, 100.0), 2.0), vec![near]);
    }

    #[test]
    fn point_cast_on_walls_respects_the_segment_span() {
        let (world, wall, _, _, _) = populated();
        assert_eq!(world.point_cast_in(ObjectKind::Wall, v(101.0, 50.0), 2.0), vec![wall]);
        assert_eq!(world.point_cast_in(ObjectKind::Wall, v(100.0, 200.0), 0.0), vec![wall]);
        assert!(world.point_cast_in(ObjectKind::Wall, v(100.0, 201.0), 2.0).is_empty());
        assert!(world.point_cast_in(ObjectKind::Wall, v(104.0, 50.0), 2.0).is_empty());
    }

    #[test]
    fn point_cast_finds_the_cell_under_the_cursor() {
        let (world, _, near, _, _) = populated();
        let hits = world.point_cast(v(52.0, 103.0), 0.0);
        assert_eq!(hits, vec![ObjectKey::new(ObjectKind::Cell, near)]);
    }

    #[test]
    fn removed_objects_drop_out_of_stale_indices() {
        let (mut world, _, near, _, _) = populated();
        world.remove(near);
        assert!(world.point_cast_in(ObjectKind::Cell, v(50.0, 100.0), 0.0).is_empty());
    }
}
