//! Simulation entities: cells, food particles and walls.

use crate::{Genome, ObjectId, Vector2};
use petri_index::{Aabb, HasAabb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Divisor applied to a food particle's area-derived radius.
pub const FOOD_DENSITY: f64 = 4.0;

/// One half of a tether between two cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    /// Anchor on this cell's rim, relative to the cell's facing.
    pub angle: f64,
    pub partner: ObjectId,
}

impl Connection {
    #[must_use]
    pub const fn new(angle: f64, partner: ObjectId) -> Self {
        Self { angle, partner }
    }
}

/// Soft-bodied cell. Radius is derived from mass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub id: ObjectId,
    pub center: Vector2,
    pub speed: Vector2,
    pub mass: f64,
    pub angle: f64,
    pub angular_speed: f64,
    pub genome: Genome,
    /// Seconds of simulated time since the cell was created.
    pub age: f64,
    pub connections: BTreeMap<ObjectId, Connection>,
}

impl Cell {
    /// New cell without an id; the world assigns one on insertion.
    #[must_use]
    pub fn new(
        center: Vector2,
        speed: Vector2,
        mass: f64,
        angle: f64,
        angular_speed: f64,
        genome: Genome,
    ) -> Self {
        Self {
            id: ObjectId::UNASSIGNED,
            center,
            speed,
            mass,
            angle,
            angular_speed,
            genome,
            age: 0.0,
            connections: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.mass.sqrt()
    }
}

impl HasAabb for Cell {
    fn aabb(&self) -> Aabb {
        Aabb::around(self.center.x, self.center.y, self.radius())
    }
}

/// Consumable particle that slowly decays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub id: ObjectId,
    pub center: Vector2,
    pub mass: f64,
}

impl Food {
    #[must_use]
    pub fn new(center: Vector2, mass: f64) -> Self {
        Self {
            id: ObjectId::UNASSIGNED,
            center,
            mass,
        }
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        (self.mass / PI).sqrt() / FOOD_DENSITY
    }
}

impl HasAabb for Food {
    fn aabb(&self) -> Aabb {
        Aabb::around(self.center.x, self.center.y, self.radius())
    }
}

/// Immovable line segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wall {
    pub id: ObjectId,
    pub a: Vector2,
    pub b: Vector2,
}

impl Wall {
    #[must_use]
    pub fn new(a: Vector2, b: Vector2) -> Self {
        Self {
            id: ObjectId::UNASSIGNED,
            a,
            b,
        }
    }

    #[must_use]
    pub fn segment(&self) -> (Vector2, Vector2) {
        (self.a, self.b)
    }
}

impl HasAabb for Wall {
    fn aabb(&self) -> Aabb {
        Aabb::from_corners((self.a.x, self.a.y), (self.b.x, self.b.y))
    }
}

/// Category of a world object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Wall,
    Cell,
    Food,
}

/// Reference to a live world object by category and id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub id: ObjectId,
}

impl ObjectKey {
    #[must_use]
    pub const fn new(kind: ObjectKind, id: ObjectId) -> Self {
        Self { kind, id }
    }
}

/// Owned world object of any category, as passed to and returned from the world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WorldObject {
    Cell(Cell),
    Food(Food),
    Wall(Wall),
}

impl WorldObject {
    #[must_use]
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Cell(cell) => cell.id,
            Self::Food(food) => food.id,
            Self::Wall(wall) => wall.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        match self {
            Self::Cell(cell) => cell.id = id,
            Self::Food(food) => food.id = id,
            Self::Wall(wall) => wall.id = id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Cell(_) => ObjectKind::Cell,
            Self::Food(_) => ObjectKind::Food,
            Self::Wall(_) => ObjectKind::Wall,
        }
    }

    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.kind(), self.id())
    }
}

impl HasAabb for WorldObject {
    fn aabb(&self) -> Aabb {
        match self {
            Self::Cell(cell) => cell.aabb(),
            Self::Food(food) => food.aabb(),
            Self::Wall(wall) => wall.aabb(),
        }
    }
}

impl From<Cell> for WorldObject {
    fn from(cell: Cell) -> Self {
        Self::Cell(cell)
    }
}

impl From<Food> for WorldObject {
    fn from(food: Food) -> Self {
        Self::Food(food)
    }
}

impl From<Wall> for WorldObject {
    fn from(wall: Wall) -> Self {
        Self::Wall(wall)
    }
}
