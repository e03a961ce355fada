//! Authoritative container of cells, food and walls.

use crate::{
    Cell, Connection, Food, Genome, NoRadiation, ObjectId, ObjectKind, RadiationHook, Wall,
    WorldConfig, WorldError, WorldObject,
};
use petri_index::{Aabb, CollisionIndex, HasAabb, IndexError, KdIndex};
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// One broad-phase index per object category.
#[derive(Debug, Default)]
pub struct CollisionIndices {
    pub cells: KdIndex<ObjectId>,
    pub food: KdIndex<ObjectId>,
    pub walls: KdIndex<ObjectId>,
}

fn index_entries<T: HasAabb>(objects: &BTreeMap<ObjectId, T>) -> Vec<(ObjectId, Aabb)> {
    objects
        .iter()
        .map(|(&id, object)| (id, object.aabb()))
        .collect()
}

/// Simulation world: entity collections, global parameters and id allocation.
///
/// Collections are keyed by ids drawn from one strictly increasing counter, so an id
/// lives in at most one collection and is never handed out twice.
pub struct World {
    config: WorldConfig,
    pub(crate) cells: BTreeMap<ObjectId, Cell>,
    pub(crate) food: BTreeMap<ObjectId, Food>,
    pub(crate) walls: BTreeMap<ObjectId, Wall>,
    next_id: u64,
    rng: SmallRng,
    radiation: Box<dyn RadiationHook>,
    indices: CollisionIndices,
    indices_stale: bool,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("cells", &self.cells.len())
            .field("food", &self.food.len())
            .field("walls", &self.walls.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl World {
    /// Instantiate an empty world using the supplied configuration.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        Self::with_radiation_hook(config, Box::new(NoRadiation))
    }

    /// Instantiate an empty world whose splits run child genomes through `hook`.
    pub fn with_radiation_hook(
        config: WorldConfig,
        hook: Box<dyn RadiationHook>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let rng = config.seeded_rng();
        Ok(Self {
            config,
            cells: BTreeMap::new(),
            food: BTreeMap::new(),
            walls: BTreeMap::new(),
            next_id: 0,
            rng,
            radiation: hook,
            indices: CollisionIndices::default(),
            indices_stale: true,
        })
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Replace the configuration after validating it.
    pub fn set_config(&mut self, config: WorldConfig) -> Result<(), WorldError> {
        config.validate()?;
        self.config = config;
        self.indices_stale = true;
        Ok(())
    }

    /// Replace the radiation hook applied after splits.
    pub fn set_radiation_hook(&mut self, hook: Box<dyn RadiationHook>) {
        self.radiation = hook;
    }

    /// Borrow the world RNG mutably for deterministic sampling.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Reserve the next object id. Fails once the counter reaches the
    /// [`ObjectId::UNASSIGNED`] sentinel.
    pub fn new_id(&mut self) -> Result<ObjectId, WorldError> {
        let id = ObjectId(self.next_id);
        if !id.is_assigned() {
            return Err(WorldError::IdExhausted(id));
        }
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(WorldError::IdExhausted(id))?;
        Ok(id)
    }

    /// Insert an object, assigning a fresh id unless it already carries one.
    pub fn add(&mut self, object: impl Into<WorldObject>) -> Result<ObjectId, WorldError> {
        let mut object = object.into();
        let id = if object.id().is_assigned() {
            let id = object.id();
            if self.contains(id) {
                return Err(WorldError::DuplicateId(id));
            }
            let after = id.0.checked_add(1).ok_or(WorldError::IdExhausted(id))?;
            self.next_id = self.next_id.max(after);
            id
        } else {
            let id = self.new_id()?;
            object.set_id(id);
            id
        };

        match object {
            WorldObject::Cell(cell) => {
                self.cells.insert(id, cell);
            }
            WorldObject::Food(food) => {
                self.food.insert(id, food);
            }
            WorldObject::Wall(wall) => {
                self.walls.insert(id, wall);
            }
        }
        self.indices_stale = true;
        Ok(id)
    }

    /// Remove an object of any category. Removing a cell also strips the reciprocal
    /// half of each of its connections from the partners.
    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        let removed = if let Some(cell) = self.cells.remove(&id) {
            for partner in cell.connections.keys() {
                if let Some(partner) = self.cells.get_mut(partner) {
                    partner.connections.remove(&id);
                }
            }
            Some(WorldObject::Cell(cell))
        } else if let Some(food) = self.food.remove(&id) {
            Some(WorldObject::Food(food))
        } else {
            self.walls.remove(&id).map(WorldObject::Wall)
        };
        if removed.is_some() {
            self.indices_stale = true;
        }
        removed
    }

    /// Remove every object. Ids already handed out stay retired.
    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self
            .walls
            .keys()
            .chain(self.cells.keys())
            .chain(self.food.keys())
            .copied()
            .collect();
        for id in ids {
            self.remove(id);
        }
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.kind_of(id).is_some()
    }

    /// Category of the live object with `id`, if any.
    #[must_use]
    pub fn kind_of(&self, id: ObjectId) -> Option<ObjectKind> {
        if self.cells.contains_key(&id) {
            Some(ObjectKind::Cell)
        } else if self.food.contains_key(&id) {
            Some(ObjectKind::Food)
        } else if self.walls.contains_key(&id) {
            Some(ObjectKind::Wall)
        } else {
            None
        }
    }

    /// Total number of live objects across all categories.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.cells.len() + self.food.len() + self.walls.len()
    }

    #[must_use]
    pub fn cells(&self) -> &BTreeMap<ObjectId, Cell> {
        &self.cells
    }

    #[must_use]
    pub fn food(&self) -> &BTreeMap<ObjectId, Food> {
        &self.food
    }

    #[must_use]
    pub fn walls(&self) -> &BTreeMap<ObjectId, Wall> {
        &self.walls
    }

    #[must_use]
    pub fn cell(&self, id: ObjectId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// Mutable access to one cell. Collision indices are refreshed before the next tick.
    pub fn cell_mut(&mut self, id: ObjectId) -> Option<&mut Cell> {
        self.indices_stale = true;
        self.cells.get_mut(&id)
    }

    #[must_use]
    pub fn food_item(&self, id: ObjectId) -> Option<&Food> {
        self.food.get(&id)
    }

    pub fn food_item_mut(&mut self, id: ObjectId) -> Option<&mut Food> {
        self.indices_stale = true;
        self.food.get_mut(&id)
    }

    #[must_use]
    pub fn wall(&self, id: ObjectId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    /// Tether two distinct live cells. Returns false when either is missing.
    pub fn connect(&mut self, a: ObjectId, b: ObjectId, angle_a: f64, angle_b: f64) -> bool {
        if a == b || !self.cells.contains_key(&a) || !self.cells.contains_key(&b) {
            return false;
        }
        if let Some(cell) = self.cells.get_mut(&a) {
            cell.connections.insert(b, Connection::new(angle_a, b));
        }
        if let Some(cell) = self.cells.get_mut(&b) {
            cell.connections.insert(a, Connection::new(angle_b, a));
        }
        true
    }

    /// Remove both halves of a connection. Returns true if either half existed.
    pub fn disconnect(&mut self, a: ObjectId, b: ObjectId) -> bool {
        let first = self
            .cells
            .get_mut(&a)
            .is_some_and(|cell| cell.connections.remove(&b).is_some());
        let second = self
            .cells
            .get_mut(&b)
            .is_some_and(|cell| cell.connections.remove(&a).is_some());
        first || second
    }

    /// Connection halves whose partner is missing or does not point back.
    #[must_use]
    pub fn asymmetric_connections(&self) -> Vec<(ObjectId, ObjectId)> {
        let mut broken = Vec::new();
        for (&id, cell) in &self.cells {
            for &partner in cell.connections.keys() {
                let reciprocal = self
                    .cells
                    .get(&partner)
                    .is_some_and(|other| other.connections.contains_key(&id));
                if !reciprocal {
                    broken.push((id, partner));
                }
            }
        }
        broken
    }

    /// Broad-phase indices as of the last rebuild.
    #[must_use]
    pub fn indices(&self) -> &CollisionIndices {
        &self.indices
    }

    /// Returns true when objects changed since the last index rebuild.
    #[must_use]
    pub fn indices_stale(&self) -> bool {
        self.indices_stale
    }

    /// Rebuild all three collision indices from current object positions.
    pub fn rebuild_indices(&mut self) -> Result<(), IndexError> {
        let bounds = self.config.bounds();
        self.indices
            .cells
            .rebuild(bounds, &index_entries(&self.cells))?;
        self.indices.food.rebuild(bounds, &index_entries(&self.food))?;
        self.indices
            .walls
            .rebuild(bounds, &index_entries(&self.walls))?;
        self.indices_stale = false;
        Ok(())
    }

    /// Rebuild the indices only if something changed since the last rebuild.
    pub fn refresh_indices(&mut self) -> Result<(), IndexError> {
        if self.indices_stale {
            self.rebuild_indices()?;
        }
        Ok(())
    }

    /// Run a freshly copied child genome through the radiation hook.
    pub(crate) fn irradiate(&mut self, genome: &mut Genome) {
        self.radiation
            .irradiate(genome, self.config.radiation, &mut self.rng);
    }

    /// Replace a cell with food at its center, returning the food id.
    pub(crate) fn convert_to_food(&mut self, id: ObjectId) -> Option<ObjectId> {
        let Some(WorldObject::Cell(cell)) = self.remove(id) else {
            return None;
        };
        let mass = cell.mass.max(0.0).sqrt();
        match self.add(Food::new(cell.center, mass)) {
            Ok(food) => Some(food),
            Err(err) => {
                warn!(?err, cell = %id, "failed to leave food behind a dead cell");
                None
            }
        }
    }

    pub(crate) fn mark_indices_stale(&mut self) {
        self.indices_stale = true;
    }
}
