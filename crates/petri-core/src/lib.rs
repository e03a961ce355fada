//! Core simulation engine for the Petri workspace.
//!
//! Soft-bodied cells move, collide, split and trade nutrition inside a bounded world
//! of walls and decaying food. [`Simulation`] advances a [`World`] one fixed tick at a
//! time; [`Scheduler`] maps wall-clock time onto ticks.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cast;
pub mod config;
pub mod error;
pub mod genome;
pub mod geometry;
pub mod object;
pub mod pipeline;
pub mod scenario;
pub mod scheduler;
pub mod tools;
pub mod updater;
pub mod vector;
pub mod world;

pub use config::{SchedulerConfig, WorldConfig};
pub use error::{SimulationError, WorldError};
pub use genome::{CellType, Genome, GenomeError, GenomeNode, NoRadiation, Pigments, RadiationHook};
pub use object::{Cell, Connection, FOOD_DENSITY, Food, ObjectKey, ObjectKind, Wall, WorldObject};
pub use pipeline::{Simulation, TickSummary};
pub use scheduler::Scheduler;
pub use vector::Vector2;
pub use world::{CollisionIndices, World};

/// Identifier shared by cells, food and walls. Allocated from one increasing counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Placeholder carried by objects that have not been added to a world yet.
    pub const UNASSIGNED: Self = Self(u64::MAX);

    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != u64::MAX
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#unassigned")
        }
    }
}

/// High level simulation clock (ticks processed since the world was seeded).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}
