use crate::{ObjectId, Tick};
use petri_index::IndexError;
use thiserror::Error;

/// Errors raised by the world container and its configuration.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// An object carrying a preassigned id collided with a live object.
    #[error("object id {0} is already in use")]
    DuplicateId(ObjectId),
    /// The preset id cannot be handed out: it is the unassigned sentinel or the id
    /// space above it is exhausted.
    #[error("object id {0} cannot be allocated")]
    IdExhausted(ObjectId),
}

/// Faults that abort a simulation tick.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    /// Force resolution diverged and produced a NaN or infinite position.
    #[error("cell {cell} has a non-finite position at tick {}", tick.0)]
    NonFinitePosition { cell: ObjectId, tick: Tick },
    /// A tick was requested with a negative or non-finite length in seconds.
    #[error("tick length must be non-negative and finite, got {0}")]
    InvalidTickLength(f64),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    World(#[from] WorldError),
}
