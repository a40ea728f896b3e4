//! Shared value types: actor and world identifiers, coordinates, orientations
//! and the per-cell material model every other crate speaks.

mod types;

pub use types::{ActorId, Cell, Coordinate, Material, Orientation, WorldId};
