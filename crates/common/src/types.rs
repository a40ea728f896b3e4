use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a connected actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First block of the uuid is enough to tell actors apart in logs.
        let text = self.0.to_string();
        f.write_str(&text[..8])
    }
}

/// Name of a world (dimension / region) hosted by the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Look direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Orientation {
    pub const fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

/// A fully specified place in some world: position plus orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub world: WorldId,
    pub position: DVec3,
    pub orientation: Orientation,
}

impl Coordinate {
    pub fn new(world: impl Into<WorldId>, position: DVec3, orientation: Orientation) -> Self {
        Self {
            world: world.into(),
            position,
            orientation,
        }
    }

    /// The block containing this coordinate.
    pub fn block(&self) -> IVec3 {
        self.position.floor().as_ivec3()
    }
}

impl From<String> for WorldId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Block material as seen by the relocation engine. Anything that is not
/// solid can be stood in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Empty,
    Solid,
}

/// One cell of a column: its block material plus whether a fluid occupies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub material: Material,
    pub fluid: bool,
}

impl Cell {
    pub const AIR: Cell = Cell {
        material: Material::Empty,
        fluid: false,
    };
    pub const SOLID: Cell = Cell {
        material: Material::Solid,
        fluid: false,
    };
    pub const FLUID: Cell = Cell {
        material: Material::Empty,
        fluid: true,
    };

    pub fn is_solid(&self) -> bool {
        self.material == Material::Solid
    }

    /// Neither solid nor fluid.
    pub fn is_safe(&self) -> bool {
        !self.is_solid() && !self.fluid
    }
}
