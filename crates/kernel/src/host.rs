//! Interfaces the relocation engine consumes from its host.
//!
//! All of them are object safe so services can hold `Arc<dyn Trait>` and be
//! constructed without a live host.

use futures::future::BoxFuture;
use glam::{DVec3, IVec3};
use warpgate_common::{ActorId, Coordinate, Material, Orientation, WorldId};

use crate::terrain::ColumnSnapshot;

/// Block and fluid lookups against the host's worlds.
pub trait WorldQuery: Send + Sync {
    /// Whether `world` is currently loaded.
    fn is_world_loaded(&self, world: &WorldId) -> bool;

    /// Whether the column at block `(x, z)` can be read without fetching.
    fn is_column_resident(&self, world: &WorldId, x: i32, z: i32) -> bool;

    /// Material at `pos`. Non-resident or unknown cells read as `Empty`.
    fn block_material(&self, world: &WorldId, pos: IVec3) -> Material;

    /// Whether a fluid occupies `pos`. Non-resident cells read as `false`.
    fn has_fluid(&self, world: &WorldId, pos: IVec3) -> bool;

    /// Fetch the column at block `(x, z)` without blocking the caller.
    /// Resolves to `None` if the world or column cannot be produced.
    fn fetch_column(&self, world: &WorldId, x: i32, z: i32)
    -> BoxFuture<'static, Option<ColumnSnapshot>>;
}

/// Live view of an actor as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub coordinate: Coordinate,
    /// False once the host's reference to the actor has gone stale.
    pub valid: bool,
}

impl ActorSnapshot {
    pub fn position(&self) -> DVec3 {
        self.coordinate.position
    }

    pub fn world(&self) -> &WorldId {
        &self.coordinate.world
    }

    pub fn orientation(&self) -> Orientation {
        self.coordinate.orientation
    }
}

/// Lookup of connected actors. `None` means the actor is not connected.
pub trait ActorDirectory: Send + Sync {
    fn resolve(&self, actor: ActorId) -> Option<ActorSnapshot>;
}

pub trait PermissionCheck: Send + Sync {
    fn has_permission(&self, actor: ActorId, permission: &str) -> bool;
}

/// Fire-and-forget delivery of a user-facing message.
pub trait Notifier: Send + Sync {
    fn notify(&self, actor: ActorId, message: &str);
}

/// Stages a relocation on the host. The host applies it on its own schedule,
/// the same way it applies any other component mutation.
pub trait Relocator: Send + Sync {
    /// Returns false if the host no longer knows the actor.
    fn relocate(&self, actor: ActorId, destination: Coordinate) -> bool;
}

/// Work that must run after the current tick pass.
pub type DeferredJob = Box<dyn FnOnce() + Send + 'static>;

/// Accepts jobs to run once, strictly after the current tick pass finishes.
pub trait DeferredExecutor {
    fn submit(&self, job: DeferredJob);
}
