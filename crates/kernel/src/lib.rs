//! Kernel: the seams between the relocation engine and its host simulation.
//!
//! # Invariants
//! - The engine never reaches into host state directly; every read and write
//!   goes through the traits in [`host`].
//! - Mutations staged during a tick pass run only when the pass has finished
//!   and the [`CommandBuffer`] is drained.
//!
//! [`World`] is a reference in-memory host implementing every trait, used by
//! tests, benchmarks and the CLI.

pub mod deferred;
pub mod host;
pub mod terrain;
pub mod world;

pub use deferred::CommandBuffer;
pub use host::{
    ActorDirectory, ActorSnapshot, DeferredExecutor, DeferredJob, Notifier, PermissionCheck,
    Relocator, WorldQuery,
};
pub use terrain::{CHUNK_SIZE, ChunkCoord, ColumnSnapshot, Terrain};
pub use world::{ActorData, SharedWorld, World, WorldEvent};
