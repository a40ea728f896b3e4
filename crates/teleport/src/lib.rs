//! Delayed teleports: request, wait, watch for movement, then relocate.
//!
//! A request either relocates at once (no delay, or the actor holds the
//! bypass permission) or becomes a [`PendingAction`] in the
//! [`PendingActionRegistry`]. The host ticks each waiting actor; moving
//! beyond the cancel distance drops the action, and an action whose delay
//! has elapsed is handed to a [`warpgate_kernel::DeferredExecutor`] for the
//! [`TeleportExecutor`] to apply after the tick pass.
//!
//! # Invariants
//! - At most one pending action per actor.
//! - A ready action leaves the registry before its execution is submitted,
//!   so it executes at most once.
//! - Follow targets are resolved at execution time, never at request time.
//! - Every applied orientation is cardinal-snapped with zero pitch.

mod config;
mod error;
mod executor;
mod pending;
mod registry;
mod resolver;
mod rtp;

pub use config::{RtpConfig, TeleportConfig};
pub use error::{TargetFault, TeleportError};
pub use executor::TeleportExecutor;
pub use pending::{PendingAction, SuccessHook, Target, TeleportRequest};
pub use registry::{MOVED_MESSAGE, Outcome, PendingActionRegistry, TickStatus};
pub use resolver::{DestinationResolver, snap_cardinal};
pub use rtp::{CooldownRemaining, RTP_SUCCESS_MESSAGE, RandomTeleport, RtpError, RtpRoute, RtpTask};

pub fn crate_info() -> &'static str {
    "warpgate-teleport v0.1.0"
}
