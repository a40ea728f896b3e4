//! Spawn protection.
//!
//! [`ProtectedArea`] answers whether a position is protected: a square in X/Z
//! around the spawn point with an optional Y window. [`ProtectionGuard`]
//! turns that into cancel decisions for block and PvP events, and
//! [`RegionTracker`] reports actors crossing the boundary.
//!
//! # Invariants
//! - Containment is pure; only the guard and the tracker have side effects.
//! - Without a spawn point nothing is protected.

mod area;
mod config;
mod guard;
mod region;

pub use area::ProtectedArea;
pub use config::ProtectionConfig;
pub use guard::{BlockAction, DamageSource, Decision, PROTECTED_MESSAGE, PVP_MESSAGE, ProtectionGuard};
pub use region::{RegionTracker, Title, Transition};

pub fn crate_info() -> &'static str {
    "warpgate-protect v0.1.0"
}
