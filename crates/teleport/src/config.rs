use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warpgate_search::{SearchConfig, VerticalSearchConfig};

/// Delayed teleport tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TeleportConfig {
    /// Seconds an actor must stand still before relocating. Zero or less
    /// relocates immediately.
    pub delay_seconds: i32,
    /// Displacement from the start position that cancels the wait.
    pub cancel_distance: f64,
    /// Holders skip the delay.
    pub bypass_permission: String,
    /// Upward search applied to player-set destinations.
    pub safe_search: VerticalSearchConfig,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            delay_seconds: 3,
            cancel_distance: 2.0,
            bypass_permission: "warpgate.teleport.bypass".to_owned(),
            safe_search: VerticalSearchConfig::default(),
        }
    }
}

/// Random teleport tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RtpConfig {
    /// Search radius per world. Worlds missing here have random teleport
    /// disabled.
    pub radii: BTreeMap<String, i32>,
    /// World used when the actor's own world has no radius.
    pub default_world: String,
    pub cooldown_seconds: u64,
    pub cooldown_bypass_permission: String,
    pub search: SearchConfig,
}

impl Default for RtpConfig {
    fn default() -> Self {
        Self {
            radii: BTreeMap::from([("overworld".to_owned(), 5000)]),
            default_world: "overworld".to_owned(),
            cooldown_seconds: 300,
            cooldown_bypass_permission: "warpgate.rtp.cooldown.bypass".to_owned(),
            search: SearchConfig::default(),
        }
    }
}

impl RtpConfig {
    pub fn radius(&self, world: &str) -> Option<i32> {
        self.radii.get(world).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teleport_defaults() {
        let config = TeleportConfig::default();
        assert_eq!(config.delay_seconds, 3);
        assert_eq!(config.cancel_distance, 2.0);
        assert_eq!(config.safe_search.max_height, 128);
    }

    #[test]
    fn rtp_radius_lookup() {
        let config = RtpConfig::default();
        assert_eq!(config.radius("overworld"), Some(5000));
        assert_eq!(config.radius("nether"), None);
        assert_eq!(config.search.max_attempts, 5);
    }
}
