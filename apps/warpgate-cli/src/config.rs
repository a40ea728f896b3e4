use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use warpgate_protect::ProtectionConfig;
use warpgate_teleport::{RtpConfig, TeleportConfig};

/// Everything the CLI reads from its YAML config file. Missing sections and
/// keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    pub teleport: TeleportConfig,
    pub rtp: RtpConfig,
    pub protection: ProtectionConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            tracing::debug!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
