use serde::{Deserialize, Serialize};

/// Protected spawn area settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProtectionConfig {
    pub enabled: bool,
    /// Half-width of the protected square around spawn, in blocks.
    pub radius: i32,
    /// Lowest protected Y, or -1 for no lower bound.
    pub min_y: i32,
    /// Highest protected Y, or -1 for no upper bound.
    pub max_y: i32,
    /// Players inside the area cannot be hurt by other players.
    #[serde(alias = "prevent-pvp")]
    pub invulnerable: bool,
    pub bypass_permission: String,
    pub show_titles: bool,
    pub enter_title: String,
    pub enter_subtitle: String,
    pub exit_title: String,
    pub exit_subtitle: String,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 16,
            min_y: -1,
            max_y: -1,
            invulnerable: true,
            bypass_permission: "warpgate.spawn.bypass".to_owned(),
            show_titles: true,
            enter_title: "Entering Spawn".to_owned(),
            enter_subtitle: "This is a protected area".to_owned(),
            exit_title: "Leaving Spawn".to_owned(),
            exit_subtitle: "You can now build".to_owned(),
        }
    }
}
