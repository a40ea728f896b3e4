use serde::{Deserialize, Serialize};

/// Tuning for the random landing search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Y at which each column scan starts.
    pub ceiling: i32,
    /// Lowest Y inspected (inclusive).
    pub floor: i32,
    /// Columns sampled before giving up.
    pub max_attempts: u32,
    /// Free cells needed above the ground.
    pub player_height: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ceiling: 200,
            floor: 0,
            max_attempts: 5,
            player_height: 2,
        }
    }
}

/// Tuning for the upward search applied to player-set destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VerticalSearchConfig {
    /// Cells inspected above the stored Y before falling back to it.
    pub max_height: i32,
    pub player_height: i32,
}

impl Default for VerticalSearchConfig {
    fn default() -> Self {
        Self {
            max_height: 128,
            player_height: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.ceiling, 200);
        assert_eq!(config.floor, 0);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.player_height, 2);
    }

    #[test]
    fn vertical_config_defaults() {
        let config = VerticalSearchConfig::default();
        assert_eq!(config.max_height, 128);
        assert_eq!(config.player_height, 2);
    }
}
