//! Configuration types for Rolecall.
//!
//! `RolecallConfig` represents the top-level `config.toml` that controls
//! conversation timeouts, retry behavior, and the database location.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.rolecall/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolecallConfig {
    /// Character creation flow settings.
    #[serde(default)]
    pub flow: FlowConfig,

    /// Overrides the default `sqlite://{data_dir}/rolecall.db` location.
    #[serde(default)]
    pub database_url: Option<String>,
}

/// Timeouts and retry policy for the interactive create flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_description_timeout_secs")]
    pub description_timeout_secs: u64,

    #[serde(default = "default_level_timeout_secs")]
    pub level_timeout_secs: u64,

    /// Applies to each meta attempt separately; a retry gets a fresh window.
    #[serde(default = "default_meta_timeout_secs")]
    pub meta_timeout_secs: u64,

    /// Re-prompt on a non-numeric level instead of failing the flow.
    #[serde(default)]
    pub retry_invalid_level: bool,
}

fn default_description_timeout_secs() -> u64 {
    120
}

fn default_level_timeout_secs() -> u64 {
    60
}

fn default_meta_timeout_secs() -> u64 {
    120
}

impl FlowConfig {
    pub fn description_timeout(&self) -> Duration {
        Duration::from_secs(self.description_timeout_secs)
    }

    pub fn level_timeout(&self) -> Duration {
        Duration::from_secs(self.level_timeout_secs)
    }

    pub fn meta_timeout(&self) -> Duration {
        Duration::from_secs(self.meta_timeout_secs)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            description_timeout_secs: default_description_timeout_secs(),
            level_timeout_secs: default_level_timeout_secs(),
            meta_timeout_secs: default_meta_timeout_secs(),
            retry_invalid_level: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_config_default_values() {
        let flow = FlowConfig::default();
        assert_eq!(flow.description_timeout(), Duration::from_secs(120));
        assert_eq!(flow.level_timeout(), Duration::from_secs(60));
        assert_eq!(flow.meta_timeout(), Duration::from_secs(120));
        assert!(!flow.retry_invalid_level);
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: RolecallConfig = toml::from_str("").unwrap();
        assert_eq!(config.flow, FlowConfig::default());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_config_deserialize_partial_flow_section() {
        let toml_str = r#"
database_url = "sqlite:///tmp/rc.db"

[flow]
level_timeout_secs = 30
retry_invalid_level = true
"#;
        let config: RolecallConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite:///tmp/rc.db"));
        assert_eq!(config.flow.level_timeout_secs, 30);
        assert!(config.flow.retry_invalid_level);
        // Unset fields keep their defaults
        assert_eq!(config.flow.description_timeout_secs, 120);
        assert_eq!(config.flow.meta_timeout_secs, 120);
    }
}
