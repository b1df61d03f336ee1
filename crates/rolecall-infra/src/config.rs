//! Configuration loader for Rolecall.
//!
//! Reads `config.toml` from the data directory (`~/.rolecall/` in production)
//! and deserializes it into [`RolecallConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use rolecall_types::config::RolecallConfig;

use crate::sqlite::pool::default_database_url;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`RolecallConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_config(data_dir: &Path) -> RolecallConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return RolecallConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RolecallConfig::default();
        }
    };

    match toml::from_str::<RolecallConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RolecallConfig::default()
        }
    }
}

/// Resolve the database URL: the configured override, else
/// `sqlite://{data_dir}/rolecall.db`.
pub fn database_url(config: &RolecallConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolecall_types::config::FlowConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.flow, FlowConfig::default());
        assert!(config.database_url.is_none());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
database_url = "sqlite://elsewhere.db"

[flow]
level_timeout_secs = 15
retry_invalid_level = true
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.flow.level_timeout_secs, 15);
        assert!(config.flow.retry_invalid_level);
        // Unset fields keep their defaults.
        assert_eq!(config.flow.meta_timeout_secs, 120);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://elsewhere.db"));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.flow, FlowConfig::default());
    }

    #[test]
    fn database_url_prefers_override() {
        let dir = Path::new("/data");
        let mut config = RolecallConfig::default();
        assert_eq!(database_url(&config, dir), "sqlite:///data/rolecall.db?mode=rwc");

        config.database_url = Some("sqlite::memory:".to_string());
        assert_eq!(database_url(&config, dir), "sqlite::memory:");
    }
}
