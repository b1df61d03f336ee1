//! Data directory layout.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "ROLECALL_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `ROLECALL_DATA_DIR` environment variable
/// 2. `~/.rolecall`
/// 3. `.rolecall` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn data_dir_from(env_dir: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = home {
        return home.join(".rolecall");
    }

    PathBuf::from(".rolecall")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(data_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        let dir = data_dir_from(Some("/srv/rc".to_string()), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, PathBuf::from("/srv/rc"));
    }

    #[test]
    fn blank_env_falls_back_to_home() {
        let dir = data_dir_from(Some("  ".to_string()), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, PathBuf::from("/home/u/.rolecall"));
    }

    #[test]
    fn no_home_uses_cwd() {
        assert_eq!(data_dir_from(None, None), PathBuf::from(".rolecall"));
    }

    #[tokio::test]
    async fn ensure_data_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_data_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
