/// Configuration system for repograph
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Graph store configuration
    pub store: StoreConfig,
}

/// Which backend holds the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Durable SQLite database (the default).
    Sqlite,
    /// In-memory store; the graph is discarded when the process exits.
    Memory,
}

/// Graph store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend: "sqlite" or "memory"
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// SQLite database file path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum SQLite pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./repograph.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            db_path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Config {
    /// Load configuration: file (if given) layered under env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(backend) = std::env::var("REPOGRAPH_STORE_BACKEND") {
            self.store.backend = match backend.as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "memory" => StoreBackend::Memory,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "REPOGRAPH_STORE_BACKEND".to_string(),
                        reason: format!("expected 'sqlite' or 'memory', got '{other}'"),
                    })
                }
            };
        }
        if let Ok(path) = std::env::var("REPOGRAPH_DB_PATH") {
            self.store.db_path = PathBuf::from(path);
        }
        if let Ok(max) = std::env::var("REPOGRAPH_DB_MAX_CONNECTIONS") {
            self.store.max_connections =
                max.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "REPOGRAPH_DB_MAX_CONNECTIONS".to_string(),
                    reason: format!("expected a positive integer, got '{max}'"),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_sqlite() {
        let config = Config::default();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.db_path, PathBuf::from("./repograph.db"));
        assert_eq!(config.store.max_connections, 5);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repograph.toml");
        std::fs::write(
            &path,
            "[store]\nbackend = \"memory\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.db_path, PathBuf::from("./repograph.db"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repograph.toml");
        std::fs::write(&path, "store = not toml").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
