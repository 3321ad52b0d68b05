use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::store::JsonFileStore;

/// Log levels accepted in `general.log_level`
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Default directory for saved topologies and progress records
pub const DEFAULT_STORAGE_PATH: &str = "netsim_data";

/// Top-level simulator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::InvalidGeneral(format!(
                    "unknown log_level '{}', expected one of {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }

        if self.session.max_console_lines == Some(0) {
            return Err(ConfigError::InvalidSession(
                "max_console_lines must be at least 1".to_string(),
            ));
        }
        if let Some(lease_time) = self.session.lease_time {
            if lease_time.as_secs() == 0 {
                return Err(ConfigError::InvalidSession(
                    "lease_time must be at least one second".to_string(),
                ));
            }
        }

        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorage(
                "storage path cannot be empty".to_string(),
            ));
        }

        if let Some(catalog) = &self.catalog {
            if catalog.path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidCatalog(
                    "catalog path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Settings applied to every new editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed for ids, MAC addresses and display names; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Console lines kept before the oldest are dropped; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_console_lines: Option<usize>,
    /// Lease time stamped into new DHCP servers, e.g. "12h"
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub lease_time: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl StorageConfig {
    /// File store rooted at the configured path
    pub fn open(&self) -> JsonFileStore {
        JsonFileStore::new(&self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid session configuration: {0}")]
    InvalidSession(String),
    #[error("Invalid storage configuration: {0}")]
    InvalidStorage(String),
    #[error("Invalid catalog configuration: {0}")]
    InvalidCatalog(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TopologyStore;

    #[test]
    fn test_storage_path_roots_the_file_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let yaml = format!("storage:\n  path: {}\n", dir.path().display());
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        let store = config.storage.open();
        assert_eq!(store.root(), dir.path());

        store
            .save_progress("alice", &crate::exercise::ProgressTracker::new())
            .unwrap();
        assert!(dir.path().join("progress").join("alice.json").is_file());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.path, PathBuf::from("netsim_data"));
        assert_eq!(config.session, SessionConfig::default());
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
general:
  log_level: debug
session:
  seed: 42
  max_console_lines: 200
  lease_time: 12h
storage:
  path: /var/lib/netsim
catalog:
  path: catalog/exercises.yaml
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.seed, Some(42));
        assert_eq!(config.session.max_console_lines, Some(200));
        assert_eq!(config.session.lease_time, Some(Duration::from_secs(12 * 3600)));
        assert_eq!(
            config.catalog.map(|c| c.path),
            Some(PathBuf::from("catalog/exercises.yaml"))
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        config.general.log_level = Some("loud".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGeneral(_))));

        let mut config = Config::default();
        config.session.max_console_lines = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSession(_))));

        let mut config = Config::default();
        config.session.lease_time = Some(Duration::from_millis(10));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSession(_))));

        let mut config = Config::default();
        config.storage.path = PathBuf::new();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidStorage(_))));
    }
}
