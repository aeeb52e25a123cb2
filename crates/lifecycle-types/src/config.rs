//! Configuration loading for index-lifecycle.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! Default config file lives at ~/.config/index-lifecycle/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::LifecycleError;
use crate::search::SearchType;

const APP_NAME: &str = "index-lifecycle";

/// Metadata store call policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Deadline for each individual store call (ms).
    #[serde(default = "default_store_timeout")]
    pub timeout_ms: u64,

    /// Allow one automatic retry of idempotent reads.
    #[serde(default = "default_true")]
    pub read_retry: bool,

    /// First backoff interval before a read retry (ms).
    #[serde(default = "default_retry_initial_backoff")]
    pub retry_initial_backoff_ms: u64,

    /// Upper bound on the backoff interval (ms).
    #[serde(default = "default_retry_max_backoff")]
    pub retry_max_backoff_ms: u64,
}

fn default_store_timeout() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_retry_initial_backoff() -> u64 {
    100
}

fn default_retry_max_backoff() -> u64 {
    1_000
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_store_timeout(),
            read_retry: default_true(),
            retry_initial_backoff_ms: default_retry_initial_backoff(),
            retry_max_backoff_ms: default_retry_max_backoff(),
        }
    }
}

impl StoreSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("store.timeout_ms must be > 0".to_string());
        }
        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(format!(
                "store.retry_initial_backoff_ms ({}) must not exceed \
                 store.retry_max_backoff_ms ({})",
                self.retry_initial_backoff_ms, self.retry_max_backoff_ms
            ));
        }
        Ok(())
    }

    /// Per-call deadline as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retrieval facade defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Results requested from the search executor
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Search type used when the caller does not pick one
    #[serde(default)]
    pub search_type: SearchType,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            search_type: SearchType::default(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB metadata directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metadata store call policy
    #[serde(default)]
    pub store: StoreSettings,

    /// Retrieval defaults
    #[serde(default)]
    pub retrieval: RetrievalSettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join("metadata"))
        .unwrap_or_else(|| PathBuf::from("./metadata"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            store: StoreSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/index-lifecycle/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (LIFECYCLE_*, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, LifecycleError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| LifecycleError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| LifecycleError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: LIFECYCLE_DB_PATH, LIFECYCLE_STORE__TIMEOUT_MS, ...
        builder = builder.add_source(
            Environment::with_prefix("LIFECYCLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| LifecycleError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| LifecycleError::Config(e.to_string()))?;

        settings.store.validate().map_err(LifecycleError::Config)?;
        Ok(settings)
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.store.timeout_ms, 5_000);
        assert!(settings.store.read_retry);
        assert_eq!(settings.retrieval.top_k, 4);
        assert_eq!(settings.retrieval.search_type, SearchType::NearestNeighbor);
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.store.retry_initial_backoff_ms, 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lifecycle-test.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"db_path = "/var/lib/lifecycle"

[store]
timeout_ms = 250
read_retry = false

[retrieval]
top_k = 10
search_type = "lexical""#
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.db_path, "/var/lib/lifecycle");
        assert_eq!(settings.store.timeout_ms, 250);
        assert!(!settings.store.read_retry);
        assert_eq!(settings.retrieval.top_k, 10);
        assert_eq!(settings.retrieval.search_type, SearchType::Lexical);
    }

    #[test]
    fn test_store_validation() {
        let mut store = StoreSettings::default();
        assert!(store.validate().is_ok());

        store.timeout_ms = 0;
        assert!(store.validate().is_err());

        store.timeout_ms = 100;
        store.retry_initial_backoff_ms = 5_000;
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_expanded_db_path_passthrough() {
        let settings = Settings {
            db_path: "/tmp/metadata".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.expanded_db_path(), PathBuf::from("/tmp/metadata"));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.store.timeout_ms, settings.store.timeout_ms);
        assert_eq!(decoded.retrieval.search_type, settings.retrieval.search_type);
    }
}
