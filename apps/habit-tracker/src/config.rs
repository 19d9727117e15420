//! Configuration for habit tracker.

use crate::store::{SeedPolicy, StoreOptions, DEFAULT_STORAGE_KEY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from default path.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .map(|s| Self::from_toml(&s))
            .unwrap_or_default()
    }

    /// Parse configuration, falling back to defaults when malformed.
    pub fn from_toml(content: &str) -> Self {
        toml::from_str(content).unwrap_or_default()
    }

    /// Get configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "habit-tracker")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Get data directory.
    pub fn data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "habit-tracker").map(|d| d.data_dir().to_path_buf())
    }

    /// Database path, honoring the configured override.
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("habits.db")))
            .unwrap_or_else(|| "habits.db".into())
    }

    /// Log file path, honoring the configured override.
    pub fn log_path(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("habit-tracker.log")))
            .unwrap_or_else(|| "habit-tracker.log".into())
    }

    /// Options for opening the habit store.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key: self.storage.key.clone(),
            seed: self.storage.seed,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; defaults to the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Key the habit collection is stored under.
    #[serde(default = "default_key")]
    pub key: String,
    /// What to create on first run.
    #[serde(default)]
    pub seed: SeedPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_key(),
            seed: SeedPolicy::Examples,
        }
    }
}

fn default_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Header date format string.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Show the last-seven-days strip next to each habit.
    #[serde(default = "default_true")]
    pub show_weekly_strip: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            show_weekly_strip: true,
        }
    }
}

fn default_date_format() -> String {
    "%A, %B %d, %Y".to_string()
}

fn default_true() -> bool {
    true
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log file; defaults to the data directory.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [storage]
            seed = "empty"

            [display]
            show_weekly_strip = false
            "#,
        );
        assert_eq!(config.storage.seed, SeedPolicy::Empty);
        assert_eq!(config.storage.key, DEFAULT_STORAGE_KEY);
        assert!(!config.display.show_weekly_strip);
        assert_eq!(config.display.date_format, "%A, %B %d, %Y");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let config = Config::from_toml("storage = [");
        assert_eq!(config.storage.seed, SeedPolicy::Examples);
    }

    #[test]
    fn test_path_overrides() {
        let config = Config::from_toml(
            r#"
            [storage]
            path = "/tmp/custom.db"
            key = "mine"

            [logging]
            file = "/tmp/custom.log"
            "#,
        );
        assert_eq!(config.db_path(), PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/custom.log"));
        assert_eq!(config.store_options().key, "mine");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back = Config::from_toml(&text);
        assert_eq!(back.storage.key, config.storage.key);
        assert_eq!(back.display.date_format, config.display.date_format);
    }
}
