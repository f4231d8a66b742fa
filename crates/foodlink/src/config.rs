//! Configuration management for foodlink.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::import::CsvFiles;
use crate::storage::DeletePolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "foodlink";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "foodlink.db";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "FOODLINK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FOODLINK_`, `__` between
///    section and key, e.g. `FOODLINK_DATABASE__PATH`)
/// 2. TOML config file at `~/.config/foodlink/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// CSV import configuration.
    pub import: ImportConfig,
    /// Report configuration.
    pub report: ReportConfig,
}

/// Database-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/foodlink/foodlink.db`
    pub path: Option<PathBuf>,
    /// Schema variant used when the database is first created.
    pub delete_policy: DeletePolicy,
}

/// CSV import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Directory holding the CSV files. Import is disabled when unset.
    pub data_dir: Option<PathBuf>,
    /// Import into empty tables every time the database is opened.
    pub load_on_open: bool,
    /// Providers file name, relative to `data_dir`.
    pub providers_file: String,
    /// Receivers file name, relative to `data_dir`.
    pub receivers_file: String,
    /// Food listings file name, relative to `data_dir`.
    pub food_listings_file: String,
    /// Claims file name, relative to `data_dir`.
    pub claims_file: String,
    /// Field delimiter.
    pub delimiter: char,
}

/// Report-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows shown by top-N analyses when no limit is given.
    pub top_limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            load_on_open: true,
            providers_file: "providers_clean_dataset.csv".to_string(),
            receivers_file: "receivers_clean_dataset.csv".to_string(),
            food_listings_file: "food_listing_clean_dataset.csv".to_string(),
            claims_file: "claims_clean_dataset.csv".to_string(),
            delimiter: ',',
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_limit: 1 }
    }
}

impl ImportConfig {
    /// The four CSV files inside `dir`.
    ///
    /// Call after [`Config::validate`]; a non-ASCII delimiter falls back
    /// to a comma.
    #[must_use]
    pub fn files_in(&self, dir: &Path) -> CsvFiles {
        CsvFiles {
            providers: dir.join(&self.providers_file),
            receivers: dir.join(&self.receivers_file),
            food_listings: dir.join(&self.food_listings_file),
            claims: dir.join(&self.claims_file),
            delimiter: u8::try_from(self.delimiter).unwrap_or(b','),
        }
    }

    /// The CSV files inside the configured data directory, if any.
    #[must_use]
    pub fn files(&self) -> Option<CsvFiles> {
        self.data_dir.as_deref().map(|dir| self.files_in(dir))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FOODLINK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.report.top_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "report.top_limit must be greater than 0".to_string(),
            });
        }

        for (key, name) in [
            ("providers_file", &self.import.providers_file),
            ("receivers_file", &self.import.receivers_file),
            ("food_listings_file", &self.import.food_listings_file),
            ("claims_file", &self.import.claims_file),
        ] {
            if name.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("import.{key} must not be empty"),
                });
            }
        }

        if !self.import.delimiter.is_ascii() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "import.delimiter must be a single ASCII character, got '{}'",
                    self.import.delimiter
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.database.path.is_none());
        assert_eq!(config.database.delete_policy, DeletePolicy::Cascade);
        assert!(config.import.data_dir.is_none());
        assert!(config.import.load_on_open);
        assert_eq!(config.report.top_limit, 1);
    }

    #[test]
    fn test_default_import_config() {
        let import = ImportConfig::default();

        assert_eq!(import.providers_file, "providers_clean_dataset.csv");
        assert_eq!(import.receivers_file, "receivers_clean_dataset.csv");
        assert_eq!(import.food_listings_file, "food_listing_clean_dataset.csv");
        assert_eq!(import.claims_file, "claims_clean_dataset.csv");
        assert_eq!(import.delimiter, ',');
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_top_limit() {
        let mut config = Config::default();
        config.report.top_limit = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("top_limit"));
    }

    #[test]
    fn test_validate_empty_file_name() {
        let mut config = Config::default();
        config.import.claims_file = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("claims_file"));
    }

    #[test]
    fn test_validate_non_ascii_delimiter() {
        let mut config = Config::default();
        config.import.delimiter = '§';

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("delimiter"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("foodlink.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.database.path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_files_require_data_dir() {
        let mut config = Config::default();
        assert!(config.import.files().is_none());

        config.import.data_dir = Some(PathBuf::from("/data"));
        config.import.delimiter = ';';
        let files = config.import.files().unwrap();
        assert_eq!(
            files.providers,
            PathBuf::from("/data/providers_clean_dataset.csv")
        );
        assert_eq!(
            files.food_listings,
            PathBuf::from("/data/food_listing_clean_dataset.csv")
        );
        assert_eq!(files.delimiter, b';');
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("foodlink"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_toml_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "foodlink.toml",
                r#"
                [database]
                path = "/srv/foodlink/donations.db"
                delete_policy = "restrict"

                [report]
                top_limit = 3
                "#,
            )?;
            jail.set_env("FOODLINK_REPORT__TOP_LIMIT", "5");
            jail.set_env("FOODLINK_IMPORT__DATA_DIR", "/srv/foodlink/csv");

            let config = Config::load_from(Some(PathBuf::from("foodlink.toml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.database_path(), PathBuf::from("/srv/foodlink/donations.db"));
            assert_eq!(config.database.delete_policy, DeletePolicy::Restrict);
            assert_eq!(config.report.top_limit, 5);
            assert_eq!(config.import.data_dir, Some(PathBuf::from("/srv/foodlink/csv")));
            assert!(config.import.load_on_open);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.create_file("foodlink.toml", "[report]\ntop_limit = 0\n")?;

            let err = Config::load_from(Some(PathBuf::from("foodlink.toml"))).unwrap_err();
            assert!(matches!(err, Error::ConfigValidation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["database"]["delete_policy"], "cascade");
        assert_eq!(json["report"]["top_limit"], 1);
    }

    #[test]
    fn test_import_config_deserialize() {
        let json = r#"{"data_dir": "/data", "load_on_open": false}"#;
        let import: ImportConfig = serde_json::from_str(json).unwrap();
        assert_eq!(import.data_dir, Some(PathBuf::from("/data")));
        assert!(!import.load_on_open);
        assert_eq!(import.claims_file, "claims_clean_dataset.csv");
    }
}
