//! Configuration management for travelreport.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::PageGeometry;
use crate::report::{is_dialing_code, DEFAULT_PHONE_CODE};
use crate::store::DEFAULT_STORE_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "travelreport";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "reports.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TRAVELREPORT_`)
/// 2. TOML config file at `~/.config/travelreport/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Form configuration.
    pub form: FormConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/travelreport/reports.db`
    pub database_path: Option<PathBuf>,
    /// Key the report list is stored under.
    pub store_key: String,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported files are written to.
    /// Defaults to the user's download directory.
    pub output_dir: Option<PathBuf>,
    /// Start a new PDF page for the signatures when less than this many
    /// millimetres remain.
    pub page_break_threshold_mm: f32,
}

/// Form-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Dialing code a fresh draft starts with.
    pub default_phone_code: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            store_key: DEFAULT_STORE_KEY.to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            page_break_threshold_mm: PageGeometry::default().break_threshold_mm,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_phone_code: DEFAULT_PHONE_CODE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration, reading `config_path` or the default config file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("TRAVELREPORT_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
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
        if self.storage.store_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "store_key must not be empty".to_string(),
            });
        }

        if !is_dialing_code(&self.form.default_phone_code) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "unknown default_phone_code: {}",
                    self.form.default_phone_code
                ),
            });
        }

        let threshold = self.export.page_break_threshold_mm;
        let page_height = PageGeometry::default().height_mm;
        if !(threshold > 0.0 && threshold < page_height) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "page_break_threshold_mm must be between 0 and {page_height}, got {threshold}"
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export.output_dir.clone().unwrap_or_else(|| {
            dirs::download_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// PDF page geometry with the configured break threshold.
    #[must_use]
    pub fn page_geometry(&self) -> PageGeometry {
        PageGeometry {
            break_threshold_mm: self.export.page_break_threshold_mm,
            ..PageGeometry::default()
        }
    }
}
