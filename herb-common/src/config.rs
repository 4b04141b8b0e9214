//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. Every key has a
//! built-in default, so a missing or partial file never prevents startup.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `HERB_ROOT_FOLDER`
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "HERB_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "herbarium.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Root folder for the database and working files
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database path (defaults to `<root_folder>/herbarium.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External name resolution service
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Import batch behavior
    #[serde(default)]
    pub import: ImportConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// External name resolution service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Base URL of the name matching service
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total wall-clock budget for retrying a failed request
    #[serde(default = "default_resolver_max_retry_wait_ms")]
    pub max_retry_wait_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retry_wait_ms: default_resolver_max_retry_wait_ms(),
        }
    }
}

/// Import batch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Agent id stamped on created taxon nodes
    #[serde(default = "default_creator_id")]
    pub creator_id: i64,

    /// Padding applied to both ends of a recorded batch window
    #[serde(default = "default_batch_window_buffer_ms")]
    pub batch_window_buffer_ms: u64,

    /// Maximum time to keep retrying a locked database write
    #[serde(default = "default_database_max_lock_wait_ms")]
    pub database_max_lock_wait_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            creator_id: default_creator_id(),
            batch_window_buffer_ms: default_batch_window_buffer_ms(),
            database_max_lock_wait_ms: default_database_max_lock_wait_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_resolver_max_retry_wait_ms() -> u64 {
    30_000
}

fn default_creator_id() -> i64 {
    1
}

fn default_batch_window_buffer_ms() -> u64 {
    1_000
}

fn default_database_max_lock_wait_ms() -> u64 {
    5_000
}

/// Default location of the TOML config file for this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("herb").join("herb.toml"))
}

/// Load TOML configuration
///
/// A missing file is not an error: a warning is logged and defaults are
/// returned. A file that exists but does not parse is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using built-in defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Resolve the database path: explicit TOML path, otherwise inside the root folder
pub fn resolve_database_path(root_folder: &Path, toml_config: &TomlConfig) -> PathBuf {
    toml_config
        .database_path
        .clone()
        .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("herb"))
        .unwrap_or_else(|| PathBuf::from("./herb_data"))
}
