//! Configuration management.
//!
//! Configuration is loaded once at startup and copied into clients; nothing
//! mutates it afterwards.
//!
//! # Configuration File Format
//!
//! ```toml
//! [vndb]
//! endpoint = "https://api.vndb.org/kana"
//! results_limit = 100
//! timeout_secs = 30
//!
//! [sampler]
//! attempts = 3
//! min_votecount = 30
//! min_rating = 70
//! floor_votecount = 100
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Every key can be overridden from the environment with the
//! `VNDB_LOOKUP_` prefix and `__` as the section separator, e.g.
//! `VNDB_LOOKUP_VNDB__TIMEOUT_SECS=10`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::DEFAULT_RESULTS_LIMIT;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "VNDB_LOOKUP";

/// Config file name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "vndb-lookup.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// VNDB API settings
    #[serde(default)]
    pub vndb: VndbConfig,

    /// Random sampling settings
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// VNDB API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VndbConfig {
    /// Base URL of the API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// `results` sent with list queries
    #[serde(default = "default_results_limit")]
    pub results_limit: u32,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for VndbConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            results_limit: default_results_limit(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.vndb.org/kana".to_string()
}

fn default_results_limit() -> u32 {
    DEFAULT_RESULTS_LIMIT
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Random sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Draws before giving up
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Minimum vote count of the character's VN
    #[serde(default = "default_min_votecount")]
    pub min_votecount: u32,

    /// Minimum rating (10-100) of the character's VN
    #[serde(default = "default_min_rating")]
    pub min_rating: u32,

    /// Vote count required alongside the random id floor
    #[serde(default = "default_floor_votecount")]
    pub floor_votecount: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            min_votecount: default_min_votecount(),
            min_rating: default_min_rating(),
            floor_votecount: default_floor_votecount(),
        }
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_min_votecount() -> u32 {
    30
}

fn default_min_rating() -> u32 {
    70
}

fn default_floor_votecount() -> u32 {
    100
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, plain text otherwise
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigFileError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Configuration from the environment and defaults only
pub fn get_config() -> Result<Config, ConfigFileError> {
    let settings = config::Config::builder()
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Save configuration as TOML
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Default location under the user config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vndb-lookup").join("config.toml"))
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}
