//! Configuration loading
//!
//! Bootstrap configuration is read once at startup and handed to component
//! constructors. Nothing here is global.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (applied through [`ConfigOverrides`], which
//!    also carry the `BOOKVAULT_*` environment fallbacks)
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default Google Books volumes endpoint
pub const DEFAULT_CATALOG_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Top-level BookVault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Flat directory holding downloaded covers, one file per book id
    #[serde(default = "default_cover_cache_dir")]
    pub cover_cache_dir: PathBuf,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// External catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Catalog (Google Books) client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Volumes search endpoint
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// Result cap for free-text searches
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Result cap for ISBN searches
    #[serde(default = "default_isbn_max_results")]
    pub isbn_max_results: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Values supplied on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub cover_cache_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("bookvault.db")
}

fn default_cover_cache_dir() -> PathBuf {
    PathBuf::from("cover_cache")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_max_results() -> u32 {
    20
}

fn default_isbn_max_results() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            cover_cache_dir: default_cover_cache_dir(),
            server: ServerConfig::default(),
            catalog: CatalogConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            max_results: default_max_results(),
            isbn_max_results: default_isbn_max_results(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// used. A file that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides (highest priority)
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.database_path {
            self.database_path = path;
        }
        if let Some(dir) = overrides.cover_cache_dir {
            self.cover_cache_dir = dir;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self
    }

    /// Validate values that would otherwise fail late
    pub fn validate(&self) -> Result<()> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(Error::Config("catalog.base_url must not be empty".to_string()));
        }
        if self.catalog.max_results == 0 || self.catalog.isbn_max_results == 0 {
            return Err(Error::Config("catalog result caps must be at least 1".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Default configuration file location for the platform
///
/// `<config_dir>/bookvault/config.toml`, or `./bookvault.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("bookvault").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("bookvault.toml"))
}
