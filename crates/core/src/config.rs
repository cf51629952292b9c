//! Configuration management
//!
//! This module handles loading, saving, and migrating the bucketview
//! configuration file. The file is stored in TOML format at
//! `$BV_CONFIG_DIR/config.toml`, falling back to
//! `~/.config/bucketview/config.toml`.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BV_CONFIG_DIR";

/// Default number of objects per listing page
const DEFAULT_LIST_LIMIT: usize = 20;

/// Default upper bound for a requested listing page size
const DEFAULT_MAX_LIMIT: usize = 1000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Listing page sizes
    #[serde(default)]
    pub listing: ListingConfig,

    /// Container permission policy
    #[serde(default)]
    pub containers: ContainerPolicy,

    /// Storage backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            listing: ListingConfig::default(),
            containers: ContainerPolicy::default(),
            backend: None,
        }
    }
}

/// Listing page size settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page size used when none (or an invalid one) is requested
    #[serde(default = "default_list_limit")]
    pub default_limit: usize,

    /// Largest page size a caller may request
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

fn default_max_limit() -> usize {
    DEFAULT_MAX_LIMIT
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_list_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl ListingConfig {
    /// Resolve a requested page size against configuration and backend bounds
    ///
    /// A request is honoured when it is positive, within `max_limit`, and
    /// leaves room for the one-object overfetch below `backend_max`.
    pub fn resolve_limit(&self, requested: Option<usize>, backend_max: Option<usize>) -> usize {
        let valid = |limit: usize| {
            limit > 0
                && limit <= self.max_limit
                && backend_max.is_none_or(|max| limit < max)
        };
        match requested {
            Some(limit) if valid(limit) => limit,
            _ => self.default_limit,
        }
    }
}

/// Which containers may be browsed
///
/// A non-empty allow list admits only the listed names; otherwise every name
/// not on the deny list is admitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerPolicy {
    /// Container names explicitly allowed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    /// Container names explicitly denied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

impl ContainerPolicy {
    /// Whether the container may be accessed
    pub fn permits(&self, name: &str) -> bool {
        if !self.allow.is_empty() {
            return self.allow.iter().any(|a| a == name);
        }
        !self.deny.iter().any(|d| d == name)
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// S3-compatible flat object store
    S3(S3Settings),
    /// Local directory tree
    Filesystem(FilesystemSettings),
}

/// Credentials and endpoint of an S3-compatible service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    /// Access key ID
    pub account: String,

    /// Secret access key
    pub secret: String,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint URL (AWS when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[serde(default)]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl S3Settings {
    /// Create settings with required fields
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret: secret.into(),
            region: default_region(),
            endpoint: None,
            path_style: false,
        }
    }
}

/// Root of a filesystem-backed store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemSettings {
    /// Directory whose subdirectories are the containers
    pub root: PathBuf,
}

impl Config {
    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.listing.default_limit == 0 || self.listing.default_limit > self.listing.max_limit
        {
            return Err(Error::Config(format!(
                "listing.default_limit must be between 1 and max_limit ({})",
                self.listing.max_limit
            )));
        }

        if let Some(BackendConfig::S3(s3)) = &self.backend {
            if let Some(endpoint) = &s3.endpoint {
                url::Url::parse(endpoint)
                    .map_err(|e| Error::Config(format!("Invalid endpoint '{endpoint}': {e}")))?;
            }
        }

        Ok(())
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("bucketview"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {e}", self.config_path.display()))
        })?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade bucketview.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        let io_err =
            |e: std::io::Error| Error::Config(format!("Cannot write {}: {e}", self.config_path.display()));

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("TOML serialization error: {e}")))?;
        std::fs::write(&self.config_path, content).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions).map_err(io_err)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;

        // No layout changes between released schema versions yet.
        tracing::debug!(from = config.schema_version, to = SCHEMA_VERSION, "Migrating configuration");
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
