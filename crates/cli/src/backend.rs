//! Backend selection
//!
//! Builds the one Connection the process uses from the `[backend]` table
//! of the configuration file.

use std::sync::Arc;

use bv_core::{BackendConfig, Config, ConfigManager, Connection, Container, Error, Result};
use bv_fs::FsConnection;
use bv_s3::S3Connection;

/// Loaded configuration plus the connection built from it
pub struct Backend {
    pub config: Config,
    pub connection: Arc<dyn Connection>,
}

impl Backend {
    /// Load the configuration file and connect to the configured backend
    pub fn load() -> Result<Self> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        tracing::debug!(path = %manager.config_path().display(), "Loaded configuration");
        Self::from_config(config)
    }

    /// Connect to the backend described by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let connection = open_connection(&config)?;
        Ok(Self { config, connection })
    }

    /// Open a permitted container
    pub async fn container(&self, name: &str) -> Result<Arc<dyn Container>> {
        self.connection.get_container(name).await
    }

    /// Page size for a listing request, bounded by configuration and backend
    pub fn list_limit(&self, requested: Option<usize>) -> usize {
        self.config
            .listing
            .resolve_limit(requested, self.connection.max_list())
    }
}

/// Build the connection selected by the configuration
pub fn open_connection(config: &Config) -> Result<Arc<dyn Connection>> {
    let policy = config.containers.clone();
    match &config.backend {
        Some(BackendConfig::S3(settings)) => {
            tracing::debug!(account = %settings.account, "Using S3 backend");
            Ok(Arc::new(S3Connection::new(settings.clone(), policy)))
        }
        Some(BackendConfig::Filesystem(settings)) => {
            tracing::debug!(root = %settings.root.display(), "Using filesystem backend");
            Ok(Arc::new(FsConnection::new(settings.root.clone(), policy)))
        }
        None => Err(Error::Config(
            "No backend configured; add a [backend] table to the configuration file".into(),
        )),
    }
}
