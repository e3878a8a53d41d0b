use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::Config;

/// Application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Create an application instance from the validated on-disk config
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Prepare the data directory; returns the workspace database path
    pub fn initialize(&self) -> Result<PathBuf> {
        tracing::info!("Initializing application in {}", self.config.data_dir.display());

        std::fs::create_dir_all(&self.config.data_dir)
            .context("Failed to create data directory")?;

        let db_path = self.config.database_path();
        tracing::debug!("Workspace database: {}", db_path.display());
        Ok(db_path)
    }

    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }
}
