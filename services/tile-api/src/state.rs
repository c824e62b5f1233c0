//! Application state and shared resources.

use std::sync::Arc;

use anyhow::{Context, Result};
use storage::{SqliteWaypointStore, UploadDirectory, WaypointStore};

use crate::config::ServerConfig;

/// Shared application state. Rasters are opened per request and never held
/// here.
pub struct AppState {
    pub config: ServerConfig,
    pub waypoints: Arc<dyn WaypointStore>,
    pub uploads: UploadDirectory,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let store = SqliteWaypointStore::open(&config.database_path)
            .await
            .with_context(|| {
                format!("Failed to open waypoint database: {}", config.database_path.display())
            })?;
        Self::with_store(config, Arc::new(store))
    }

    /// State over an already opened waypoint store.
    pub fn with_store(config: ServerConfig, waypoints: Arc<dyn WaypointStore>) -> Result<Self> {
        let uploads = UploadDirectory::new(&config.upload_dir, config.collision_policy)
            .with_context(|| {
                format!("Failed to prepare upload directory: {}", config.upload_dir.display())
            })?;
        Ok(Self {
            config,
            waypoints,
            uploads,
        })
    }
}
