//! Service configuration.
//!
//! Values come from an optional YAML file, then environment variables
//! override individual fields.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use planner_common::Crs;
use serde::{Deserialize, Serialize};
use storage::CollisionPolicy;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Where uploads and reprojected artifacts are published.
    pub upload_dir: PathBuf,
    /// SQLite file backing the waypoint store.
    pub database_path: PathBuf,
    /// Display CRS; uploads in any other CRS are reprojected once.
    pub target_epsg: u16,
    /// Tile edge used when a request has no `size`.
    pub tile_size: u32,
    pub max_tile_size: u32,
    pub collision_policy: CollisionPolicy,
    /// Sampling step for previews and histograms.
    pub preview_downsample: u32,
    pub max_upload_bytes: usize,
    /// Largest `width x height` an upload header may declare.
    pub max_raster_pixels: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploaded_images"),
            database_path: PathBuf::from("./waypoints.db"),
            target_epsg: 3857,
            tile_size: 256,
            max_tile_size: 1024,
            collision_policy: CollisionPolicy::Overwrite,
            preview_downsample: 5,
            max_upload_bytes: 512 * 1024 * 1024,
            max_raster_pixels: raster_source::DEFAULT_MAX_PIXELS,
        }
    }
}

impl ServerConfig {
    /// Load from `path` (if given), apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        info!(
            upload_dir = %config.upload_dir.display(),
            database = %config.database_path.display(),
            target = %config.target_crs(),
            policy = ?config.collision_policy,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Override fields from `lookup` (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        override_parsed(&lookup, "TARGET_EPSG", &mut self.target_epsg)?;
        override_parsed(&lookup, "TILE_SIZE", &mut self.tile_size)?;
        override_parsed(&lookup, "MAX_TILE_SIZE", &mut self.max_tile_size)?;
        override_parsed(&lookup, "UPLOAD_COLLISION_POLICY", &mut self.collision_policy)?;
        override_parsed(&lookup, "PREVIEW_DOWNSAMPLE", &mut self.preview_downsample)?;
        override_parsed(&lookup, "MAX_UPLOAD_BYTES", &mut self.max_upload_bytes)?;
        override_parsed(&lookup, "MAX_RASTER_PIXELS", &mut self.max_raster_pixels)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tile_size == 0 {
            bail!("max_tile_size must be at least 1");
        }
        if self.tile_size == 0 || self.tile_size > self.max_tile_size {
            bail!(
                "tile_size {} must be in 1..={}",
                self.tile_size,
                self.max_tile_size
            );
        }
        if self.preview_downsample == 0 {
            bail!("preview_downsample must be at least 1");
        }
        if self.max_raster_pixels == 0 {
            bail!("max_raster_pixels must be at least 1");
        }
        Ok(())
    }

    pub fn target_crs(&self) -> Crs {
        Crs::from_epsg(self.target_epsg)
    }
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *field = raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {}='{}': {}", key, raw, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.target_crs(), Crs::WEB_MERCATOR);
        assert_eq!(config.max_upload_bytes, 536_870_912);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("UPLOAD_DIR", "/data/uploads"),
                ("TARGET_EPSG", "4326"),
                ("TILE_SIZE", "512"),
                ("UPLOAD_COLLISION_POLICY", "version"),
            ]))
            .unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/data/uploads"));
        assert_eq!(config.target_epsg, 4326);
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.collision_policy, CollisionPolicy::Version);
        assert_eq!(config.preview_downsample, 5);
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("TILE_SIZE", "big")]))
            .unwrap_err();
        assert!(err.to_string().contains("TILE_SIZE"));
    }

    #[test]
    fn test_yaml_partial_file() {
        let config: ServerConfig =
            serde_yaml::from_str("tile_size: 512\ncollision_policy: version\n").unwrap();
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.collision_policy, CollisionPolicy::Version);
        assert_eq!(config.max_tile_size, 1024);
    }

    #[test]
    fn test_raster_pixel_cap_override() {
        let mut config = ServerConfig::default();
        assert_eq!(config.max_raster_pixels, 1 << 30);
        config
            .apply_overrides(lookup_from(&[("MAX_RASTER_PIXELS", "1000")]))
            .unwrap();
        assert_eq!(config.max_raster_pixels, 1000);

        config.max_raster_pixels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_default_tile() {
        let config = ServerConfig {
            tile_size: 2048,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
