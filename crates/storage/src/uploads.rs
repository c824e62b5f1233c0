//! Upload directory with atomic publish.
//!
//! Writers stage bytes in `.{name}.{uuid}.part` next to the target, flush
//! and sync, then publish in one step. Readers never observe a partial file.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use planner_common::{PlannerError, PlannerResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Upper bound on `{stem}-{n}` suffixes tried under [`CollisionPolicy::Version`].
const MAX_VERSIONS: u32 = 10_000;

/// What happens when a published name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Atomic rename over the existing file.
    #[default]
    Overwrite,
    /// Keep the existing file and publish as `{stem}-{n}.{ext}`.
    Version,
}

impl FromStr for CollisionPolicy {
    type Err = PlannerError;

    fn from_str(s: &str) -> PlannerResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "version" => Ok(CollisionPolicy::Version),
            other => Err(PlannerError::invalid_parameter(
                "collision_policy",
                format!("expected overwrite or version, got '{}'", other),
            )),
        }
    }
}

/// A file that landed in the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    /// Final name, which differs from the requested one under `Version`.
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A plain file name: no separators, no leading dot, not empty.
pub fn validate_filename(name: &str) -> PlannerResult<()> {
    let invalid = |reason: &str| {
        PlannerError::invalid_parameter("filename", format!("'{}' {}", name, reason))
    };
    if name.is_empty() {
        return Err(invalid("is empty"));
    }
    if name.len() > 255 {
        return Err(invalid("is longer than 255 bytes"));
    }
    if name.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
        return Err(invalid("contains a path separator"));
    }
    if name.starts_with('.') {
        return Err(invalid("starts with a dot"));
    }
    Ok(())
}

/// Split "field.tif" into ("field", Some("tif")).
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

fn versioned_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match split_name(name) {
        (stem, Some(ext)) => format!("{}-{}.{}", stem, n, ext),
        (stem, None) => format!("{}-{}", stem, n),
    }
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> PlannerError {
    PlannerError::StorageError(format!("failed to {} {}: {}", action, path.display(), err))
}

/// The directory uploaded rasters and their artifacts are served from.
#[derive(Debug, Clone)]
pub struct UploadDirectory {
    root: PathBuf,
    policy: CollisionPolicy,
}

impl UploadDirectory {
    /// Use `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>, policy: CollisionPolicy) -> PlannerResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| storage_error("create", &root, e))?;
        info!(root = %root.display(), policy = ?policy, "Upload directory ready");
        Ok(Self { root, policy })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Path of a published file; the name is validated first.
    pub fn resolve(&self, name: &str) -> PlannerResult<PathBuf> {
        validate_filename(name)?;
        Ok(self.root.join(name))
    }

    /// Path of a published file, or `NotFound`.
    pub fn existing(&self, name: &str) -> PlannerResult<PathBuf> {
        let path = self.resolve(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(PlannerError::NotFound("File not found".to_string()))
        }
    }

    /// Atomically publish `bytes` under `name` according to the policy.
    #[instrument(skip(self, bytes), fields(root = %self.root.display(), size = bytes.len()))]
    pub fn publish(&self, name: &str, bytes: &[u8]) -> PlannerResult<PublishedFile> {
        validate_filename(name)?;

        let staging = self
            .root
            .join(format!(".{}.{}.part", name, Uuid::new_v4().simple()));
        if let Err(e) = write_synced(&staging, bytes) {
            remove_staging(&staging);
            return Err(e);
        }

        let published = match self.policy {
            CollisionPolicy::Overwrite => self.publish_overwrite(&staging, name),
            CollisionPolicy::Version => self.publish_versioned(&staging, name),
        };
        // The staging name is gone after a rename and redundant after a link.
        remove_staging(&staging);

        let filename = published?;
        let path = self.root.join(&filename);
        info!(filename = %filename, "Published upload");
        Ok(PublishedFile {
            filename,
            path,
            size: bytes.len() as u64,
        })
    }

    fn publish_overwrite(&self, staging: &Path, name: &str) -> PlannerResult<String> {
        let target = self.root.join(name);
        fs::rename(staging, &target).map_err(|e| storage_error("publish", &target, e))?;
        Ok(name.to_string())
    }

    fn publish_versioned(&self, staging: &Path, name: &str) -> PlannerResult<String> {
        for n in 0..MAX_VERSIONS {
            let candidate = versioned_name(name, n);
            let target = self.root.join(&candidate);
            match fs::hard_link(staging, &target) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(candidate = %candidate, "Name taken, trying next version");
                }
                Err(e) => return Err(storage_error("publish", &target, e)),
            }
        }
        Err(PlannerError::StorageError(format!(
            "no free version of '{}' after {} attempts",
            name, MAX_VERSIONS
        )))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> PlannerResult<()> {
    let mut file = File::create(path).map_err(|e| storage_error("create", path, e))?;
    file.write_all(bytes)
        .map_err(|e| storage_error("write", path, e))?;
    file.sync_all().map_err(|e| storage_error("sync", path, e))
}

fn remove_staging(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staging file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("field.tif").is_ok());
        assert!(validate_filename("ortho 2024-05.tif").is_ok());
        for bad in ["", ".hidden.tif", "../x.tif", "a/b.tif", "a\\b.tif", ".."] {
            assert!(validate_filename(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_versioned_name() {
        assert_eq!(versioned_name("field.tif", 0), "field.tif");
        assert_eq!(versioned_name("field.tif", 2), "field-2.tif");
        assert_eq!(versioned_name("field.v2.tif", 1), "field.v2-1.tif");
        assert_eq!(versioned_name("README", 3), "README-3");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Version".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Version);
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::Overwrite);
        assert!("clobber".parse::<CollisionPolicy>().is_err());
    }
}
