//! Upload pipeline: validate, open, publish, reproject on CRS mismatch.
//!
//! Runs synchronously; handlers call it from the blocking pool.

use std::path::Path;

use bytes::Bytes;
use planner_common::{BoundingBox, Crs, PlannerError, PlannerResult};
use projection::CrsTransformer;
use raster_source::RasterHandle;
use reproject::{reproject, EDGE_SAMPLES};
use serde::Serialize;
use storage::{validate_filename, UploadDirectory};
use tracing::{info, warn};

use crate::metrics;

/// Response body of `POST /upload`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    /// Name to request tiles with; the reprojected artifact when one was made.
    pub filename: String,
    /// Name the original upload was published under.
    pub source_filename: String,
    pub path: String,
    /// XYZ URL template.
    pub tiles: String,
    pub crs: Crs,
    pub reprojected: bool,
    /// In `crs`.
    pub bounds: BoundingBox,
    /// Longitude/latitude, for fitting a map view.
    pub bounds_wgs84: BoundingBox,
}

/// Name of the reprojected artifact for a published original.
pub fn artifact_name(original: &str, target: Crs) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original);
    format!("{}_epsg{}.tif", stem, target.epsg())
}

/// Rasters whose header declares more than `max_pixels` are rejected as
/// unreadable before anything is published.
pub fn process_upload(
    uploads: &UploadDirectory,
    name: &str,
    bytes: Bytes,
    target: Crs,
    max_pixels: u64,
) -> PlannerResult<UploadResult> {
    validate_filename(name)?;

    let mut handle = RasterHandle::from_bytes_with_max_pixels(bytes.clone(), max_pixels)?;
    let source_crs = handle.crs();
    let original = uploads.publish(name, &bytes)?;

    if source_crs == Some(target) {
        let bounds = handle.bounds();
        handle.close();
        return finish(original.filename.clone(), original.filename, &original.path, target, bounds, false);
    }

    info!(
        filename = %original.filename,
        from = ?source_crs.map(|c| c.to_string()),
        to = %target,
        "CRS differs from display CRS, reprojecting"
    );
    let artifact = reproject(&mut handle, target).map_err(|e| {
        warn!(filename = %original.filename, error = %e, "Reprojection failed");
        PlannerError::from(e)
    })?;
    handle.close();
    metrics::record_reprojection();

    let served = uploads.publish(&artifact_name(&original.filename, target), &artifact.bytes)?;
    finish(served.filename, original.filename, &served.path, artifact.crs, artifact.bounds, true)
}

fn finish(
    filename: String,
    source_filename: String,
    path: &Path,
    crs: Crs,
    bounds: BoundingBox,
    reprojected: bool,
) -> PlannerResult<UploadResult> {
    let bounds_wgs84 = CrsTransformer::new(crs, Crs::WGS84)
        .and_then(|t| t.forward_bounds(&bounds, EDGE_SAMPLES))
        .map_err(|e| PlannerError::ReprojectionError(e.to_string()))?;

    info!(
        filename = %filename,
        source = %source_filename,
        crs = %crs,
        reprojected,
        "Upload processed"
    );

    Ok(UploadResult {
        tiles: format!("/tiles/{}/{{z}}/{{x}}/{{y}}.png", filename),
        path: path.display().to_string(),
        filename,
        source_filename,
        crs,
        reprojected,
        bounds,
        bounds_wgs84,
    })
}
