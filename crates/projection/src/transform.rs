//! Point and bounding-box transforms between EPSG coordinate systems.
//!
//! Every transform pivots through WGS84 longitude/latitude degrees:
//! `source -> lon/lat -> target`. The Web Mercator and WGS84 legs are exact
//! closed-form math; other codes go through proj4rs.

use planner_common::{BoundingBox, Crs};
use proj4rs::proj::Proj;
use thiserror::Error;

use crate::mercator::{lonlat_to_mercator, mercator_to_lonlat};

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Errors raised while building or applying a CRS transform.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// The EPSG code is not in the crs-definitions database.
    #[error("EPSG:{0} is not in the CRS database")]
    UnknownEpsg(u16),

    /// proj4rs rejected the projection definition.
    #[error("invalid projection definition for EPSG:{epsg}: {message}")]
    InvalidDefinition { epsg: u16, message: String },

    /// A point could not be transformed.
    #[error("transform from {from} to {to} failed at ({x}, {y}): {message}")]
    TransformFailed {
        from: Crs,
        to: Crs,
        x: f64,
        y: f64,
        message: String,
    },

    /// No sampled point of a bounding box survived the transform.
    #[error("bounding box {0:?} has no valid points in the target CRS")]
    EmptyBounds(BoundingBox),
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Get the PROJ4 string for an EPSG code from the crs-definitions database.
pub fn proj_string(crs: Crs) -> Option<&'static str> {
    crs_definitions::from_code(crs.epsg()).map(|def| def.proj4)
}

/// Check whether a CRS uses longitude/latitude degrees.
pub fn is_geographic(crs: Crs) -> bool {
    if crs.is_wgs84() {
        return true;
    }
    if crs.is_web_mercator() {
        return false;
    }
    proj_string(crs)
        .map(|s| s.contains("+proj=longlat"))
        .unwrap_or(false)
}

/// One side of a transform, expressed relative to WGS84 lon/lat.
enum Endpoint {
    Wgs84,
    WebMercator,
    Proj { proj: Proj, geographic: bool },
}

impl Endpoint {
    fn for_crs(crs: Crs) -> Result<Self> {
        if crs.is_wgs84() {
            return Ok(Endpoint::Wgs84);
        }
        if crs.is_web_mercator() {
            return Ok(Endpoint::WebMercator);
        }

        let definition = proj_string(crs).ok_or(ProjectionError::UnknownEpsg(crs.epsg()))?;
        let proj = Proj::from_proj_string(definition).map_err(|e| {
            ProjectionError::InvalidDefinition {
                epsg: crs.epsg(),
                message: format!("{:?}", e),
            }
        })?;

        Ok(Endpoint::Proj {
            proj,
            geographic: definition.contains("+proj=longlat"),
        })
    }
}

/// A reusable transform between two coordinate systems.
///
/// Build once per raster operation and apply to many points.
pub struct CrsTransformer {
    source: Crs,
    target: Crs,
    source_endpoint: Endpoint,
    target_endpoint: Endpoint,
    wgs84: Option<Proj>,
}

impl std::fmt::Debug for CrsTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransformer")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

impl CrsTransformer {
    /// Create a transformer from `source` to `target`.
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        let source_endpoint = Endpoint::for_crs(source)?;
        let target_endpoint = Endpoint::for_crs(target)?;

        let needs_proj = matches!(source_endpoint, Endpoint::Proj { .. })
            || matches!(target_endpoint, Endpoint::Proj { .. });
        let wgs84 = if needs_proj && source != target {
            Some(
                Proj::from_proj_string(WGS84_PROJ).map_err(|e| {
                    ProjectionError::InvalidDefinition {
                        epsg: Crs::WGS84.epsg(),
                        message: format!("{:?}", e),
                    }
                })?,
            )
        } else {
            None
        };

        Ok(Self {
            source,
            target,
            source_endpoint,
            target_endpoint,
            wgs84,
        })
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Transform a point from source to target.
    pub fn forward(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self.to_lonlat(&self.source_endpoint, self.source, x, y)?;
        self.from_lonlat(&self.target_endpoint, self.target, lon, lat)
    }

    /// Transform a point from target back to source.
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self.to_lonlat(&self.target_endpoint, self.target, x, y)?;
        self.from_lonlat(&self.source_endpoint, self.source, lon, lat)
    }

    /// Transform a bounding box from source to target.
    ///
    /// The edges are densified so curved footprints are captured; points
    /// that fail to transform are skipped.
    pub fn forward_bounds(&self, bbox: &BoundingBox, per_edge: usize) -> Result<BoundingBox> {
        if self.is_identity() {
            return Ok(*bbox);
        }
        let points = bbox
            .densified_edges(per_edge)
            .into_iter()
            .filter_map(|(x, y)| self.forward(x, y).ok());
        BoundingBox::from_points(points).ok_or(ProjectionError::EmptyBounds(*bbox))
    }

    /// Transform a bounding box from target back to source.
    pub fn inverse_bounds(&self, bbox: &BoundingBox, per_edge: usize) -> Result<BoundingBox> {
        if self.is_identity() {
            return Ok(*bbox);
        }
        let points = bbox
            .densified_edges(per_edge)
            .into_iter()
            .filter_map(|(x, y)| self.inverse(x, y).ok());
        BoundingBox::from_points(points).ok_or(ProjectionError::EmptyBounds(*bbox))
    }

    fn to_lonlat(&self, endpoint: &Endpoint, crs: Crs, x: f64, y: f64) -> Result<(f64, f64)> {
        match endpoint {
            Endpoint::Wgs84 => Ok((x, y)),
            Endpoint::WebMercator => Ok(mercator_to_lonlat(x, y)),
            Endpoint::Proj { proj, geographic } => {
                // proj4rs works in radians for geographic systems
                let mut point = if *geographic {
                    (x.to_radians(), y.to_radians(), 0.0)
                } else {
                    (x, y, 0.0)
                };
                self.apply(proj, self.wgs84_proj()?, &mut point)
                    .map_err(|message| self.failed(crs, Crs::WGS84, x, y, message))?;
                finite((point.0.to_degrees(), point.1.to_degrees()))
                    .ok_or_else(|| self.failed(crs, Crs::WGS84, x, y, "non-finite result"))
            }
        }
    }

    fn from_lonlat(&self, endpoint: &Endpoint, crs: Crs, lon: f64, lat: f64) -> Result<(f64, f64)> {
        match endpoint {
            Endpoint::Wgs84 => Ok((lon, lat)),
            Endpoint::WebMercator => Ok(lonlat_to_mercator(lon, lat)),
            Endpoint::Proj { proj, geographic } => {
                let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
                self.apply(self.wgs84_proj()?, proj, &mut point)
                    .map_err(|message| self.failed(Crs::WGS84, crs, lon, lat, message))?;
                let out = if *geographic {
                    (point.0.to_degrees(), point.1.to_degrees())
                } else {
                    (point.0, point.1)
                };
                finite(out).ok_or_else(|| self.failed(Crs::WGS84, crs, lon, lat, "non-finite result"))
            }
        }
    }

    fn apply(
        &self,
        from: &Proj,
        to: &Proj,
        point: &mut (f64, f64, f64),
    ) -> std::result::Result<(), String> {
        proj4rs::transform::transform(from, to, point).map_err(|e| format!("{:?}", e))
    }

    fn wgs84_proj(&self) -> Result<&Proj> {
        self.wgs84.as_ref().ok_or(ProjectionError::UnknownEpsg(Crs::WGS84.epsg()))
    }

    fn failed(&self, from: Crs, to: Crs, x: f64, y: f64, message: impl Into<String>) -> ProjectionError {
        ProjectionError::TransformFailed {
            from,
            to,
            x,
            y,
            message: message.into(),
        }
    }
}

fn finite(point: (f64, f64)) -> Option<(f64, f64)> {
    if point.0.is_finite() && point.1.is_finite() {
        Some(point)
    } else {
        None
    }
}
