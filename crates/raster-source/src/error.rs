//! Error types for raster access.

use planner_common::{PixelWindow, PlannerError};
use thiserror::Error;

/// Errors raised while opening, reading or writing a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Not a TIFF, corrupt, missing georeferencing, or an unsupported layout.
    #[error("unreadable raster: {0}")]
    Unreadable(String),

    /// The requested window has no overlap with the raster.
    #[error("window {window} does not overlap a {width}x{height} raster")]
    WindowOutOfRange {
        window: PixelWindow,
        width: u32,
        height: u32,
    },

    /// The requested bounds do not overlap the raster footprint.
    #[error("bounds do not overlap the raster footprint")]
    BoundsOutOfRange,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write GeoTIFF: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, RasterError>;

impl RasterError {
    pub fn unreadable(message: impl Into<String>) -> Self {
        RasterError::Unreadable(message.into())
    }

    /// Whether this is the expected "nothing to draw here" outcome.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            RasterError::WindowOutOfRange { .. } | RasterError::BoundsOutOfRange
        )
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => RasterError::Io(e),
            other => RasterError::Unreadable(other.to_string()),
        }
    }
}

impl From<RasterError> for PlannerError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::Unreadable(msg) => PlannerError::UnreadableRaster(msg),
            e @ (RasterError::WindowOutOfRange { .. } | RasterError::BoundsOutOfRange) => {
                PlannerError::WindowOutOfRange(e.to_string())
            }
            RasterError::Io(e) => PlannerError::StorageError(e.to_string()),
            RasterError::Write(msg) => PlannerError::StorageError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_boundary_taxonomy() {
        let err: PlannerError = RasterError::unreadable("not a tiff").into();
        assert!(matches!(err, PlannerError::UnreadableRaster(_)));

        let err: PlannerError = RasterError::WindowOutOfRange {
            window: PixelWindow::new(100, 100, 5, 5),
            width: 10,
            height: 10,
        }
        .into();
        assert!(matches!(err, PlannerError::WindowOutOfRange(_)));
    }
}
