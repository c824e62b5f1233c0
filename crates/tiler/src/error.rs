use planner_common::PlannerError;
use projection::ProjectionError;
use raster_source::RasterError;
use renderer::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// A raster without a CRS cannot be placed on the tile grid.
    #[error("raster has no defined CRS")]
    UndefinedCrs,

    #[error("invalid {param}: {message}")]
    InvalidParameter { param: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, TileError>;

impl TileError {
    pub fn invalid_parameter(param: &'static str, message: impl Into<String>) -> Self {
        TileError::InvalidParameter {
            param,
            message: message.into(),
        }
    }
}

impl From<TileError> for PlannerError {
    fn from(err: TileError) -> Self {
        match err {
            TileError::Raster(e) => e.into(),
            TileError::Projection(e) => PlannerError::ReprojectionError(e.to_string()),
            TileError::Render(e) => e.into(),
            e @ TileError::UndefinedCrs => PlannerError::UnreadableRaster(e.to_string()),
            TileError::InvalidParameter { param, message } => {
                PlannerError::invalid_parameter(param, message)
            }
        }
    }
}
