use planner_common::PlannerError;
use projection::ProjectionError;
use raster_source::RasterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReprojectError {
    #[error("source raster has no defined CRS")]
    UndefinedCrs,

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("output grid is empty: {0}")]
    EmptyGrid(String),
}

pub type Result<T> = std::result::Result<T, ReprojectError>;

impl From<ReprojectError> for PlannerError {
    fn from(err: ReprojectError) -> Self {
        PlannerError::ReprojectionError(err.to_string())
    }
}
