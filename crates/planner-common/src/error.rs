//! Error taxonomy at the service boundary.

use thiserror::Error;

/// Result type alias using PlannerError.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Primary error type for planner operations reaching the HTTP boundary.
#[derive(Debug, Error)]
pub enum PlannerError {
    // === Raster Errors ===
    #[error("Unreadable raster: {0}")]
    UnreadableRaster(String),

    /// Expected condition for tiles outside the raster footprint.
    #[error("Window out of range: {0}")]
    WindowOutOfRange(String),

    #[error("Reprojection failed: {0}")]
    ReprojectionError(String),

    #[error("Invalid rescale parameter: {0}")]
    RescaleParameterInvalid(String),

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Request Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl PlannerError {
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            PlannerError::UnreadableRaster(_)
            | PlannerError::InvalidParameter { .. }
            | PlannerError::RescaleParameterInvalid(_) => 400,

            PlannerError::NotFound(_) => 404,

            PlannerError::ReprojectionError(_) => 422,

            // Callers substitute a transparent tile; it never reaches a client as an error.
            PlannerError::WindowOutOfRange(_) => 200,

            PlannerError::StorageError(_)
            | PlannerError::DatabaseError(_)
            | PlannerError::InternalError(_) => 500,
        }
    }

    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::UnreadableRaster(_) => "unreadable_raster",
            PlannerError::WindowOutOfRange(_) => "window_out_of_range",
            PlannerError::ReprojectionError(_) => "reprojection_error",
            PlannerError::RescaleParameterInvalid(_) => "rescale_parameter_invalid",
            PlannerError::StorageError(_) => "storage_error",
            PlannerError::DatabaseError(_) => "database_error",
            PlannerError::NotFound(_) => "not_found",
            PlannerError::InvalidParameter { .. } => "invalid_parameter",
            PlannerError::InternalError(_) => "internal_error",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for PlannerError {
    fn from(err: std::io::Error) -> Self {
        PlannerError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::InternalError(format!("JSON error: {}", err))
    }
}
