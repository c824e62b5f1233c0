use planner_common::PlannerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// `rescale` was not two finite numbers with `min != max`.
    #[error("invalid rescale parameter '{0}': expected 'min,max' with min != max")]
    RescaleParameterInvalid(String),

    #[error("{view} needs at least {needed} bands, raster has {got}")]
    NotEnoughBands {
        view: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("invalid {param}: {message}")]
    InvalidParameter { param: &'static str, message: String },

    #[error("alpha mask has {got} values, expected {expected}")]
    AlphaMismatch { expected: usize, got: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    pub fn invalid_parameter(param: &'static str, message: impl Into<String>) -> Self {
        RenderError::InvalidParameter {
            param,
            message: message.into(),
        }
    }
}

impl From<RenderError> for PlannerError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::RescaleParameterInvalid(v) => PlannerError::RescaleParameterInvalid(v),
            e @ RenderError::NotEnoughBands { .. } => {
                PlannerError::invalid_parameter("view", e.to_string())
            }
            RenderError::InvalidParameter { param, message } => {
                PlannerError::invalid_parameter(param, message)
            }
            e @ (RenderError::AlphaMismatch { .. } | RenderError::Encode(_)) => {
                PlannerError::InternalError(e.to_string())
            }
        }
    }
}
