//! Error types for the sales_forecast crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Requested model type is not registered
    #[error("Unknown model type: {0}")]
    UnknownModelType(String),

    /// Forecast horizon outside the supported range
    #[error("Invalid range: forecast_days must be between {min} and {max}, got {value}")]
    InvalidRange { value: i64, min: i64, max: i64 },

    /// Configuration value rejected at construction time
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Model has no fitted state for the request
    #[error("Model not fitted: {0}")]
    NotFitted(String),

    /// No artifact stored at the given path
    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// Artifact payload could not be decoded into the expected shape
    #[error("Artifact corrupt at {}: {reason}", .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// Backend failed to fit
    #[error("Training error: {0}")]
    TrainingError(String),

    /// Paired sequences differ in length
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Training run stopped by its cancellation token
    #[error("Training cancelled: {0}")]
    Cancelled(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error encoding a value as JSON
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error from the numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Stable, machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::UnknownModelType(_) => "unknown_model_type",
            ForecastError::InvalidRange { .. } => "invalid_range",
            ForecastError::InvalidConfig(_) => "invalid_config",
            ForecastError::NotFitted(_) => "not_fitted",
            ForecastError::ArtifactNotFound(_) => "artifact_not_found",
            ForecastError::ArtifactCorrupt { .. } => "artifact_corrupt",
            ForecastError::TrainingError(_) => "training_error",
            ForecastError::LengthMismatch { .. } => "length_mismatch",
            ForecastError::DataError(_) => "data_error",
            ForecastError::Cancelled(_) => "cancelled",
            ForecastError::IoError(_) => "io_error",
            ForecastError::PolarsError(_) => "polars_error",
            ForecastError::SerializationError(_) => "serialization_error",
            ForecastError::MathError(_) => "math_error",
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ForecastError::ArtifactCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
