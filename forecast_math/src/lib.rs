//! # Forecast Math
//!
//! Numeric kernels used by the sales forecasting pipeline.
//! Everything here is a pure function of its inputs: no I/O, no logging and
//! no randomness, so the higher-level crate can reason about determinism.
//!
//! - [`statistics`]: means, deviations, quantiles and IQR bounds
//! - [`rolling`]: shifts and rolling-window statistics over gappy columns
//! - [`smoothing`]: linear regression and damped Holt smoothing
//! - [`tree`]: least-squares regression trees

use thiserror::Error;

pub mod rolling;
pub mod smoothing;
pub mod statistics;
pub mod tree;

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
