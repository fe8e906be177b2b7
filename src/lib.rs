//! # Sales Forecast Workspace
//!
//! Umbrella crate for the forecasting workspace. It re-exports the member
//! crates so callers can depend on a single package.
//!
//! - [`math`]: numeric kernels (statistics, rolling windows, smoothing, regression trees)
//! - [`forecast`]: data loading, preprocessing, model backends, training and prediction
//!
//! ## Example
//!
//! ```
//! use sales_forecast_workspace::forecast::ModelType;
//! use sales_forecast_workspace::math::statistics::mean;
//!
//! assert_eq!("prophet".parse::<ModelType>().unwrap(), ModelType::TrendBased);
//! assert_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
//! ```

pub use forecast_math as math;
pub use sales_forecast as forecast;

/// Versions of the member crates, in workspace order
pub fn versions() -> [(&'static str, &'static str); 2] {
    [
        ("sales_forecast_workspace", env!("CARGO_PKG_VERSION")),
        (sales_forecast::NAME, sales_forecast::VERSION),
    ]
}
