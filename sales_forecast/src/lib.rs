//! # Sales Forecast
//!
//! A Rust library for day-by-day product sales forecasting with
//! interchangeable model backends.
//!
//! ## Features
//!
//! - Sales data loading from CSV and Parquet (via polars)
//! - Preprocessing: duplicate and missing-value handling, IQR outlier
//!   removal, date/lag/rolling features, standard and min-max scaling
//! - Backends behind one contract: trend-based (damped Holt with weekly
//!   seasonality), gradient-boosted trees, a sequence network, and a naive
//!   reference model
//! - Training with holdout evaluation (MAE, RMSE, R²) and JSON artifacts
//! - Single and batch prediction with proportional confidence bands
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::schemas::{PredictionRequest, TrainingRequest};
//! use sales_forecast::{ForecastConfig, ForecastService};
//!
//! let service = ForecastService::with_files(ForecastConfig::from_env()?)?;
//!
//! service.train(&TrainingRequest {
//!     model_type: "trend-based".to_string(),
//!     data_path: Some("sales.csv".to_string()),
//! })?;
//!
//! let forecast = service.predict(&PredictionRequest {
//!     product_id: "P1".to_string(),
//!     forecast_days: 30,
//!     model_type: None,
//! })?;
//! assert_eq!(forecast.predictions.len(), 30);
//! # Ok::<(), sales_forecast::ForecastError>(())
//! ```

pub mod batch;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod preprocessing;
pub mod schemas;
pub mod service;
pub mod storage;
pub mod trainer;
pub mod utils;

// Re-export commonly used types
pub use crate::batch::BatchPredictor;
pub use crate::config::ForecastConfig;
pub use crate::data::{DataLoader, DataSource, SalesFrame, SalesRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{evaluate, EvaluationReport};
pub use crate::models::{ForecastModel, ModelRegistry, ModelType, PredictParams};
pub use crate::predictor::{Forecast, Predictor};
pub use crate::service::ForecastService;
pub use crate::storage::{ArtifactStore, FileArtifactStore, MemoryArtifactStore};
pub use crate::trainer::{Trainer, TrainingReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
