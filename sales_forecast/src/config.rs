//! Runtime configuration for training and prediction
//!
//! Values come from `Default`, a JSON file, or environment overrides; every
//! entry point runs [`ForecastConfig::validate`] before the config is used.

use crate::error::{ForecastError, Result};
use crate::models::ModelType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the artifact directory
pub const ENV_MODEL_PATH: &str = "ML_MODEL_PATH";
/// Environment variable naming the default training data source
pub const ENV_DATA_PATH: &str = "ML_DATA_PATH";
/// Environment variable overriding the confidence level
pub const ENV_CONFIDENCE_LEVEL: &str = "ML_CONFIDENCE_LEVEL";
/// Environment variable overriding the default model type
pub const ENV_DEFAULT_MODEL: &str = "ML_DEFAULT_MODEL";

/// Cleaning steps applied before feature engineering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Missing-value strategy name: mean, median, drop or none
    pub missing_strategy: String,
    /// Whether to apply the IQR outlier rule to the target column
    pub remove_outliers: bool,
    /// IQR multiplier for the outlier rule
    pub outlier_multiplier: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_strategy: "mean".to_string(),
            remove_outliers: true,
            outlier_multiplier: 1.5,
        }
    }
}

/// Derived columns produced by feature engineering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Add year/month/day/day_of_week/is_weekend columns
    pub date_features: bool,
    /// Shift distances for lag columns
    pub lags: Vec<usize>,
    /// Window sizes for rolling mean/std columns
    pub windows: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            date_features: true,
            lags: vec![1, 7, 14],
            windows: vec![7, 14],
        }
    }
}

/// Top-level configuration shared by trainer and predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub model_dir: PathBuf,
    pub data_path: Option<PathBuf>,
    pub confidence_level: f64,
    pub default_model_type: String,
    pub target_column: String,
    pub holdout_days: usize,
    pub cleaning: CleaningConfig,
    pub features: FeatureConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./saved_models"),
            data_path: None,
            confidence_level: 0.95,
            default_model_type: ModelType::TrendBased.as_str().to_string(),
            target_column: "quantity".to_string(),
            holdout_days: 14,
            cleaning: CleaningConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file; missing keys fall back to defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            ForecastError::InvalidConfig(format!(
                "{}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `ML_*` environment variables onto this config
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(ENV_MODEL_PATH) {
            self.model_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var(ENV_DATA_PATH) {
            self.data_path = Some(PathBuf::from(path));
        }
        if let Ok(level) = std::env::var(ENV_CONFIDENCE_LEVEL) {
            self.confidence_level = level.parse().map_err(|_| {
                ForecastError::InvalidConfig(format!(
                    "{} is not a number: {}",
                    ENV_CONFIDENCE_LEVEL, level
                ))
            })?;
        }
        if let Ok(model) = std::env::var(ENV_DEFAULT_MODEL) {
            self.default_model_type = model;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_default_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.default_model_type = model_type.into();
        self
    }

    pub fn with_holdout_days(mut self, days: usize) -> Self {
        self.holdout_days = days;
        self
    }

    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.cleaning = cleaning;
        self
    }

    pub fn with_features(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    /// Reject values that would only fail later, deep inside a run
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidConfig(format!(
                "confidence_level must be between 0 and 1 (exclusive), got {}",
                self.confidence_level
            )));
        }
        if self.holdout_days == 0 {
            return Err(ForecastError::InvalidConfig(
                "holdout_days must be greater than zero".to_string(),
            ));
        }
        if ModelType::from_name(&self.default_model_type).is_none() {
            return Err(ForecastError::InvalidConfig(format!(
                "default_model_type '{}' is not a known model type",
                self.default_model_type
            )));
        }
        if self.target_column.trim().is_empty() {
            return Err(ForecastError::InvalidConfig(
                "target_column must not be empty".to_string(),
            ));
        }
        if self.cleaning.outlier_multiplier < 0.0 {
            return Err(ForecastError::InvalidConfig(
                "outlier_multiplier must not be negative".to_string(),
            ));
        }
        if self.features.lags.contains(&0) || self.features.windows.contains(&0) {
            return Err(ForecastError::InvalidConfig(
                "lags and windows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Artifact path for a model type; repeated runs of one type share it
    pub fn model_path(&self, model_type: ModelType) -> PathBuf {
        self.model_dir
            .join(format!("{}_model.json", model_type.as_str()))
    }
}
