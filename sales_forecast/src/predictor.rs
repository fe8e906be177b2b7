//! Prediction orchestration over stored artifacts

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ModelRegistry, ModelType, PredictParams};
use crate::storage::ArtifactStore;
use crate::utils::{confidence_intervals, validate_forecast_days, validate_product_id, ConfidenceInterval};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Forecast for one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub product_id: String,
    pub model_type: ModelType,
    pub forecast_days: usize,
    pub predictions: Vec<f64>,
    pub confidence_intervals: Vec<ConfidenceInterval>,
}

/// Loads fitted backends lazily and serves forecasts from them
///
/// Loaded models are cached per type and shared read-only; call
/// [`Predictor::invalidate`] after retraining a type.
#[derive(Debug)]
pub struct Predictor {
    config: ForecastConfig,
    registry: ModelRegistry,
    store: Arc<dyn ArtifactStore>,
    cache: RwLock<HashMap<ModelType, Arc<dyn ForecastModel>>>,
}

impl Predictor {
    pub fn new(
        config: ForecastConfig,
        registry: ModelRegistry,
        store: Arc<dyn ArtifactStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            store,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Model type for an optional requested name, falling back to the configured default
    pub fn resolve(&self, name: Option<&str>) -> Result<ModelType> {
        self.registry
            .resolve(name.unwrap_or(&self.config.default_model_type))
    }

    /// Forecast with the default model type
    pub fn predict(&self, product_id: &str, forecast_days: i64) -> Result<Forecast> {
        let model_type = self.resolve(None)?;
        self.predict_with(model_type, product_id, forecast_days)
    }

    /// Forecast with an explicit model type
    pub fn predict_with(
        &self,
        model_type: ModelType,
        product_id: &str,
        forecast_days: i64,
    ) -> Result<Forecast> {
        let days = validate_forecast_days(forecast_days)?;
        validate_product_id(product_id)?;

        let model = self.model(model_type)?;
        let predictions = model.predict(&PredictParams::new(product_id, days))?;
        if predictions.len() != days {
            return Err(ForecastError::LengthMismatch {
                expected: days,
                actual: predictions.len(),
            });
        }

        let intervals = confidence_intervals(&predictions, self.config.confidence_level)?;
        debug!(model_type = %model_type, product_id, days, "forecast produced");

        Ok(Forecast {
            product_id: product_id.to_string(),
            model_type,
            forecast_days: days,
            predictions,
            confidence_intervals: intervals,
        })
    }

    /// Fitted model for `model_type`, loading its artifact on first use
    pub fn model(&self, model_type: ModelType) -> Result<Arc<dyn ForecastModel>> {
        if let Some(model) = self.cache.read().get(&model_type) {
            return Ok(Arc::clone(model));
        }

        let path = self.config.model_path(model_type);
        let mut model = self.registry.create(model_type, &self.config)?;
        match model.load(self.store.as_ref(), &path) {
            Ok(()) => {}
            Err(ForecastError::ArtifactNotFound(missing)) => {
                return Err(ForecastError::NotFitted(format!(
                    "No trained {} model at {}",
                    model_type,
                    missing.display()
                )))
            }
            Err(e) => return Err(e),
        }

        let model: Arc<dyn ForecastModel> = Arc::from(model);
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(model_type).or_insert(model)))
    }

    /// Drop the cached model so the next request reloads its artifact
    pub fn invalidate(&self, model_type: ModelType) {
        if self.cache.write().remove(&model_type).is_some() {
            debug!(model_type = %model_type, "dropped cached model");
        }
    }
}
