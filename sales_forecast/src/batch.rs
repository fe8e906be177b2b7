//! Multi-product prediction with per-product failure isolation

use crate::error::Result;
use crate::models::ModelType;
use crate::predictor::{Forecast, Predictor};
use crate::utils::validate_forecast_days;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-product outcome of a batch
pub type BatchResults = BTreeMap<String, Result<Forecast>>;

/// Runs independent product forecasts in parallel
#[derive(Debug, Clone)]
pub struct BatchPredictor {
    predictor: Arc<Predictor>,
}

impl BatchPredictor {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        Self { predictor }
    }

    /// Batch forecast with the default model type
    pub fn predict_batch(&self, product_ids: &[String], forecast_days: i64) -> Result<BatchResults> {
        let model_type = self.predictor.resolve(None)?;
        self.predict_batch_with(model_type, product_ids, forecast_days)
    }

    /// Forecast every distinct product; one product's error does not affect the others
    ///
    /// Request-level problems (an invalid horizon) fail the whole call.
    pub fn predict_batch_with(
        &self,
        model_type: ModelType,
        product_ids: &[String],
        forecast_days: i64,
    ) -> Result<BatchResults> {
        validate_forecast_days(forecast_days)?;

        let mut seen = HashSet::new();
        let unique: Vec<&String> = product_ids.iter().filter(|id| seen.insert(*id)).collect();

        let results: BatchResults = unique
            .par_iter()
            .map(|id| {
                let outcome = self.predictor.predict_with(model_type, id, forecast_days);
                if let Err(e) = &outcome {
                    warn!(product_id = %id, error = %e, "batch item failed");
                }
                (id.to_string(), outcome)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        let failed = results.values().filter(|r| r.is_err()).count();
        info!(
            model_type = %model_type,
            products = results.len(),
            failed,
            "batch prediction finished"
        );
        Ok(results)
    }
}
