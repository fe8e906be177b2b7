//! Request and response bodies exchanged with the serving layer

use crate::batch::BatchResults;
use crate::error::ForecastError;
use crate::predictor::Forecast;
use crate::trainer::TrainingReport;
use crate::utils::ConfidenceInterval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Horizon used when a request does not name one
pub const DEFAULT_FORECAST_DAYS: i64 = 30;

fn default_forecast_days() -> i64 {
    DEFAULT_FORECAST_DAYS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub model_type: String,
    #[serde(default)]
    pub data_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub model_type: String,
    pub status: String,
    pub accuracy: Option<f64>,
    pub model_path: Option<String>,
}

impl TrainingResponse {
    pub fn completed(report: &TrainingReport) -> Self {
        Self {
            model_type: report.model_type.as_str().to_string(),
            status: "completed".to_string(),
            accuracy: report.accuracy,
            model_path: Some(report.model_path.display().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub product_id: String,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: i64,
    #[serde(default)]
    pub model_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub product_id: String,
    pub forecast_days: usize,
    pub predictions: Vec<f64>,
    pub confidence_intervals: Vec<ConfidenceInterval>,
}

impl From<Forecast> for PredictionResponse {
    fn from(forecast: Forecast) -> Self {
        Self {
            product_id: forecast.product_id,
            forecast_days: forecast.forecast_days,
            predictions: forecast.predictions,
            confidence_intervals: forecast.confidence_intervals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionRequest {
    pub product_ids: Vec<String>,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: i64,
    #[serde(default)]
    pub model_type: Option<String>,
}

/// Outcome of one product in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchItem {
    Ok(PredictionResponse),
    Error(ErrorResponse),
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchItem::Ok(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionResponse {
    pub forecast_days: i64,
    pub results: BTreeMap<String, BatchItem>,
}

impl BatchPredictionResponse {
    pub fn from_results(forecast_days: i64, results: BatchResults) -> Self {
        let results = results
            .into_iter()
            .map(|(id, outcome)| {
                let item = match outcome {
                    Ok(forecast) => BatchItem::Ok(forecast.into()),
                    Err(e) => BatchItem::Error(ErrorResponse::from(&e)),
                };
                (id, item)
            })
            .collect();

        Self {
            forecast_days,
            results,
        }
    }
}

/// Error body returned at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub kind: String,
    pub message: String,
}

impl From<&ForecastError> for ErrorResponse {
    fn from(err: &ForecastError) -> Self {
        Self {
            status: 500,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
