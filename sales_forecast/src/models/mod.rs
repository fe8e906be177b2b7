//! Forecasting models
//!
//! Every backend implements [`ForecastModel`]. The shipped backends share one
//! implementation, [`SeriesModel`], which fits a [`SeriesMethod`] to each
//! product's daily series and keeps the fitted states in a single artifact
//! per model type.

pub mod gradient_boosted;
pub mod naive;
pub mod registry;
pub mod sequence;
pub mod trend;

use crate::config::ForecastConfig;
use crate::data::{DailySeries, SalesFrame};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate, EvaluationReport};
use crate::storage::ArtifactStore;
use crate::utils::CancellationToken;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info, warn};

pub use gradient_boosted::{GradientBoostedMethod, GradientBoostedModel};
pub use naive::{NaiveMethod, NaiveModel};
pub use registry::ModelRegistry;
pub use sequence::{SequenceMethod, SequenceModel};
pub use trend::{TrendMethod, TrendModel};

/// Current artifact envelope version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Registered backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelType {
    TrendBased,
    GradientBoosted,
    SequenceBased,
    Naive,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        ModelType::TrendBased,
        ModelType::GradientBoosted,
        ModelType::SequenceBased,
        ModelType::Naive,
    ];

    /// Canonical name, also used in artifact paths
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::TrendBased => "trend-based",
            ModelType::GradientBoosted => "gradient-boosted",
            ModelType::SequenceBased => "sequence-based",
            ModelType::Naive => "naive",
        }
    }

    /// Resolve a canonical name or a legacy alias (`prophet`, `xgboost`, `lstm`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trend-based" | "prophet" => Some(ModelType::TrendBased),
            "gradient-boosted" | "xgboost" => Some(ModelType::GradientBoosted),
            "sequence-based" | "lstm" => Some(ModelType::SequenceBased),
            "naive" => Some(ModelType::Naive),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| ForecastError::UnknownModelType(s.to_string()))
    }
}

/// Inputs to a single prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictParams {
    pub product_id: String,
    pub forecast_days: usize,
}

impl PredictParams {
    pub fn new(product_id: impl Into<String>, forecast_days: usize) -> Self {
        Self {
            product_id: product_id.into(),
            forecast_days,
        }
    }
}

/// Result of a successful training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingOutcome {
    pub model_type: ModelType,
    /// Pooled R² over the holdout days, when any series was long enough
    pub accuracy: Option<f64>,
    pub metrics: Option<EvaluationReport>,
    /// Products with a fitted state
    pub products: Vec<String>,
    /// Products skipped for lack of history or a failed fit
    pub skipped: Vec<String>,
}

/// Serialized envelope around a backend's fitted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub format_version: u32,
    pub model_type: ModelType,
    pub accuracy: Option<f64>,
    pub metrics: Option<EvaluationReport>,
    pub trained_at: DateTime<Utc>,
    pub state: serde_json::Value,
}

impl Artifact {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| ForecastError::SerializationError(e.to_string()))
    }

    /// Decode an envelope read from `path`
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ForecastError::corrupt(path, e))
    }
}

/// Contract shared by all forecasting backends
pub trait ForecastModel: Send + Sync + Debug {
    fn model_type(&self) -> ModelType;

    /// Whether `train` or `load` has produced a fitted state
    fn is_fitted(&self) -> bool;

    /// Fit from a training frame, checking `cancel` between products
    ///
    /// The fitted state is replaced only when the whole run succeeds.
    fn train_with_cancel(
        &mut self,
        data: &SalesFrame,
        cancel: &CancellationToken,
    ) -> Result<TrainingOutcome>;

    /// Fit from a training frame
    fn train(&mut self, data: &SalesFrame) -> Result<TrainingOutcome> {
        self.train_with_cancel(data, &CancellationToken::new())
    }

    /// Forecast `forecast_days` values for one product, starting the day after its last observation
    fn predict(&self, params: &PredictParams) -> Result<Vec<f64>>;

    /// Products with a fitted state
    fn products(&self) -> Vec<String>;

    /// Fitted state as a serializable envelope
    fn to_artifact(&self) -> Result<Artifact>;

    /// Replace the fitted state with the contents of an envelope read from `origin`
    fn restore(&mut self, artifact: Artifact, origin: &Path) -> Result<()>;

    fn save(&self, store: &dyn ArtifactStore, path: &Path) -> Result<()> {
        let bytes = self.to_artifact()?.to_bytes()?;
        store.write(path, &bytes)?;
        info!(model_type = %self.model_type(), path = %path.display(), "saved model artifact");
        Ok(())
    }

    fn load(&mut self, store: &dyn ArtifactStore, path: &Path) -> Result<()> {
        let bytes = store.read(path)?;
        let artifact = Artifact::from_bytes(path, &bytes)?;
        self.restore(artifact, path)?;
        info!(model_type = %self.model_type(), path = %path.display(), "loaded model artifact");
        Ok(())
    }
}

/// Fitted state of one product's series
pub trait FittedSeries: Debug + Clone + Send + Sync {
    /// Values for the `horizon` days after the fitted series ends
    fn forecast(&self, horizon: usize) -> Vec<f64>;
}

/// Numeric method that turns one daily series into a fitted state
pub trait SeriesMethod: Debug + Clone + Send + Sync + 'static {
    type Fitted: FittedSeries + Serialize + DeserializeOwned;

    const MODEL_TYPE: ModelType;

    /// Shortest series the method can fit
    fn min_observations(&self) -> usize;

    fn fit(&self, series: &DailySeries) -> Result<Self::Fitted>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductFit<F> {
    /// Last observed day
    cutoff: NaiveDate,
    model: F,
}

#[derive(Debug, Clone)]
struct FittedState<F> {
    products: BTreeMap<String, ProductFit<F>>,
    accuracy: Option<f64>,
    metrics: Option<EvaluationReport>,
    trained_at: DateTime<Utc>,
}

/// Per-product forecasting model built from a [`SeriesMethod`]
#[derive(Debug, Clone)]
pub struct SeriesModel<M: SeriesMethod> {
    method: M,
    target: String,
    holdout_days: usize,
    fitted: Option<FittedState<M::Fitted>>,
}

impl<M: SeriesMethod> SeriesModel<M> {
    /// Model fitting `method` to the daily sums of `target`
    pub fn new(method: M, target: impl Into<String>, holdout_days: usize) -> Self {
        Self {
            method,
            target: target.into(),
            holdout_days,
            fitted: None,
        }
    }

    pub fn from_config(method: M, config: &ForecastConfig) -> Self {
        Self::new(method, config.target_column.clone(), config.holdout_days)
    }

    pub fn method(&self) -> &M {
        &self.method
    }

    /// Last training day of a product
    pub fn cutoff(&self, product_id: &str) -> Option<NaiveDate> {
        self.fitted
            .as_ref()
            .and_then(|f| f.products.get(product_id))
            .map(|p| p.cutoff)
    }

    /// Accuracy of the current fitted state
    pub fn accuracy(&self) -> Option<f64> {
        self.fitted.as_ref().and_then(|f| f.accuracy)
    }

    /// Forecast the holdout tail of `series` from a fit on its head
    fn holdout_forecast(&self, series: &DailySeries) -> Option<(Vec<f64>, Vec<f64>)> {
        if self.holdout_days == 0
            || series.len() < self.method.min_observations() + self.holdout_days
        {
            return None;
        }

        let head = series.head(series.len() - self.holdout_days);
        match self.method.fit(&head) {
            Ok(fit) => {
                let predicted = clamp(fit.forecast(self.holdout_days));
                let actual = series.values()[head.len()..].to_vec();
                Some((actual, predicted))
            }
            Err(e) => {
                debug!(product_id = series.product_id(), error = %e, "holdout fit failed");
                None
            }
        }
    }
}

/// Sales cannot be negative
fn clamp(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().map(|v| v.max(0.0)).collect()
}

impl<M: SeriesMethod> ForecastModel for SeriesModel<M> {
    fn model_type(&self) -> ModelType {
        M::MODEL_TYPE
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn train_with_cancel(
        &mut self,
        data: &SalesFrame,
        cancel: &CancellationToken,
    ) -> Result<TrainingOutcome> {
        if data.is_empty() {
            return Err(ForecastError::TrainingError(
                "Training data contains no rows".to_string(),
            ));
        }
        let all_series = data
            .daily_series(&self.target)
            .map_err(|e| ForecastError::TrainingError(e.to_string()))?;

        let mut products = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut actual = Vec::new();
        let mut predicted = Vec::new();

        for (product_id, series) in &all_series {
            cancel.check(&format!("fitting product {}", product_id))?;

            if series.len() < self.method.min_observations() {
                warn!(
                    model_type = %M::MODEL_TYPE,
                    product_id = %product_id,
                    days = series.len(),
                    required = self.method.min_observations(),
                    "skipping product with too little history"
                );
                skipped.push(product_id.clone());
                continue;
            }

            if let Some((a, p)) = self.holdout_forecast(series) {
                actual.extend(a);
                predicted.extend(p);
            }

            match self.method.fit(series) {
                Ok(model) => {
                    products.insert(
                        product_id.clone(),
                        ProductFit {
                            cutoff: series.end(),
                            model,
                        },
                    );
                }
                Err(e) => {
                    warn!(model_type = %M::MODEL_TYPE, product_id = %product_id, error = %e, "fit failed");
                    skipped.push(product_id.clone());
                }
            }
        }

        cancel.check("saving fitted state")?;

        if products.is_empty() {
            return Err(ForecastError::TrainingError(format!(
                "No product could be fitted; {} needs at least {} days of history",
                M::MODEL_TYPE,
                self.method.min_observations()
            )));
        }

        let metrics = if actual.is_empty() {
            None
        } else {
            Some(evaluate(&actual, &predicted)?)
        };
        let accuracy = metrics.map(|m| m.r2);

        info!(
            model_type = %M::MODEL_TYPE,
            products = products.len(),
            skipped = skipped.len(),
            accuracy = ?accuracy,
            "training finished"
        );

        let outcome = TrainingOutcome {
            model_type: M::MODEL_TYPE,
            accuracy,
            metrics,
            products: products.keys().cloned().collect(),
            skipped,
        };

        self.fitted = Some(FittedState {
            products,
            accuracy,
            metrics,
            trained_at: Utc::now(),
        });

        Ok(outcome)
    }

    fn predict(&self, params: &PredictParams) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            ForecastError::NotFitted(format!("{} model has not been trained or loaded", M::MODEL_TYPE))
        })?;

        let product = fitted.products.get(&params.product_id).ok_or_else(|| {
            ForecastError::NotFitted(format!(
                "{} model has no fitted state for product '{}'",
                M::MODEL_TYPE,
                params.product_id
            ))
        })?;

        Ok(clamp(product.model.forecast(params.forecast_days)))
    }

    fn products(&self) -> Vec<String> {
        self.fitted
            .as_ref()
            .map(|f| f.products.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn to_artifact(&self) -> Result<Artifact> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            ForecastError::NotFitted(format!("{} model has nothing to save", M::MODEL_TYPE))
        })?;

        let state = serde_json::to_value(&fitted.products)
            .map_err(|e| ForecastError::SerializationError(e.to_string()))?;

        Ok(Artifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_type: M::MODEL_TYPE,
            accuracy: fitted.accuracy,
            metrics: fitted.metrics,
            trained_at: fitted.trained_at,
            state,
        })
    }

    fn restore(&mut self, artifact: Artifact, origin: &Path) -> Result<()> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ForecastError::corrupt(
                origin,
                format!("unsupported format version {}", artifact.format_version),
            ));
        }
        if artifact.model_type != M::MODEL_TYPE {
            return Err(ForecastError::corrupt(
                origin,
                format!(
                    "artifact holds a {} model, expected {}",
                    artifact.model_type,
                    M::MODEL_TYPE
                ),
            ));
        }

        let products: BTreeMap<String, ProductFit<M::Fitted>> =
            serde_json::from_value(artifact.state).map_err(|e| ForecastError::corrupt(origin, e))?;
        if products.is_empty() {
            return Err(ForecastError::corrupt(origin, "artifact holds no fitted products"));
        }

        self.fitted = Some(FittedState {
            products,
            accuracy: artifact.accuracy,
            metrics: artifact.metrics,
            trained_at: artifact.trained_at,
        });
        Ok(())
    }
}
