//! Gradient-boosted regression trees over lag, rolling and calendar features
//!
//! Squared loss, so each tree fits the residuals of the ensemble so far.
//! Rows are subsampled per round with a seeded generator, which keeps
//! training deterministic. Multi-step forecasts are produced recursively:
//! each predicted day is appended to the history the next day's features
//! are computed from.

use crate::config::{FeatureConfig, ForecastConfig};
use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use crate::models::{FittedSeries, ModelType, SeriesMethod, SeriesModel};
use chrono::Datelike;
use forecast_math::rolling::trailing_mean;
use forecast_math::tree::{RegressionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Gradient-boosted model over daily sales
pub type GradientBoostedModel = SeriesModel<GradientBoostedMethod>;

impl GradientBoostedModel {
    /// Backend whose feature rows follow `config.features`
    pub fn with_config(config: &ForecastConfig) -> Self {
        SeriesModel::from_config(GradientBoostedMethod::from_features(&config.features), config)
    }
}

/// Boosting hyperparameters and the feature layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedMethod {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Fraction of rows sampled for each tree
    pub subsample: f64,
    pub tree: TreeParams,
    pub seed: u64,
    pub features: FeatureLayout,
}

impl Default for GradientBoostedMethod {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            subsample: 0.8,
            tree: TreeParams {
                max_depth: 3,
                min_samples_leaf: 3,
            },
            seed: 42,
            features: FeatureLayout::from(&FeatureConfig::default()),
        }
    }
}

impl GradientBoostedMethod {
    pub fn from_features(features: &FeatureConfig) -> Self {
        Self {
            features: FeatureLayout::from(features),
            ..Self::default()
        }
    }
}

/// Columns of one feature row: lags, trailing means, then calendar flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub lags: Vec<usize>,
    pub windows: Vec<usize>,
    pub calendar: bool,
}

impl From<&FeatureConfig> for FeatureLayout {
    fn from(config: &FeatureConfig) -> Self {
        Self {
            lags: config.lags.clone(),
            windows: config.windows.clone(),
            calendar: config.date_features,
        }
    }
}

impl FeatureLayout {
    /// Days of history needed to compute one feature row
    pub fn lookback(&self) -> usize {
        self.lags
            .iter()
            .chain(&self.windows)
            .copied()
            .max()
            .unwrap_or(1)
            .max(1)
    }

    fn width(&self) -> usize {
        self.lags.len() + self.windows.len() + if self.calendar { 2 } else { 0 }
    }

    /// Features for the day following `history`, which holds `lookback()` days
    fn row(&self, history: &[f64], weekday: u32) -> Vec<f64> {
        let n = history.len();
        let mut row = Vec::with_capacity(self.width());

        for &lag in &self.lags {
            row.push(history[n - lag]);
        }
        for &window in &self.windows {
            row.push(trailing_mean(history, window).unwrap_or(0.0));
        }
        if self.calendar {
            row.push(weekday as f64);
            row.push(if weekday >= 5 { 1.0 } else { 0.0 });
        }

        row
    }
}

/// Fitted ensemble plus the history tail needed to keep forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedFit {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    features: FeatureLayout,
    history: Vec<f64>,
    /// Weekday (Monday = 0) of the first forecast day
    next_weekday: u32,
}

impl BoostedFit {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.base + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

impl SeriesMethod for GradientBoostedMethod {
    type Fitted = BoostedFit;

    const MODEL_TYPE: ModelType = ModelType::GradientBoosted;

    fn min_observations(&self) -> usize {
        2 * self.features.lookback()
    }

    fn fit(&self, series: &DailySeries) -> Result<BoostedFit> {
        let values = series.values();
        if values.len() < self.min_observations() {
            return Err(ForecastError::TrainingError(format!(
                "Gradient-boosted model needs at least {} days, got {}",
                self.min_observations(),
                values.len()
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ForecastError::InvalidConfig(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }

        if self.features.width() == 0 {
            return Err(ForecastError::InvalidConfig(
                "gradient-boosted model needs at least one lag, window or calendar feature"
                    .to_string(),
            ));
        }

        let layout = &self.features;
        let lookback = layout.lookback();
        let first_weekday = series.start().weekday().num_days_from_monday();
        let weekday_at = |t: usize| ((first_weekday as usize + t) % 7) as u32;

        let (features, targets): (Vec<Vec<f64>>, Vec<f64>) = (lookback..values.len())
            .map(|t| (layout.row(&values[t - lookback..t], weekday_at(t)), values[t]))
            .unzip();

        let base = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut fitted = vec![base; targets.len()];
        let mut trees = Vec::with_capacity(self.n_estimators);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let all_rows: Vec<usize> = (0..targets.len()).collect();

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = targets.iter().zip(&fitted).map(|(y, f)| y - f).collect();

            let mut rows: Vec<usize> = all_rows
                .iter()
                .copied()
                .filter(|_| rng.gen::<f64>() < self.subsample)
                .collect();
            if rows.len() < 2 * self.tree.min_samples_leaf {
                rows = all_rows.clone();
            }

            let tree = RegressionTree::fit(&features, &residuals, &rows, self.tree)?;
            for (f, row) in fitted.iter_mut().zip(&features) {
                *f += self.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(BoostedFit {
            base,
            learning_rate: self.learning_rate,
            trees,
            features: layout.clone(),
            history: values[values.len() - lookback..].to_vec(),
            next_weekday: weekday_at(values.len()),
        })
    }
}

impl FittedSeries for BoostedFit {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        let lookback = self.features.lookback();
        let mut history = self.history.clone();
        let mut out = Vec::with_capacity(horizon);

        for step in 0..horizon {
            let weekday = (self.next_weekday + step as u32) % 7;
            let row = self.features.row(&history[history.len() - lookback..], weekday);
            let value = self.predict_row(&row).max(0.0);
            history.push(value);
            out.push(value);
        }

        out
    }
}
