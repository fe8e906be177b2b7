//! Sequence-based backend: a small feed-forward network over a sliding window
//!
//! The series is min-max scaled, each window of `lookback` days predicts the
//! next day, and the network is trained with plain SGD from a seeded Gaussian
//! initialisation. Forecasts feed each prediction back into the window.

use crate::config::ForecastConfig;
use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use crate::models::{FittedSeries, ModelType, SeriesMethod, SeriesModel};
use crate::preprocessing::{Scaler, ScalingMethod};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Sequence-based model over daily sales
pub type SequenceModel = SeriesModel<SequenceMethod>;

impl SequenceModel {
    pub fn with_config(config: &ForecastConfig) -> Self {
        SeriesModel::from_config(SequenceMethod::default(), config)
    }
}

/// Network shape and optimiser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceMethod {
    pub lookback: usize,
    pub hidden: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for SequenceMethod {
    fn default() -> Self {
        Self {
            lookback: 14,
            hidden: 16,
            epochs: 150,
            learning_rate: 0.01,
            seed: 7,
        }
    }
}

/// One hidden tanh layer and a linear output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Network {
    w1: Vec<Vec<f64>>,
    b1: Vec<f64>,
    w2: Vec<f64>,
    b2: f64,
}

impl Network {
    fn init(lookback: usize, hidden: usize, rng: &mut StdRng) -> Result<Self> {
        let normal = Normal::new(0.0, (1.0 / lookback as f64).sqrt())
            .map_err(|e| ForecastError::TrainingError(e.to_string()))?;

        Ok(Self {
            w1: (0..hidden)
                .map(|_| (0..lookback).map(|_| normal.sample(rng)).collect())
                .collect(),
            b1: vec![0.0; hidden],
            w2: (0..hidden).map(|_| normal.sample(rng)).collect(),
            b2: 0.0,
        })
    }

    fn hidden(&self, x: &[f64]) -> Vec<f64> {
        self.w1
            .iter()
            .zip(&self.b1)
            .map(|(w, b)| (w.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + b).tanh())
            .collect()
    }

    fn forward(&self, x: &[f64]) -> f64 {
        let h = self.hidden(x);
        self.w2.iter().zip(&h).map(|(w, h)| w * h).sum::<f64>() + self.b2
    }

    /// One SGD step on squared error
    fn step(&mut self, x: &[f64], y: f64, lr: f64) {
        let h = self.hidden(x);
        let out = self.w2.iter().zip(&h).map(|(w, h)| w * h).sum::<f64>() + self.b2;
        let err = out - y;

        for j in 0..h.len() {
            let grad_h = err * self.w2[j] * (1.0 - h[j] * h[j]);
            self.w2[j] -= lr * err * h[j];
            for (w, xi) in self.w1[j].iter_mut().zip(x) {
                *w -= lr * grad_h * xi;
            }
            self.b1[j] -= lr * grad_h;
        }
        self.b2 -= lr * err;
    }

    fn is_finite(&self) -> bool {
        self.b2.is_finite()
            && self.w2.iter().chain(&self.b1).all(|v| v.is_finite())
            && self.w1.iter().flatten().all(|v| v.is_finite())
    }
}

/// Fitted network, its scaler and the last scaled window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceFit {
    network: Network,
    scaler: Scaler,
    window: Vec<f64>,
}

impl SeriesMethod for SequenceMethod {
    type Fitted = SequenceFit;

    const MODEL_TYPE: ModelType = ModelType::SequenceBased;

    fn min_observations(&self) -> usize {
        self.lookback + 7
    }

    fn fit(&self, series: &DailySeries) -> Result<SequenceFit> {
        let values = series.values();
        if self.lookback == 0 || self.hidden == 0 {
            return Err(ForecastError::InvalidConfig(
                "lookback and hidden must be greater than zero".to_string(),
            ));
        }
        if values.len() < self.min_observations() {
            return Err(ForecastError::TrainingError(format!(
                "Sequence model needs at least {} days, got {}",
                self.min_observations(),
                values.len()
            )));
        }

        let mut scaler = Scaler::with_method(ScalingMethod::MinMax);
        let scaled = scaler.fit_transform_column(values)?;

        let mut order: Vec<usize> = (self.lookback..scaled.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut network = Network::init(self.lookback, self.hidden, &mut rng)?;

        for _ in 0..self.epochs {
            order.shuffle(&mut rng);
            for &t in &order {
                network.step(&scaled[t - self.lookback..t], scaled[t], self.learning_rate);
            }
        }

        if !network.is_finite() {
            return Err(ForecastError::TrainingError(
                "Sequence model diverged during training".to_string(),
            ));
        }

        Ok(SequenceFit {
            network,
            scaler,
            window: scaled[scaled.len() - self.lookback..].to_vec(),
        })
    }
}

impl FittedSeries for SequenceFit {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        let lookback = self.window.len();
        let mut window = self.window.clone();
        let mut out = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let next = self.network.forward(&window[window.len() - lookback..]);
            window.push(next);
            out.push(self.scaler.inverse_value(next).unwrap_or(0.0));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> DailySeries {
        DailySeries::new("P1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values)
    }

    #[test]
    fn test_forecast_length_and_scale() {
        let values: Vec<f64> = (0..42).map(|i| 50.0 + (i % 7) as f64).collect();
        let fit = SequenceMethod::default().fit(&series(values)).unwrap();

        let forecast = fit.forecast(10);
        assert_eq!(forecast.len(), 10);
        assert!(forecast.iter().all(|v| v.is_finite()));
        assert!(forecast.iter().all(|&v| v > 25.0 && v < 85.0));
    }

    #[test]
    fn test_same_seed_same_fit() {
        let values: Vec<f64> = (0..30).map(|i| (i * 3 % 11) as f64).collect();
        let method = SequenceMethod::default();
        assert_eq!(
            method.fit(&series(values.clone())).unwrap(),
            method.fit(&series(values)).unwrap()
        );
    }
}
