//! Trend-based backend: damped Holt smoothing with additive weekly seasonality

use crate::config::ForecastConfig;
use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use crate::models::{FittedSeries, ModelType, SeriesMethod, SeriesModel};
use forecast_math::smoothing::{DampedHolt, HoltState, LinearRegression};
use serde::{Deserialize, Serialize};

/// Default trend damping factor
pub const DEFAULT_DAMPING: f64 = 0.98;

const SEASON: usize = 7;

/// Trend-based model over daily sales
pub type TrendModel = SeriesModel<TrendMethod>;

impl TrendModel {
    pub fn with_config(config: &ForecastConfig) -> Self {
        SeriesModel::from_config(TrendMethod::default(), config)
    }
}

/// Damped Holt smoothing; seasonal indices are added once two full weeks exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendMethod {
    pub damping: f64,
}

impl Default for TrendMethod {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
        }
    }
}

/// Fitted trend and weekly profile for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    holt: HoltState,
    /// Additive offset per position in the week; empty when not seasonal
    seasonal: Vec<f64>,
    /// Seasonal position of the first forecast day
    phase: usize,
}

/// Mean detrended residual per weekday position, centred on zero
fn seasonal_indices(values: &[f64]) -> Result<Vec<f64>> {
    let line = LinearRegression::fit(values)?;

    let mut sums = [0.0; SEASON];
    let mut counts = [0usize; SEASON];
    for (i, &v) in values.iter().enumerate() {
        sums[i % SEASON] += v - line.value_at(i as f64);
        counts[i % SEASON] += 1;
    }

    let mut indices: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let centre = indices.iter().sum::<f64>() / SEASON as f64;
    indices.iter_mut().for_each(|v| *v -= centre);

    Ok(indices)
}

impl SeriesMethod for TrendMethod {
    type Fitted = TrendFit;

    const MODEL_TYPE: ModelType = ModelType::TrendBased;

    fn min_observations(&self) -> usize {
        SEASON
    }

    fn fit(&self, series: &DailySeries) -> Result<TrendFit> {
        let values = series.values();
        if values.len() < self.min_observations() {
            return Err(ForecastError::TrainingError(format!(
                "Trend model needs at least {} days, got {}",
                self.min_observations(),
                values.len()
            )));
        }

        let seasonal = if values.len() >= 2 * SEASON {
            seasonal_indices(values)?
        } else {
            Vec::new()
        };

        let adjusted: Vec<f64> = if seasonal.is_empty() {
            values.to_vec()
        } else {
            values
                .iter()
                .enumerate()
                .map(|(i, v)| v - seasonal[i % SEASON])
                .collect()
        };

        let (_, holt) = DampedHolt::optimize(&adjusted, self.damping)?;

        Ok(TrendFit {
            holt,
            seasonal,
            phase: values.len() % SEASON,
        })
    }
}

impl FittedSeries for TrendFit {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| {
                let season = if self.seasonal.is_empty() {
                    0.0
                } else {
                    self.seasonal[(self.phase + h - 1) % SEASON]
                };
                self.holt.forecast(h) + season
            })
            .collect()
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
    fn test_rising_series_keeps_rising() {
        let values: Vec<f64> = (0..30).map(|i| 10.0 + 2.0 * i as f64).collect();
        let fit = TrendMethod::default().fit(&series(values)).unwrap();

        let forecast = fit.forecast(5);
        assert_eq!(forecast.len(), 5);
        assert!(forecast[0] > 60.0);
        assert!(forecast[4] > forecast[0]);
    }

    #[test]
    fn test_weekly_pattern_is_carried_forward() {
        let week = [5.0, 5.0, 5.0, 5.0, 5.0, 20.0, 20.0];
        let values: Vec<f64> = week.iter().copied().cycle().take(56).collect();
        let fit = TrendMethod::default().fit(&series(values)).unwrap();

        // 56 days is a whole number of weeks, so day 6 of the forecast is a peak day
        let forecast = fit.forecast(7);
        assert!(forecast[5] > forecast[0] + 5.0);
        assert!(forecast[6] > forecast[2] + 5.0);
    }

    #[test]
    fn test_short_series_is_rejected() {
        assert!(TrendMethod::default().fit(&series(vec![1.0; 3])).is_err());
    }
}
