//! Naive backend: flat continuation of the trailing weekly mean

use crate::config::ForecastConfig;
use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use crate::models::{FittedSeries, ModelType, SeriesMethod, SeriesModel};
use forecast_math::rolling::trailing_mean;
use serde::{Deserialize, Serialize};

/// Naive model over daily sales
pub type NaiveModel = SeriesModel<NaiveMethod>;

impl NaiveModel {
    pub fn with_config(config: &ForecastConfig) -> Self {
        SeriesModel::from_config(NaiveMethod::default(), config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveMethod {
    pub window: usize,
}

impl Default for NaiveMethod {
    fn default() -> Self {
        Self { window: 7 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveFit {
    level: f64,
}

impl SeriesMethod for NaiveMethod {
    type Fitted = NaiveFit;

    const MODEL_TYPE: ModelType = ModelType::Naive;

    fn min_observations(&self) -> usize {
        1
    }

    fn fit(&self, series: &DailySeries) -> Result<NaiveFit> {
        let level = trailing_mean(series.values(), self.window).ok_or_else(|| {
            ForecastError::TrainingError(format!(
                "Naive model cannot fit product '{}' with window {}",
                series.product_id(),
                self.window
            ))
        })?;
        Ok(NaiveFit { level })
    }
}

impl FittedSeries for NaiveFit {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        vec![self.level; horizon]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_uses_last_week_only() {
        let mut values = vec![100.0; 10];
        values.extend([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let series = DailySeries::new("P1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values);

        let fit = NaiveMethod::default().fit(&series).unwrap();
        assert_eq!(fit.forecast(3), vec![4.0, 4.0, 4.0]);
    }
}
