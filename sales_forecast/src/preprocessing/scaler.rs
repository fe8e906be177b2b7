//! Feature scaling with a reusable fitted transform

use crate::error::{ForecastError, Result};
use forecast_math::statistics::{mean, population_std_dev};
use serde::{Deserialize, Serialize};

/// Scaling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMethod {
    /// Zero mean, unit variance
    Standard,
    /// Rescale into `[0, 1]`
    MinMax,
}

impl ScalingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingMethod::Standard => "standard",
            ScalingMethod::MinMax => "minmax",
        }
    }
}

/// Per-feature `(offset, scale)` pair; `x' = (x - offset) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct FeatureScale {
    offset: f64,
    scale: f64,
}

/// Fits once on reference rows and reapplies the same transform afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    method: ScalingMethod,
    params: Option<Vec<FeatureScale>>,
}

impl Scaler {
    /// Create a scaler by method name (`standard` or `minmax`)
    pub fn new(method: &str) -> Result<Self> {
        let method = match method.trim().to_ascii_lowercase().as_str() {
            "standard" => ScalingMethod::Standard,
            "minmax" => ScalingMethod::MinMax,
            other => {
                return Err(ForecastError::InvalidConfig(format!(
                    "Unknown scaling method: {}",
                    other
                )))
            }
        };
        Ok(Self::with_method(method))
    }

    pub fn with_method(method: ScalingMethod) -> Self {
        Self {
            method,
            params: None,
        }
    }

    pub fn method(&self) -> ScalingMethod {
        self.method
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Number of features seen by `fit`
    pub fn n_features(&self) -> Option<usize> {
        self.params.as_ref().map(Vec::len)
    }

    /// Learn per-feature parameters from rows of equal width
    pub fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| ForecastError::DataError("Cannot fit a scaler on no rows".to_string()))?;
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(ForecastError::LengthMismatch {
                expected: width,
                actual: bad.len(),
            });
        }

        let mut params = Vec::with_capacity(width);
        for feature in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[feature]).collect();
            params.push(self.fit_feature(&column)?);
        }

        self.params = Some(params);
        Ok(())
    }

    fn fit_feature(&self, column: &[f64]) -> Result<FeatureScale> {
        let (offset, scale) = match self.method {
            ScalingMethod::Standard => (mean(column)?, population_std_dev(column)?),
            ScalingMethod::MinMax => {
                let min = column.iter().copied().fold(f64::INFINITY, f64::min);
                let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
        };

        // Constant features map to zero instead of dividing by zero
        let scale = if scale == 0.0 || !scale.is_finite() { 1.0 } else { scale };
        Ok(FeatureScale { offset, scale })
    }

    fn fitted_params(&self, width: usize) -> Result<&[FeatureScale]> {
        let params = self
            .params
            .as_deref()
            .ok_or_else(|| ForecastError::NotFitted("Scaler has not been fitted".to_string()))?;
        if params.len() != width {
            return Err(ForecastError::LengthMismatch {
                expected: params.len(),
                actual: width,
            });
        }
        Ok(params)
    }

    fn map_rows<F>(&self, rows: &[Vec<f64>], f: F) -> Result<Vec<Vec<f64>>>
    where
        F: Fn(f64, &FeatureScale) -> f64,
    {
        rows.iter()
            .map(|row| {
                let params = self.fitted_params(row.len())?;
                Ok(row.iter().zip(params).map(|(&x, p)| f(x, p)).collect())
            })
            .collect()
    }

    /// Apply the fitted transform
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.map_rows(rows, |x, p| (x - p.offset) / p.scale)
    }

    /// Fit on `rows`, then transform them
    pub fn fit_transform(&mut self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.fit(rows)?;
        self.transform(rows)
    }

    /// Undo the fitted transform
    pub fn inverse_transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.map_rows(rows, |x, p| x * p.scale + p.offset)
    }

    /// Fit on a single feature column
    pub fn fit_column(&mut self, values: &[f64]) -> Result<()> {
        let param = self.fit_feature(values)?;
        self.params = Some(vec![param]);
        Ok(())
    }

    /// Fit on a single feature column, then transform it
    pub fn fit_transform_column(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.fit_column(values)?;
        self.transform_column(values)
    }

    /// Transform a single feature column
    pub fn transform_column(&self, values: &[f64]) -> Result<Vec<f64>> {
        let p = self.fitted_params(1)?[0];
        Ok(values.iter().map(|x| (x - p.offset) / p.scale).collect())
    }

    /// Undo the transform for one value of a single-feature scaler
    pub fn inverse_value(&self, value: f64) -> Result<f64> {
        let p = self.fitted_params(1)?[0];
        Ok(value * p.scale + p.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unknown_method_fails_at_construction() {
        assert!(matches!(
            Scaler::new("robust"),
            Err(ForecastError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_standard_scaling() {
        let mut scaler = Scaler::new("standard").unwrap();
        let out = scaler.fit_transform_column(&[2.0, 4.0, 6.0]).unwrap();

        assert_relative_eq!(out.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(out[2], 1.224744871391589, epsilon = 1e-9);
    }

    #[test]
    fn test_minmax_and_inverse() {
        let rows = vec![vec![0.0, 10.0], vec![5.0, 20.0], vec![10.0, 30.0]];
        let mut scaler = Scaler::new("minmax").unwrap();

        let scaled = scaler.fit_transform(&rows).unwrap();
        assert_eq!(scaled[1], vec![0.5, 0.5]);

        let restored = scaler.inverse_transform(&scaled).unwrap();
        for (a, b) in rows.iter().flatten().zip(restored.iter().flatten()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = Scaler::new("minmax").unwrap();
        assert!(matches!(
            scaler.transform(&[vec![1.0]]),
            Err(ForecastError::NotFitted(_))
        ));
    }

    #[test]
    fn test_constant_column() {
        let mut scaler = Scaler::new("standard").unwrap();
        let out = scaler.fit_transform_column(&[3.0, 3.0]).unwrap();
        assert_eq!(out, vec![0.0, 0.0]);
    }
}
