//! Descriptive statistics over plain `f64` slices
//!
//! Quantiles use linear interpolation between the two closest ranks, which is
//! what most dataframe libraries default to.

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Arithmetic mean of a non-empty series
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().mean())
}

/// Median of a non-empty series
pub fn median(values: &[f64]) -> Result<f64> {
    quantile(values, 0.5)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample standard deviation needs at least 2 values, have {}",
            values.len()
        )));
    }

    Ok(values.iter().std_dev())
}

/// Population standard deviation (n denominator)
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the deviation of an empty series".to_string(),
        ));
    }

    Ok(values.iter().population_std_dev())
}

/// Quantile `q` in `[0, 1]` with linear interpolation between ranks
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a quantile of an empty series".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be between 0 and 1, got {}",
            q
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Interquartile-range acceptance window for outlier filtering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    /// First quartile
    pub q1: f64,
    /// Third quartile
    pub q3: f64,
    /// Smallest accepted value
    pub lower: f64,
    /// Largest accepted value
    pub upper: f64,
}

impl IqrBounds {
    /// Whether `value` lies inside the window; the bounds themselves are accepted
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Width of the interquartile range
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Compute `[Q1 - k*IQR, Q3 + k*IQR]` for the given series
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Result<IqrBounds> {
    if multiplier < 0.0 {
        return Err(MathError::InvalidInput(
            "IQR multiplier must not be negative".to_string(),
        ));
    }

    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let iqr = q3 - q1;

    Ok(IqrBounds {
        q1,
        q3,
        lower: q1 - multiplier * iqr,
        upper: q3 + multiplier * iqr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_deviation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        assert_relative_eq!(mean(&values).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(population_std_dev(&values).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(
            sample_std_dev(&values).unwrap(),
            (32.0_f64 / 7.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        assert!(mean(&[]).is_err());
        assert!(median(&[]).is_err());
        assert!(sample_std_dev(&[1.0]).is_err());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];

        assert_relative_eq!(quantile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&values, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile(&values, 1.0).unwrap(), 4.0);
        assert!(quantile(&values, 1.5).is_err());
    }

    #[test]
    fn test_median_ignores_input_order() {
        assert_relative_eq!(median(&[9.0, 1.0, 5.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_iqr_bounds_are_inclusive() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let bounds = iqr_bounds(&values, 1.5).unwrap();

        // Q1 = 2, Q3 = 4, IQR = 2
        assert_relative_eq!(bounds.lower, -1.0);
        assert_relative_eq!(bounds.upper, 7.0);
        assert_relative_eq!(bounds.iqr(), 2.0);
        assert!(bounds.contains(-1.0));
        assert!(bounds.contains(7.0));
        assert!(!bounds.contains(7.000001));
    }
}
