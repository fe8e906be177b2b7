//! Utility functions for the sales_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Smallest accepted forecast horizon
pub const MIN_FORECAST_DAYS: i64 = 1;
/// Largest accepted forecast horizon
pub const MAX_FORECAST_DAYS: i64 = 365;

/// Check that a forecast horizon is inside `[1, 365]` and convert it to a length
pub fn validate_forecast_days(days: i64) -> Result<usize> {
    if !(MIN_FORECAST_DAYS..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(ForecastError::InvalidRange {
            value: days,
            min: MIN_FORECAST_DAYS,
            max: MAX_FORECAST_DAYS,
        });
    }
    Ok(days as usize)
}

/// Check that a product id is non-blank
pub fn validate_product_id(product_id: &str) -> Result<()> {
    if product_id.trim().is_empty() {
        return Err(ForecastError::DataError(
            "product_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Lower and upper bound around one predicted value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Whether `value` lies inside the band, bounds included
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Half-width of the proportional band for a confidence level
pub fn interval_margin(confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "Confidence level must be between 0 and 1 (exclusive), got {}",
            confidence
        )));
    }
    Ok((1.0 - confidence) / 2.0)
}

/// Proportional band `p * (1 -/+ margin)` around each prediction
///
/// The bounds are ordered so that `lower <= p <= upper` also holds for
/// negative predictions.
pub fn confidence_intervals(predictions: &[f64], confidence: f64) -> Result<Vec<ConfidenceInterval>> {
    let margin = interval_margin(confidence)?;

    Ok(predictions
        .iter()
        .map(|&p| {
            let a = p * (1.0 - margin);
            let b = p * (1.0 + margin);
            ConfidenceInterval {
                lower: a.min(b),
                upper: a.max(b),
            }
        })
        .collect())
}

/// Split a series into a training head and a trailing holdout of `holdout` values
pub fn train_test_split(data: &[f64], holdout: usize) -> (&[f64], &[f64]) {
    let split = data.len().saturating_sub(holdout);
    data.split_at(split)
}

/// Consecutive dates starting at `start`
pub fn date_range(start: NaiveDate, days: usize) -> Vec<NaiveDate> {
    start.iter_days().take(days).collect()
}

/// Date parsing for the timestamp formats found in sales exports
pub mod date_parser {
    use super::*;

    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

    /// Parse a timestamp, dropping any timezone after normalising to UTC
    pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime> {
        let input = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.naive_utc());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
                return Ok(dt);
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(input, format) {
                return Ok(date.and_time(chrono::NaiveTime::default()));
            }
        }

        Err(ForecastError::DataError(format!(
            "Unrecognised timestamp: {}",
            input
        )))
    }
}

/// Cooperative stop signal shared between a caller and a training run
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` if cancellation was requested
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ForecastError::Cancelled(format!("stopped before {}", stage)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_follows_confidence() {
        assert!((interval_margin(0.95).unwrap() - 0.025).abs() < 1e-12);
        assert!((interval_margin(0.8).unwrap() - 0.1).abs() < 1e-12);
        assert!(interval_margin(1.0).is_err());
        assert!(interval_margin(0.0).is_err());
    }

    #[test]
    fn test_intervals_bracket_negative_values() {
        let intervals = confidence_intervals(&[-10.0, 0.0, 10.0], 0.9).unwrap();
        for (p, ci) in [-10.0, 0.0, 10.0].iter().zip(&intervals) {
            assert!(ci.contains(*p));
        }
    }

    #[test]
    fn test_date_parser_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(date_parser::parse_timestamp("2023-01-15").unwrap(), expected);
        assert_eq!(date_parser::parse_timestamp("01/15/2023").unwrap(), expected);
        assert_eq!(
            date_parser::parse_timestamp("2023-01-15T00:00:00Z").unwrap(),
            expected
        );
        assert!(date_parser::parse_timestamp("not-a-date").is_err());
    }

    #[test]
    fn test_train_test_split() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (train, test) = train_test_split(&data, 2);
        assert_eq!(train, &[1.0, 2.0, 3.0]);
        assert_eq!(test, &[4.0, 5.0]);

        let (train, test) = train_test_split(&data, 10);
        assert!(train.is_empty());
        assert_eq!(test.len(), 5);
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check("fit").is_ok());

        clone.cancel();
        assert!(matches!(token.check("fit"), Err(ForecastError::Cancelled(_))));
    }
}
