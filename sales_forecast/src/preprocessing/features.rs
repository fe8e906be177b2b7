//! Derived feature columns
//!
//! Lag and rolling columns are computed within each product's rows in
//! chronological order, then scattered back to the original row positions.

use crate::config::FeatureConfig;
use crate::data::SalesFrame;
use crate::error::Result;
use chrono::Datelike;
use forecast_math::rolling::{rolling_mean, rolling_std, shift};

/// Builds date, lag and rolling-window columns
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Add `year`, `month`, `day`, `day_of_week` (Monday = 0) and `is_weekend`
    pub fn add_date_features(&self, frame: &SalesFrame) -> Result<SalesFrame> {
        let dates: Vec<_> = frame.timestamps().iter().map(|t| t.date()).collect();
        let mut out = frame.clone();

        out.set_column("year", dates.iter().map(|d| Some(d.year() as f64)).collect())?;
        out.set_column("month", dates.iter().map(|d| Some(d.month() as f64)).collect())?;
        out.set_column("day", dates.iter().map(|d| Some(d.day() as f64)).collect())?;
        out.set_column(
            "day_of_week",
            dates
                .iter()
                .map(|d| Some(d.weekday().num_days_from_monday() as f64))
                .collect(),
        )?;
        out.set_column(
            "is_weekend",
            dates
                .iter()
                .map(|d| Some(if d.weekday().num_days_from_monday() >= 5 { 1.0 } else { 0.0 }))
                .collect(),
        )?;

        Ok(out)
    }

    /// Add `{column}_lag_{k}` for each lag
    pub fn add_lag_features(&self, frame: &SalesFrame, column: &str, lags: &[usize]) -> Result<SalesFrame> {
        let mut out = frame.clone();
        for &lag in lags {
            let values = per_product(frame, column, |v| Ok(shift(v, lag)))?;
            out.set_column(format!("{}_lag_{}", column, lag), values)?;
        }
        Ok(out)
    }

    /// Add `{column}_rolling_mean_{w}` and `{column}_rolling_std_{w}` for each window
    pub fn add_rolling_features(
        &self,
        frame: &SalesFrame,
        column: &str,
        windows: &[usize],
    ) -> Result<SalesFrame> {
        let mut out = frame.clone();
        for &window in windows {
            let means = per_product(frame, column, |v| Ok(rolling_mean(v, window)?))?;
            out.set_column(format!("{}_rolling_mean_{}", column, window), means)?;

            let stds = per_product(frame, column, |v| Ok(rolling_std(v, window)?))?;
            out.set_column(format!("{}_rolling_std_{}", column, window), stds)?;
        }
        Ok(out)
    }

    /// Apply every configured feature step for `column`
    pub fn engineer(&self, frame: &SalesFrame, column: &str, config: &FeatureConfig) -> Result<SalesFrame> {
        let mut out = if config.date_features {
            self.add_date_features(frame)?
        } else {
            frame.clone()
        };

        if !config.lags.is_empty() {
            out = self.add_lag_features(&out, column, &config.lags)?;
        }
        if !config.windows.is_empty() {
            out = self.add_rolling_features(&out, column, &config.windows)?;
        }

        tracing::debug!(
            column,
            columns = out.columns().len(),
            "engineered features"
        );
        Ok(out)
    }
}

/// Run `transform` over each product's values in time order
fn per_product<F>(frame: &SalesFrame, column: &str, transform: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(&[Option<f64>]) -> Result<Vec<Option<f64>>>,
{
    let source = frame.require_column(column)?;
    let timestamps = frame.timestamps();
    let mut output = vec![None; frame.len()];

    for (_, mut rows) in frame.product_groups() {
        rows.sort_by_key(|&r| timestamps[r]);
        let values: Vec<Option<f64>> = rows.iter().map(|&r| source[r]).collect();
        for (row, value) in rows.into_iter().zip(transform(&values)?) {
            output[row] = value;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_lags_stay_within_product() {
        let day = |d: u32| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let mut frame = SalesFrame::new(
            vec![day(1), day(1), day(2), day(2)],
            vec!["A".into(), "B".into(), "A".into(), "B".into()],
        )
        .unwrap();
        frame
            .set_column("quantity", vec![Some(1.0), Some(10.0), Some(2.0), Some(20.0)])
            .unwrap();

        let out = FeatureEngineer::new()
            .add_lag_features(&frame, "quantity", &[1])
            .unwrap();

        assert_eq!(
            out.column("quantity_lag_1").unwrap(),
            &[None, None, Some(1.0), Some(10.0)]
        );
    }
}
