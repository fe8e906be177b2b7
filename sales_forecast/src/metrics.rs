//! Metrics for evaluating forecast accuracy

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Accuracy of a forecast against observed values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Evaluation:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  R2:    {:.4}", self.r2)?;
        Ok(())
    }
}

fn check_pair(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ForecastError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ForecastError::DataError(
            "Cannot evaluate empty sequences".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute error
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;

    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Root mean squared error
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;

    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok((sum / y_true.len() as f64).sqrt())
}

/// Coefficient of determination
///
/// Defined as 0.0 when `y_true` has no variance.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Ok(0.0);
    }

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(1.0 - ss_res / ss_tot)
}

/// Compute MAE, RMSE and R² for paired true and predicted values
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<EvaluationReport> {
    Ok(EvaluationReport {
        mae: mean_absolute_error(y_true, y_pred)?,
        rmse: root_mean_squared_error(y_true, y_pred)?,
        r2: r2_score(y_true, y_pred)?,
    })
}
