//! Shifts and rolling-window statistics
//!
//! Columns are `Option<f64>` so that gaps survive the transformation: a window
//! that is not yet full, or that touches a missing value, produces `None`.

use crate::statistics::{mean, sample_std_dev};
use crate::{MathError, Result};

/// Shift a column down by `periods` rows, filling the head with `None`
pub fn shift(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    let mut shifted = vec![None; values.len().min(periods)];
    if periods < values.len() {
        shifted.extend_from_slice(&values[..values.len() - periods]);
    }
    shifted
}

/// Rolling mean over `window` rows
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    rolling_apply(values, window, |w| mean(w).ok())
}

/// Rolling sample standard deviation over `window` rows
///
/// A window of one row has no sample deviation, so every output is `None`.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    rolling_apply(values, window, |w| sample_std_dev(w).ok())
}

fn rolling_apply<F>(values: &[Option<f64>], window: usize, stat: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }

    let mut output = Vec::with_capacity(values.len());
    let mut buffer = Vec::with_capacity(window);

    for end in 0..values.len() {
        if end + 1 < window {
            output.push(None);
            continue;
        }

        buffer.clear();
        let complete = values[end + 1 - window..=end].iter().all(|v| match v {
            Some(x) => {
                buffer.push(*x);
                true
            }
            None => false,
        });

        output.push(if complete { stat(&buffer) } else { None });
    }

    Ok(output)
}

/// Mean of the last `window` values (or of all of them when the series is shorter)
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if values.is_empty() || window == 0 {
        return None;
    }

    let start = values.len().saturating_sub(window);
    mean(&values[start..]).ok()
}
