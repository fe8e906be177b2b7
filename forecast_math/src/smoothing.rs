//! Trend estimation for time series
//!
//! Contains:
//! - Least-squares linear regression over an evenly spaced series
//! - Damped Holt (double exponential) smoothing with a small parameter search

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Ordinary least-squares line through `(index, value)` pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
}

impl LinearRegression {
    /// Fit a line through the values, using their positions as x
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(MathError::InsufficientData(
                "Not enough data for linear regression. Need at least 2 points.".to_string(),
            ));
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            numerator += dx * (y - y_mean);
            denominator += dx * dx;
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;

        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    /// Slope per period
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Value of the line at x = 0
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Value of the line at position `x`
    pub fn value_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Damped Holt smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampedHolt {
    alpha: f64,
    beta: f64,
    phi: f64,
}

/// Level and trend after running Holt smoothing over a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltState {
    /// Final smoothed level
    pub level: f64,
    /// Final smoothed trend
    pub trend: f64,
    /// Damping factor applied to the trend at each step
    pub phi: f64,
    /// Sum of squared one-step-ahead errors
    pub sse: f64,
}

const ALPHA_GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const BETA_GRID: [f64; 5] = [0.01, 0.05, 0.1, 0.2, 0.3];

// Points used to seed level and trend
const INIT_WINDOW: usize = 7;

impl DampedHolt {
    /// Create smoothing parameters; `alpha` and `beta` in (0, 1), `phi` in (0, 1]
    pub fn new(alpha: f64, beta: f64, phi: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(MathError::InvalidInput(
                "Alpha must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        if beta <= 0.0 || beta >= 1.0 {
            return Err(MathError::InvalidInput(
                "Beta must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        if phi <= 0.0 || phi > 1.0 {
            return Err(MathError::InvalidInput(
                "Phi must be in (0, 1]".to_string(),
            ));
        }

        Ok(Self { alpha, beta, phi })
    }

    /// Level smoothing factor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Trend smoothing factor
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Trend damping factor
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Run the smoother over `values` and return the final state
    pub fn fit(&self, values: &[f64]) -> Result<HoltState> {
        let seed = LinearRegression::fit(&values[..values.len().min(INIT_WINDOW)])?;

        // Level one step before the first observation
        let mut level = seed.value_at(-1.0);
        let mut trend = seed.slope();
        let mut sse = 0.0;

        for &value in values {
            let forecast = level + self.phi * trend;
            sse += (value - forecast).powi(2);

            let new_level = self.alpha * value + (1.0 - self.alpha) * forecast;
            trend = self.beta * (new_level - level) + (1.0 - self.beta) * self.phi * trend;
            level = new_level;
        }

        if !level.is_finite() || !trend.is_finite() {
            return Err(MathError::CalculationError(
                "Holt smoothing diverged".to_string(),
            ));
        }

        Ok(HoltState {
            level,
            trend,
            phi: self.phi,
            sse,
        })
    }

    /// Pick `alpha` and `beta` from a fixed grid by one-step SSE
    ///
    /// Ties keep the earliest grid point, so the search is deterministic.
    pub fn optimize(values: &[f64], phi: f64) -> Result<(Self, HoltState)> {
        let mut best: Option<(Self, HoltState)> = None;

        for &alpha in &ALPHA_GRID {
            for &beta in &BETA_GRID {
                let params = Self::new(alpha, beta, phi)?;
                let state = match params.fit(values) {
                    Ok(state) => state,
                    Err(MathError::CalculationError(_)) => continue,
                    Err(e) => return Err(e),
                };

                let better = best
                    .as_ref()
                    .map_or(true, |(_, current)| state.sse < current.sse);
                if better {
                    best = Some((params, state));
                }
            }
        }

        best.ok_or_else(|| {
            MathError::CalculationError("No smoothing parameters converged".to_string())
        })
    }
}

impl HoltState {
    /// Forecast `h` steps past the end of the fitted series (h >= 1)
    pub fn forecast(&self, h: usize) -> f64 {
        let mut damped = 0.0;
        let mut factor = 1.0;
        for _ in 0..h {
            factor *= self.phi;
            damped += factor;
        }
        self.level + damped * self.trend
    }
}
