//! Duplicate, missing-value and outlier handling

use crate::config::CleaningConfig;
use crate::data::SalesFrame;
use crate::error::Result;
use forecast_math::statistics::{iqr_bounds, mean, median};
use tracing::{debug, warn};

/// Multiplier of the interquartile range used by the outlier rule
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// How gaps in numeric columns are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValueStrategy {
    /// Fill each column's gaps with the column mean
    Mean,
    /// Fill each column's gaps with the column median
    Median,
    /// Drop every row that has a gap in any column
    Drop,
    /// Leave gaps in place
    None,
}

impl MissingValueStrategy {
    /// Parse a strategy name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mean" => Some(Self::Mean),
            "median" => Some(Self::Median),
            "drop" => Some(Self::Drop),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Drop => "drop",
            Self::None => "none",
        }
    }
}

/// Cleans raw sales frames before feature engineering
#[derive(Debug, Clone, Default)]
pub struct DataCleaner;

impl DataCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Drop rows identical to an earlier row, keeping the first occurrence
    pub fn remove_duplicates(&self, frame: &SalesFrame) -> SalesFrame {
        let keep = frame.first_occurrences();
        if keep.len() < frame.len() {
            debug!(removed = frame.len() - keep.len(), "removed duplicate rows");
        }
        frame.select_rows(&keep)
    }

    /// Apply a named missing-value strategy
    ///
    /// An unknown strategy name leaves the frame unchanged.
    pub fn handle_missing_values(&self, frame: &SalesFrame, strategy: &str) -> SalesFrame {
        let Some(parsed) = MissingValueStrategy::from_name(strategy) else {
            warn!(strategy, "unknown missing-value strategy, leaving data unchanged");
            return frame.clone();
        };
        self.apply_strategy(frame, parsed)
    }

    /// Apply a parsed missing-value strategy
    pub fn apply_strategy(&self, frame: &SalesFrame, strategy: MissingValueStrategy) -> SalesFrame {
        match strategy {
            MissingValueStrategy::None => frame.clone(),
            MissingValueStrategy::Drop => {
                let columns = frame.columns();
                frame.filter_rows(|row| columns.iter().all(|c| c.values()[row].is_some()))
            }
            MissingValueStrategy::Mean | MissingValueStrategy::Median => {
                frame.map_columns(|column| {
                    let present = column.present();
                    let fill = if strategy == MissingValueStrategy::Mean {
                        mean(&present).ok()
                    } else {
                        median(&present).ok()
                    };
                    column.values().iter().map(|v| v.or(fill)).collect()
                })
            }
        }
    }

    /// Keep rows whose `column` value lies within the IQR bounds, inclusive
    ///
    /// Rows where the column is missing are dropped.
    pub fn remove_outliers(
        &self,
        frame: &SalesFrame,
        column: &str,
        multiplier: f64,
    ) -> Result<SalesFrame> {
        let values = frame.require_column(column)?;
        let keep = Self::rows_within_bounds(values, &(0..frame.len()).collect::<Vec<_>>(), multiplier)?;

        if keep.len() < frame.len() {
            debug!(column, removed = frame.len() - keep.len(), "removed outlier rows");
        }
        Ok(frame.select_rows(&keep))
    }

    /// Outlier rule applied separately within each product's rows
    pub fn remove_outliers_by_product(
        &self,
        frame: &SalesFrame,
        column: &str,
        multiplier: f64,
    ) -> Result<SalesFrame> {
        let values = frame.require_column(column)?;

        let mut keep = Vec::with_capacity(frame.len());
        for rows in frame.product_groups().values() {
            keep.extend(Self::rows_within_bounds(values, rows, multiplier)?);
        }
        keep.sort_unstable();

        if keep.len() < frame.len() {
            debug!(column, removed = frame.len() - keep.len(), "removed outlier rows");
        }
        Ok(frame.select_rows(&keep))
    }

    fn rows_within_bounds(
        values: &[Option<f64>],
        rows: &[usize],
        multiplier: f64,
    ) -> Result<Vec<usize>> {
        let present: Vec<f64> = rows.iter().filter_map(|&r| values[r]).collect();
        if present.is_empty() {
            return Ok(Vec::new());
        }

        let bounds = iqr_bounds(&present, multiplier)?;
        Ok(rows
            .iter()
            .copied()
            .filter(|&r| values[r].map_or(false, |v| bounds.contains(v)))
            .collect())
    }

    /// Keep the first row for each `(product_id, timestamp)` key
    pub fn collapse_duplicate_keys(&self, frame: &SalesFrame) -> SalesFrame {
        let keep = frame.first_key_occurrences();
        if keep.len() < frame.len() {
            debug!(removed = frame.len() - keep.len(), "collapsed rows sharing a product and timestamp");
        }
        frame.select_rows(&keep)
    }

    /// Full cleaning pass used before training
    pub fn clean(&self, frame: &SalesFrame, target: &str, config: &CleaningConfig) -> Result<SalesFrame> {
        let deduped = self.remove_duplicates(frame);
        let filled = self.handle_missing_values(&deduped, &config.missing_strategy);

        let filtered = if config.remove_outliers {
            self.remove_outliers_by_product(&filled, target, config.outlier_multiplier)?
        } else {
            filled
        };

        let cleaned = self.collapse_duplicate_keys(&filtered);
        debug!(rows_in = frame.len(), rows_out = cleaned.len(), "cleaned sales data");
        Ok(cleaned)
    }
}
