//! Sales data handling for forecasting
//!
//! Raw transactions are read through polars and converted into a
//! [`SalesFrame`]: row-aligned timestamps, product ids and named numeric
//! columns. Preprocessing appends derived columns to the same frame, and
//! backends fit against the per-product [`DailySeries`] it aggregates to.

use crate::error::{ForecastError, Result};
use crate::utils::{date_parser, date_range};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;

pub const TIMESTAMP: &str = "timestamp";
pub const PRODUCT_ID: &str = "product_id";
pub const QUANTITY: &str = "quantity";
pub const UNIT_PRICE: &str = "unit_price";
pub const TOTAL_AMOUNT: &str = "total_amount";

/// One sales transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub timestamp: NaiveDateTime,
    pub product_id: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_amount: Option<f64>,
}

impl SalesRecord {
    /// Record with every numeric field present
    pub fn new(
        timestamp: NaiveDateTime,
        product_id: impl Into<String>,
        quantity: f64,
        unit_price: f64,
    ) -> Self {
        Self {
            timestamp,
            product_id: product_id.into(),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            total_amount: Some(quantity * unit_price),
        }
    }
}

/// A named numeric column with gaps
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Present values only, in row order
    pub fn present(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Number of missing entries
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Row-aligned table of sales data plus derived feature columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesFrame {
    timestamps: Vec<NaiveDateTime>,
    product_ids: Vec<String>,
    columns: Vec<Column>,
}

/// Hashable identity of a full row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RowKey<'a> {
    timestamp: NaiveDateTime,
    product_id: &'a str,
    values: Vec<Option<u64>>,
}

impl SalesFrame {
    /// Create a frame with only the key columns
    pub fn new(timestamps: Vec<NaiveDateTime>, product_ids: Vec<String>) -> Result<Self> {
        if timestamps.len() != product_ids.len() {
            return Err(ForecastError::LengthMismatch {
                expected: timestamps.len(),
                actual: product_ids.len(),
            });
        }

        Ok(Self {
            timestamps,
            product_ids,
            columns: Vec::new(),
        })
    }

    /// Build a frame with the three core numeric columns
    pub fn from_records(records: &[SalesRecord]) -> Self {
        let mut frame = Self {
            timestamps: records.iter().map(|r| r.timestamp).collect(),
            product_ids: records.iter().map(|r| r.product_id.clone()).collect(),
            columns: Vec::with_capacity(3),
        };

        frame.columns.push(Column::new(
            QUANTITY,
            records.iter().map(|r| r.quantity).collect(),
        ));
        frame.columns.push(Column::new(
            UNIT_PRICE,
            records.iter().map(|r| r.unit_price).collect(),
        ));
        frame.columns.push(Column::new(
            TOTAL_AMOUNT,
            records.iter().map(|r| r.total_amount).collect(),
        ));

        frame
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the frame has no rows
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Names of the numeric columns, in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Values of a numeric column, if present
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Values of a numeric column, or a data error naming it
    pub fn require_column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| ForecastError::DataError(format!("Column '{}' not found", name)))
    }

    /// Add a column, replacing any existing column of the same name
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.len() {
            return Err(ForecastError::LengthMismatch {
                expected: self.len(),
                actual: values.len(),
            });
        }

        let name = name.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
        Ok(())
    }

    /// New frame holding the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            timestamps: rows.iter().map(|&r| self.timestamps[r]).collect(),
            product_ids: rows.iter().map(|&r| self.product_ids[r].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), rows.iter().map(|&r| c.values[r]).collect()))
                .collect(),
        }
    }

    /// New frame holding the rows for which `keep` returns true
    pub fn filter_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.len()).filter(|&r| keep(r)).collect();
        self.select_rows(&rows)
    }

    /// Map every column, leaving keys untouched
    pub(crate) fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Column) -> Vec<Option<f64>>,
    {
        Self {
            timestamps: self.timestamps.clone(),
            product_ids: self.product_ids.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), f(c)))
                .collect(),
        }
    }

    fn row_key(&self, row: usize) -> RowKey<'_> {
        RowKey {
            timestamp: self.timestamps[row],
            product_id: &self.product_ids[row],
            values: self
                .columns
                .iter()
                .map(|c| c.values[row].map(f64::to_bits))
                .collect(),
        }
    }

    /// Row indices whose full-row identity was not seen earlier
    pub(crate) fn first_occurrences(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.len());
        (0..self.len())
            .filter(|&r| seen.insert(self.row_key(r)))
            .collect()
    }

    /// Row indices whose `(product_id, timestamp)` key was not seen earlier
    pub(crate) fn first_key_occurrences(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.len());
        (0..self.len())
            .filter(|&r| seen.insert((self.product_ids[r].as_str(), self.timestamps[r])))
            .collect()
    }

    /// Row indices per product, each in row order
    pub fn product_groups(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, product) in self.product_ids.iter().enumerate() {
            groups.entry(product.as_str()).or_default().push(row);
        }
        groups
    }

    /// Distinct product ids in sorted order
    pub fn products(&self) -> Vec<String> {
        self.product_groups().keys().map(|p| p.to_string()).collect()
    }

    /// Aggregate `target` into one contiguous daily series per product
    ///
    /// Values on the same day are summed, missing values are skipped, and
    /// days without any sale are filled with 0.
    pub fn daily_series(&self, target: &str) -> Result<BTreeMap<String, DailySeries>> {
        let values = self.require_column(target)?;
        let mut series = BTreeMap::new();

        for (product, rows) in self.product_groups() {
            let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for &row in &rows {
                let total = per_day.entry(self.timestamps[row].date()).or_insert(0.0);
                if let Some(v) = values[row] {
                    *total += v;
                }
            }

            let (Some(&start), Some(&end)) = (per_day.keys().next(), per_day.keys().next_back())
            else {
                continue;
            };

            let days = (end - start).num_days() as usize + 1;
            let daily = date_range(start, days)
                .into_iter()
                .map(|day| per_day.get(&day).copied().unwrap_or(0.0))
                .collect();

            series.insert(
                product.to_string(),
                DailySeries::new(product, start, daily),
            );
        }

        Ok(series)
    }
}

/// Contiguous daily history of one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    product_id: String,
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    pub fn new(product_id: impl Into<String>, start: NaiveDate, values: Vec<f64>) -> Self {
        Self {
            product_id: product_id.into(),
            start,
            values,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last observed day (the training cutoff)
    pub fn end(&self) -> NaiveDate {
        self.start + chrono::Duration::days(self.values.len().saturating_sub(1) as i64)
    }

    /// Calendar dates of the observations
    pub fn dates(&self) -> Vec<NaiveDate> {
        date_range(self.start, self.values.len())
    }

    /// Series restricted to the first `len` days
    pub fn head(&self, len: usize) -> Self {
        Self {
            product_id: self.product_id.clone(),
            start: self.start,
            values: self.values[..len.min(self.values.len())].to_vec(),
        }
    }
}

/// Loader for sales data files and polars frames
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load sales data from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SalesFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Load sales data from a Parquet file
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<SalesFrame> {
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;

        Self::from_dataframe(&df)
    }

    /// Convert a polars DataFrame into a [`SalesFrame`]
    ///
    /// `timestamp` (or `date`), `product_id` and `quantity` are required;
    /// `unit_price` and `total_amount` are carried over when present.
    pub fn from_dataframe(df: &DataFrame) -> Result<SalesFrame> {
        let time_column = Self::detect_time_column(df)?;

        let timestamps = Self::string_column(df, &time_column)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Some(raw) => date_parser::parse_timestamp(&raw),
                None => Err(ForecastError::DataError(format!(
                    "Missing timestamp in row {}",
                    row
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let product_ids = Self::string_column(df, PRODUCT_ID)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing product_id in row {}", row))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut frame = SalesFrame::new(timestamps, product_ids)?;
        frame.set_column(QUANTITY, Self::numeric_column(df, QUANTITY)?)?;

        for optional in [UNIT_PRICE, TOTAL_AMOUNT] {
            if df.get_column_names().contains(&optional) {
                frame.set_column(optional, Self::numeric_column(df, optional)?)?;
            }
        }

        Ok(frame)
    }

    /// Build a frame from in-memory records
    pub fn from_records(records: &[SalesRecord]) -> SalesFrame {
        SalesFrame::from_records(records)
    }

    fn detect_time_column(df: &DataFrame) -> Result<String> {
        let names = df.get_column_names();
        for candidate in [TIMESTAMP, "date"] {
            if names.contains(&candidate) {
                return Ok(candidate.to_string());
            }
        }

        Err(ForecastError::DataError(
            "No timestamp or date column found in data".to_string(),
        ))
    }

    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let column = df
            .column(name)
            .map_err(|e| ForecastError::DataError(format!("Column '{}' not found: {}", name, e)))?;
        let cast = column.cast(&DataType::Utf8)?;
        let values = cast.utf8()?.into_iter().map(|v| v.map(str::to_string)).collect();
        Ok(values)
    }

    fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df
            .column(name)
            .map_err(|e| ForecastError::DataError(format!("Column '{}' not found: {}", name, e)))?;
        let cast = column.cast(&DataType::Float64).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' cannot be converted to f64: {}", name, e))
        })?;
        let values = cast.f64()?.into_iter().collect();
        Ok(values)
    }
}

/// Source of tabular sales records, addressed by path or connection string
pub trait DataSource: Send + Sync + std::fmt::Debug {
    /// Load every record available at `location`
    fn load(&self, location: &str) -> Result<SalesFrame>;
}

/// Reads CSV files, or Parquet files when the extension says so
#[derive(Debug, Clone, Default)]
pub struct FileDataSource;

impl DataSource for FileDataSource {
    fn load(&self, location: &str) -> Result<SalesFrame> {
        let path = Path::new(location);
        let is_parquet = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("parquet"));

        if is_parquet {
            DataLoader::from_parquet(path)
        } else {
            DataLoader::from_csv(path)
        }
    }
}
