//! Training orchestration: select a backend, prepare data, fit, persist

use crate::config::ForecastConfig;
use crate::data::{DataSource, FileDataSource, SalesFrame};
use crate::error::{ForecastError, Result};
use crate::metrics::EvaluationReport;
use crate::models::{ModelRegistry, ModelType};
use crate::preprocessing::{DataCleaner, FeatureEngineer};
use crate::storage::{ArtifactStore, FileArtifactStore, PathLocks};
use crate::utils::CancellationToken;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of a completed training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub model_type: ModelType,
    pub accuracy: Option<f64>,
    pub metrics: Option<EvaluationReport>,
    pub model_path: PathBuf,
    pub products: Vec<String>,
    pub skipped: Vec<String>,
}

/// Unusable training input is a training failure; I/O and other errors pass through
fn as_training_error(err: ForecastError) -> ForecastError {
    match err {
        ForecastError::DataError(msg) => ForecastError::TrainingError(msg),
        other => other,
    }
}

/// Fits backends and writes their artifacts
#[derive(Debug)]
pub struct Trainer {
    config: ForecastConfig,
    registry: ModelRegistry,
    store: Arc<dyn ArtifactStore>,
    source: Arc<dyn DataSource>,
    locks: PathLocks,
    cleaner: DataCleaner,
    engineer: FeatureEngineer,
}

impl Trainer {
    pub fn new(
        config: ForecastConfig,
        registry: ModelRegistry,
        store: Arc<dyn ArtifactStore>,
        source: Arc<dyn DataSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            store,
            source,
            locks: PathLocks::new(),
            cleaner: DataCleaner::new(),
            engineer: FeatureEngineer::new(),
        })
    }

    /// Trainer reading files and writing artifacts under `config.model_dir`
    pub fn with_files(config: ForecastConfig) -> Result<Self> {
        Self::new(
            config,
            ModelRegistry::with_defaults(),
            Arc::new(FileArtifactStore::new()),
            Arc::new(FileDataSource),
        )
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Resolve a requested model name against the registry
    pub fn resolve(&self, name: &str) -> Result<ModelType> {
        self.registry.resolve(name)
    }

    /// Train `model_type` on the data at `data_path`, or the configured default source
    pub fn train_model(&self, model_type: &str, data_path: Option<&str>) -> Result<TrainingReport> {
        self.train_model_with_cancel(model_type, data_path, &CancellationToken::new())
    }

    pub fn train_model_with_cancel(
        &self,
        model_type: &str,
        data_path: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TrainingReport> {
        let model_type = self.registry.resolve(model_type)?;

        let location = match data_path {
            Some(path) => path.to_string(),
            None => self
                .config
                .data_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    ForecastError::TrainingError(
                        "No data path given and no default data source configured".to_string(),
                    )
                })?,
        };

        info!(model_type = %model_type, source = %location, "loading training data");
        let raw = self.source.load(&location).map_err(as_training_error)?;
        self.train_frame_with_cancel(model_type, &raw, cancel)
    }

    /// Train on an already loaded frame
    pub fn train_frame(&self, model_type: ModelType, raw: &SalesFrame) -> Result<TrainingReport> {
        self.train_frame_with_cancel(model_type, raw, &CancellationToken::new())
    }

    pub fn train_frame_with_cancel(
        &self,
        model_type: ModelType,
        raw: &SalesFrame,
        cancel: &CancellationToken,
    ) -> Result<TrainingReport> {
        cancel.check("preprocessing")?;
        let prepared = self.prepare(raw).map_err(as_training_error)?;

        let path = self.config.model_path(model_type);
        let lock = self.locks.lock_for(&path);
        let _writer = lock.lock();

        let mut model = self.registry.create(model_type, &self.config)?;
        let outcome = model.train_with_cancel(&prepared, cancel)?;

        cancel.check("writing the artifact")?;
        model.save(self.store.as_ref(), &path)?;

        info!(
            model_type = %model_type,
            path = %path.display(),
            accuracy = ?outcome.accuracy,
            products = outcome.products.len(),
            "model trained"
        );

        Ok(TrainingReport {
            model_type,
            accuracy: outcome.accuracy,
            metrics: outcome.metrics,
            model_path: path,
            products: outcome.products,
            skipped: outcome.skipped,
        })
    }

    /// Clean and feature-engineer a raw frame
    pub fn prepare(&self, raw: &SalesFrame) -> Result<SalesFrame> {
        let target = &self.config.target_column;
        let cleaned = self.cleaner.clean(raw, target, &self.config.cleaning)?;
        let prepared = self.engineer.engineer(&cleaned, target, &self.config.features)?;

        debug!(
            rows = prepared.len(),
            columns = prepared.columns().len(),
            "prepared training data"
        );
        Ok(prepared)
    }
}
