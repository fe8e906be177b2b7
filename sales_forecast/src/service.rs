//! Facade wiring trainer, predictor and batch predictor together

use crate::batch::BatchPredictor;
use crate::config::ForecastConfig;
use crate::data::{DataSource, FileDataSource, SalesFrame};
use crate::error::Result;
use crate::models::ModelRegistry;
use crate::predictor::Predictor;
use crate::schemas::{
    BatchPredictionRequest, BatchPredictionResponse, PredictionRequest, PredictionResponse,
    TrainingRequest, TrainingResponse,
};
use crate::storage::{ArtifactStore, FileArtifactStore};
use crate::trainer::{Trainer, TrainingReport};
use std::sync::Arc;

/// Entry point for the serving layer
#[derive(Debug)]
pub struct ForecastService {
    trainer: Trainer,
    predictor: Arc<Predictor>,
    batch: BatchPredictor,
}

impl ForecastService {
    pub fn new(
        config: ForecastConfig,
        registry: ModelRegistry,
        store: Arc<dyn ArtifactStore>,
        source: Arc<dyn DataSource>,
    ) -> Result<Self> {
        let trainer = Trainer::new(config.clone(), registry.clone(), Arc::clone(&store), source)?;
        let predictor = Arc::new(Predictor::new(config, registry, store)?);
        let batch = BatchPredictor::new(Arc::clone(&predictor));

        Ok(Self {
            trainer,
            predictor,
            batch,
        })
    }

    /// Service over local files with every shipped backend
    pub fn with_files(config: ForecastConfig) -> Result<Self> {
        Self::new(
            config,
            ModelRegistry::with_defaults(),
            Arc::new(FileArtifactStore::new()),
            Arc::new(FileDataSource),
        )
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn train(&self, request: &TrainingRequest) -> Result<TrainingResponse> {
        let report = self
            .trainer
            .train_model(&request.model_type, request.data_path.as_deref())?;
        Ok(self.after_training(&report))
    }

    /// Train from an in-memory frame
    pub fn train_frame(&self, model_type: &str, frame: &SalesFrame) -> Result<TrainingResponse> {
        let model_type = self.trainer.resolve(model_type)?;
        let report = self.trainer.train_frame(model_type, frame)?;
        Ok(self.after_training(&report))
    }

    fn after_training(&self, report: &TrainingReport) -> TrainingResponse {
        self.predictor.invalidate(report.model_type);
        TrainingResponse::completed(report)
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let model_type = self.predictor.resolve(request.model_type.as_deref())?;
        let forecast = self
            .predictor
            .predict_with(model_type, &request.product_id, request.forecast_days)?;
        Ok(forecast.into())
    }

    pub fn predict_batch(&self, request: &BatchPredictionRequest) -> Result<BatchPredictionResponse> {
        let model_type = self.predictor.resolve(request.model_type.as_deref())?;
        let results = self
            .batch
            .predict_batch_with(model_type, &request.product_ids, request.forecast_days)?;
        Ok(BatchPredictionResponse::from_results(
            request.forecast_days,
            results,
        ))
    }
}
