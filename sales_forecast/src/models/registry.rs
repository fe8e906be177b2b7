//! Name-to-constructor registry for forecasting backends

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{
    ForecastModel, GradientBoostedModel, ModelType, NaiveModel, SequenceModel, TrendModel,
};
use std::collections::BTreeMap;

/// Builds an unfitted backend from configuration
pub type ModelConstructor = fn(&ForecastConfig) -> Box<dyn ForecastModel>;

/// Explicit registry of available backends, owned by the trainer and predictor
#[derive(Clone)]
pub struct ModelRegistry {
    constructors: BTreeMap<ModelType, ModelConstructor>,
}

impl ModelRegistry {
    /// Registry without any backend
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with every shipped backend
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ModelType::TrendBased, |c| Box::new(TrendModel::with_config(c)));
        registry.register(ModelType::GradientBoosted, |c| {
            Box::new(GradientBoostedModel::with_config(c))
        });
        registry.register(ModelType::SequenceBased, |c| Box::new(SequenceModel::with_config(c)));
        registry.register(ModelType::Naive, |c| Box::new(NaiveModel::with_config(c)));
        registry
    }

    /// Add or replace the constructor for a model type
    pub fn register(&mut self, model_type: ModelType, constructor: ModelConstructor) {
        self.constructors.insert(model_type, constructor);
    }

    /// Resolve a requested name to a registered model type
    pub fn resolve(&self, name: &str) -> Result<ModelType> {
        ModelType::from_name(name)
            .filter(|t| self.constructors.contains_key(t))
            .ok_or_else(|| ForecastError::UnknownModelType(name.to_string()))
    }

    /// Fresh, unfitted backend instance
    pub fn create(&self, model_type: ModelType, config: &ForecastConfig) -> Result<Box<dyn ForecastModel>> {
        let constructor = self
            .constructors
            .get(&model_type)
            .ok_or_else(|| ForecastError::UnknownModelType(model_type.to_string()))?;
        Ok(constructor(config))
    }

    /// Canonical names of the registered backends
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().map(|t| t.as_str()).collect()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_names_and_aliases() {
        let registry = ModelRegistry::with_defaults();

        assert_eq!(registry.resolve("trend-based").unwrap(), ModelType::TrendBased);
        assert_eq!(registry.resolve("prophet").unwrap(), ModelType::TrendBased);
        assert_eq!(registry.resolve("XGBoost").unwrap(), ModelType::GradientBoosted);
        assert_eq!(registry.resolve("lstm").unwrap(), ModelType::SequenceBased);
        assert!(matches!(
            registry.resolve("arima"),
            Err(ForecastError::UnknownModelType(_))
        ));
    }

    #[test]
    fn test_unregistered_type_is_unknown() {
        let registry = ModelRegistry::empty();
        assert!(registry.resolve("naive").is_err());
        assert!(registry.create(ModelType::Naive, &ForecastConfig::default()).is_err());
    }

    #[test]
    fn test_created_models_match_type() {
        let registry = ModelRegistry::default();
        let config = ForecastConfig::default();
        for model_type in ModelType::ALL {
            let model = registry.create(model_type, &config).unwrap();
            assert_eq!(model.model_type(), model_type);
            assert!(!model.is_fitted());
        }
    }
}
