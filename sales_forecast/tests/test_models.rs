mod common;

use rstest::rstest;
use sales_forecast::models::{Artifact, ARTIFACT_FORMAT_VERSION};
use sales_forecast::storage::ArtifactStore;
use sales_forecast::utils::CancellationToken;
use sales_forecast::{
    ForecastConfig, ForecastError, MemoryArtifactStore, ModelRegistry, ModelType, PredictParams,
    SalesFrame,
};
use std::path::Path;

fn trained(model_type: ModelType, frame: &SalesFrame) -> Box<dyn sales_forecast::ForecastModel> {
    let mut model = ModelRegistry::with_defaults()
        .create(model_type, &ForecastConfig::default())
        .unwrap();
    model.train(frame).unwrap();
    model
}

#[rstest]
#[case(ModelType::TrendBased)]
#[case(ModelType::GradientBoosted)]
#[case(ModelType::SequenceBased)]
#[case(ModelType::Naive)]
fn test_save_load_roundtrip(#[case] model_type: ModelType) {
    let frame = common::sales_frame(&[("P1", 60, 10.0), ("P2", 45, 3.0)]);
    let model = trained(model_type, &frame);
    let params = PredictParams::new("P1", 21);
    let before = model.predict(&params).unwrap();

    let store = MemoryArtifactStore::new();
    let path = Path::new("models/roundtrip.json");
    model.save(&store, path).unwrap();

    let mut restored = ModelRegistry::with_defaults()
        .create(model_type, &ForecastConfig::default())
        .unwrap();
    restored.load(&store, path).unwrap();

    assert!(restored.is_fitted());
    assert_eq!(restored.products(), vec!["P1".to_string(), "P2".to_string()]);
    assert_eq!(restored.predict(&params).unwrap(), before);
}

#[rstest]
#[case(ModelType::GradientBoosted)]
#[case(ModelType::SequenceBased)]
fn test_reloaded_artifact_is_bit_identical(#[case] model_type: ModelType) {
    let frame = common::sales_frame(&[("P1", 60, 10.0), ("P2", 45, 3.0)]);
    let model = trained(model_type, &frame);

    let store = MemoryArtifactStore::new();
    let first = Path::new("models/first.json");
    let second = Path::new("models/second.json");
    model.save(&store, first).unwrap();

    let mut restored = ModelRegistry::with_defaults()
        .create(model_type, &ForecastConfig::default())
        .unwrap();
    restored.load(&store, first).unwrap();
    restored.save(&store, second).unwrap();

    assert_eq!(store.read(first).unwrap(), store.read(second).unwrap());
}

#[test]
fn test_feature_config_reaches_gradient_boosted_backend() {
    let frame = common::sales_frame(&[("P1", 60, 10.0)]);
    let params = PredictParams::new("P1", 14);
    let default_predictions = trained(ModelType::GradientBoosted, &frame)
        .predict(&params)
        .unwrap();

    let mut config = ForecastConfig::default();
    config.features.lags = vec![1, 2];
    config.features.windows = vec![3];
    config.features.date_features = false;
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::GradientBoosted, &config)
        .unwrap();
    model.train(&frame).unwrap();

    assert_ne!(model.predict(&params).unwrap(), default_predictions);
}

#[rstest]
#[case(ModelType::TrendBased)]
#[case(ModelType::GradientBoosted)]
#[case(ModelType::SequenceBased)]
#[case(ModelType::Naive)]
fn test_predictions_are_deterministic_and_non_negative(#[case] model_type: ModelType) {
    let frame = common::sales_frame(&[("P1", 60, 0.5)]);
    let model = trained(model_type, &frame);
    let params = PredictParams::new("P1", 90);

    let first = model.predict(&params).unwrap();
    let second = model.predict(&params).unwrap();

    assert_eq!(first.len(), 90);
    assert_eq!(first, second);
    assert!(first.iter().all(|&v| v >= 0.0 && v.is_finite()));
}

#[test]
fn test_accuracy_reported_from_holdout() {
    let frame = common::sales_frame(&[("P1", 60, 10.0)]);
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::TrendBased, &ForecastConfig::default())
        .unwrap();

    let outcome = model.train(&frame).unwrap();

    let metrics = outcome.metrics.unwrap();
    assert_eq!(outcome.accuracy, Some(metrics.r2));
    assert!(metrics.mae >= 0.0);
    assert!(metrics.rmse >= metrics.mae);
}

#[test]
fn test_predict_before_training() {
    let model = ModelRegistry::with_defaults()
        .create(ModelType::TrendBased, &ForecastConfig::default())
        .unwrap();

    let result = model.predict(&PredictParams::new("P1", 7));
    assert!(matches!(result, Err(ForecastError::NotFitted(_))));
}

#[test]
fn test_unknown_product_is_not_fitted() {
    let model = trained(ModelType::Naive, &common::sales_frame(&[("P1", 10, 1.0)]));
    let result = model.predict(&PredictParams::new("P9", 7));
    assert!(matches!(result, Err(ForecastError::NotFitted(_))));
}

#[test]
fn test_training_requires_rows_and_target() {
    let registry = ModelRegistry::with_defaults();
    let config = ForecastConfig::default();

    let mut model = registry.create(ModelType::TrendBased, &config).unwrap();
    let empty = common::sales_frame(&[]);
    assert!(matches!(model.train(&empty), Err(ForecastError::TrainingError(_))));

    let no_target = SalesFrame::new(vec![common::day(0)], vec!["P1".to_string()]).unwrap();
    assert!(matches!(model.train(&no_target), Err(ForecastError::TrainingError(_))));
}

#[test]
fn test_short_histories_are_skipped() {
    let frame = common::sales_frame(&[("LONG", 60, 5.0), ("SHORT", 10, 5.0)]);
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::GradientBoosted, &ForecastConfig::default())
        .unwrap();

    let outcome = model.train(&frame).unwrap();

    assert_eq!(outcome.products, vec!["LONG".to_string()]);
    assert_eq!(outcome.skipped, vec!["SHORT".to_string()]);
}

#[test]
fn test_no_fittable_product_is_a_training_error() {
    let frame = common::sales_frame(&[("SHORT", 10, 5.0)]);
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::GradientBoosted, &ForecastConfig::default())
        .unwrap();

    assert!(matches!(model.train(&frame), Err(ForecastError::TrainingError(_))));
    assert!(!model.is_fitted());
}

#[test]
fn test_failed_training_keeps_previous_state() {
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::TrendBased, &ForecastConfig::default())
        .unwrap();
    model.train(&common::sales_frame(&[("P1", 30, 4.0)])).unwrap();
    let params = PredictParams::new("P1", 5);
    let before = model.predict(&params).unwrap();

    assert!(model.train(&common::sales_frame(&[("P1", 3, 4.0)])).is_err());

    assert_eq!(model.predict(&params).unwrap(), before);
}

#[test]
fn test_cancelled_training() {
    let token = CancellationToken::new();
    token.cancel();
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::Naive, &ForecastConfig::default())
        .unwrap();

    let result = model.train_with_cancel(&common::sales_frame(&[("P1", 30, 4.0)]), &token);

    assert!(matches!(result, Err(ForecastError::Cancelled(_))));
    assert!(!model.is_fitted());
}

#[test]
fn test_load_missing_artifact() {
    let store = MemoryArtifactStore::new();
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::Naive, &ForecastConfig::default())
        .unwrap();

    let result = model.load(&store, Path::new("missing.json"));
    assert!(matches!(result, Err(ForecastError::ArtifactNotFound(_))));
}

#[test]
fn test_load_corrupt_payloads() {
    let store = MemoryArtifactStore::new();
    let mut model = ModelRegistry::with_defaults()
        .create(ModelType::TrendBased, &ForecastConfig::default())
        .unwrap();

    let garbage = Path::new("garbage.json");
    store.write(garbage, b"not json at all").unwrap();
    assert!(matches!(
        model.load(&store, garbage),
        Err(ForecastError::ArtifactCorrupt { .. })
    ));

    // A naive artifact cannot be loaded into a trend-based model
    let naive = trained(ModelType::Naive, &common::sales_frame(&[("P1", 10, 1.0)]));
    let other_type = Path::new("naive.json");
    naive.save(&store, other_type).unwrap();
    assert!(matches!(
        model.load(&store, other_type),
        Err(ForecastError::ArtifactCorrupt { .. })
    ));

    // Right envelope, wrong state shape
    let mut artifact = trained(ModelType::TrendBased, &common::sales_frame(&[("P1", 30, 1.0)]))
        .to_artifact()
        .unwrap();
    artifact.state = serde_json::json!({"P1": {"unexpected": true}});
    let bad_state = Path::new("bad_state.json");
    store.write(bad_state, &artifact.to_bytes().unwrap()).unwrap();
    assert!(matches!(
        model.load(&store, bad_state),
        Err(ForecastError::ArtifactCorrupt { .. })
    ));

    assert!(!model.is_fitted());
}

#[test]
fn test_artifact_envelope_fields() {
    let model = trained(ModelType::TrendBased, &common::sales_frame(&[("P1", 40, 2.0)]));
    let artifact = model.to_artifact().unwrap();

    assert_eq!(artifact.format_version, ARTIFACT_FORMAT_VERSION);
    assert_eq!(artifact.model_type, ModelType::TrendBased);
    assert!(artifact.accuracy.is_some());

    let json: serde_json::Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
    assert_eq!(json["model_type"], "trend-based");

    let decoded = Artifact::from_bytes(Path::new("a.json"), &artifact.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, artifact);
}

#[test]
fn test_model_type_names() {
    assert_eq!("xgboost".parse::<ModelType>().unwrap(), ModelType::GradientBoosted);
    assert_eq!(ModelType::SequenceBased.to_string(), "sequence-based");
    assert!(matches!(
        "arima".parse::<ModelType>(),
        Err(ForecastError::UnknownModelType(_))
    ));
}
