mod common;

use pretty_assertions::assert_eq;
use sales_forecast::config::{CleaningConfig, FeatureConfig};
use sales_forecast::data::QUANTITY;
use sales_forecast::preprocessing::{DataCleaner, FeatureEngineer, Scaler, DEFAULT_IQR_MULTIPLIER};
use sales_forecast::{ForecastError, SalesFrame};

fn quantity_frame(values: &[Option<f64>]) -> SalesFrame {
    let mut frame = SalesFrame::new(
        (0..values.len() as i64).map(common::day).collect(),
        vec!["P1".to_string(); values.len()],
    )
    .unwrap();
    frame.set_column(QUANTITY, values.to_vec()).unwrap();
    frame
}

#[test]
fn test_remove_duplicates_is_idempotent() {
    let base = common::sales_frame(&[("P1", 4, 1.0), ("P2", 3, 2.0)]);
    let doubled = base.select_rows(&[0, 1, 1, 2, 3, 3, 4, 5, 6, 6]);
    let cleaner = DataCleaner::new();

    let once = cleaner.remove_duplicates(&doubled);
    let twice = cleaner.remove_duplicates(&once);

    assert_eq!(once.len(), 7);
    assert_eq!(once, twice);
    assert_eq!(once, base);
}

#[test]
fn test_rows_differing_in_any_column_are_kept() {
    let frame = quantity_frame(&[Some(1.0), Some(1.0)]);
    // Same values, different timestamps
    assert_eq!(DataCleaner::new().remove_duplicates(&frame).len(), 2);
}

#[test]
fn test_outlier_bounds_are_inclusive() {
    // Q1 = 2, Q3 = 4, so the accepted window is exactly [-1, 7]
    let values: Vec<Option<f64>> = [-1.0, 2.0, 2.0, 2.0, 3.0, 4.0, 4.0, 4.0, 7.0, 8.0]
        .iter()
        .copied()
        .map(Some)
        .collect();
    let frame = quantity_frame(&values);

    let filtered = DataCleaner::new()
        .remove_outliers(&frame, QUANTITY, DEFAULT_IQR_MULTIPLIER)
        .unwrap();

    let kept = filtered.column(QUANTITY).unwrap();
    assert_eq!(kept.len(), 9);
    assert!(kept.contains(&Some(-1.0)));
    assert!(kept.contains(&Some(7.0)));
    assert!(!kept.contains(&Some(8.0)));
}

#[test]
fn test_outliers_on_missing_column() {
    let frame = quantity_frame(&[Some(1.0)]);
    let result = DataCleaner::new().remove_outliers(&frame, "price", DEFAULT_IQR_MULTIPLIER);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_unknown_strategy_leaves_data_unchanged() {
    let frame = quantity_frame(&[Some(1.0), None, Some(3.0)]);

    let result = DataCleaner::new().handle_missing_values(&frame, "interpolate");

    assert_eq!(result, frame);
}

#[test]
fn test_none_strategy_keeps_gaps() {
    let frame = quantity_frame(&[Some(1.0), None]);
    let result = DataCleaner::new().handle_missing_values(&frame, "none");
    assert_eq!(result.column(QUANTITY).unwrap()[1], None);
}

#[test]
fn test_clean_collapses_duplicate_keys() {
    let mut frame = SalesFrame::new(
        vec![common::day(0), common::day(0), common::day(1)],
        vec!["P1".to_string(); 3],
    )
    .unwrap();
    frame
        .set_column(QUANTITY, vec![Some(5.0), Some(6.0), Some(5.5)])
        .unwrap();

    let cleaned = DataCleaner::new()
        .clean(&frame, QUANTITY, &CleaningConfig::default())
        .unwrap();

    assert_eq!(cleaned.len(), 2);
    assert_eq!(cleaned.column(QUANTITY).unwrap(), &[Some(5.0), Some(5.5)]);
}

#[test]
fn test_outliers_are_judged_per_product() {
    let combined = common::sales_frame(&[("SMALL", 28, 1.0), ("LARGE", 7, 1000.0)]);
    let cleaner = DataCleaner::new();

    // Across the whole column the high-volume product looks like an outlier
    let global = cleaner
        .remove_outliers(&combined, QUANTITY, DEFAULT_IQR_MULTIPLIER)
        .unwrap();
    assert_eq!(global.len(), 28);

    let cleaned = cleaner
        .clean(&combined, QUANTITY, &CleaningConfig::default())
        .unwrap();
    assert_eq!(cleaned.len(), 35);
}

#[test]
fn test_feature_columns() {
    let frame = common::sales_frame(&[("P1", 10, 1.0)]);
    let config = FeatureConfig {
        date_features: true,
        lags: vec![1, 7],
        windows: vec![3],
    };

    let engineered = FeatureEngineer::new()
        .engineer(&frame, QUANTITY, &config)
        .unwrap();

    for name in [
        "quantity",
        "year",
        "month",
        "day",
        "day_of_week",
        "is_weekend",
        "quantity_lag_1",
        "quantity_lag_7",
        "quantity_rolling_mean_3",
        "quantity_rolling_std_3",
    ] {
        assert!(engineered.has_column(name), "missing column {}", name);
    }
    assert_eq!(engineered.len(), frame.len());

    // 2024-01-06 is a Saturday
    assert_eq!(engineered.column("is_weekend").unwrap()[5], Some(1.0));
    assert_eq!(engineered.column("day_of_week").unwrap()[0], Some(0.0));

    let lag = engineered.column("quantity_lag_1").unwrap();
    assert_eq!(lag[0], None);
    assert_eq!(lag[1], frame.column(QUANTITY).unwrap()[0]);

    let rolling = engineered.column("quantity_rolling_mean_3").unwrap();
    assert_eq!(rolling[1], None);
    assert!(rolling[2].is_some());
}

#[test]
fn test_scaler_reuses_fitted_parameters() {
    let mut scaler = Scaler::new("minmax").unwrap();
    scaler.fit(&[vec![0.0], vec![10.0]]).unwrap();

    let scaled = scaler.transform(&[vec![5.0], vec![20.0]]).unwrap();
    assert_eq!(scaled, vec![vec![0.5], vec![2.0]]);

    assert!(matches!(
        Scaler::new("log"),
        Err(ForecastError::InvalidConfig(_))
    ));
}
