use approx::assert_relative_eq;
use sales_forecast::metrics::{
    evaluate, mean_absolute_error, r2_score, root_mean_squared_error,
};
use sales_forecast::ForecastError;

#[test]
fn test_perfect_forecast() {
    let report = evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();

    assert_eq!(report.mae, 0.0);
    assert_eq!(report.rmse, 0.0);
    assert_eq!(report.r2, 1.0);
}

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
    assert_relative_eq!(
        root_mean_squared_error(&actual, &predicted).unwrap(),
        30.0_f64.sqrt() / 5.0_f64.sqrt(),
        epsilon = 1e-12
    );
    assert_relative_eq!(r2_score(&actual, &predicted).unwrap(), 1.0 - 30.0 / 1000.0, epsilon = 1e-12);
}

#[test]
fn test_constant_truth_gives_zero_r2() {
    assert_eq!(r2_score(&[5.0, 5.0, 5.0], &[4.0, 5.0, 6.0]).unwrap(), 0.0);

    let report = evaluate(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap();
    assert_eq!(report.r2, 0.0);
}

#[test]
fn test_length_mismatch() {
    let err = evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::LengthMismatch {
            expected: 3,
            actual: 2
        }
    ));
}

#[test]
fn test_empty_input() {
    assert!(matches!(evaluate(&[], &[]), Err(ForecastError::DataError(_))));
}
