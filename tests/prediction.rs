use std::time::Duration;

use approx::assert_abs_diff_eq;
use augur::data::{PredictionRequest, ValidationError};
use augur::pipeline::{PipelineConfig, PredictionError, PredictionPipeline};

fn pipeline() -> PredictionPipeline {
    PredictionPipeline::new(PipelineConfig::default())
}

/// The canonical smoke request: six observed rows in three dimensions, a
/// linear hint, two query rows.
fn linear_request() -> PredictionRequest {
    PredictionRequest {
        x_observed: vec![
            vec![0.5, -1.2, 0.8],
            vec![1.0, 0.2, -0.5],
            vec![-0.3, 1.5, 0.1],
            vec![0.8, -0.7, 1.3],
            vec![1.2, 0.9, -0.4],
            vec![-0.5, 0.3, 0.9],
        ],
        y_observed: vec![2.1, 1.8, -0.5, 2.3, 3.1, 0.8],
        x_predict: vec![vec![0.7, -1.1, 0.2], vec![1.5, 0.6, -0.9]],
        t: "The output y is a linear combination of the input features with some noise."
            .to_string(),
        n: 6,
        k: 2,
        d: 3,
    }
}

#[test]
fn end_to_end_returns_one_finite_prediction_per_query_row() {
    let predictions = pipeline().predict(&linear_request()).unwrap();
    assert_eq!(predictions.len(), 2);
    assert!(predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn identical_requests_produce_bit_identical_predictions() {
    let request = linear_request();
    let first = pipeline().predict(&request).unwrap();
    let second = pipeline().predict(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn declared_shape_violation_is_a_validation_error() {
    let mut request = linear_request();
    request.x_observed.pop();
    match pipeline().predict(&request).unwrap_err() {
        PredictionError::Validation(ValidationError::RowCountMismatch {
            field,
            declared,
            found,
        }) => {
            assert_eq!(field, "x_observed");
            assert_eq!(declared, 6);
            assert_eq!(found, 5);
        }
        other => panic!("Expected RowCountMismatch, got {other:?}"),
    }
}

#[test]
fn zero_budget_times_out_instead_of_returning_partial_results() {
    let pipeline = PredictionPipeline::new(PipelineConfig {
        time_budget: Duration::ZERO,
    });
    match pipeline.predict(&linear_request()).unwrap_err() {
        PredictionError::Timeout { budget_secs } => assert_eq!(budget_secs, 0.0),
        other => panic!("Expected Timeout, got {other:?}"),
    }
}

#[test]
fn noiseless_linear_relationship_is_recovered() {
    let x_observed: Vec<Vec<f64>> = vec![
        vec![0.5, -1.2, 0.8],
        vec![1.0, 0.2, -0.5],
        vec![-0.3, 1.5, 0.1],
        vec![0.8, -0.7, 1.3],
        vec![1.2, 0.9, -0.4],
        vec![-0.5, 0.3, 0.9],
        vec![0.2, 0.6, -1.1],
        vec![-0.9, -0.4, 0.5],
    ];
    let truth = |row: &[f64]| 2.0 * row[0] - row[1] + 0.5 * row[2] + 1.0;
    let y_observed: Vec<f64> = x_observed.iter().map(|r| truth(r)).collect();
    let x_predict = vec![vec![0.3, 0.4, 0.5], vec![-0.6, 1.0, -0.2]];

    let request = PredictionRequest {
        n: x_observed.len(),
        k: x_predict.len(),
        d: 3,
        x_observed,
        y_observed,
        x_predict: x_predict.clone(),
        t: "y is linear in the inputs".to_string(),
    };

    let predictions = pipeline().predict(&request).unwrap();
    for (prediction, row) in predictions.iter().zip(&x_predict) {
        assert_abs_diff_eq!(*prediction, truth(row), epsilon = 0.3);
    }
}

#[test]
fn quadratic_hint_recovers_a_parabola() {
    let xs: Vec<f64> = vec![-2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5, 2.0];
    let x_observed: Vec<Vec<f64>> = xs.iter().map(|&x| vec![x]).collect();
    let y_observed: Vec<f64> = xs.iter().map(|&x| x * x).collect();
    let x_predict = vec![vec![1.25], vec![-0.75]];

    let request = PredictionRequest {
        n: x_observed.len(),
        k: x_predict.len(),
        d: 1,
        x_observed,
        y_observed,
        x_predict,
        t: "roughly quadratic".to_string(),
    };

    let predictions = pipeline().predict(&request).unwrap();
    assert_abs_diff_eq!(predictions[0], 1.5625, epsilon = 0.3);
    assert_abs_diff_eq!(predictions[1], 0.5625, epsilon = 0.3);
}

#[test]
fn periodic_hint_tracks_a_sine_wave() {
    let n = 24;
    // The second column is deterministic filler, decorrelated from the
    // first so it carries no information about the target.
    let x_observed: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let t = i as f64 * 0.5;
            vec![t, ((i * 37) % 11) as f64 * 0.1]
        })
        .collect();
    let y_observed: Vec<f64> = x_observed.iter().map(|row| row[0].sin()).collect();
    let x_predict = vec![vec![1.3, 0.0], vec![7.9, 1.0]];

    let request = PredictionRequest {
        n,
        k: x_predict.len(),
        d: 2,
        x_observed,
        y_observed,
        x_predict: x_predict.clone(),
        t: "periodic in x1".to_string(),
    };

    let predictions = pipeline().predict(&request).unwrap();
    for (prediction, row) in predictions.iter().zip(&x_predict) {
        assert_abs_diff_eq!(*prediction, row[0].sin(), epsilon = 0.3);
    }
}

#[test]
fn query_column_mismatch_is_rejected() {
    let mut request = linear_request();
    for row in request.x_predict.iter_mut() {
        row.pop();
    }
    match pipeline().predict(&request).unwrap_err() {
        PredictionError::Validation(ValidationError::RowWidthMismatch { field, .. }) => {
            assert_eq!(field, "x_predict");
        }
        other => panic!("Expected RowWidthMismatch, got {other:?}"),
    }
}

#[test]
fn non_finite_payload_is_rejected_before_fitting() {
    let mut request = linear_request();
    request.x_observed[0][0] = f64::NAN;
    match pipeline().predict(&request).unwrap_err() {
        PredictionError::Validation(ValidationError::NonFiniteValue { field, .. }) => {
            assert_eq!(field, "x_observed");
        }
        other => panic!("Expected NonFiniteValue, got {other:?}"),
    }
}

#[test]
fn request_payload_decodes_from_the_documented_json_shape() {
    let raw = r#"{
        "x_observed": [[0.5, -1.2, 0.8], [1.0, 0.2, -0.5]],
        "y_observed": [2.1, 1.8],
        "x_predict": [[0.7, -1.1, 0.2]],
        "t": "linear in x2",
        "n": 2,
        "k": 1,
        "d": 3
    }"#;
    let request: PredictionRequest = serde_json::from_str(raw).unwrap();
    assert_eq!(request.n, 2);
    assert_eq!(request.x_observed.len(), 2);
    assert_eq!(request.t, "linear in x2");
}
