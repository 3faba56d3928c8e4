//! # Request Validation Module
//!
//! This module is the exclusive entry point for caller-provided payloads.
//! The host hands over an already-decoded (but not yet validated) request;
//! everything here is checked against the declared `n`, `k`, `d` before any
//! numeric work happens, and the raw nested lists are materialized into the
//! clean `ndarray` structures the statistical core operates on.
//!
//! - Caller-centric errors: a failed check is assumed to be a caller
//!   mistake. Every `ValidationError` names the offending field and, where
//!   it applies, the position, so the mismatch can be fixed without
//!   guesswork.
//! - Finite data only: NaN and infinity are rejected up front rather than
//!   surfacing later as an opaque solver failure.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One decoded prediction request, exactly as the host hands it over.
///
/// `n`, `k` and `d` declare the expected shapes of the three arrays; the
/// declaration is verified, never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Observed inputs, `n` rows of `d` values.
    pub x_observed: Vec<Vec<f64>>,
    /// Observed targets, length `n`.
    pub y_observed: Vec<f64>,
    /// Query inputs to predict for, `k` rows of `d` values.
    pub x_predict: Vec<Vec<f64>>,
    /// Natural-language hint describing the expected relationship.
    pub t: String,
    pub n: usize,
    pub k: usize,
    pub d: usize,
}

/// Validated observed data, ready for design construction.
#[derive(Debug)]
pub struct ObservedSet {
    /// Inputs, shape `[n, d]`.
    pub x: Array2<f64>,
    /// Targets, length `n`.
    pub y: Array1<f64>,
}

/// Validated query points. Column count matches the observed set.
#[derive(Debug)]
pub struct QuerySet {
    /// Inputs, shape `[k, d]`.
    pub x: Array2<f64>,
}

/// A comprehensive error type for all payload validation failures.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Declared dimension '{name}' must be at least 1, but was 0.")]
    DeclaredDimensionZero { name: &'static str },

    #[error("Field '{field}' has {found} row(s), but {declared} were declared.")]
    RowCountMismatch {
        field: &'static str,
        declared: usize,
        found: usize,
    },

    #[error(
        "Field '{field}' row {row} has {found} value(s), but {declared} column(s) were declared."
    )]
    RowWidthMismatch {
        field: &'static str,
        row: usize,
        declared: usize,
        found: usize,
    },

    #[error("Field '{field}' has {found} value(s), but {declared} were declared.")]
    LengthMismatch {
        field: &'static str,
        declared: usize,
        found: usize,
    },

    #[error(
        "Non-finite value (NaN or infinity) in field '{field}' at position {index}. All data must be finite."
    )]
    NonFiniteValue { field: &'static str, index: usize },
}

/// Validates a request against its declared shapes and materializes the
/// numeric payload. Any mismatch is returned immediately, before the model
/// path is touched.
pub fn validate_request(
    request: &PredictionRequest,
) -> Result<(ObservedSet, QuerySet), ValidationError> {
    for (name, value) in [("n", request.n), ("k", request.k), ("d", request.d)] {
        if value == 0 {
            return Err(ValidationError::DeclaredDimensionZero { name });
        }
    }

    let x_observed = internal::to_matrix("x_observed", &request.x_observed, request.n, request.d)?;
    let y_observed = internal::to_vector("y_observed", &request.y_observed, request.n)?;
    let x_predict = internal::to_matrix("x_predict", &request.x_predict, request.k, request.d)?;

    Ok((
        ObservedSet {
            x: x_observed,
            y: y_observed,
        },
        QuerySet { x: x_predict },
    ))
}

mod internal {
    use super::*;

    pub(super) fn to_matrix(
        field: &'static str,
        rows: &[Vec<f64>],
        declared_rows: usize,
        declared_cols: usize,
    ) -> Result<Array2<f64>, ValidationError> {
        if rows.len() != declared_rows {
            return Err(ValidationError::RowCountMismatch {
                field,
                declared: declared_rows,
                found: rows.len(),
            });
        }

        let mut buffer = Vec::with_capacity(declared_rows * declared_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != declared_cols {
                return Err(ValidationError::RowWidthMismatch {
                    field,
                    row: i,
                    declared: declared_cols,
                    found: row.len(),
                });
            }
            for &value in row {
                if !value.is_finite() {
                    return Err(ValidationError::NonFiniteValue { field, index: i });
                }
                buffer.push(value);
            }
        }

        Ok(Array2::from_shape_vec((declared_rows, declared_cols), buffer)
            .expect("dimensions were checked row by row"))
    }

    pub(super) fn to_vector(
        field: &'static str,
        values: &[f64],
        declared_len: usize,
    ) -> Result<Array1<f64>, ValidationError> {
        if values.len() != declared_len {
            return Err(ValidationError::LengthMismatch {
                field,
                declared: declared_len,
                found: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field, index });
        }
        Ok(Array1::from_vec(values.to_vec()))
    }
}
