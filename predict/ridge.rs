//! # Ridge Regression with Deterministic Strength Selection
//!
//! Fits ridge-regularized least squares on a standardized design matrix.
//! The regularization strength is chosen from a fixed candidate grid by
//! leave-one-out cross-validation in closed form (via leverages), so the
//! selection involves no randomized splits and two identical inputs always
//! produce the same model. The intercept is left unpenalized: targets are
//! centered before the solve and the mean is restored at prediction time,
//! which is exact because the observed design columns are zero-mean by
//! construction.
//!
//! If no candidate yields a usable held-out score the fitter falls back to
//! a fixed strength of 1.0. The fallback is logged at WARN level.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_linalg::{Inverse, Solve};
use thiserror::Error;

/// Candidate regularization strengths, tried in order.
pub const ALPHA_GRID: [f64; 5] = [0.1, 0.3, 1.0, 3.0, 10.0];

/// Strength used when cross-validated selection fails.
const FALLBACK_ALPHA: f64 = 1.0;

/// A fitted ridge model. Request-scoped; never persisted.
#[derive(Debug, Clone)]
pub struct RidgeModel {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// The regularization strength the fit settled on.
    pub alpha: f64,
}

/// Errors from the ridge solve.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Design matrix has {rows} row(s) but {targets} target(s) were supplied.")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("The ridge normal equations could not be solved: {0}")]
    SolveFailed(#[from] ndarray_linalg::error::LinalgError),

    #[error(
        "The solver produced non-finite coefficients; the design matrix is degenerate beyond what any candidate strength can resolve."
    )]
    DegenerateSolution,
}

/// Fits a ridge model, selecting the strength from `ALPHA_GRID` by
/// leave-one-out cross-validation.
pub fn fit(phi: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<RidgeModel, ModelError> {
    let n = phi.nrows();
    if n == 0 || y.len() != n {
        return Err(ModelError::ShapeMismatch {
            rows: n,
            targets: y.len(),
        });
    }

    let intercept = y.mean().expect("target vector is non-empty");
    let y_centered = &y.to_owned() - intercept;

    let gram = phi.t().dot(&phi);
    let xty = phi.t().dot(&y_centered);

    let mut best: Option<(f64, f64, Array1<f64>)> = None;
    for &alpha in ALPHA_GRID.iter() {
        let Some((score, beta)) =
            internal::evaluate_candidate(&gram, &xty, phi, &y_centered, alpha)
        else {
            log::debug!("ridge candidate alpha={alpha} skipped (unusable held-out score)");
            continue;
        };
        log::debug!("ridge candidate alpha={alpha} scored LOO MSE {score:.6e}");
        // Strictly-less keeps the earliest candidate on ties, so the
        // selection is a pure function of the inputs.
        if best.as_ref().is_none_or(|(s, _, _)| score < *s) {
            best = Some((score, alpha, beta));
        }
    }

    let (alpha, beta) = match best {
        Some((score, alpha, beta)) => {
            log::debug!("ridge selected alpha={alpha} (LOO MSE {score:.6e})");
            (alpha, beta)
        }
        None => {
            log::warn!(
                "cross-validated strength selection failed for every candidate; \
                 falling back to fixed alpha={FALLBACK_ALPHA}"
            );
            let mut a = gram.clone();
            for i in 0..a.nrows() {
                a[[i, i]] += FALLBACK_ALPHA;
            }
            (FALLBACK_ALPHA, a.solve(&xty)?)
        }
    };

    if !intercept.is_finite() || beta.iter().any(|b| !b.is_finite()) {
        return Err(ModelError::DegenerateSolution);
    }

    Ok(RidgeModel {
        coefficients: beta,
        intercept,
        alpha,
    })
}

/// Applies a fitted model to a standardized query design matrix. Pure.
pub fn predict(model: &RidgeModel, phi: ArrayView2<f64>) -> Array1<f64> {
    phi.dot(&model.coefficients) + model.intercept
}

/// Internal module for the held-out scoring of one candidate strength.
mod internal {
    use super::*;

    /// Solves the penalized system for one strength and scores it by the
    /// closed-form leave-one-out residuals `e_i / (1 - h_ii)`, where the
    /// leverage includes the 1/n contribution of the unpenalized intercept.
    ///
    /// Returns `None` when the system cannot be inverted, a leverage
    /// reaches 1 (a point the held-out residual cannot be formed for), or
    /// the score is non-finite.
    pub(super) fn evaluate_candidate(
        gram: &Array2<f64>,
        xty: &Array1<f64>,
        phi: ArrayView2<f64>,
        y_centered: &Array1<f64>,
        alpha: f64,
    ) -> Option<(f64, Array1<f64>)> {
        let n = phi.nrows();

        let mut a = gram.clone();
        for i in 0..a.nrows() {
            a[[i, i]] += alpha;
        }
        let a_inv = a.inv().ok()?;

        let beta = a_inv.dot(xty);
        let fitted = phi.dot(&beta);

        let mut total = 0.0;
        for i in 0..n {
            let row = phi.row(i);
            let leverage = row.dot(&a_inv.dot(&row)) + 1.0 / n as f64;
            let retained = 1.0 - leverage;
            if retained <= f64::EPSILON {
                return None;
            }
            let held_out = (y_centered[i] - fitted[i]) / retained;
            total += held_out * held_out;
        }

        let score = total / n as f64;
        score.is_finite().then_some((score, beta))
    }
}
