//! # Design Matrix Construction
//!
//! This module turns raw input matrices into the standardized feature
//! (design) matrices fed to the regression solver, under the direction of a
//! `FeatureRecipe`. It is the exclusive owner of the fit/apply asymmetry
//! that keeps the observed and query sets in one coordinate system:
//!
//! - `build_design_matrix` expands the observed inputs, computes per-column
//!   mean and scale from that expansion, and returns both the standardized
//!   matrix and the fitted `ScalerState`.
//! - `apply_design_matrix` expands the query inputs under the same recipe
//!   and applies a previously fitted `ScalerState` verbatim. The apply path
//!   never computes its own statistics.
//!
//! Columns with zero observed variance use scale = 1 rather than dividing
//! by zero; such a column standardizes to all zeros. This is a policy
//! choice, not a discovered bug.

use crate::hint::FeatureRecipe;
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use thiserror::Error;

/// Per-column standardization statistics, fixed at fit time.
///
/// Owned by one request's fit-side build and applied unchanged to that
/// request's query side; never reused across requests.
#[derive(Debug, Clone)]
pub struct ScalerState {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl ScalerState {
    /// Number of expanded feature columns this scaler was fitted on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }
}

/// Errors from feature expansion and standardization.
#[derive(Error, Debug)]
pub enum DesignError {
    #[error(
        "The hint selects input dimension x{dim}, but the data only has {ncols} column(s)."
    )]
    DimensionOutOfRange { dim: usize, ncols: usize },

    #[error("Cannot build a design matrix from an empty input (shape {rows}x{cols}).")]
    EmptyInput { rows: usize, cols: usize },

    #[error(
        "Scaler was fitted on {expected} feature column(s) but the expansion produced {found}."
    )]
    ScalerWidthMismatch { expected: usize, found: usize },
}

/// Expands and standardizes the observed inputs, fitting the scaler.
///
/// Returns the standardized design matrix together with the `ScalerState`
/// that must be applied to the query side of the same request.
pub fn build_design_matrix(
    x: ArrayView2<f64>,
    recipe: &FeatureRecipe,
) -> Result<(Array2<f64>, ScalerState), DesignError> {
    let phi = internal::expand_features(x, recipe)?;

    let mean = phi
        .mean_axis(Axis(0))
        .expect("expansion of a non-empty matrix has rows");
    // Population standard deviation, matching the fit-once semantics of the
    // scaler. Zero-variance columns fall back to the identity scale.
    let scale = phi
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s == 0.0 { 1.0 } else { s });

    let standardized = (&phi - &mean) / &scale;
    Ok((standardized, ScalerState { mean, scale }))
}

/// Expands the query inputs under the same recipe and applies a previously
/// fitted scaler verbatim.
pub fn apply_design_matrix(
    x: ArrayView2<f64>,
    recipe: &FeatureRecipe,
    scaler: &ScalerState,
) -> Result<Array2<f64>, DesignError> {
    let phi = internal::expand_features(x, recipe)?;
    if phi.ncols() != scaler.width() {
        return Err(DesignError::ScalerWidthMismatch {
            expected: scaler.width(),
            found: phi.ncols(),
        });
    }
    Ok((&phi - &scaler.mean) / &scaler.scale)
}

/// Internal module for the raw (unstandardized) feature expansions.
mod internal {
    use super::*;

    /// Dispatches on the recipe kind. The expansion itself carries no
    /// fitted state; all rows are mapped independently.
    pub(super) fn expand_features(
        x: ArrayView2<f64>,
        recipe: &FeatureRecipe,
    ) -> Result<Array2<f64>, DesignError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(DesignError::EmptyInput {
                rows: x.nrows(),
                cols: x.ncols(),
            });
        }

        match *recipe {
            FeatureRecipe::Linear => Ok(x.to_owned()),
            FeatureRecipe::Polynomial { degree } => Ok(polynomial_expansion(x, degree)),
            FeatureRecipe::Periodic { dim, harmonics } => fourier_expansion(x, dim, harmonics),
        }
    }

    /// Full polynomial expansion of all columns up to `degree` total degree,
    /// excluding the constant term. Terms are ordered by ascending total
    /// degree, then lexicographically by the index combination, so the
    /// column layout is identical on the fit and apply sides.
    fn polynomial_expansion(x: ArrayView2<f64>, degree: usize) -> Array2<f64> {
        let d = x.ncols();
        let terms: Vec<Vec<usize>> = (1..=degree)
            .flat_map(|total| (0..d).combinations_with_replacement(total))
            .collect();

        let mut phi = Array2::zeros((x.nrows(), terms.len()));
        for (c, term) in terms.iter().enumerate() {
            let mut col = phi.column_mut(c);
            col.fill(1.0);
            for &j in term {
                col *= &x.column(j);
            }
        }
        phi
    }

    /// The raw columns concatenated with a Fourier expansion of one selected
    /// dimension: `[X | v, sin(1v), cos(1v), ..., sin(hv), cos(hv)]` with a
    /// base frequency of 1.
    fn fourier_expansion(
        x: ArrayView2<f64>,
        dim: usize,
        harmonics: usize,
    ) -> Result<Array2<f64>, DesignError> {
        let d = x.ncols();
        if dim < 1 || dim > d {
            return Err(DesignError::DimensionOutOfRange { dim, ncols: d });
        }
        let v = x.column(dim - 1);

        let mut phi = Array2::zeros((x.nrows(), d + 1 + 2 * harmonics));
        phi.slice_mut(s![.., ..d]).assign(&x);
        phi.column_mut(d).assign(&v);
        for h in 1..=harmonics {
            let w = h as f64;
            phi.column_mut(d + 2 * h - 1).assign(&v.mapv(|t| (w * t).sin()));
            phi.column_mut(d + 2 * h).assign(&v.mapv(|t| (w * t).cos()));
        }
        Ok(phi)
    }
}
