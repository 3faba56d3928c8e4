//! # The Prediction Pipeline
//!
//! Sequences one request end to end: validation, hint parsing, design
//! construction on the observed and query sides, then the bounded ridge
//! fit/predict step. Every failure is classified into exactly one of three
//! disjoint kinds — a caller-fixable validation error, a terminal
//! computation error, or a timeout — and a request either fully succeeds or
//! fails with exactly one of them; partial prediction sets are never
//! returned.
//!
//! The pipeline holds no per-request state between calls: every entity it
//! creates (recipe, scaler, model) lives for one `predict` invocation, so a
//! host may share one pipeline across concurrent requests without locking.

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::bounded::{BoundedExecutor, BoundedOutcome};
use crate::data::{self, PredictionRequest, ValidationError};
use crate::design::{self, DesignError};
use crate::hint;
use crate::ridge::{self, ModelError};

/// Wall-clock budget applied to a request when none is configured.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(90);

/// Explicit pipeline configuration, passed in at construction. The core
/// never reads ambient state (environment, globals) during execution.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Total wall-clock budget for one request, measured from the moment
    /// `predict` is entered.
    pub time_budget: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }
}

/// The single classified failure a request can end in.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Computation failed: {message}")]
    Computation { message: String },

    #[error("Prediction did not complete within the {budget_secs:.1}s time budget.")]
    Timeout { budget_secs: f64 },
}

impl From<DesignError> for PredictionError {
    fn from(err: DesignError) -> Self {
        PredictionError::Computation {
            message: err.to_string(),
        }
    }
}

impl From<ModelError> for PredictionError {
    fn from(err: ModelError) -> Self {
        PredictionError::Computation {
            message: err.to_string(),
        }
    }
}

/// Stateless orchestrator for prediction requests.
pub struct PredictionPipeline {
    executor: BoundedExecutor,
}

impl PredictionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            executor: BoundedExecutor::new(config.time_budget),
        }
    }

    /// Runs the full pipeline on one request and returns the predictions in
    /// the same order as the query rows.
    pub fn predict(&self, request: &PredictionRequest) -> Result<Vec<f64>, PredictionError> {
        let started = Instant::now();

        let (observed, query) = data::validate_request(request)?;

        let recipe = hint::parse_hint(&request.t);
        log::debug!("hint {:?} resolved to recipe {recipe:?}", request.t);

        let (phi_observed, scaler) = design::build_design_matrix(observed.x.view(), &recipe)?;
        let phi_query = design::apply_design_matrix(query.x.view(), &recipe, &scaler)?;
        log::debug!(
            "design matrices built: observed {:?}, query {:?}",
            phi_observed.shape(),
            phi_query.shape()
        );

        // Guaranteed by construction; re-checked so a defect upstream
        // surfaces here as a classified failure instead of a solver error.
        if phi_observed.nrows() != observed.y.len() {
            return Err(PredictionError::Computation {
                message: format!(
                    "internal invariant violated: {} design rows for {} targets",
                    phi_observed.nrows(),
                    observed.y.len()
                ),
            });
        }
        if phi_observed.ncols() != phi_query.ncols() {
            return Err(PredictionError::Computation {
                message: format!(
                    "internal invariant violated: observed and query expansions disagree on width ({} vs {})",
                    phi_observed.ncols(),
                    phi_query.ncols()
                ),
            });
        }

        let targets = observed.y;
        let outcome = self.executor.run(started, move || {
            let model = ridge::fit(phi_observed.view(), targets.view())?;
            Ok::<_, ModelError>(ridge::predict(&model, phi_query.view()))
        });

        let predictions = match outcome {
            BoundedOutcome::Finished(Ok(predictions)) => predictions,
            BoundedOutcome::Finished(Err(err)) => return Err(err.into()),
            BoundedOutcome::TimedOut { budget } => {
                return Err(PredictionError::Timeout {
                    budget_secs: budget.as_secs_f64(),
                });
            }
            BoundedOutcome::Lost => {
                return Err(PredictionError::Computation {
                    message: "prediction worker terminated before returning a result".to_string(),
                });
            }
        };

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(PredictionError::Computation {
                message: "prediction produced non-finite values".to_string(),
            });
        }

        Ok(predictions.to_vec())
    }
}
