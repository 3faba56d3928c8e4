//! # Deadline Enforcement for Non-Cancellable Work
//!
//! The numeric fit/predict step has no cooperative cancellation point, so
//! the only way to bound it is to run it on a dedicated worker thread and
//! bound the *wait*. `BoundedExecutor` owns that indirection: it measures
//! the time already spent on validation and design construction against a
//! single budget counted from request start, refuses to dispatch when the
//! budget is exhausted, and otherwise waits on a rendezvous channel for up
//! to the remaining allowance.
//!
//! Cancellation is best-effort only: when the wait is abandoned the worker
//! thread is detached and may keep computing until it finishes on its own.
//! Under sustained timeout pressure this is an accepted resource leak; the
//! worker holds its inputs alive until it completes.

use std::thread;
use std::time::{Duration, Instant};

/// The result of running one unit of work under a deadline.
#[derive(Debug)]
pub enum BoundedOutcome<R> {
    /// The work finished inside the allowance; its result is returned as-is
    /// (including any error the work itself produced).
    Finished(R),
    /// The allowance elapsed before the work reported back. The work may
    /// still be running.
    TimedOut { budget: Duration },
    /// The worker stopped without reporting a result (panic or failure to
    /// spawn). Callers classify this as a computation failure.
    Lost,
}

/// Wraps one fit+predict unit of work with a wall-clock deadline.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    budget: Duration,
}

impl BoundedExecutor {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// The total per-request budget this executor enforces.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Runs `job` on a fresh worker thread and waits for at most the part
    /// of the budget not already consumed since `started`.
    ///
    /// If the budget is already exhausted the job is never dispatched. On
    /// timeout the worker is abandoned, not interrupted.
    pub fn run<R, F>(&self, started: Instant, job: F) -> BoundedOutcome<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let Some(allowance) = self.budget.checked_sub(started.elapsed()) else {
            return BoundedOutcome::TimedOut {
                budget: self.budget,
            };
        };
        if allowance.is_zero() {
            return BoundedOutcome::TimedOut {
                budget: self.budget,
            };
        }

        let (sender, receiver) = crossbeam_channel::bounded(1);
        let spawned = thread::Builder::new()
            .name("augur-fit".to_string())
            .spawn(move || {
                // The receiver may be gone by the time the job finishes;
                // a failed send just means the wait was abandoned.
                let _ = sender.send(job());
            });
        if let Err(e) = spawned {
            log::error!("failed to spawn prediction worker: {e}");
            return BoundedOutcome::Lost;
        }

        match receiver.recv_timeout(allowance) {
            Ok(result) => BoundedOutcome::Finished(result),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                log::warn!(
                    "prediction work exceeded its {:.1}s budget and was abandoned",
                    self.budget.as_secs_f64()
                );
                BoundedOutcome::TimedOut {
                    budget: self.budget,
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => BoundedOutcome::Lost,
        }
    }
}
