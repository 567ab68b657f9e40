//! Errors in parallel trajectory generation.
use thiserror::Error;

/// Errors in parallel trajectory generation.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// `n_workers` is zero.
    #[error("The number of workers must be positive")]
    NoWorkers,

    /// Some batches failed under [`FailurePolicy::FailFast`](crate::FailurePolicy::FailFast).
    #[error("{n_failed} batches failed, {n_lost} of {n_requested} episodes lost; first error: {first}")]
    WorkerFailed {
        /// The number of failed batches.
        n_failed: usize,
        /// The number of episodes in failed batches.
        n_lost: usize,
        /// The number of requested episodes.
        n_requested: usize,
        /// Error message of the first failed batch.
        first: String,
    },
}
