//! Parallel trajectory generation.
//!
//! [`ParallelSampler`] splits a requested number of episodes into chunks, one per [`Worker`].
//! Each worker runs on its own thread with a private clone of the environment and a distinct
//! seed, and sends its batch back as a [`BatchMessage`] through a channel. The sampler waits
//! for all workers, then concatenates the batches into a dataset.
//!
//! A failed batch does not abort the others. Failures are collected in [`BatchOutcome`], and
//! [`FailurePolicy`] decides whether a dataset with lost episodes is an error.
mod config;
mod error;
mod messages;
mod parallel_sampler;
mod worker;
pub use config::{EpisodeOrder, FailurePolicy, ParallelConfig};
pub use error::ParallelError;
pub use messages::BatchMessage;
pub use parallel_sampler::{
    chunk_sizes, estimate_return, generate_dataset, BatchOutcome, ParallelSampler, WorkerFailure,
};
pub use worker::{worker_stats_fmt, Worker, WorkerStat};
