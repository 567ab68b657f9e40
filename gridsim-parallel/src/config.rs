//! Configuration of parallel trajectory generation.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// What to do with a dataset when some worker batches have failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Returns an error if any batch has failed.
    FailFast,

    /// Keeps the episodes of the successful batches and logs the number of lost episodes.
    BestEffort,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::FailFast
    }
}

/// Order in which worker batches are concatenated into a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeOrder {
    /// Batches in the order they were dispatched, so episode indices are reproducible
    /// for a fixed seed.
    Dispatch,

    /// Batches in the order workers completed them. Indices may vary between runs.
    Completion,
}

impl Default for EpisodeOrder {
    fn default() -> Self {
        Self::Dispatch
    }
}

/// Configuration of [`ParallelSampler`](crate::ParallelSampler).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// If `false`, all episodes are generated on the calling thread.
    pub parallel: bool,

    /// The number of worker threads.
    pub n_workers: usize,

    /// Handling of failed batches.
    pub failure_policy: FailurePolicy,

    /// Order of batches in the dataset.
    pub episode_order: EpisodeOrder,

    /// Seed from which the seeds of workers are drawn. Fresh entropy is used if `None`.
    pub seed: Option<u64>,

    /// Stack size of worker threads in bytes. The platform default is used if `None`.
    pub stack_size: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            n_workers: 8,
            failure_policy: FailurePolicy::default(),
            episode_order: EpisodeOrder::default(),
            seed: None,
            stack_size: None,
        }
    }
}

impl ParallelConfig {
    /// Enables or disables parallel generation.
    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Sets the number of worker threads.
    pub fn n_workers(mut self, v: usize) -> Self {
        self.n_workers = v;
        self
    }

    /// Sets the failure policy.
    pub fn failure_policy(mut self, v: FailurePolicy) -> Self {
        self.failure_policy = v;
        self
    }

    /// Sets the order of batches.
    pub fn episode_order(mut self, v: EpisodeOrder) -> Self {
        self.episode_order = v;
        self
    }

    /// Sets the base seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Sets the stack size of worker threads.
    pub fn stack_size(mut self, v: usize) -> Self {
        self.stack_size = Some(v);
        self
    }

    /// Constructs [`ParallelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ParallelConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
