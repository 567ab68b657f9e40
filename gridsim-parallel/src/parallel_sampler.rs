//! Orchestrates workers generating a dataset.
use crate::{
    worker_stats_fmt, BatchMessage, EpisodeOrder, FailurePolicy, ParallelConfig, ParallelError,
    Worker, WorkerStat,
};
use anyhow::Result;
use crossbeam_channel::bounded;
use gridsim_core::{Dataset, DatasetBuilder, Env, EpisodeSource, Sampler};
use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{any::Any, thread};

/// Splits `n_episodes` into `n_workers` chunks.
///
/// Each worker but the last takes `n_episodes / n_workers` episodes and the last one takes
/// the rest, so the chunks always sum to `n_episodes`.
pub fn chunk_sizes(n_episodes: usize, n_workers: usize) -> Result<Vec<usize>> {
    if n_workers == 0 {
        return Err(ParallelError::NoWorkers.into());
    }
    let chunk_size = n_episodes / n_workers;
    let mut sizes = vec![chunk_size; n_workers];
    if let Some(last) = sizes.last_mut() {
        *last = n_episodes - (n_workers - 1) * chunk_size;
    }
    Ok(sizes)
}

/// A batch that produced no episodes.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerFailure {
    /// Dispatch index of the worker.
    pub id: usize,

    /// The number of episodes assigned to the worker, all of them lost.
    pub n_episodes: usize,

    /// Error message, or the panic message of the worker thread.
    pub error: String,
}

/// Result of [`ParallelSampler::generate`].
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    /// Episodes of the successful batches.
    pub dataset: Dataset,

    /// Failed batches, in dispatch order.
    pub failures: Vec<WorkerFailure>,

    /// The number of requested episodes.
    pub n_requested: usize,

    /// Stats of the batches that reported back.
    pub stats: Vec<WorkerStat>,
}

impl BatchOutcome {
    /// The number of episodes lost in failed batches.
    pub fn n_lost(&self) -> usize {
        self.failures.iter().map(|f| f.n_episodes).sum()
    }

    /// Returns `true` if no batch has failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Applies `policy` to failed batches and returns the dataset.
    pub fn into_dataset(self, policy: FailurePolicy) -> Result<Dataset> {
        if self.is_complete() {
            return Ok(self.dataset);
        }

        let n_lost = self.n_lost();
        match policy {
            FailurePolicy::FailFast => Err(ParallelError::WorkerFailed {
                n_failed: self.failures.len(),
                n_lost,
                n_requested: self.n_requested,
                first: self.failures[0].error.clone(),
            }
            .into()),
            FailurePolicy::BestEffort => {
                for f in self.failures.iter() {
                    warn!("Batch {} failed: {}", f.id, f.error);
                }
                warn!(
                    "{} of {} episodes lost in {} failed batches",
                    n_lost,
                    self.n_requested,
                    self.failures.len()
                );
                Ok(self.dataset)
            }
        }
    }
}

/// Generates datasets with workers running on threads.
///
/// Each worker receives a clone of the environment, which carries the tables and the current
/// policy parameters, and a distinct seed drawn from a base seed. The sampler blocks until all
/// workers have finished.
pub struct ParallelSampler<E: Env + Clone + Send + 'static> {
    sampler: Sampler<E>,
    config: ParallelConfig,
    rng: StdRng,
}

impl<E: Env + Clone + Send + 'static> ParallelSampler<E> {
    /// Creates a sampler from an environment used as the prototype of workers.
    pub fn new(env: E, config: ParallelConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            sampler: Sampler::new(env),
            config,
            rng,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// The prototype environment.
    pub fn env(&self) -> &E {
        self.sampler.env()
    }

    /// The prototype environment, mutable.
    pub fn env_mut(&mut self) -> &mut E {
        self.sampler.env_mut()
    }

    /// Generates `n_episodes` episodes, collecting failed batches instead of returning an error.
    pub fn generate(&mut self, n_episodes: usize) -> Result<BatchOutcome> {
        if self.config.parallel {
            self.generate_parallel(n_episodes)
        } else {
            Ok(self.generate_sequential(n_episodes))
        }
    }

    fn generate_sequential(&mut self, n_episodes: usize) -> BatchOutcome {
        let seed = self.rng.gen::<u64>();
        let mut builder = DatasetBuilder::with_capacity(n_episodes);
        let mut failures = vec![];
        match self.sampler.generate_episode_batch(n_episodes, seed) {
            Ok(episodes) => builder.extend(episodes),
            Err(e) => failures.push(WorkerFailure {
                id: 0,
                n_episodes,
                error: format!("{:#}", e),
            }),
        }
        BatchOutcome {
            dataset: builder.build(),
            failures,
            n_requested: n_episodes,
            stats: vec![],
        }
    }

    fn generate_parallel(&mut self, n_episodes: usize) -> Result<BatchOutcome> {
        let sizes = chunk_sizes(n_episodes, self.config.n_workers)?;
        let base_seed = self.rng.gen::<u64>();
        let (s, r) = bounded::<BatchMessage>(sizes.len());

        let mut failures = vec![];
        let mut handles = Vec::with_capacity(sizes.len());
        for (id, &n) in sizes.iter().enumerate() {
            let seed = base_seed.wrapping_add(id as u64);
            let worker = Worker::new(id, self.sampler.env().clone(), n, seed);
            let sender = s.clone();
            let mut builder = thread::Builder::new().name(format!("gridsim-worker-{}", id));
            if let Some(stack_size) = self.config.stack_size {
                builder = builder.stack_size(stack_size);
            }
            match builder.spawn(move || worker.run(sender)) {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => failures.push(WorkerFailure {
                    id,
                    n_episodes: n,
                    error: format!("failed to spawn worker: {}", e),
                }),
            }
        }
        drop(s);
        debug!(
            "Dispatched {} episodes to {} workers",
            n_episodes,
            handles.len()
        );

        // Join barrier
        for (id, handle) in handles.into_iter() {
            if let Err(payload) = handle.join() {
                failures.push(WorkerFailure {
                    id,
                    n_episodes: sizes[id],
                    error: panic_message(&*payload),
                });
            }
        }

        // Messages arrive in completion order
        let mut messages = r.try_iter().collect::<Vec<_>>();
        if self.config.episode_order == EpisodeOrder::Dispatch {
            messages.sort_by_key(|m| m.id);
        }

        let mut builder = DatasetBuilder::with_capacity(n_episodes);
        let mut stats = Vec::with_capacity(messages.len());
        for msg in messages.into_iter() {
            match msg.episodes {
                Ok(episodes) => builder.extend(episodes),
                Err(error) => failures.push(WorkerFailure {
                    id: msg.id,
                    n_episodes: sizes[msg.id],
                    error,
                }),
            }
            stats.push(msg.stat);
        }
        failures.sort_by_key(|f| f.id);
        stats.sort_by_key(|s| s.id);
        debug!("Worker stats\n{}", worker_stats_fmt(&stats));

        let dataset = builder.build();
        info!(
            "Generated {} of {} episodes with {} workers",
            dataset.n_episodes(),
            n_episodes,
            sizes.len()
        );

        Ok(BatchOutcome {
            dataset,
            failures,
            n_requested: n_episodes,
            stats,
        })
    }
}

impl<E: Env + Clone + Send + 'static> EpisodeSource for ParallelSampler<E> {
    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        self.sampler.env_mut().set_params(params)
    }

    fn gamma(&self) -> f64 {
        self.sampler.env().gamma()
    }

    fn generate_dataset(&mut self, n_episodes: usize) -> Result<Dataset> {
        let policy = self.config.failure_policy;
        self.generate(n_episodes)?.into_dataset(policy)
    }
}

/// Generates a dataset of `n_episodes` episodes from `env` as configured by `config`.
pub fn generate_dataset<E>(env: &E, n_episodes: usize, config: &ParallelConfig) -> Result<Dataset>
where
    E: Env + Clone + Send + 'static,
{
    ParallelSampler::new(env.clone(), config.clone()).generate_dataset(n_episodes)
}

/// Estimates `J(theta)` at `params` with `n_episodes` episodes generated as configured by
/// `config`.
///
/// `env` itself is not modified.
pub fn estimate_return<E>(
    env: &E,
    params: &[f64],
    n_episodes: usize,
    config: &ParallelConfig,
) -> Result<f64>
where
    E: Env + Clone + Send + 'static,
{
    let mut sampler = ParallelSampler::new(env.clone(), config.clone());
    gridsim_core::estimate_return(&mut sampler, params, n_episodes)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", s)
    } else {
        "worker panicked".to_string()
    }
}
