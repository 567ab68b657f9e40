use crate::{BatchMessage, WorkerStat};
use crossbeam_channel::Sender;
use gridsim_core::{Env, Sampler};
use log::{debug, warn};
use std::time::Instant;

/// Generates a batch of episodes with a private copy of an [`Env`].
///
/// The batch is sent to [`ParallelSampler`](crate::ParallelSampler) as a [`BatchMessage`].
pub struct Worker<E: Env> {
    id: usize,
    env: E,
    n_episodes: usize,
    seed: u64,
}

impl<E: Env> Worker<E> {
    /// Creates a worker generating `n_episodes` episodes after reseeding `env` with `seed`.
    pub fn new(id: usize, env: E, n_episodes: usize, seed: u64) -> Self {
        Self {
            id,
            env,
            n_episodes,
            seed,
        }
    }

    /// Generates the batch and sends the result.
    pub fn run(self, sender: Sender<BatchMessage>) {
        let id = self.id;
        let time = Instant::now();
        let mut sampler = Sampler::new(self.env);
        let episodes = sampler
            .generate_episode_batch(self.n_episodes, self.seed)
            .map_err(|e| format!("{:#}", e));
        let stat = WorkerStat {
            id,
            n_episodes: episodes.as_ref().map(|e| e.len()).unwrap_or(0),
            env_steps: episodes
                .as_ref()
                .map(|e| e.iter().map(|e| e.len()).sum::<usize>())
                .unwrap_or(0),
            duration: time.elapsed(),
        };
        debug!("Worker {} finished in {:?}", id, stat.duration);

        if sender.send(BatchMessage { id, episodes, stat }).is_err() {
            warn!("Worker {} could not send its batch", id);
        }
    }
}
