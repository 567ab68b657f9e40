//! Trajectory generation.
//!
//! A [`Sampler`] drives an [`Env`] through episodes under the current policy:
//!
//! 1. The environment is reset to the initial state.
//! 2. Steps are taken until the terminal state is reached or `timeout` steps have been taken.
//! 3. The environment is reset again, so the next episode starts from the initial state.
use crate::{stats::discounted_weighted_sum, Dataset, DatasetBuilder, Env, StepRecord};
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// A sequence of steps from the initial state to termination or timeout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode(Vec<StepRecord>);

impl Episode {
    /// The number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the episode has no step.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Steps of the episode.
    pub fn steps(&self) -> &[StepRecord] {
        &self.0
    }

    /// Rewards of the episode.
    pub fn rewards(&self) -> Vec<f64> {
        self.0.iter().map(|s| s.reward).collect()
    }

    /// Sum of rewards discounted by `gamma`.
    pub fn discounted_return(&self, gamma: f64) -> f64 {
        discounted_weighted_sum(&self.rewards(), gamma)
    }

    /// Appends a step.
    pub fn push(&mut self, step: StepRecord) {
        self.0.push(step);
    }
}

impl From<Vec<StepRecord>> for Episode {
    fn from(steps: Vec<StepRecord>) -> Self {
        Self(steps)
    }
}

impl From<Episode> for Vec<StepRecord> {
    fn from(episode: Episode) -> Self {
        episode.0
    }
}

/// Generates episodes by interacting with an environment.
pub struct Sampler<E: Env> {
    env: E,
}

impl<E: Env> Sampler<E> {
    /// Creates a new sampler with the given environment.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The environment, mutable.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Returns the environment.
    pub fn into_env(self) -> E {
        self.env
    }

    /// Generates an episode with the current policy.
    ///
    /// The step count is checked against `timeout` before each step, so an episode has at most
    /// `timeout` steps and is shorter only if it has reached the terminal state.
    pub fn generate_episode(&mut self) -> Result<Episode> {
        let timeout = self.env.timeout();
        let mut episode = Episode::default();
        self.env.reset();

        while !self.env.is_terminal() {
            if episode.len() == timeout {
                break;
            }
            // Reset before propagating an error, leaving the environment reusable
            match self.env.step() {
                Ok(step) => episode.push(step),
                Err(e) => {
                    self.env.reset();
                    return Err(e);
                }
            }
        }

        self.env.reset();
        Ok(episode)
    }

    /// Generates `n_episodes` episodes after reseeding the environment with `seed`.
    pub fn generate_episode_batch(&mut self, n_episodes: usize, seed: u64) -> Result<Vec<Episode>> {
        self.env.reseed(seed);
        let episodes = (0..n_episodes)
            .map(|_| self.generate_episode())
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Generated {} episodes, {} steps",
            episodes.len(),
            episodes.iter().map(|e| e.len()).sum::<usize>()
        );
        Ok(episodes)
    }

    /// Generates a dataset of `n_episodes` episodes one after another.
    ///
    /// The order of episodes is determined by the state of the random number generator.
    pub fn generate_dataset(&mut self, n_episodes: usize) -> Result<Dataset> {
        let mut builder = DatasetBuilder::with_capacity(n_episodes);
        for _ in 0..n_episodes {
            builder.push_episode(self.generate_episode()?);
        }
        Ok(builder.build())
    }
}
