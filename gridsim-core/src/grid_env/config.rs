//! Configuration of [`GridEnv`](super::GridEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`GridEnv`](super::GridEnv).
///
/// Holds the tables of a finite MDP with deterministic transitions and rewards,
/// together with episode-level constants.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GridEnvConfig {
    /// The number of states.
    pub n_states: usize,

    /// The number of actions.
    pub n_actions: usize,

    /// Next state of each `(state, action)` pair, `transitions[state][action]`.
    pub transitions: Vec<Vec<usize>>,

    /// Reward received upon entering each state.
    pub rewards: Vec<f64>,

    /// Where an episode starts.
    pub initial_state: usize,

    /// The state where an episode terminates.
    pub terminal_state: usize,

    /// Discount factor when calculating returns.
    pub gamma: f64,

    /// The number of steps after which an episode is stopped regardless of the state.
    pub timeout: usize,

    /// If `true`, softmax denominators are cached per state.
    #[serde(default)]
    pub cache_denominators: bool,
}

impl Default for GridEnvConfig {
    fn default() -> Self {
        Self::gridworld3x3()
    }
}

impl GridEnvConfig {
    /// 3x3 gridworld.
    ///
    /// States 0-8 are numbered row by row from the top left cell. Actions 0, 1, 2 and 3
    /// are up, down, left and right. Moving into a wall keeps the agent in place.
    /// The reward is 0 everywhere except -1 in cell 7 (bottom middle) and 1 in cell 8
    /// (bottom right). An episode starts in cell 0 and terminates in cell 8.
    pub fn gridworld3x3() -> Self {
        let mut rewards = vec![0.0; 9];
        rewards[7] = -1.0;
        rewards[8] = 1.0;

        Self {
            n_states: 9,
            n_actions: 4,
            transitions: vec![
                vec![0, 3, 0, 1],
                vec![1, 4, 0, 2],
                vec![2, 5, 1, 2],
                vec![0, 6, 3, 4],
                vec![1, 7, 3, 5],
                vec![2, 8, 4, 5],
                vec![3, 6, 6, 7],
                vec![4, 7, 6, 8],
                vec![5, 8, 7, 8],
            ],
            rewards,
            initial_state: 0,
            terminal_state: 8,
            gamma: 0.9,
            timeout: 50,
            cache_denominators: false,
        }
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the maximum number of steps of an episode.
    pub fn timeout(mut self, timeout: usize) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables caching of softmax denominators.
    pub fn cache_denominators(mut self, v: bool) -> Self {
        self.cache_denominators = v;
        self
    }

    /// Constructs [`GridEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GridEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
