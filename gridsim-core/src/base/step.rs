//! Environment step.
use serde::{Deserialize, Serialize};

/// A `(s_t, a_t, r_t, pi(a_t | s_t))` tuple emitted by an environment at every step.
///
/// `state` is the state before the transition, `reward` is the reward of entering the next
/// state and `probability` is the probability the policy assigned to `action` at `state`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// State before the transition.
    pub state: usize,

    /// Action drawn from the policy.
    pub action: usize,

    /// Reward.
    pub reward: f64,

    /// Probability of `action` at `state`.
    pub probability: f64,
}

impl StepRecord {
    /// Constructs a [`StepRecord`] object.
    pub fn new(state: usize, action: usize, reward: f64, probability: f64) -> Self {
        Self {
            state,
            action,
            reward,
            probability,
        }
    }
}
