//! Environment.
use super::StepRecord;
use anyhow::Result;

/// Represents an environment, an MDP coupled with a parameterized stochastic policy.
///
/// The environment owns the policy parameters and its own random number generator,
/// so a single object is a complete simulation session. Independent sessions are
/// obtained by cloning and reseeding.
pub trait Env {
    /// Resets the environment to the initial state.
    ///
    /// Calling this method more than once has no further effect.
    fn reset(&mut self);

    /// Draws an action from the policy at the current state and applies the transition.
    fn step(&mut self) -> Result<StepRecord>;

    /// Returns `true` if the current state is the terminal state.
    fn is_terminal(&self) -> bool;

    /// The maximum number of steps of an episode.
    fn timeout(&self) -> usize;

    /// Discount factor.
    fn gamma(&self) -> f64;

    /// Replaces the parameters of the policy.
    fn set_params(&mut self, params: &[f64]) -> Result<()>;

    /// Reseeds the random number generator.
    fn reseed(&mut self, seed: u64);
}
