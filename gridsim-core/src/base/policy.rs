//! Policy.
use anyhow::Result;
use rand::Rng;

/// A stochastic policy on a finite MDP.
///
/// Policy is a mapping from a state to a probability distribution over actions.
pub trait Policy {
    /// Probability of taking `action` at `state`.
    fn probability(&self, state: usize, action: usize) -> Result<f64>;

    /// Probabilities of all actions at `state`.
    fn probabilities(&self, state: usize) -> Result<Vec<f64>>;

    /// Samples an action at `state` and returns it with its probability.
    fn sample<R: Rng + ?Sized>(&self, state: usize, rng: &mut R) -> Result<(usize, f64)>;
}
