//! Finite MDP environment driven by a tabular softmax policy.
mod config;
mod mdp;
mod softmax;
pub use config::GridEnvConfig;
pub use mdp::TabularMdp;
pub use softmax::SoftmaxPolicy;

use crate::{Env, Policy, StepRecord};
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;

/// A simulation session on a finite MDP.
///
/// The transition and reward tables are shared by all clones of the environment,
/// while the policy parameters, the current state and the random number generator
/// are private to each object. A clone is therefore an independent session that
/// can be moved to another thread.
#[derive(Debug, Clone)]
pub struct GridEnv {
    mdp: Arc<TabularMdp>,
    policy: SoftmaxPolicy,
    current_state: usize,
    rng: StdRng,
}

impl GridEnv {
    /// Builds an environment with a given random seed.
    ///
    /// The policy parameters are initialized to zero, i.e., the uniform policy.
    pub fn build(config: &GridEnvConfig, seed: u64) -> Result<Self> {
        let mdp = Arc::new(TabularMdp::new(config)?);
        let policy = SoftmaxPolicy::new(mdp.clone(), config.cache_denominators);
        Ok(Self {
            current_state: mdp.initial_state(),
            mdp,
            policy,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Probability that the policy takes `action` at `state`.
    pub fn policy_probability(&self, state: usize, action: usize) -> Result<f64> {
        self.policy.probability(state, action)
    }

    /// The current state.
    pub fn current_state(&self) -> usize {
        self.current_state
    }

    /// The current policy parameters.
    pub fn params(&self) -> &[f64] {
        self.policy.params()
    }

    /// The policy.
    pub fn policy(&self) -> &SoftmaxPolicy {
        &self.policy
    }

    /// The tables of the MDP.
    pub fn mdp(&self) -> &TabularMdp {
        &self.mdp
    }
}

impl Env for GridEnv {
    fn reset(&mut self) {
        self.current_state = self.mdp.initial_state();
    }

    fn step(&mut self) -> Result<StepRecord> {
        let state = self.current_state;
        let (action, probability) = self.policy.sample(state, &mut self.rng)?;
        let next_state = self.mdp.next_state(state, action)?;
        let reward = self.mdp.reward(next_state)?;
        self.current_state = next_state;
        Ok(StepRecord::new(state, action, reward, probability))
    }

    fn is_terminal(&self) -> bool {
        self.current_state == self.mdp.terminal_state()
    }

    fn timeout(&self) -> usize {
        self.mdp.timeout()
    }

    fn gamma(&self) -> f64 {
        self.mdp.gamma()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        self.policy.set_params(params)
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_right() -> Vec<f64> {
        let mut p = vec![0.0; 32];
        for s in 0..8usize {
            p[s * 4 + 3] = 10.0;
        }
        p
    }

    #[test]
    fn test_step() {
        let mut env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 0).unwrap();
        for _ in 0..100 {
            env.reset();
            let state = env.current_state();
            let step = env.step().unwrap();
            assert_eq!(step.state, state);
            assert_eq!(step.probability, 0.25);
            let next = env.mdp().next_state(state, step.action).unwrap();
            assert_eq!(env.current_state(), next);
            assert_eq!(step.reward, env.mdp().reward(next).unwrap());
        }
    }

    #[test]
    fn test_reset_idempotent() {
        let mut env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 0).unwrap();
        env.set_params(&always_right()).unwrap();
        env.step().unwrap();
        env.reset();
        env.reset();
        assert_eq!(env.current_state(), 0);
        assert!(!env.is_terminal());
    }

    #[test]
    fn test_reward_on_entering_terminal() {
        let mut env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 3).unwrap();
        // Always go down, then right
        let mut p = vec![0.0; 32];
        for s in [0usize, 3].iter() {
            p[s * 4 + 1] = 50.0;
        }
        for s in [6usize, 7].iter() {
            p[s * 4 + 3] = 50.0;
        }
        env.set_params(&p).unwrap();

        let rewards = (0..4).map(|_| env.step().unwrap().reward).collect::<Vec<_>>();
        assert_eq!(rewards, vec![0.0, 0.0, -1.0, 1.0]);
        assert!(env.is_terminal());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 0).unwrap();
        let mut env_ = env.clone();
        env_.set_params(&always_right()).unwrap();
        assert_eq!(env.params(), &[0.0; 32][..]);
        env_.step().unwrap();
        assert_eq!(env.current_state(), 0);
        assert!(env.set_params(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_reseed_reproducible() {
        let mut env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 0).unwrap();
        let mut env_ = env.clone();
        env.reseed(11);
        env_.reseed(11);
        for _ in 0..30 {
            assert_eq!(env.step().unwrap(), env_.step().unwrap());
            if env.is_terminal() {
                env.reset();
                env_.reset();
            }
        }
    }
}
