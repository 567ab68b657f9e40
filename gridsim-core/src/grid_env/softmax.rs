//! Tabular softmax policy.
use super::TabularMdp;
use crate::{error::GridSimError, Policy};
use anyhow::Result;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use std::sync::Arc;

/// Tabular softmax policy.
///
/// The parameter vector is viewed as a matrix with one row per non-terminal state and one
/// column per action, and
///
/// `pi(a | s) = exp(w[s, a]) / sum_a' exp(w[s, a'])`.
#[derive(Debug, Clone)]
pub struct SoftmaxPolicy {
    mdp: Arc<TabularMdp>,
    params: Vec<f64>,

    /// Incremented on every parameter update.
    version: u64,

    /// `(max, denominator)` of each row, shifted by the row maximum.
    /// Rebuilt whenever the parameters are replaced.
    denominators: Option<Vec<(f64, f64)>>,
}

impl SoftmaxPolicy {
    /// Constructs a uniform policy, i.e., all parameters are zero.
    pub fn new(mdp: Arc<TabularMdp>, cache_denominators: bool) -> Self {
        let params = vec![0.0; mdp.n_params()];
        let mut policy = Self {
            mdp,
            params,
            version: 0,
            denominators: None,
        };
        if cache_denominators {
            policy.denominators = Some(policy.compute_denominators());
        }
        policy
    }

    /// Replaces the parameter vector.
    pub fn set_params(&mut self, params: &[f64]) -> Result<()> {
        let expected = self.mdp.n_params();
        if params.len() != expected {
            return Err(GridSimError::ParamsLength {
                expected,
                got: params.len(),
            }
            .into());
        }
        self.params.clear();
        self.params.extend_from_slice(params);
        self.version += 1;
        if self.denominators.is_some() {
            self.denominators = Some(self.compute_denominators());
        }
        Ok(())
    }

    /// The current parameter vector.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// The number of times the parameters have been replaced.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn row(&self, state: usize) -> Result<(usize, &[f64])> {
        let ix = self.mdp.decision_index(state)?;
        let n = self.mdp.n_actions();
        Ok((ix, &self.params[ix * n..(ix + 1) * n]))
    }

    fn compute_denominators(&self) -> Vec<(f64, f64)> {
        self.params
            .chunks(self.mdp.n_actions())
            .map(shifted_denominator)
            .collect()
    }

    fn denominator(&self, ix: usize, weights: &[f64]) -> (f64, f64) {
        match &self.denominators {
            Some(d) => d[ix],
            None => shifted_denominator(weights),
        }
    }
}

fn shifted_denominator(weights: &[f64]) -> (f64, f64) {
    let max = weights.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let denom = weights.iter().map(|w| (w - max).exp()).sum::<f64>();
    (max, denom)
}

impl Policy for SoftmaxPolicy {
    fn probability(&self, state: usize, action: usize) -> Result<f64> {
        if action >= self.mdp.n_actions() {
            return Err(GridSimError::OutOfRange { state, action }.into());
        }
        let (ix, weights) = self.row(state)?;
        let (max, denom) = self.denominator(ix, weights);
        Ok((weights[action] - max).exp() / denom)
    }

    fn probabilities(&self, state: usize) -> Result<Vec<f64>> {
        let (ix, weights) = self.row(state)?;
        let (max, denom) = self.denominator(ix, weights);
        Ok(weights.iter().map(|w| (w - max).exp() / denom).collect())
    }

    fn sample<R: Rng + ?Sized>(&self, state: usize, rng: &mut R) -> Result<(usize, f64)> {
        let probs = self.probabilities(state)?;
        let dist = WeightedIndex::new(&probs)?;
        let action = dist.sample(rng);
        Ok((action, probs[action]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridEnvConfig;
    use rand::{rngs::StdRng, SeedableRng};

    fn mdp() -> Arc<TabularMdp> {
        Arc::new(TabularMdp::new(&GridEnvConfig::gridworld3x3()).unwrap())
    }

    fn params(n: usize) -> Vec<f64> {
        (0..n).map(|i| ((i * 7) % 5) as f64 * 0.8 - 1.5).collect()
    }

    #[test]
    fn test_uniform_at_zero() {
        let policy = SoftmaxPolicy::new(mdp(), false);
        for s in 0..8 {
            for a in 0..4 {
                assert!((policy.probability(s, a).unwrap() - 0.25).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_normalization() {
        for &cache in [false, true].iter() {
            let mut policy = SoftmaxPolicy::new(mdp(), cache);
            policy.set_params(&params(32)).unwrap();
            for s in 0..8 {
                let sum: f64 = (0..4).map(|a| policy.probability(s, a).unwrap()).sum();
                assert!((sum - 1.0).abs() < 1e-9);
                let probs = policy.probabilities(s).unwrap();
                assert!(probs.iter().all(|&p| p >= 0.0));
                assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_cache_matches_direct() {
        let mut cached = SoftmaxPolicy::new(mdp(), true);
        let mut direct = SoftmaxPolicy::new(mdp(), false);
        for k in 0..3 {
            let p = params(32).iter().map(|w| w * k as f64).collect::<Vec<_>>();
            cached.set_params(&p).unwrap();
            direct.set_params(&p).unwrap();
            assert_eq!(cached.version(), k + 1);
            for s in 0..8 {
                assert_eq!(
                    cached.probabilities(s).unwrap(),
                    direct.probabilities(s).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_invalid_params_length() {
        let mut policy = SoftmaxPolicy::new(mdp(), false);
        let err = policy.set_params(&[0.0; 36]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GridSimError>(),
            Some(&GridSimError::ParamsLength {
                expected: 32,
                got: 36
            })
        );
        assert_eq!(policy.version(), 0);
    }

    #[test]
    fn test_no_decision_at_terminal() {
        let policy = SoftmaxPolicy::new(mdp(), false);
        assert!(policy.probability(8, 0).is_err());
        assert!(policy.probability(0, 4).is_err());
    }

    #[test]
    fn test_sample_frequency() {
        let mut policy = SoftmaxPolicy::new(mdp(), false);
        let mut p = vec![0.0; 32];
        p[4 * 4 + 1] = 2.0_f64.ln(); // state 4: down is twice as likely
        policy.set_params(&p).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let n = 20000;
        let mut counts = [0usize; 4];
        for _ in 0..n {
            let (a, prob) = policy.sample(4, &mut rng).unwrap();
            assert_eq!(prob, policy.probability(4, a).unwrap());
            counts[a] += 1;
        }
        let freq = counts[1] as f64 / n as f64;
        assert!((freq - 0.4).abs() < 0.02, "{}", freq);
    }
}
