//! Monte Carlo estimation of the expected discounted return of a policy.
use crate::{
    stats::{mean, sample_stddev},
    Dataset, Env, Sampler,
};
use anyhow::Result;
use log::{debug, info};

/// A source of episodes generated under a replaceable policy parameter vector.
///
/// Implemented by [`Sampler`] for sequential generation. Parallel generation is provided
/// by other crates implementing this trait.
pub trait EpisodeSource {
    /// Replaces the policy parameters used for subsequent episodes.
    fn set_params(&mut self, params: &[f64]) -> Result<()>;

    /// Discount factor of the environment.
    fn gamma(&self) -> f64;

    /// Generates a dataset of `n_episodes` episodes.
    fn generate_dataset(&mut self, n_episodes: usize) -> Result<Dataset>;
}

impl<E: Env> EpisodeSource for Sampler<E> {
    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        self.env_mut().set_params(params)
    }

    fn gamma(&self) -> f64 {
        self.env().gamma()
    }

    fn generate_dataset(&mut self, n_episodes: usize) -> Result<Dataset> {
        Sampler::generate_dataset(self, n_episodes)
    }
}

/// Result of [`ReturnEstimator::estimate_with_stats`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnEstimate {
    /// Sample mean of discounted returns, the estimate of `J(theta)`.
    pub mean: f64,

    /// Sample standard deviation of discounted returns, `None` with fewer than two episodes.
    pub stddev: Option<f64>,

    /// The number of episodes the estimate is based on.
    pub n_episodes: usize,

    /// Discounted return of each episode.
    pub returns: Vec<f64>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Estimates the expected discounted return `J(theta)` of the policy.
///
/// The estimator is closed over an [`EpisodeSource`] and the number of episodes, so it can be
/// handed to an optimizer as a black-box objective of the parameter vector:
///
/// ```mermaid
/// graph LR
///     Params[Parameter vector] --> Source[EpisodeSource]
///     Source --> Dataset
///     Dataset --> Long[LongTable]
///     Long --> Returns[Discounted returns]
///     Returns --> J["J(theta)"]
/// ```
pub struct ReturnEstimator<S: EpisodeSource> {
    source: S,
    n_episodes: usize,
}

impl<S: EpisodeSource> ReturnEstimator<S> {
    /// Constructs an estimator averaging over `n_episodes` episodes.
    pub fn new(source: S, n_episodes: usize) -> Self {
        Self { source, n_episodes }
    }

    /// The number of episodes per estimate.
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }

    /// The episode source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The episode source, mutable.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the episode source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Estimates `J(theta)` at `params`.
    pub fn estimate(&mut self, params: &[f64]) -> Result<f64> {
        Ok(self.estimate_with_stats(params)?.mean)
    }

    /// Estimates `J(theta)` at `params` and returns statistics of the discounted returns.
    pub fn estimate_with_stats(&mut self, params: &[f64]) -> Result<ReturnEstimate> {
        self.source.set_params(params)?;
        let dataset = self.source.generate_dataset(self.n_episodes)?;
        let returns = dataset.long().discounted_returns(self.source.gamma());
        let mean = mean(&returns)?;
        let stddev = sample_stddev(&returns).ok();
        debug!(
            "J = {} over {} episodes, stddev = {:?}",
            mean,
            returns.len(),
            stddev
        );
        if returns.len() != self.n_episodes {
            info!(
                "Estimate based on {} of {} requested episodes",
                returns.len(),
                self.n_episodes
            );
        }

        Ok(ReturnEstimate {
            mean,
            stddev,
            n_episodes: returns.len(),
            returns,
        })
    }

    /// Returns a closure evaluating [`ReturnEstimator::estimate`].
    pub fn oracle(&mut self) -> impl FnMut(&[f64]) -> Result<f64> + '_ {
        move |params| self.estimate(params)
    }
}

/// Estimates `J(theta)` at `params` with `n_episodes` episodes generated by `source`.
pub fn estimate_return<S: EpisodeSource>(
    source: &mut S,
    params: &[f64],
    n_episodes: usize,
) -> Result<f64> {
    source.set_params(params)?;
    let dataset = source.generate_dataset(n_episodes)?;
    mean(&dataset.long().discounted_returns(source.gamma()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridEnv, GridEnvConfig};

    fn estimator(n_episodes: usize) -> ReturnEstimator<Sampler<GridEnv>> {
        let env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 42).unwrap();
        ReturnEstimator::new(Sampler::new(env), n_episodes)
    }

    fn params_toward_goal() -> Vec<f64> {
        // Right along the top row, then down the right column, never entering cell 7
        let mut p = vec![0.0; 32];
        for s in [0usize, 1, 4].iter() {
            p[s * 4 + 3] = 5.0;
        }
        for s in [2usize, 5].iter() {
            p[s * 4 + 1] = 5.0;
        }
        p
    }

    #[test]
    fn test_trap_has_zero_return() {
        let mut p = vec![0.0; 32];
        for s in 0..8usize {
            p[s * 4 + 3] = 10.0;
        }
        let mut estimator = estimator(5);
        let est = estimator.estimate_with_stats(&p).unwrap();
        assert_eq!(est.n_episodes, 5);
        assert_eq!(est.mean, 0.0);
    }

    #[test]
    fn test_estimate_improves_with_params() {
        let mut estimator = estimator(200);
        let j_uniform = estimator.estimate(&[0.0; 32]).unwrap();
        let j_goal = estimator.estimate(&params_toward_goal()).unwrap();
        assert!(j_goal > j_uniform, "{} <= {}", j_goal, j_uniform);

        // The shortest path 0 -> 1 -> 2 -> 5 -> 8 yields 0.9^3
        assert!(j_goal <= 0.9f64.powi(3) + 1e-12);
        assert!(j_goal > 0.5);
    }

    #[test]
    fn test_oracle() {
        let mut estimator = estimator(20);
        let mut f = estimator.oracle();
        let j = f(&[0.0; 32]).unwrap();
        assert!(j.is_finite());
        assert!(f(&[0.0; 31]).is_err());
    }

    #[test]
    fn test_estimate_return_matches_returns() {
        let env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 3).unwrap();
        let mut sampler = Sampler::new(env);
        let j = estimate_return(&mut sampler, &params_toward_goal(), 50).unwrap();

        let env = GridEnv::build(&GridEnvConfig::gridworld3x3(), 3).unwrap();
        let mut sampler = Sampler::new(env);
        sampler.env_mut().set_params(&params_toward_goal()).unwrap();
        let dataset = sampler.generate_dataset(50).unwrap();
        let returns = dataset.discounted_returns(0.9);
        let j_ = returns.iter().sum::<f64>() / 50.0;
        assert!((j - j_).abs() < 1e-12);
    }

    #[test]
    fn test_zero_episodes() {
        let mut estimator = estimator(0);
        assert!(estimator.estimate(&[0.0; 32]).is_err());
    }
}
