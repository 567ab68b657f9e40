#![warn(missing_docs)]
//! A simulator of finite Markov decision processes driven by a parameterized stochastic policy.
//!
//! The crate generates trajectory datasets under the current policy and estimates the expected
//! discounted return of the policy from them:
//!
//! * [`GridEnv`] holds immutable transition and reward tables ([`TabularMdp`]) and a tabular
//!   softmax policy ([`SoftmaxPolicy`]) whose parameters are replaced by the caller.
//! * [`Sampler`] runs episodes until termination or timeout and collects them in a [`Dataset`].
//! * [`Dataset`] is converted into a [`LongTable`] or a [`FlatTable`], which can be written to
//!   CSV or bincode files.
//! * [`ReturnEstimator`] reduces a dataset to the mean discounted return `J(theta)`.
//! * [`stats`] provides the numeric primitives used for confidence bounds.
pub mod dataset;
pub mod error;
pub mod stats;

mod base;
pub use base::{Env, Policy, StepRecord};

mod grid_env;
pub use grid_env::{GridEnv, GridEnvConfig, SoftmaxPolicy, TabularMdp};

mod sampler;
pub use sampler::{Episode, Sampler};

pub use dataset::{Dataset, DatasetBuilder, FlatTable, LongRow, LongTable};

mod estimator;
pub use estimator::{estimate_return, EpisodeSource, ReturnEstimate, ReturnEstimator};
