//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum GridSimError {
    /// The parameter vector does not match the number of (decision state, action) pairs.
    #[error("Parameter vector has length {got}, expected {expected}")]
    ParamsLength {
        /// Required length.
        expected: usize,
        /// Given length.
        got: usize,
    },

    /// A table of the MDP is malformed.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// The policy has no decision at the given state (the terminal state).
    #[error("No decision is defined at state {0}")]
    NoDecision(usize),

    /// State or action out of range.
    #[error("State-action pair ({state}, {action}) is out of range")]
    OutOfRange {
        /// State.
        state: usize,
        /// Action.
        action: usize,
    },

    /// Too few samples for the statistic.
    #[error("At least 2 samples are required, got {0}")]
    TooFewSamples(usize),

    /// Empty input.
    #[error("Input is empty")]
    EmptyInput,

    /// Probability passed to a quantile function is outside of (0, 1).
    #[error("Probability must be in (0, 1), got {0}")]
    InvalidProbability(f64),

    /// Degrees of freedom must be positive and finite.
    #[error("Degrees of freedom must be positive, got {0}")]
    InvalidDegreesOfFreedom(f64),

    /// A row of a long table refers to an episode the table does not list.
    #[error("Row refers to unknown episode {0}")]
    UnknownEpisode(usize),

    /// Dataset file extension is not supported.
    #[error("Unsupported file extension: {0:?}")]
    UnsupportedExtension(String),
}
