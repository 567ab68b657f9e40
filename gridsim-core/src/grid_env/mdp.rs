//! Validated tables of a finite MDP.
use super::GridEnvConfig;
use crate::error::GridSimError;
use anyhow::Result;

/// Immutable transition and reward tables.
///
/// All entries are checked in [`TabularMdp::new`], so lookups with in-range
/// states and actions never fail afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularMdp {
    n_states: usize,
    n_actions: usize,

    // Row-major (state, action) -> next state.
    transitions: Vec<usize>,
    rewards: Vec<f64>,
    initial_state: usize,
    terminal_state: usize,
    gamma: f64,
    timeout: usize,
}

impl TabularMdp {
    /// Builds the tables from a configuration.
    pub fn new(config: &GridEnvConfig) -> Result<Self> {
        let n_states = config.n_states;
        let n_actions = config.n_actions;

        if n_states < 2 || n_actions == 0 {
            return Err(GridSimError::InvalidTable(format!(
                "{} states and {} actions",
                n_states, n_actions
            ))
            .into());
        }
        if config.transitions.len() != n_states {
            return Err(GridSimError::InvalidTable(format!(
                "{} transition rows for {} states",
                config.transitions.len(),
                n_states
            ))
            .into());
        }
        if config.rewards.len() != n_states {
            return Err(GridSimError::InvalidTable(format!(
                "{} rewards for {} states",
                config.rewards.len(),
                n_states
            ))
            .into());
        }
        if config.initial_state >= n_states || config.terminal_state >= n_states {
            return Err(GridSimError::InvalidTable(format!(
                "initial state {} or terminal state {} is out of range",
                config.initial_state, config.terminal_state
            ))
            .into());
        }
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(GridSimError::InvalidTable(format!("gamma = {}", config.gamma)).into());
        }

        let mut transitions = Vec::with_capacity(n_states * n_actions);
        for (s, row) in config.transitions.iter().enumerate() {
            if row.len() != n_actions {
                return Err(GridSimError::InvalidTable(format!(
                    "state {} has {} transitions, expected {}",
                    s,
                    row.len(),
                    n_actions
                ))
                .into());
            }
            if let Some(&s_) = row.iter().find(|&&s_| s_ >= n_states) {
                return Err(GridSimError::InvalidTable(format!(
                    "state {} transitions to unknown state {}",
                    s, s_
                ))
                .into());
            }
            transitions.extend_from_slice(row);
        }

        Ok(Self {
            n_states,
            n_actions,
            transitions,
            rewards: config.rewards.clone(),
            initial_state: config.initial_state,
            terminal_state: config.terminal_state,
            gamma: config.gamma,
            timeout: config.timeout,
        })
    }

    /// The number of states.
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// The number of actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Initial state.
    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    /// Terminal state.
    pub fn terminal_state(&self) -> usize {
        self.terminal_state
    }

    /// Discount factor.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// The maximum number of steps of an episode.
    pub fn timeout(&self) -> usize {
        self.timeout
    }

    /// The number of policy parameters, one per (non-terminal state, action) pair.
    pub fn n_params(&self) -> usize {
        (self.n_states - 1) * self.n_actions
    }

    /// Next state after taking `action` at `state`.
    pub fn next_state(&self, state: usize, action: usize) -> Result<usize> {
        if state >= self.n_states || action >= self.n_actions {
            return Err(GridSimError::OutOfRange { state, action }.into());
        }
        Ok(self.transitions[state * self.n_actions + action])
    }

    /// Reward of entering `state`.
    pub fn reward(&self, state: usize) -> Result<f64> {
        self.rewards
            .get(state)
            .copied()
            .ok_or_else(|| GridSimError::OutOfRange { state, action: 0 }.into())
    }

    /// Row of `state` in the parameter matrix.
    ///
    /// The terminal state has no row, states after it are shifted up by one.
    pub fn decision_index(&self, state: usize) -> Result<usize> {
        if state >= self.n_states {
            return Err(GridSimError::OutOfRange { state, action: 0 }.into());
        }
        if state == self.terminal_state {
            return Err(GridSimError::NoDecision(state).into());
        }
        Ok(if state < self.terminal_state {
            state
        } else {
            state - 1
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gridworld_tables() {
        let mdp = TabularMdp::new(&GridEnvConfig::gridworld3x3()).unwrap();
        assert_eq!(mdp.n_params(), 32);
        assert_eq!(mdp.next_state(0, 3).unwrap(), 1);
        assert_eq!(mdp.next_state(2, 3).unwrap(), 2);
        assert_eq!(mdp.next_state(7, 3).unwrap(), 8);
        assert_eq!(mdp.next_state(5, 1).unwrap(), 8);
        assert_eq!(mdp.reward(7).unwrap(), -1.0);
        assert_eq!(mdp.reward(8).unwrap(), 1.0);
        assert_eq!(mdp.reward(4).unwrap(), 0.0);
        assert!(mdp.next_state(9, 0).is_err());
        assert!(mdp.next_state(0, 4).is_err());
    }

    #[test]
    fn test_decision_index() {
        let mut config = GridEnvConfig::gridworld3x3();
        config.terminal_state = 4;
        let mdp = TabularMdp::new(&config).unwrap();
        assert_eq!(mdp.decision_index(3).unwrap(), 3);
        assert_eq!(mdp.decision_index(5).unwrap(), 4);
        assert_eq!(mdp.decision_index(8).unwrap(), 7);
        let err = mdp.decision_index(4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GridSimError>(),
            Some(&GridSimError::NoDecision(4))
        );
    }

    #[test]
    fn test_invalid_tables() {
        let mut config = GridEnvConfig::gridworld3x3();
        config.transitions[3][1] = 9;
        assert!(TabularMdp::new(&config).is_err());

        let mut config = GridEnvConfig::gridworld3x3();
        config.transitions[0].pop();
        assert!(TabularMdp::new(&config).is_err());

        let mut config = GridEnvConfig::gridworld3x3();
        config.rewards.push(0.0);
        assert!(TabularMdp::new(&config).is_err());

        let config = GridEnvConfig::gridworld3x3().gamma(1.5);
        assert!(TabularMdp::new(&config).is_err());
    }
}
