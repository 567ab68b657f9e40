//! Tabular datasets of episodes.
//!
//! A [`Dataset`] is an ordered collection of episodes, where the index of an episode is its
//! position. It is converted into one of two fixed-schema tables:
//!
//! * [`LongTable`] - one row per step, `episode_index,O,A,R,pi`.
//! * [`FlatTable`] - one row per episode, `s_0,a_0,r_0,pi_0,s_1,...`, padded with missing
//!   values up to the longest episode.
//!
//! Both tables are written to CSV files or to bincode files for fast reload.
mod flat;
mod long;
pub use flat::FlatTable;
pub use long::{LongRow, LongTable};

use crate::{error::GridSimError, Episode};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An ordered collection of episodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    episodes: Vec<Episode>,
}

impl Dataset {
    /// The number of episodes.
    pub fn n_episodes(&self) -> usize {
        self.episodes.len()
    }

    /// Episodes, in the order of their indices.
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Length of the longest episode.
    pub fn max_episode_len(&self) -> usize {
        self.episodes.iter().map(|e| e.len()).max().unwrap_or(0)
    }

    /// Discounted return of each episode.
    pub fn discounted_returns(&self, gamma: f64) -> Vec<f64> {
        self.episodes
            .iter()
            .map(|e| e.discounted_return(gamma))
            .collect()
    }

    /// Converts into the long layout, one row per step.
    pub fn long(&self) -> LongTable {
        LongTable::from_episodes(&self.episodes)
    }

    /// Converts into the flat layout, one row per episode.
    pub fn flat(&self) -> FlatTable {
        FlatTable::new(&self.episodes)
    }
}

/// Builds a [`Dataset`] incrementally.
///
/// Episode indices are assigned in the order episodes are pushed.
#[derive(Default)]
pub struct DatasetBuilder {
    episodes: Vec<Episode>,
}

impl DatasetBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with room for `n` episodes.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            episodes: Vec::with_capacity(n),
        }
    }

    /// Appends an episode and returns its index.
    pub fn push_episode(&mut self, episode: Episode) -> usize {
        self.episodes.push(episode);
        self.episodes.len() - 1
    }

    /// Appends episodes.
    pub fn extend(&mut self, episodes: impl IntoIterator<Item = Episode>) {
        self.episodes.extend(episodes);
    }

    /// The number of episodes pushed so far.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Returns `true` if no episode has been pushed.
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Builds the dataset.
    pub fn build(self) -> Dataset {
        Dataset {
            episodes: self.episodes,
        }
    }
}

/// File formats of datasets, determined by the extension of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    /// Delimited text, `.csv`.
    Csv,

    /// Serialized binary object, `.bin` or `.bincode`.
    Bincode,
}

impl FileFormat {
    /// Determines the format of `path` from its extension.
    ///
    /// Any other extension is an error rather than a silent no-op.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext {
            "csv" => Ok(Self::Csv),
            "bin" | "bincode" => Ok(Self::Bincode),
            _ => Err(GridSimError::UnsupportedExtension(ext.to_string()).into()),
        }
    }
}
