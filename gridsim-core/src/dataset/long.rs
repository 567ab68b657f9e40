//! Long layout of datasets.
use super::FileFormat;
use crate::{error::GridSimError, stats::discounted_weighted_sum, Episode, StepRecord};
use anyhow::Result;
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    convert::TryFrom,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// A row of [`LongTable`], corresponding to a step of an episode.
///
/// Column names follow the conventional `episode_index,O,A,R,pi` header.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    /// Index of the episode the step belongs to.
    pub episode_index: usize,

    /// State (observation).
    #[serde(rename = "O")]
    pub state: usize,

    /// Action.
    #[serde(rename = "A")]
    pub action: usize,

    /// Reward.
    #[serde(rename = "R")]
    pub reward: f64,

    /// Probability of the action.
    #[serde(rename = "pi")]
    pub probability: f64,
}

impl LongRow {
    /// Creates a row from a step of the episode at `episode_index`.
    pub fn new(episode_index: usize, step: &StepRecord) -> Self {
        Self {
            episode_index,
            state: step.state,
            action: step.action,
            reward: step.reward,
            probability: step.probability,
        }
    }
}

/// Dataset in the long layout, one row per step.
///
/// The table lists the indices of its episodes, so an episode without steps still counts.
/// Every row refers to a listed episode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLongTable")]
pub struct LongTable {
    rows: Vec<LongRow>,

    // Strictly increasing.
    episodes: Vec<usize>,
}

// Deserialized form, validated by `LongTable::new`.
#[derive(Deserialize)]
struct RawLongTable {
    rows: Vec<LongRow>,
    episodes: Vec<usize>,
}

impl TryFrom<RawLongTable> for LongTable {
    type Error = GridSimError;

    fn try_from(raw: RawLongTable) -> Result<Self, Self::Error> {
        Self::new(raw.rows, raw.episodes)
    }
}

impl LongTable {
    /// Creates a table of the episodes with indices `episodes`.
    ///
    /// `episodes` must be strictly increasing and contain the episode index of every row.
    pub fn new(rows: Vec<LongRow>, episodes: Vec<usize>) -> Result<Self, GridSimError> {
        if episodes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridSimError::InvalidTable(
                "episode indices are not strictly increasing".to_string(),
            ));
        }
        if let Some(row) = rows
            .iter()
            .find(|r| episodes.binary_search(&r.episode_index).is_err())
        {
            return Err(GridSimError::UnknownEpisode(row.episode_index));
        }
        Ok(Self { rows, episodes })
    }

    /// Creates a table of the episodes appearing in `rows`.
    pub fn from_rows(rows: Vec<LongRow>) -> Self {
        let episodes = rows
            .iter()
            .map(|r| r.episode_index)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { rows, episodes }
    }

    /// Creates a table from episodes, the index of an episode being its position.
    pub fn from_episodes(episodes: &[Episode]) -> Self {
        let rows = episodes
            .iter()
            .enumerate()
            .flat_map(|(ix, episode)| {
                episode
                    .steps()
                    .iter()
                    .map(move |step| LongRow::new(ix, step))
            })
            .collect();
        Self {
            rows,
            episodes: (0..episodes.len()).collect(),
        }
    }

    /// Rows of the table.
    pub fn rows(&self) -> &[LongRow] {
        &self.rows
    }

    /// The number of episodes.
    pub fn n_episodes(&self) -> usize {
        self.episodes.len()
    }

    /// Indices of the episodes, in increasing order.
    pub fn episode_indices(&self) -> &[usize] {
        &self.episodes
    }

    /// Rewards grouped by episode, in the order of episode indices.
    pub fn episode_rewards(&self) -> Vec<Vec<f64>> {
        let mut rewards = vec![vec![]; self.episodes.len()];
        for row in self.rows.iter() {
            if let Ok(pos) = self.episodes.binary_search(&row.episode_index) {
                rewards[pos].push(row.reward);
            }
        }
        rewards
    }

    /// Discounted return of each episode, in the order of episode indices.
    pub fn discounted_returns(&self, gamma: f64) -> Vec<f64> {
        self.episode_rewards()
            .iter()
            .map(|r| discounted_weighted_sum(r, gamma))
            .collect()
    }

    /// Writes the table to a CSV file.
    pub fn write_csv(&self, path: impl AsRef<Path>, header: bool) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .has_headers(header)
            .from_path(path.as_ref())?;
        for row in self.rows.iter() {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Reads a table from a CSV file.
    ///
    /// Only the episode indices present in the file are counted, as a file does not record
    /// episodes without steps.
    pub fn read_csv(path: impl AsRef<Path>, header: bool) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(header)
            .from_path(path.as_ref())?;
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<LongRow>, csv::Error>>()?;
        Ok(Self::from_rows(rows))
    }

    /// Saves the table as a bincode file.
    pub fn save_bincode(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut wtr, self)?;
        wtr.flush()?;
        Ok(())
    }

    /// Loads a table from a bincode file.
    ///
    /// The table is validated as in [`LongTable::new`].
    pub fn load_bincode(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(rdr)?)
    }

    /// Saves the table in the format given by the extension of `path`.
    ///
    /// `header` is used only for CSV files.
    pub fn save(&self, path: impl AsRef<Path>, header: bool) -> Result<()> {
        let path = path.as_ref();
        match FileFormat::from_path(path)? {
            FileFormat::Csv => self.write_csv(path, header)?,
            FileFormat::Bincode => self.save_bincode(path)?,
        }
        info!("Saved {:?}", path);
        Ok(())
    }

    /// Loads a table in the format given by the extension of `path`.
    pub fn load(path: impl AsRef<Path>, header: bool) -> Result<Self> {
        let path = path.as_ref();
        match FileFormat::from_path(path)? {
            FileFormat::Csv => Self::read_csv(path, header),
            FileFormat::Bincode => Self::load_bincode(path),
        }
    }
}
