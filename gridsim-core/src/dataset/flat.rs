//! Flat layout of datasets.
use super::FileFormat;
use crate::{Episode, StepRecord};
use anyhow::{anyhow, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

const FIELDS_PER_STEP: usize = 4;

/// Dataset in the flat layout, one row per episode.
///
/// Columns are `s_k,a_k,r_k,pi_k` for `k = 0..max_len`. Cells beyond the end of an episode
/// are missing values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatTable {
    rows: Vec<Vec<StepRecord>>,
    max_len: usize,
}

impl FlatTable {
    /// Creates a table from episodes.
    pub fn new(episodes: &[Episode]) -> Self {
        let rows = episodes
            .iter()
            .map(|e| e.steps().to_vec())
            .collect::<Vec<_>>();
        let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        Self { rows, max_len }
    }

    /// The number of rows, i.e., episodes.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// The number of step groups, the length of the longest episode.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Step `k` of episode `ix`, `None` for padding.
    pub fn get(&self, ix: usize, k: usize) -> Option<&StepRecord> {
        self.rows.get(ix).and_then(|r| r.get(k))
    }

    /// Column names, `s_0,a_0,r_0,pi_0,s_1,...`.
    pub fn columns(&self) -> Vec<String> {
        (0..self.max_len)
            .flat_map(|k| {
                vec![
                    format!("s_{}", k),
                    format!("a_{}", k),
                    format!("r_{}", k),
                    format!("pi_{}", k),
                ]
            })
            .collect()
    }

    fn record(&self, row: &[StepRecord]) -> Vec<String> {
        let mut record = Vec::with_capacity(self.max_len * FIELDS_PER_STEP);
        for step in row.iter() {
            record.push(step.state.to_string());
            record.push(step.action.to_string());
            record.push(format!("{:?}", step.reward));
            record.push(format!("{:?}", step.probability));
        }
        record.resize(self.max_len * FIELDS_PER_STEP, String::new());
        record
    }

    /// Writes the table to a CSV file.
    pub fn write_csv(&self, path: impl AsRef<Path>, header: bool) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .from_path(path.as_ref())?;
        if header {
            wtr.write_record(self.columns())?;
        }
        for row in self.rows.iter() {
            wtr.write_record(self.record(row))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Reads a table from a CSV file.
    ///
    /// Each row is read up to its first missing step.
    pub fn read_csv(path: impl AsRef<Path>, header: bool) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(header)
            .flexible(true)
            .from_path(path.as_ref())?;
        let rows = rdr
            .records()
            .map(|record| parse_row(&record?))
            .collect::<Result<Vec<_>>>()?;
        let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        Ok(Self { rows, max_len })
    }

    /// Saves the table as a bincode file.
    pub fn save_bincode(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut wtr, self)?;
        wtr.flush()?;
        Ok(())
    }

    /// Loads a table from a bincode file.
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
}

fn parse_row(record: &StringRecord) -> Result<Vec<StepRecord>> {
    let fields = record.iter().collect::<Vec<_>>();

    // A record without fields is written as a single empty field
    if fields.len() <= 1 && fields.iter().all(|f| f.is_empty()) {
        return Ok(vec![]);
    }
    let mut row = vec![];
    for chunk in fields.chunks(FIELDS_PER_STEP) {
        if chunk.len() < FIELDS_PER_STEP || chunk[0].is_empty() {
            break;
        }
        row.push(StepRecord::new(
            chunk[0].parse()?,
            chunk[1].parse()?,
            chunk[2].parse()?,
            chunk[3].parse()?,
        ));
    }
    if fields.len() % FIELDS_PER_STEP != 0 {
        return Err(anyhow!(
            "Row has {} fields, not a multiple of {}",
            fields.len(),
            FIELDS_PER_STEP
        ));
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::super::tests::dataset;
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_padding() {
        let flat = dataset().flat();
        assert_eq!(flat.n_rows(), 3);
        assert_eq!(flat.max_len(), 3);
        assert_eq!(flat.columns().len(), 12);
        assert_eq!(&flat.columns()[4..8], &["s_1", "a_1", "r_1", "pi_1"]);
        assert_eq!(flat.get(0, 2).unwrap().reward, -1.0);
        assert!(flat.get(1, 0).is_none());
        assert!(flat.get(2, 1).is_none());
        assert_eq!(flat.get(2, 0).unwrap().state, 5);
    }

    #[test]
    fn test_csv() -> Result<()> {
        let dir = TempDir::new("flat_table")?;
        let flat = dataset().flat();

        let path = dir.path().join("flat.csv");
        flat.save(&path, false)?;
        let text = fs::read_to_string(&path)?;
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0,3,0.0,0.25,1,1,0.0,0.5,4,1,-1.0,0.125");
        assert_eq!(lines[2], "5,1,1.0,0.75,,,,,,,,");

        let flat_ = FlatTable::read_csv(&path, false)?;
        assert_eq!(flat, flat_);

        let path = dir.path().join("flat_header.csv");
        flat.write_csv(&path, true)?;
        let text = fs::read_to_string(&path)?;
        assert!(text.starts_with("s_0,a_0,r_0,pi_0,s_1,"));
        assert_eq!(FlatTable::read_csv(&path, true)?, flat);
        Ok(())
    }

    #[test]
    fn test_csv_empty_episodes() -> Result<()> {
        let dir = TempDir::new("flat_table")?;
        let flat = FlatTable::new(&[Episode::default(), Episode::default()]);
        assert_eq!(flat.max_len(), 0);

        for &header in [false, true].iter() {
            let path = dir.path().join(format!("empty_{}.csv", header));
            flat.save(&path, header)?;
            let flat_ = FlatTable::read_csv(&path, header)?;
            assert_eq!(flat_.n_rows(), 2);
            assert_eq!(flat_, flat);
        }
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_bincode_reports_write_error() {
        // Writes to /dev/full fail with ENOSPC
        if !Path::new("/dev/full").exists() {
            return;
        }
        let flat = dataset().flat();
        assert!(flat.save_bincode("/dev/full").is_err());
    }

    #[test]
    fn test_bincode() -> Result<()> {
        let dir = TempDir::new("flat_table")?;
        let flat = dataset().flat();
        let path = dir.path().join("flat.bincode");
        flat.save(&path, true)?;
        assert_eq!(FlatTable::load_bincode(&path)?, flat);
        Ok(())
    }
}
