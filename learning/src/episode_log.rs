//! Per-episode CSV log.

use std::{fs::File, path::Path};

use serde::{Deserialize, Serialize};

/// Column names written as the first row of the log.
pub const HEADER: [&str; 5] = ["episode", "score", "epsilon", "steps", "duration_seconds"];

/// One row of the episode log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Episode number, starting at 1.
    pub episode: u32,
    /// Cumulative reward of the episode.
    pub score: f32,
    /// Exploration rate used during the episode.
    pub epsilon: f64,
    /// Decisions taken.
    pub steps: u32,
    /// Wall-clock duration.
    pub duration_seconds: f64,
}

/// Appends episode rows, flushing after every row.
#[derive(Debug)]
pub struct EpisodeLog {
    writer: csv::Writer<File>,
}

impl EpisodeLog {
    /// Creates the log at `path` and writes the header row.
    pub fn create(path: &Path) -> Result<Self, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Appends one row.
    pub fn append(&mut self, record: &EpisodeRecord) -> Result<(), csv::Error> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads every row of a log written by [`EpisodeLog`].
pub fn read_records(path: &Path) -> Result<Vec<EpisodeRecord>, csv::Error> {
    csv::Reader::from_path(path)?.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_the_header() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("training_log.csv");
        let mut log = EpisodeLog::create(&path).expect("log");
        let record = EpisodeRecord {
            episode: 1,
            score: -3.5,
            epsilon: 0.99,
            steps: 12,
            duration_seconds: 0.25,
        };
        log.append(&record).expect("append");

        let text = std::fs::read_to_string(&path).expect("log file");
        assert_eq!(
            text.lines().next(),
            Some("episode,score,epsilon,steps,duration_seconds")
        );
        assert_eq!(read_records(&path).expect("records"), vec![record]);
    }
}
