use super::{ChangeSink, PersistenceResult, TimelineSnapshot, validate_snapshot};
use crate::history::ChangeEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &TimelineSnapshot,
    path: P,
) -> PersistenceResult<()> {
    validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<TimelineSnapshot> {
    let file = File::open(path)?;
    let snapshot: TimelineSnapshot = serde_json::from_reader(BufReader::new(file))?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// One committed batch as written to the change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogRecord {
    pub committed_at: DateTime<Utc>,
    pub changes: Vec<ChangeEntry>,
}

/// Appends each committed batch to a file as one JSON line.
#[derive(Debug, Clone)]
pub struct JsonlChangeLog {
    path: PathBuf,
}

impl JsonlChangeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record written so far, oldest first.
    pub fn read_records(&self) -> PersistenceResult<Vec<ChangeLogRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl ChangeSink for JsonlChangeLog {
    fn commit_changes(&mut self, changes: &[ChangeEntry]) -> PersistenceResult<()> {
        let record = ChangeLogRecord {
            committed_at: Utc::now(),
            changes: changes.to_vec(),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        debug!(path = %self.path.display(), count = changes.len(), "appended change log record");
        Ok(())
    }
}
