//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::error::PersistenceResult;

pub const CONFIG_PATH_ENV: &str = "TIMELINE_SCHEDULER_CONFIG";
pub const HISTORY_LIMIT_ENV: &str = "TIMELINE_SCHEDULER_HISTORY_LIMIT";
pub const ON_COMMIT_FAILURE_ENV: &str = "TIMELINE_SCHEDULER_ON_COMMIT_FAILURE";

/// What to do when the persistence collaborator rejects a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitFailurePolicy {
    /// Revert the working copy and history, then report the error.
    #[default]
    Rollback,
    /// Keep the change and flag the affected tasks as unsynced.
    MarkUnsynced,
}

impl FromStr for CommitFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rollback" => Ok(CommitFailurePolicy::Rollback),
            "mark_unsynced" => Ok(CommitFailurePolicy::MarkUnsynced),
            other => Err(format!("unknown commit failure policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undoable batches kept. `None` keeps everything.
    pub history_limit: Option<usize>,
    pub on_commit_failure: CommitFailurePolicy,
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Defaults, overlaid with the file named by `TIMELINE_SCHEDULER_CONFIG`
    /// and then with individual environment overrides.
    pub fn from_env() -> PersistenceResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(HISTORY_LIMIT_ENV) {
            match raw.trim() {
                "" | "none" | "unbounded" => self.history_limit = None,
                value => match value.parse::<usize>() {
                    Ok(limit) => self.history_limit = Some(limit),
                    Err(_) => warn!(value, "ignoring invalid {HISTORY_LIMIT_ENV}"),
                },
            }
        }
        if let Some(raw) = lookup(ON_COMMIT_FAILURE_ENV) {
            match raw.parse() {
                Ok(policy) => self.on_commit_failure = policy,
                Err(err) => warn!(%err, "ignoring invalid {ON_COMMIT_FAILURE_ENV}"),
            }
        }
    }
}
