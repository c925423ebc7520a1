//! Contracts with the persistence collaborator.
//!
//! The engine never stores tasks itself: committed changes are handed to a
//! [`ChangeSink`], and the input snapshot can be read from or written to JSON.

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
pub use crate::error::{PersistenceError, PersistenceResult};
use crate::history::ChangeEntry;
use crate::task::Task;
use crate::task_validation;

/// Receives the new start/end of every task touched by a committed change,
/// whether it came from alignment, a manual edit, undo or redo.
pub trait ChangeSink {
    fn commit_changes(&mut self, changes: &[ChangeEntry]) -> PersistenceResult<()>;
}

/// Accepts and forgets every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn commit_changes(&mut self, _changes: &[ChangeEntry]) -> PersistenceResult<()> {
        Ok(())
    }
}

/// The tasks and dependencies the engine is invoked with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl TimelineSnapshot {
    pub fn new(tasks: Vec<Task>, dependencies: Vec<Dependency>) -> Self {
        Self {
            tasks,
            dependencies,
        }
    }
}

pub fn validate_snapshot(snapshot: &TimelineSnapshot) -> PersistenceResult<()> {
    task_validation::validate_task_collection(&snapshot.tasks)?;
    task_validation::validate_dependency_collection(&snapshot.dependencies)?;
    Ok(())
}

pub mod file;

pub use file::{JsonlChangeLog, load_snapshot_from_json, save_snapshot_to_json};
