//! Dependency-constrained scheduling for a Gantt-style timeline.
//!
//! Tasks carry inclusive start/end dates; dependencies link them with
//! FS/SS/FF/SF constraints and a signed lag. [`run_automatic_scheduling`]
//! proposes the date changes that satisfy every automatic link, and
//! [`Schedule`] applies them, together with manual drag edits, as undoable
//! change batches.

pub mod calculations;
pub mod calendar;
pub mod config;
pub mod dependency;
pub mod edit;
pub mod error;
pub mod graph;
pub mod history;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod schedule;
pub mod task;
pub(crate) mod task_validation;

pub use calculations::{SchedulingResult, compute_constraint, run_automatic_scheduling};
pub use config::{CommitFailurePolicy, EngineConfig};
pub use dependency::{Dependency, DependencyId, DependencyMode, DependencyType, MAX_LAG_DAYS};
pub use edit::{EditKind, EditOutcome, ManualEdit};
pub use error::{EngineError, EngineResult, PersistenceError, ValidationError};
pub use history::{ChangeBatch, ChangeEntry, History, apply_changes};
pub use persistence::{
    ChangeSink, JsonlChangeLog, NullSink, TimelineSnapshot, load_snapshot_from_json,
    save_snapshot_to_json,
};
pub use schedule::{AlignOutcome, CommitOutcome, Schedule};
pub use task::{Task, TaskId, TaskSet};
