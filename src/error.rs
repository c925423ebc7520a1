use thiserror::Error;

use crate::dependency::DependencyId;
use crate::task::TaskId;

/// Rejected input: malformed tasks or dependency edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),

    #[error("task {id} ends on {end} before it starts on {start}")]
    InvertedInterval {
        id: TaskId,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("duplicate dependency id {0}")]
    DuplicateDependency(DependencyId),

    #[error("dependency {0} links a task to itself")]
    SelfLoop(DependencyId),

    #[error("dependency {dependency} references unknown task {task}")]
    DanglingEndpoint {
        dependency: DependencyId,
        task: TaskId,
    },

    #[error("invalid date '{0}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate(String),

    #[error("shifting {date} by {days} day(s) leaves the supported calendar range")]
    DateOutOfRange { date: chrono::NaiveDate, days: i64 },

    #[error("dependency {dependency} has lag {lag}; at most {max} days either way is allowed")]
    LagOutOfRange {
        dependency: DependencyId,
        lag: i64,
        max: i64,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    InvalidData(#[from] ValidationError),

    #[error("changes rejected: {0}")]
    Rejected(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task {0} not found")]
    UnknownTask(TaskId),

    #[error("dependency {0} not found")]
    UnknownDependency(DependencyId),

    #[error("task {0} is already being edited")]
    EditInProgress(TaskId),

    #[error("no edit in progress for task {0}")]
    NoActiveEdit(TaskId),

    #[error("cannot {action} while {edits} manual edit(s) are in progress")]
    EditsInFlight { action: &'static str, edits: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("persisting changes failed: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type EngineResult<T> = Result<T, EngineError>;
