//! Drag-based manual edits of a single task.
//!
//! An edit snapshots the task when it begins, mutates the live task while the
//! pointer moves, and on commit yields a one-entry [`ChangeBatch`] (or nothing
//! when the task ended up where it started).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calendar::add_days;
use crate::error::ValidationError;
use crate::history::{ChangeBatch, ChangeEntry};
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Shift both ends by the same number of days.
    Move,
    /// Drag the start edge; it never passes the end.
    ResizeStart,
    /// Drag the end edge; it never passes the start.
    ResizeEnd,
}

impl EditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditKind::Move => "move",
            EditKind::ResizeStart => "resize_start",
            EditKind::ResizeEnd => "resize_end",
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "move" => Ok(EditKind::Move),
            "resize_start" => Ok(EditKind::ResizeStart),
            "resize_end" => Ok(EditKind::ResizeEnd),
            other => Err(format!("unknown edit kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Committed(ChangeBatch),
    Discarded,
}

/// An in-flight edit. Dropping it without `commit` or `cancel` leaves the
/// live task wherever the last drag put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEdit {
    kind: EditKind,
    snapshot: ChangeEntry,
}

impl ManualEdit {
    pub fn begin(task: &Task, kind: EditKind) -> Self {
        Self {
            kind,
            snapshot: task.change_entry(),
        }
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    pub fn task_id(&self) -> &TaskId {
        &self.snapshot.task_id
    }

    pub fn snapshot(&self) -> &ChangeEntry {
        &self.snapshot
    }

    /// Place the live task `delta_days` away from where the edit began.
    /// A delta that leaves the calendar is rejected and the task is untouched.
    pub fn drag(&self, task: &mut Task, delta_days: i64) -> Result<(), ValidationError> {
        match self.kind {
            EditKind::Move => {
                let start = add_days(self.snapshot.start, delta_days)?;
                let end = add_days(self.snapshot.end, delta_days)?;
                task.start = start;
                task.end = end;
            }
            EditKind::ResizeStart => {
                task.start = add_days(self.snapshot.start, delta_days)?.min(task.end);
            }
            EditKind::ResizeEnd => {
                task.end = add_days(self.snapshot.end, delta_days)?.max(task.start);
            }
        }
        Ok(())
    }

    pub fn commit(self, task: &Task) -> EditOutcome {
        if task.start == self.snapshot.start && task.end == self.snapshot.end {
            return EditOutcome::Discarded;
        }
        EditOutcome::Committed(ChangeBatch::single(self.snapshot, task.change_entry()))
    }

    /// Abort the edit and put the task back where it was.
    pub fn cancel(self, task: &mut Task) {
        task.start = self.snapshot.start;
        task.end = self.snapshot.end;
    }
}
