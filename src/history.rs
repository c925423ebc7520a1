//! Change batches and the undo/redo history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::task::{TaskId, TaskSet};

/// Start/end values for one task, either proposed or historical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub task_id: TaskId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ChangeEntry {
    pub fn new(task_id: impl Into<TaskId>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            task_id: task_id.into(),
            start,
            end,
        }
    }
}

/// Paired before/after values; `undo[i]` and `redo[i]` describe the same task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChangeBatch")]
pub struct ChangeBatch {
    redo: Vec<ChangeEntry>,
    undo: Vec<ChangeEntry>,
}

#[derive(Deserialize)]
struct RawChangeBatch {
    redo: Vec<ChangeEntry>,
    undo: Vec<ChangeEntry>,
}

impl TryFrom<RawChangeBatch> for ChangeBatch {
    type Error = String;

    fn try_from(raw: RawChangeBatch) -> Result<Self, Self::Error> {
        if raw.redo.len() != raw.undo.len() {
            return Err(format!(
                "redo has {} entries but undo has {}",
                raw.redo.len(),
                raw.undo.len()
            ));
        }
        for (idx, (redo, undo)) in raw.redo.iter().zip(&raw.undo).enumerate() {
            if redo.task_id != undo.task_id {
                return Err(format!(
                    "entry {idx} pairs task {} with task {}",
                    redo.task_id, undo.task_id
                ));
            }
        }
        Ok(Self {
            redo: raw.redo,
            undo: raw.undo,
        })
    }
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one task's transition. `before` and `after` must name the same task.
    pub fn record(&mut self, before: ChangeEntry, after: ChangeEntry) {
        debug_assert_eq!(before.task_id, after.task_id);
        self.undo.push(before);
        self.redo.push(after);
    }

    pub fn single(before: ChangeEntry, after: ChangeEntry) -> Self {
        let mut batch = Self::new();
        batch.record(before, after);
        batch
    }

    pub fn redo(&self) -> &[ChangeEntry] {
        &self.redo
    }

    pub fn undo(&self) -> &[ChangeEntry] {
        &self.undo
    }

    pub fn len(&self) -> usize {
        self.redo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redo.is_empty()
    }

    /// `(before, after)` pairs in recording order.
    pub fn pairs(&self) -> impl Iterator<Item = (&ChangeEntry, &ChangeEntry)> {
        self.undo.iter().zip(&self.redo)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.redo.iter().map(|entry| &entry.task_id)
    }
}

/// Return a copy of `tasks` with `changes` applied.
pub fn apply_changes(tasks: &TaskSet, changes: &[ChangeEntry]) -> TaskSet {
    let mut next = tasks.clone();
    next.apply(changes);
    next
}

/// Undo and redo stacks of committed batches.
///
/// A batch lives on exactly one stack at a time. With a limit set, the
/// oldest undo entry is dropped once the stack grows past it.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: VecDeque<ChangeBatch>,
    redo_stack: Vec<ChangeBatch>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Record a committed batch. Any redo path is invalidated.
    pub fn push(&mut self, batch: ChangeBatch) {
        if batch.is_empty() {
            debug!("ignoring empty change batch");
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push_back(batch);
        if let Some(limit) = self.limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Revert the most recent batch on `tasks`. Returns the entries applied,
    /// or `None` when there is nothing to undo.
    pub fn undo(&mut self, tasks: &mut TaskSet) -> Option<Vec<ChangeEntry>> {
        let batch = self.undo_stack.pop_back()?;
        tasks.apply(batch.undo());
        let applied = batch.undo().to_vec();
        self.redo_stack.push(batch);
        Some(applied)
    }

    /// Re-apply the most recently undone batch on `tasks`.
    pub fn redo(&mut self, tasks: &mut TaskSet) -> Option<Vec<ChangeEntry>> {
        let batch = self.redo_stack.pop()?;
        tasks.apply(batch.redo());
        let applied = batch.redo().to_vec();
        self.undo_stack.push_back(batch);
        Some(applied)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn last_undo(&self) -> Option<&ChangeBatch> {
        self.undo_stack.back()
    }

    pub fn last_redo(&self) -> Option<&ChangeBatch> {
        self.redo_stack.last()
    }
}
