use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::calendar::{add_days, diff_days};
use crate::error::ValidationError;
use crate::history::ChangeEntry;
use crate::task_validation;

/// Opaque, stable task identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One schedulable unit on the timeline. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    /// Board column / swimlane the task belongs to. Passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<String>,
    /// Completion ratio in `[0, 1]`. Passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lane: None,
            progress: None,
            start,
            end,
        }
    }

    /// Inclusive length in calendar days.
    pub fn duration(&self) -> i64 {
        diff_days(self.end, self.start) + 1
    }

    /// The end date a task of this duration would have when starting on `start`.
    pub fn end_if_started_on(&self, start: NaiveDate) -> Result<NaiveDate, ValidationError> {
        add_days(start, self.duration() - 1)
    }

    pub fn change_entry(&self) -> ChangeEntry {
        ChangeEntry::new(self.id.clone(), self.start, self.end)
    }
}

/// Ordered, indexed collection of tasks.
///
/// This is the engine's working copy. A scheduling pass clones it and the
/// live copy only changes through [`TaskSet::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSet {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Result<Self, ValidationError> {
        task_validation::validate_task_collection(&tasks)?;
        let index = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| (task.id.clone(), idx))
            .collect();
        Ok(Self { tasks, index })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.index.get(id).map(|&idx| &self.tasks[idx])
    }

    pub(crate) fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        match self.index.get(id) {
            Some(&idx) => Some(&mut self.tasks[idx]),
            None => None,
        }
    }

    /// Tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn to_vec(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn insert(&mut self, task: Task) -> Result<(), ValidationError> {
        task_validation::validate_task(&task)?;
        if self.contains(&task.id) {
            return Err(ValidationError::DuplicateTask(task.id));
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let idx = self.index.remove(id)?;
        let task = self.tasks.remove(idx);
        for position in self.index.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        Some(task)
    }

    /// Overwrite start/end of every task named in `changes`. Entries for tasks
    /// not in the set are skipped. Returns the number of tasks updated.
    pub fn apply(&mut self, changes: &[ChangeEntry]) -> usize {
        let mut applied = 0;
        for change in changes {
            match self.get_mut(&change.task_id) {
                Some(task) => {
                    task.start = change.start;
                    task.end = change.end;
                    applied += 1;
                }
                None => warn!(task = %change.task_id, "skipping change for unknown task"),
            }
        }
        applied
    }
}

impl<'a> IntoIterator for &'a TaskSet {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
