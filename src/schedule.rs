use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::calculations::constraint::compute_constraint;
use crate::calculations::forward_pass::{SchedulingResult, run_automatic_scheduling};
use crate::config::{CommitFailurePolicy, EngineConfig};
use crate::dependency::{Dependency, DependencyId};
use crate::edit::{EditKind, EditOutcome, ManualEdit};
use crate::error::{EngineError, EngineResult, PersistenceError, ValidationError};
use crate::history::{ChangeBatch, ChangeEntry, History};
use crate::persistence::{ChangeSink, NullSink, TimelineSnapshot};
use crate::task::{Task, TaskId, TaskSet};
use crate::task_validation;

/// A change that made it into the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// Number of tasks whose dates changed.
    pub changed: usize,
    /// False when the persistence collaborator rejected the change and the
    /// configured policy kept it anyway.
    pub synced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlignOutcome {
    /// Automatic dependencies form a cycle; nothing was changed.
    Cycle { tasks: Vec<TaskId> },
    /// Every automatic dependency is already satisfied.
    NoChanges,
    Applied(CommitOutcome),
}

/// The live timeline: task working copy, dependencies, undo/redo history and
/// in-flight manual edits, wired to a persistence collaborator.
///
/// Every date change, automatic or manual, goes through the same path: apply
/// to the working copy, hand the new values to the sink, record in history.
pub struct Schedule {
    tasks: TaskSet,
    dependencies: Vec<Dependency>,
    history: History,
    edits: HashMap<TaskId, ManualEdit>,
    sink: Box<dyn ChangeSink + Send + Sync>,
    on_commit_failure: CommitFailurePolicy,
    unsynced: BTreeSet<TaskId>,
}

impl Schedule {
    pub fn new(snapshot: TimelineSnapshot) -> EngineResult<Self> {
        Self::with_config(snapshot, &EngineConfig::default())
    }

    pub fn with_config(snapshot: TimelineSnapshot, config: &EngineConfig) -> EngineResult<Self> {
        task_validation::validate_dependency_collection(&snapshot.dependencies)?;
        let tasks = TaskSet::new(snapshot.tasks)?;
        Ok(Self {
            tasks,
            dependencies: snapshot.dependencies,
            history: History::with_limit(config.history_limit),
            edits: HashMap::new(),
            sink: Box::new(NullSink),
            on_commit_failure: config.on_commit_failure,
            unsynced: BTreeSet::new(),
        })
    }

    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: ChangeSink + Send + Sync + 'static,
    {
        self.sink = Box::new(sink);
        self
    }

    pub fn set_sink(&mut self, sink: Box<dyn ChangeSink + Send + Sync>) {
        self.sink = sink;
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn dependency(&self, dependency_id: &DependencyId) -> Option<&Dependency> {
        self.dependencies.iter().find(|dep| &dep.id == dependency_id)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot::new(self.tasks.to_vec(), self.dependencies.clone())
    }

    /// Tasks whose latest change the persistence collaborator has not accepted.
    pub fn unsynced_tasks(&self) -> impl Iterator<Item = &TaskId> {
        self.unsynced.iter()
    }

    pub fn is_editing(&self, task_id: &TaskId) -> bool {
        self.edits.contains_key(task_id)
    }

    pub fn active_edits(&self) -> usize {
        self.edits.len()
    }

    /// Dry run of [`Schedule::align`]: the changes alignment would make now.
    pub fn propose_alignment(&self) -> SchedulingResult {
        run_automatic_scheduling(&self.tasks, &self.dependencies)
    }

    /// Move tasks so every automatic dependency holds, as one undoable batch.
    pub fn align(&mut self) -> EngineResult<AlignOutcome> {
        self.ensure_no_edits("align")?;
        let result = self.propose_alignment();
        if result.has_cycle {
            return Ok(AlignOutcome::Cycle {
                tasks: result.cycle,
            });
        }
        if result.batch.is_empty() {
            info!("alignment found nothing to change");
            return Ok(AlignOutcome::NoChanges);
        }
        let outcome = self.commit_batch(result.batch)?;
        info!(changed = outcome.changed, synced = outcome.synced, "alignment applied");
        Ok(AlignOutcome::Applied(outcome))
    }

    /// Revert the most recent batch. `Ok(None)` when there is nothing to undo.
    pub fn undo(&mut self) -> EngineResult<Option<CommitOutcome>> {
        self.ensure_no_edits("undo")?;
        let Some(applied) = self.history.undo(&mut self.tasks) else {
            return Ok(None);
        };
        match self.persist(&applied) {
            Ok(synced) => {
                info!(changed = applied.len(), "undo applied");
                Ok(Some(CommitOutcome {
                    changed: applied.len(),
                    synced,
                }))
            }
            Err(err) => {
                self.history.redo(&mut self.tasks);
                Err(err.into())
            }
        }
    }

    /// Re-apply the most recently undone batch. `Ok(None)` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> EngineResult<Option<CommitOutcome>> {
        self.ensure_no_edits("redo")?;
        let Some(applied) = self.history.redo(&mut self.tasks) else {
            return Ok(None);
        };
        match self.persist(&applied) {
            Ok(synced) => {
                info!(changed = applied.len(), "redo applied");
                Ok(Some(CommitOutcome {
                    changed: applied.len(),
                    synced,
                }))
            }
            Err(err) => {
                self.history.undo(&mut self.tasks);
                Err(err.into())
            }
        }
    }

    pub fn begin_edit(&mut self, task_id: &TaskId, kind: EditKind) -> EngineResult<()> {
        if self.edits.contains_key(task_id) {
            return Err(EngineError::EditInProgress(task_id.clone()));
        }
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| EngineError::UnknownTask(task_id.clone()))?;
        self.edits
            .insert(task_id.clone(), ManualEdit::begin(task, kind));
        Ok(())
    }

    /// Move the edited task `delta_days` away from where its edit began.
    ///
    /// A delta that leaves the calendar aborts the edit: the task goes back to
    /// where it was when the edit began and the error is returned.
    pub fn drag_edit(&mut self, task_id: &TaskId, delta_days: i64) -> EngineResult<&Task> {
        let edit = self
            .edits
            .get(task_id)
            .ok_or_else(|| EngineError::NoActiveEdit(task_id.clone()))?;
        let Some(task) = self.tasks.get_mut(task_id) else {
            self.edits.remove(task_id);
            return Err(EngineError::UnknownTask(task_id.clone()));
        };
        if let Err(err) = edit.drag(task, delta_days) {
            warn!(task = %task_id, delta_days, error = %err, "drag rejected, edit aborted");
            if let Some(edit) = self.edits.remove(task_id) {
                edit.cancel(task);
            }
            return Err(err.into());
        }
        Ok(&*task)
    }

    /// Finish an edit. `Ok(None)` when the task ended where it started and
    /// nothing was recorded.
    pub fn commit_edit(&mut self, task_id: &TaskId) -> EngineResult<Option<CommitOutcome>> {
        let edit = self
            .edits
            .remove(task_id)
            .ok_or_else(|| EngineError::NoActiveEdit(task_id.clone()))?;
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| EngineError::UnknownTask(task_id.clone()))?;
        match edit.commit(task) {
            EditOutcome::Discarded => Ok(None),
            EditOutcome::Committed(batch) => self.commit_batch(batch).map(Some),
        }
    }

    /// Abort an edit, restoring the task's dates from before it began.
    pub fn cancel_edit(&mut self, task_id: &TaskId) -> EngineResult<()> {
        let edit = self
            .edits
            .remove(task_id)
            .ok_or_else(|| EngineError::NoActiveEdit(task_id.clone()))?;
        if let Some(task) = self.tasks.get_mut(task_id) {
            edit.cancel(task);
        }
        Ok(())
    }

    /// Convenience for adapters that deliver a whole drag at once.
    pub fn apply_manual_edit(
        &mut self,
        task_id: &TaskId,
        kind: EditKind,
        delta_days: i64,
    ) -> EngineResult<Option<CommitOutcome>> {
        self.begin_edit(task_id, kind)?;
        self.drag_edit(task_id, delta_days)?;
        self.commit_edit(task_id)
    }

    pub fn create_dependency(&mut self, dependency: Dependency) -> EngineResult<()> {
        if self.dependency(&dependency.id).is_some() {
            return Err(ValidationError::DuplicateDependency(dependency.id).into());
        }
        task_validation::validate_dependency(&dependency, &self.tasks)?;
        self.dependencies.push(dependency);
        Ok(())
    }

    pub fn update_dependency(&mut self, dependency: Dependency) -> EngineResult<()> {
        let position = self
            .dependencies
            .iter()
            .position(|dep| dep.id == dependency.id)
            .ok_or_else(|| EngineError::UnknownDependency(dependency.id.clone()))?;
        task_validation::validate_dependency(&dependency, &self.tasks)?;
        self.dependencies[position] = dependency;
        Ok(())
    }

    pub fn delete_dependency(&mut self, dependency_id: &DependencyId) -> EngineResult<Dependency> {
        let position = self
            .dependencies
            .iter()
            .position(|dep| &dep.id == dependency_id)
            .ok_or_else(|| EngineError::UnknownDependency(dependency_id.clone()))?;
        Ok(self.dependencies.remove(position))
    }

    pub fn add_task(&mut self, task: Task) -> EngineResult<()> {
        self.tasks.insert(task)?;
        Ok(())
    }

    /// Remove a task together with every dependency touching it.
    pub fn remove_task(&mut self, task_id: &TaskId) -> EngineResult<Task> {
        let task = self
            .tasks
            .remove(task_id)
            .ok_or_else(|| EngineError::UnknownTask(task_id.clone()))?;
        self.dependencies
            .retain(|dep| &dep.from != task_id && &dep.to != task_id);
        self.edits.remove(task_id);
        self.unsynced.remove(task_id);
        Ok(task)
    }

    /// Hard-constraint links the current dates do not satisfy. The scheduler
    /// never moves tasks for these; they are reported for a human to resolve.
    pub fn hard_constraint_violations(&self) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|dep| dep.hard_constraint)
            .filter(|dep| {
                match (self.tasks.get(&dep.from), self.tasks.get(&dep.to)) {
                    (Some(pred), Some(succ)) => compute_constraint(pred, succ, dep)
                        .is_ok_and(|required| succ.start < required),
                    _ => false,
                }
            })
            .collect()
    }

    fn ensure_no_edits(&self, action: &'static str) -> EngineResult<()> {
        if self.edits.is_empty() {
            Ok(())
        } else {
            Err(EngineError::EditsInFlight {
                action,
                edits: self.edits.len(),
            })
        }
    }

    fn commit_batch(&mut self, batch: ChangeBatch) -> EngineResult<CommitOutcome> {
        self.tasks.apply(batch.redo());
        match self.persist(batch.redo()) {
            Ok(synced) => {
                let changed = batch.len();
                self.history.push(batch);
                Ok(CommitOutcome { changed, synced })
            }
            Err(err) => {
                self.tasks.apply(batch.undo());
                Err(err.into())
            }
        }
    }

    /// Hand changes to the sink. `Ok(false)` means the sink failed but the
    /// policy keeps the change; `Err` means the caller must revert it.
    fn persist(&mut self, changes: &[ChangeEntry]) -> Result<bool, PersistenceError> {
        match self.sink.commit_changes(changes) {
            Ok(()) => {
                for change in changes {
                    self.unsynced.remove(&change.task_id);
                }
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, count = changes.len(), "persisting changes failed");
                match self.on_commit_failure {
                    CommitFailurePolicy::Rollback => Err(err),
                    CommitFailurePolicy::MarkUnsynced => {
                        self.unsynced
                            .extend(changes.iter().map(|change| change.task_id.clone()));
                        Ok(false)
                    }
                }
            }
        }
    }
}
