use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calculations::constraint::compute_constraint;
use crate::calendar::snap_forward;
use crate::dependency::Dependency;
use crate::graph::ScheduleDag;
use crate::history::{ChangeBatch, ChangeEntry};
use crate::task::{TaskId, TaskSet};

/// Outcome of one automatic scheduling pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulingResult {
    pub batch: ChangeBatch,
    pub has_cycle: bool,
    /// Tasks on the offending cycle(s) when `has_cycle` is set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<TaskId>,
}

impl SchedulingResult {
    fn cycle(cycle: Vec<TaskId>) -> Self {
        Self {
            batch: ChangeBatch::new(),
            has_cycle: true,
            cycle,
        }
    }

    /// Nothing to align: no cycle and no proposed change.
    pub fn is_noop(&self) -> bool {
        !self.has_cycle && self.batch.is_empty()
    }
}

/// Propagates automatic constraints over a private copy of the task set.
pub struct ForwardPass<'a> {
    tasks: &'a TaskSet,
    dag: &'a ScheduleDag<'a>,
}

impl<'a> ForwardPass<'a> {
    pub fn new(tasks: &'a TaskSet, dag: &'a ScheduleDag<'a>) -> Self {
        Self { tasks, dag }
    }

    pub fn execute(&self) -> SchedulingResult {
        if self.dag.edge_count() == 0 {
            return SchedulingResult::default();
        }

        let Some(order) = self.dag.topological_order() else {
            let cycle = self.dag.cycle_members();
            info!(tasks = ?cycle, "automatic dependencies form a cycle");
            return SchedulingResult::cycle(cycle);
        };

        let mut working = self.tasks.clone();
        let mut batch = ChangeBatch::new();

        for node_ix in order {
            let task_id = self.dag.task_id(node_ix);
            let Some(successor) = working.get(task_id) else {
                continue;
            };

            let mut required: Option<NaiveDate> = None;
            for (pred_id, dependency) in self.dag.incoming(node_ix) {
                let Some(predecessor) = working.get(pred_id) else {
                    continue;
                };
                let candidate = match compute_constraint(predecessor, successor, dependency) {
                    Ok(candidate) => candidate,
                    Err(err) => {
                        warn!(dependency = %dependency.id, error = %err, "skipping dependency");
                        continue;
                    }
                };
                required = Some(required.map_or(candidate, |current| current.max(candidate)));
            }

            let Some(required) = required.map(snap_forward) else {
                continue;
            };
            if required <= successor.start {
                continue;
            }

            let end = match successor.end_if_started_on(required) {
                Ok(end) => end,
                Err(err) => {
                    warn!(task = %task_id, error = %err, "cannot move task");
                    continue;
                }
            };
            let before = successor.change_entry();
            let after = ChangeEntry::new(task_id.clone(), required, end);
            debug!(
                task = %task_id,
                from = %before.start,
                to = %after.start,
                "constraint moves task"
            );
            working.apply(std::slice::from_ref(&after));
            batch.record(before, after);
        }

        SchedulingResult {
            batch,
            has_cycle: false,
            cycle: Vec::new(),
        }
    }
}

/// Compute the date changes needed to satisfy every automatic dependency.
///
/// Pure: `tasks` is never modified. On a cycle the batch is empty and
/// `has_cycle` is set; no edge is guessed to break it. Like dangling edges,
/// links whose constraint falls outside the calendar are skipped with a warning.
pub fn run_automatic_scheduling(tasks: &TaskSet, dependencies: &[Dependency]) -> SchedulingResult {
    let dag = ScheduleDag::build(tasks, dependencies);
    ForwardPass::new(tasks, &dag).execute()
}
