use std::collections::HashSet;

use crate::dependency::{Dependency, MAX_LAG_DAYS};
use crate::error::ValidationError;
use crate::task::{Task, TaskSet};

pub fn validate_task(task: &Task) -> Result<(), ValidationError> {
    if task.end < task.start {
        return Err(ValidationError::InvertedInterval {
            id: task.id.clone(),
            start: task.start,
            end: task.end,
        });
    }
    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(&task.id) {
            return Err(ValidationError::DuplicateTask(task.id.clone()));
        }
        validate_task(task)?;
    }
    Ok(())
}

/// Checks applied by whoever creates or edits a link. The scheduler itself
/// tolerates dangling edges; creators must not produce them.
pub fn validate_dependency(dependency: &Dependency, tasks: &TaskSet) -> Result<(), ValidationError> {
    validate_dependency_shape(dependency)?;
    for endpoint in [&dependency.from, &dependency.to] {
        if !tasks.contains(endpoint) {
            return Err(ValidationError::DanglingEndpoint {
                dependency: dependency.id.clone(),
                task: endpoint.clone(),
            });
        }
    }
    Ok(())
}

/// Snapshot-level checks: unique dependency ids, no self-loops, bounded lag.
/// Dangling endpoints are allowed here since the scheduler skips them.
pub fn validate_dependency_collection(dependencies: &[Dependency]) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::with_capacity(dependencies.len());
    for dependency in dependencies {
        if !seen_ids.insert(&dependency.id) {
            return Err(ValidationError::DuplicateDependency(dependency.id.clone()));
        }
        validate_dependency_shape(dependency)?;
    }
    Ok(())
}

fn validate_dependency_shape(dependency: &Dependency) -> Result<(), ValidationError> {
    if dependency.is_self_loop() {
        return Err(ValidationError::SelfLoop(dependency.id.clone()));
    }
    if !(-MAX_LAG_DAYS..=MAX_LAG_DAYS).contains(&dependency.lag) {
        return Err(ValidationError::LagOutOfRange {
            dependency: dependency.id.clone(),
            lag: dependency.lag,
            max: MAX_LAG_DAYS,
        });
    }
    Ok(())
}
