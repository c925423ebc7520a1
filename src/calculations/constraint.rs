use chrono::NaiveDate;

use crate::calendar::{add_days, snap_forward};
use crate::dependency::{Dependency, DependencyType};
use crate::error::ValidationError;
use crate::task::Task;

/// Earliest start `successor` may take under `dependency`, given the
/// predecessor's current dates. The result is always a working day.
///
/// End dates are inclusive, so a finish-to-start link with no lag puts the
/// successor on the day after the predecessor's last day. Fails when the lag
/// pushes the candidate outside the representable calendar.
pub fn compute_constraint(
    predecessor: &Task,
    successor: &Task,
    dependency: &Dependency,
) -> Result<NaiveDate, ValidationError> {
    let lag = dependency.lag;
    let span = 1 - successor.duration();
    let candidate = match dependency.kind {
        DependencyType::FinishToStart => add_days(add_days(predecessor.end, lag)?, 1)?,
        DependencyType::StartToStart => add_days(predecessor.start, lag)?,
        DependencyType::FinishToFinish => add_days(add_days(predecessor.end, lag)?, span)?,
        DependencyType::StartToFinish => add_days(add_days(predecessor.start, lag)?, span)?,
    };
    Ok(snap_forward(candidate))
}
