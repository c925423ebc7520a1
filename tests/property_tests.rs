use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use timeline_scheduler::calendar::is_weekend;
use timeline_scheduler::{
    AlignOutcome, Dependency, DependencyType, Schedule, Task, TaskSet, TimelineSnapshot,
    apply_changes, compute_constraint, run_automatic_scheduling,
};

const KINDS: [DependencyType; 4] = [
    DependencyType::FinishToStart,
    DependencyType::StartToStart,
    DependencyType::FinishToFinish,
    DependencyType::StartToFinish,
];

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Tasks plus acyclic links: every edge points from a lower index to a
/// higher one.
fn timeline() -> impl Strategy<Value = (Vec<Task>, Vec<Dependency>)> {
    (2usize..8)
        .prop_flat_map(|n| {
            (
                prop::collection::vec((0i64..30, 1i64..6), n),
                prop::collection::vec((0..n, 0..n, 0usize..4, -3i64..4), 0..12),
            )
        })
        .prop_map(|(spans, links)| {
            let tasks: Vec<Task> = spans
                .iter()
                .enumerate()
                .map(|(idx, (offset, len))| {
                    let start = base() + Duration::days(*offset);
                    Task::new(format!("t{idx}"), "", start, start + Duration::days(len - 1))
                })
                .collect();
            let dependencies = links
                .into_iter()
                .filter(|(a, b, _, _)| a != b)
                .enumerate()
                .map(|(idx, (a, b, kind, lag))| {
                    let (from, to) = (a.min(b), a.max(b));
                    Dependency::new(format!("e{idx}"), format!("t{from}"), format!("t{to}"), KINDS[kind])
                        .with_lag(lag)
                })
                .collect();
            (tasks, dependencies)
        })
}

proptest! {
    #[test]
    fn aligned_timeline_satisfies_every_link((tasks, deps) in timeline()) {
        let set = TaskSet::new(tasks).unwrap();
        let result = run_automatic_scheduling(&set, &deps);
        prop_assert!(!result.has_cycle);

        let aligned = apply_changes(&set, result.batch.redo());
        for dep in &deps {
            let pred = aligned.get(&dep.from).unwrap();
            let succ = aligned.get(&dep.to).unwrap();
            prop_assert!(succ.start >= compute_constraint(pred, succ, dep).unwrap());
        }
    }

    #[test]
    fn alignment_is_idempotent((tasks, deps) in timeline()) {
        let set = TaskSet::new(tasks).unwrap();
        let first = run_automatic_scheduling(&set, &deps);
        let aligned = apply_changes(&set, first.batch.redo());
        let second = run_automatic_scheduling(&aligned, &deps);
        prop_assert!(second.is_noop());
    }

    #[test]
    fn moved_tasks_keep_duration_and_land_on_working_days((tasks, deps) in timeline()) {
        let set = TaskSet::new(tasks).unwrap();
        let result = run_automatic_scheduling(&set, &deps);
        for (before, after) in result.batch.pairs() {
            prop_assert!(!is_weekend(after.start));
            prop_assert!(after.start > before.start);
            prop_assert_eq!(after.end - after.start, before.end - before.start);
        }
    }

    #[test]
    fn undo_restores_and_redo_reapplies((tasks, deps) in timeline()) {
        let original = TaskSet::new(tasks.clone()).unwrap();
        let mut schedule = Schedule::new(TimelineSnapshot::new(tasks, deps)).unwrap();

        if let AlignOutcome::Applied(_) = schedule.align().unwrap() {
            let aligned = schedule.tasks().clone();
            schedule.undo().unwrap();
            prop_assert_eq!(schedule.tasks(), &original);
            schedule.redo().unwrap();
            prop_assert_eq!(schedule.tasks(), &aligned);
        } else {
            prop_assert_eq!(schedule.tasks(), &original);
        }
    }
}
