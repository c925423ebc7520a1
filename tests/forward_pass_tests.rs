use chrono::NaiveDate;
use timeline_scheduler::calendar::is_weekend;
use timeline_scheduler::{
    Dependency, DependencyMode, DependencyType, Task, TaskId, TaskSet, apply_changes,
    run_automatic_scheduling,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn set(tasks: Vec<Task>) -> TaskSet {
    TaskSet::new(tasks).unwrap()
}

fn dates(tasks: &TaskSet, id: &str) -> (NaiveDate, NaiveDate) {
    let task = tasks.get(&TaskId::from(id)).unwrap();
    (task.start, task.end)
}

#[test]
fn finish_to_start_moves_successor_after_predecessor() {
    // A on Mon 2025-01-06, B sitting before it on 2025-01-01
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 6)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![Dependency::finish_to_start("ab", "A", "B")];

    let result = run_automatic_scheduling(&tasks, &deps);
    assert!(!result.has_cycle);
    assert_eq!(result.batch.len(), 1);

    let after = apply_changes(&tasks, result.batch.redo());
    assert_eq!(dates(&after, "B"), (d(2025, 1, 7), d(2025, 1, 7)));
    assert_eq!(after.get(&TaskId::from("B")).unwrap().duration(), 1);

    let undo = &result.batch.undo()[0];
    assert_eq!((undo.start, undo.end), (d(2025, 1, 1), d(2025, 1, 1)));
}

#[test]
fn tightest_constraint_wins() {
    // Predecessors end on day 10 and day 15
    let tasks = set(vec![
        Task::new("P1", "P1", d(2025, 1, 6), d(2025, 1, 10)),
        Task::new("P2", "P2", d(2025, 1, 13), d(2025, 1, 15)),
        Task::new("S", "S", d(2025, 1, 1), d(2025, 1, 2)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("e1", "P1", "S"),
        Dependency::finish_to_start("e2", "P2", "S"),
    ];

    let result = run_automatic_scheduling(&tasks, &deps);
    let after = apply_changes(&tasks, result.batch.redo());
    assert_eq!(dates(&after, "S"), (d(2025, 1, 16), d(2025, 1, 17)));
}

#[test]
fn chain_propagates_through_every_task() {
    let tasks = set(vec![
        Task::new("C", "C", d(2025, 1, 1), d(2025, 1, 1)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 2)),
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 8)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("bc", "B", "C"),
        Dependency::finish_to_start("ab", "A", "B"),
    ];

    let result = run_automatic_scheduling(&tasks, &deps);
    let after = apply_changes(&tasks, result.batch.redo());
    assert_eq!(dates(&after, "A"), (d(2025, 1, 6), d(2025, 1, 8)));
    assert_eq!(dates(&after, "B"), (d(2025, 1, 9), d(2025, 1, 10)));
    // Friday end, next working day is Monday
    assert_eq!(dates(&after, "C"), (d(2025, 1, 13), d(2025, 1, 13)));
    let moved: Vec<&TaskId> = result.batch.task_ids().collect();
    assert_eq!(moved, vec![&TaskId::from("B"), &TaskId::from("C")]);
}

#[test]
fn tasks_already_late_enough_do_not_move() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 6)),
        Task::new("B", "B", d(2025, 1, 20), d(2025, 1, 21)),
    ]);
    let deps = vec![Dependency::finish_to_start("ab", "A", "B")];

    let result = run_automatic_scheduling(&tasks, &deps);
    assert!(result.is_noop());
}

#[test]
fn cycle_reports_members_and_changes_nothing() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 6)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 1)),
        Task::new("C", "C", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("ab", "A", "B"),
        Dependency::finish_to_start("bc", "B", "C"),
        Dependency::finish_to_start("ca", "C", "A"),
    ];

    let before = tasks.clone();
    let result = run_automatic_scheduling(&tasks, &deps);
    assert!(result.has_cycle);
    assert!(result.batch.is_empty());
    assert_eq!(result.cycle.len(), 3);
    assert_eq!(tasks, before);
}

#[test]
fn free_and_hard_edges_never_move_tasks() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 10)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 1)),
        Task::new("C", "C", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("ab", "A", "B").with_mode(DependencyMode::Free),
        Dependency::finish_to_start("ac", "A", "C").hard(),
    ];

    assert!(run_automatic_scheduling(&tasks, &deps).is_noop());
}

#[test]
fn cycle_through_free_edge_is_not_a_cycle() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 6)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("ab", "A", "B"),
        Dependency::finish_to_start("ba", "B", "A").with_mode(DependencyMode::Free),
    ];

    let result = run_automatic_scheduling(&tasks, &deps);
    assert!(!result.has_cycle);
    assert_eq!(result.batch.len(), 1);
}

#[test]
fn dangling_dependencies_are_ignored() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 6)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("gone", "missing", "B"),
        Dependency::finish_to_start("ab", "A", "B"),
    ];

    let result = run_automatic_scheduling(&tasks, &deps);
    assert_eq!(result.batch.len(), 1);
}

#[test]
fn no_dependencies_means_no_changes() {
    let tasks = set(vec![Task::new("A", "A", d(2025, 1, 4), d(2025, 1, 4))]);
    let result = run_automatic_scheduling(&tasks, &[]);
    assert!(result.is_noop());
}

#[test]
fn second_pass_is_a_no_op() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 9)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 3)),
        Task::new("C", "C", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("ab", "A", "B").with_lag(1),
        Dependency::new("bc", "B", "C", DependencyType::FinishToFinish),
        Dependency::new("ac", "A", "C", DependencyType::StartToStart).with_lag(2),
    ];

    let first = run_automatic_scheduling(&tasks, &deps);
    assert!(!first.batch.is_empty());
    let aligned = apply_changes(&tasks, first.batch.redo());

    let second = run_automatic_scheduling(&aligned, &deps);
    assert!(second.is_noop());
}

#[test]
fn moved_tasks_start_on_working_days() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 8)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 2)),
    ]);
    // 2025-01-08 + 1 + 3 = Sunday 2025-01-12
    let deps = vec![Dependency::finish_to_start("ab", "A", "B").with_lag(3)];

    let result = run_automatic_scheduling(&tasks, &deps);
    for entry in result.batch.redo() {
        assert!(!is_weekend(entry.start));
    }
    let after = apply_changes(&tasks, result.batch.redo());
    assert_eq!(dates(&after, "B"), (d(2025, 1, 13), d(2025, 1, 14)));
}

#[test]
fn scheduling_preserves_durations() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 17)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 7)),
    ]);
    let deps = vec![Dependency::new("ab", "A", "B", DependencyType::StartToStart).with_lag(4)];

    let result = run_automatic_scheduling(&tasks, &deps);
    let after = apply_changes(&tasks, result.batch.redo());
    let b = after.get(&TaskId::from("B")).unwrap();
    assert_eq!(b.start, d(2025, 1, 10));
    assert_eq!(b.duration(), 7);
}

#[test]
fn link_with_lag_beyond_the_calendar_is_skipped() {
    let tasks = set(vec![
        Task::new("A", "A", d(2025, 1, 6), d(2025, 1, 6)),
        Task::new("B", "B", d(2025, 1, 1), d(2025, 1, 1)),
        Task::new("C", "C", d(2025, 1, 1), d(2025, 1, 1)),
    ]);
    let deps = vec![
        Dependency::finish_to_start("ab", "A", "B").with_lag(100_000_000),
        Dependency::finish_to_start("ac", "A", "C"),
    ];

    let result = run_automatic_scheduling(&tasks, &deps);
    assert!(!result.has_cycle);
    let after = apply_changes(&tasks, result.batch.redo());
    assert_eq!(dates(&after, "B"), (d(2025, 1, 1), d(2025, 1, 1)));
    assert_eq!(dates(&after, "C"), (d(2025, 1, 7), d(2025, 1, 7)));
}
