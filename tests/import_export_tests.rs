use chrono::NaiveDate;
use std::io::Write;
use timeline_scheduler::{
    ChangeEntry, ChangeSink, Dependency, DependencyMode, DependencyType, EditKind,
    JsonlChangeLog, PersistenceError, Schedule, Task, TimelineSnapshot, load_snapshot_from_json,
    save_snapshot_to_json,
};
use tempfile::{NamedTempFile, tempdir};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_sample_snapshot() -> TimelineSnapshot {
    let mut design = Task::new("design", "Design", d(2025, 1, 6), d(2025, 1, 10));
    design.lane = Some("In progress".into());
    design.progress = Some(0.5);

    let build = Task::new("build", "Build", d(2025, 1, 6), d(2025, 1, 15));

    TimelineSnapshot::new(
        vec![design, build],
        vec![
            Dependency::finish_to_start("d1", "design", "build").with_lag(1),
            Dependency::new("d2", "build", "design", DependencyType::StartToStart)
                .with_mode(DependencyMode::Free),
        ],
    )
}

#[test]
fn json_snapshot_round_trip_preserves_everything() {
    let snapshot = build_sample_snapshot();
    let file = NamedTempFile::new().unwrap();

    save_snapshot_to_json(&snapshot, file.path()).unwrap();
    let loaded = load_snapshot_from_json(file.path()).unwrap();

    assert_eq!(loaded, snapshot);
}

#[test]
fn snapshot_reads_wire_format_with_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "tasks": [
                {{"id": "a", "start": "2025-01-06", "end": "2025-01-07"}},
                {{"id": "b", "title": "Beta", "start": "2025-01-01", "end": "2025-01-01"}}
            ],
            "dependencies": [
                {{"id": "ab", "from": "a", "to": "b", "type": "FS"}}
            ]
        }}"#
    )
    .unwrap();

    let snapshot = load_snapshot_from_json(file.path()).unwrap();
    assert_eq!(snapshot.tasks[0].title, "");
    let dep = &snapshot.dependencies[0];
    assert_eq!(dep.kind, DependencyType::FinishToStart);
    assert_eq!(dep.lag, 0);
    assert_eq!(dep.mode, DependencyMode::Asap);
    assert!(!dep.hard_constraint);
}

#[test]
fn dependencies_are_optional_in_snapshot() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"tasks": [{{"id": "a", "start": "2025-01-06", "end": "2025-01-07"}}]}}"#
    )
    .unwrap();
    let snapshot = load_snapshot_from_json(file.path()).unwrap();
    assert!(snapshot.dependencies.is_empty());
}

#[test]
fn invalid_snapshot_is_rejected_on_load() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"tasks": [{{"id": "a", "start": "2025-01-07", "end": "2025-01-06"}}]}}"#
    )
    .unwrap();
    let err = load_snapshot_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn lag_beyond_the_calendar_is_rejected_on_load() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"tasks": [
            {{"id": "a", "start": "2025-01-06", "end": "2025-01-06"}},
            {{"id": "b", "start": "2025-01-07", "end": "2025-01-07"}}
        ],
        "dependencies": [{{"id": "ab", "from": "a", "to": "b", "type": "FS", "lag": 100000000}}]}}"#
    )
    .unwrap();
    let err = load_snapshot_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn self_loop_is_rejected_on_save() {
    let mut snapshot = build_sample_snapshot();
    snapshot
        .dependencies
        .push(Dependency::finish_to_start("loop", "build", "build"));
    let file = NamedTempFile::new().unwrap();
    let err = save_snapshot_to_json(&snapshot, file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = load_snapshot_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::Serialization(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_snapshot_from_json(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PersistenceError::Io(_)));
}

#[test]
fn change_log_appends_one_record_per_commit() {
    let dir = tempdir().unwrap();
    let mut log = JsonlChangeLog::new(dir.path().join("changes.jsonl"));
    assert!(log.read_records().unwrap().is_empty());

    log.commit_changes(&[ChangeEntry::new("a", d(2025, 1, 6), d(2025, 1, 7))])
        .unwrap();
    log.commit_changes(&[
        ChangeEntry::new("a", d(2025, 1, 8), d(2025, 1, 9)),
        ChangeEntry::new("b", d(2025, 1, 10), d(2025, 1, 10)),
    ])
    .unwrap();

    let records = log.read_records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].changes.len(), 1);
    assert_eq!(records[1].changes[1].task_id.as_str(), "b");
    assert!(records[0].committed_at <= records[1].committed_at);
}

#[test]
fn schedule_writes_every_commit_to_change_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("changes.jsonl");
    let mut schedule = Schedule::new(build_sample_snapshot())
        .unwrap()
        .with_sink(JsonlChangeLog::new(&path));

    schedule.align().unwrap();
    schedule
        .apply_manual_edit(&"design".into(), EditKind::ResizeEnd, -2)
        .unwrap();
    schedule.undo().unwrap();

    let records = JsonlChangeLog::new(&path).read_records().unwrap();
    assert_eq!(records.len(), 3);
    // design ends Friday 01-10; lag 1 lands on Sunday, so build starts Monday
    assert_eq!(records[0].changes[0].start, d(2025, 1, 13));
    assert_eq!(records[1].changes[0].end, d(2025, 1, 8));
    assert_eq!(records[2].changes[0].end, d(2025, 1, 10));

    let saved = dir.path().join("timeline.json");
    save_snapshot_to_json(&schedule.snapshot(), &saved).unwrap();
    let reloaded = load_snapshot_from_json(&saved).unwrap();
    assert_eq!(reloaded.tasks[1].start, d(2025, 1, 13));
}
