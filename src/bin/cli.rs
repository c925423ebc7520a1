use std::io::{self, Write};

use timeline_scheduler::{
    AlignOutcome, CommitOutcome, Dependency, DependencyId, DependencyMode, DependencyType,
    EditKind, EngineConfig, JsonlChangeLog, Schedule, Task, TaskId, TimelineSnapshot,
    calendar::parse_date, load_snapshot_from_json, logging, save_snapshot_to_json,
};

fn render_tasks_as_text_table(schedule: &Schedule) -> String {
    let unsynced: Vec<&TaskId> = schedule.unsynced_tasks().collect();
    let headers = ["id", "title", "start", "end", "days", "lane", "synced"];
    let rows: Vec<[String; 7]> = schedule
        .tasks()
        .iter()
        .map(|task| {
            [
                task.id.to_string(),
                task.title.clone(),
                task.start.to_string(),
                task.end.to_string(),
                task.duration().to_string(),
                task.lane.clone().unwrap_or_default(),
                if unsynced.contains(&&task.id) { "no" } else { "yes" }.to_string(),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

fn render_dependencies_as_text_table(schedule: &Schedule) -> String {
    let headers = ["id", "from", "to", "type", "lag", "mode", "hard"];
    let rows: Vec<[String; 7]> = schedule
        .dependencies()
        .iter()
        .map(|dep| {
            [
                dep.id.to_string(),
                dep.from.to_string(),
                dep.to.to_string(),
                dep.kind.to_string(),
                dep.lag.to_string(),
                match dep.mode {
                    DependencyMode::Asap => "ASAP".to_string(),
                    DependencyMode::Free => "FREE".to_string(),
                },
                dep.hard_constraint.to_string(),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

fn render_table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: Vec<&str>| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers.to_vec()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show tasks\n  deps                               Show dependencies\n  add <id> <start> <end> [title...]  Add a task (dates YYYY-MM-DD)\n  remove <id>                        Remove a task and its dependencies\n  link <dep_id> <from> <to> [FS|SS|FF|SF] [lag] [asap|free] [hard]\n                                     Create a dependency\n  unlink <dep_id>                    Delete a dependency\n  preview                            Show what align would change\n  align                              Apply automatic scheduling\n  move <id> <days>                   Move a task by a day delta\n  resize-start <id> <days>           Drag a task's start edge\n  resize-end <id> <days>             Drag a task's end edge\n  undo                               Undo the last change\n  redo                               Redo the last undone change\n  history                            Show undo/redo depth\n  violations                         List unsatisfied hard constraints\n  save <path>                        Save tasks and dependencies to JSON\n  load <path>                        Load tasks and dependencies from JSON\n  quit|exit                          Exit"
    );
}

fn describe_commit(verb: &str, outcome: &CommitOutcome) -> String {
    let mut message = format!("{verb} {} task(s).", outcome.changed);
    if !outcome.synced {
        message.push_str(" Warning: changes were not persisted.");
    }
    message
}

fn parse_link(args: &[&str]) -> Result<Dependency, String> {
    let (id, from, to) = match args {
        [id, from, to, ..] => (*id, *from, *to),
        _ => {
            return Err(
                "Usage: link <dep_id> <from> <to> [FS|SS|FF|SF] [lag] [asap|free] [hard]".into(),
            );
        }
    };
    let mut dependency = Dependency::finish_to_start(id, from, to);
    for arg in &args[3..] {
        if let Ok(kind) = arg.parse::<DependencyType>() {
            dependency.kind = kind;
        } else if let Ok(lag) = arg.parse::<i64>() {
            dependency.lag = lag;
        } else if let Ok(mode) = arg.parse::<DependencyMode>() {
            dependency.mode = mode;
        } else if arg.eq_ignore_ascii_case("hard") {
            dependency.hard_constraint = true;
        } else {
            return Err(format!("Unrecognized link option '{arg}'"));
        }
    }
    Ok(dependency)
}

fn run_edit(schedule: &mut Schedule, kind: EditKind, args: &[&str]) {
    let (id, days) = match args {
        [id, days] => (*id, *days),
        _ => {
            println!("Usage: {} <id> <days>", kind.as_str().replace('_', "-"));
            return;
        }
    };
    let delta: i64 = match days.parse() {
        Ok(v) => v,
        Err(_) => {
            println!("Invalid day delta");
            return;
        }
    };
    let task_id = TaskId::from(id);
    match schedule.apply_manual_edit(&task_id, kind, delta) {
        Ok(Some(outcome)) => {
            println!("{}", describe_commit("Edited", &outcome));
            println!("{}", render_tasks_as_text_table(schedule));
        }
        Ok(None) => println!("No change."),
        Err(e) => println!("Error: {e}"),
    }
}

fn load_schedule(path: &str, config: &EngineConfig) -> Result<Schedule, Box<dyn std::error::Error>> {
    let snapshot = load_snapshot_from_json(path)?;
    let mut schedule = Schedule::with_config(snapshot, config)?;
    if let Ok(log_path) = std::env::var("TIMELINE_SCHEDULER_CHANGE_LOG") {
        schedule.set_sink(Box::new(JsonlChangeLog::new(log_path)));
    }
    Ok(schedule)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    logging::init(verbose);

    let config = EngineConfig::from_env()?;
    let mut schedule = match args.iter().find(|a| !a.starts_with('-')) {
        Some(path) => load_schedule(path, &config)?,
        None => Schedule::with_config(TimelineSnapshot::default(), &config)?,
    };

    println!("Timeline Scheduler (CLI) - type 'help' for commands\n");
    println!("{}", render_tasks_as_text_table(&schedule));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let (cmd, rest) = (parts[0], &parts[1..]);

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_tasks_as_text_table(&schedule)),
            "deps" => println!("{}", render_dependencies_as_text_table(&schedule)),
            "add" => match rest {
                [id, start, end, title @ ..] => {
                    let dates = parse_date(start).and_then(|s| parse_date(end).map(|e| (s, e)));
                    match dates {
                        Ok((start, end)) => {
                            let task = Task::new(*id, title.join(" "), start, end);
                            match schedule.add_task(task) {
                                Ok(()) => {
                                    println!("Added task {id}.");
                                    println!("{}", render_tasks_as_text_table(&schedule));
                                }
                                Err(e) => println!("Error: {e}"),
                            }
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: add <id> <start> <end> [title...]"),
            },
            "remove" => match rest {
                [id] => match schedule.remove_task(&TaskId::from(*id)) {
                    Ok(_) => println!("Removed task {id}."),
                    Err(e) => println!("Error: {e}"),
                },
                _ => println!("Usage: remove <id>"),
            },
            "link" => match parse_link(rest) {
                Ok(dependency) => {
                    let summary = format!(
                        "Linked {}: {} -> {} ({}, lag {}).",
                        dependency.id, dependency.from, dependency.to, dependency.kind, dependency.lag
                    );
                    match schedule.create_dependency(dependency) {
                        Ok(()) => println!("{summary}"),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                Err(message) => println!("{message}"),
            },
            "unlink" => match rest {
                [id] => match schedule.delete_dependency(&DependencyId::from(*id)) {
                    Ok(_) => println!("Unlinked {id}."),
                    Err(e) => println!("Error: {e}"),
                },
                _ => println!("Usage: unlink <dep_id>"),
            },
            "preview" => {
                let result = schedule.propose_alignment();
                if result.has_cycle {
                    println!("Cycle detected among: {}", join_ids(&result.cycle));
                } else if result.batch.is_empty() {
                    println!("Nothing to align.");
                } else {
                    for (before, after) in result.batch.pairs() {
                        println!(
                            "  {}: {}..{} -> {}..{}",
                            after.task_id, before.start, before.end, after.start, after.end
                        );
                    }
                }
            }
            "align" => match schedule.align() {
                Ok(AlignOutcome::Applied(outcome)) => {
                    println!("{}", describe_commit("Aligned", &outcome));
                    println!("{}", render_tasks_as_text_table(&schedule));
                }
                Ok(AlignOutcome::NoChanges) => println!("Nothing to align."),
                Ok(AlignOutcome::Cycle { tasks }) => {
                    println!("Cycle detected among: {}", join_ids(&tasks))
                }
                Err(e) => println!("Align error: {e}"),
            },
            "move" => run_edit(&mut schedule, EditKind::Move, rest),
            "resize-start" => run_edit(&mut schedule, EditKind::ResizeStart, rest),
            "resize-end" => run_edit(&mut schedule, EditKind::ResizeEnd, rest),
            "undo" => match schedule.undo() {
                Ok(Some(outcome)) => {
                    println!("{}", describe_commit("Undid changes to", &outcome));
                    println!("{}", render_tasks_as_text_table(&schedule));
                }
                Ok(None) => println!("Nothing to undo."),
                Err(e) => println!("Undo error: {e}"),
            },
            "redo" => match schedule.redo() {
                Ok(Some(outcome)) => {
                    println!("{}", describe_commit("Redid changes to", &outcome));
                    println!("{}", render_tasks_as_text_table(&schedule));
                }
                Ok(None) => println!("Nothing to redo."),
                Err(e) => println!("Redo error: {e}"),
            },
            "history" => {
                let history = schedule.history();
                println!("Undo depth : {}", history.undo_depth());
                println!("Redo depth : {}", history.redo_depth());
            }
            "violations" => {
                let violations = schedule.hard_constraint_violations();
                if violations.is_empty() {
                    println!("All hard constraints hold.");
                }
                for dep in violations {
                    println!("  {}: {} -> {} ({})", dep.id, dep.from, dep.to, dep.kind);
                }
            }
            "save" => match rest {
                [path] => match save_snapshot_to_json(&schedule.snapshot(), path) {
                    Ok(()) => println!("Timeline saved to {path}"),
                    Err(e) => println!("Save error: {e}"),
                },
                _ => println!("Usage: save <path>"),
            },
            "load" => match rest {
                [path] => match load_schedule(path, &config) {
                    Ok(loaded) => {
                        schedule = loaded;
                        println!("Timeline loaded from {path}");
                        println!("{}", render_tasks_as_text_table(&schedule));
                    }
                    Err(e) => println!("Load error: {e}"),
                },
                _ => println!("Usage: load <path>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
    Ok(())
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
