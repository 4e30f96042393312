//! Command implementations for the CLI interface.
//!
//! This module contains the subcommand definitions and their handlers, from
//! basic CRUD operations through cycle stepping to the TUI entry point.

use std::io::{self, Write};
use std::path::Path;

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use uuid::Uuid;

use crate::cli::Cli;
use crate::db::Database;
use crate::fields::{Priority, Status, TaskType};
use crate::task::{NewTask, TaskPatch};
use crate::transition::{advance_priority, advance_status};
use crate::tui::run::run_tui;
use crate::view::{project, DisplayRow};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Status: todo | in-progress | done | blocked.
        #[arg(long, value_enum, default_value_t = Status::ToDo)]
        status: Status,
        /// Priority: low | medium | high | critical.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Task type: epic | story | task | bug.
        #[arg(long = "type", value_enum, default_value_t = TaskType::Task)]
        task_type: TaskType,
        /// Parent task (display id or full id).
        #[arg(long)]
        parent: Option<String>,
    },

    /// List tasks as an indented hierarchy.
    List {
        /// Filter by task type.
        #[arg(long = "type", value_enum)]
        task_type: Option<TaskType>,
        /// Print in creation order without hierarchy.
        #[arg(long)]
        flat: bool,
    },

    /// View a single task.
    View {
        /// Task to view (display id or full id).
        id: String,
    },

    /// Update fields on a task.
    Update {
        /// Task to update (display id or full id).
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long = "type", value_enum)]
        task_type: Option<TaskType>,
        /// New parent task (display id or full id).
        #[arg(long)]
        parent: Option<String>,
        /// Clear the parent reference.
        #[arg(long)]
        clear_parent: bool,
    },

    /// Delete a task. Its children are kept and become roots.
    Delete {
        /// Task to delete (display id or full id).
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Cycle a task's status one step.
    Status {
        /// Task to cycle (display id or full id).
        id: String,
        /// Step backward through the cycle.
        #[arg(long)]
        reverse: bool,
    },

    /// Cycle a task's priority one step.
    Priority {
        /// Task to cycle (display id or full id).
        id: String,
    },

    /// Clear parent references that point at missing tasks.
    Repair,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolve a command-line task reference (display id or full id) to a task id.
pub fn resolve_task(db: &Database, identifier: &str) -> Result<Uuid, String> {
    if let Ok(display_id) = identifier.parse::<u64>() {
        return match db.get_by_display_id(display_id) {
            Some(task) => Ok(task.id),
            None => Err(format!("no task with display id {display_id}")),
        };
    }
    if let Ok(id) = Uuid::parse_str(identifier) {
        return match db.get(&id) {
            Some(task) => Ok(task.id),
            None => Err(format!("no task with id {id}")),
        };
    }
    Err(format!(
        "'{identifier}' is neither a display id nor a task id"
    ))
}

fn resolve_or_exit(db: &Database, identifier: &str) -> Uuid {
    match resolve_task(db, identifier) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(db_path: &Path) {
    if let Err(e) = run_tui(db_path) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task.
pub fn cmd_add(
    db: &mut Database,
    title: String,
    desc: Option<String>,
    status: Status,
    priority: Priority,
    task_type: TaskType,
    parent: Option<String>,
) {
    if title.trim().is_empty() {
        eprintln!("Title must not be empty.");
        std::process::exit(1);
    }
    let parent_id = parent.map(|p| resolve_or_exit(db, &p));
    let id = db.create(NewTask {
        title,
        description: desc.unwrap_or_default(),
        status,
        priority,
        task_type,
        parent_id,
    });
    let display_id = db.get(&id).map(|t| t.display_id).unwrap_or_default();
    println!("Added task {display_id}");
}

/// Print tasks in a formatted table, hierarchical by default.
pub fn cmd_list(db: &Database, task_type: Option<TaskType>, flat: bool) {
    let rows: Vec<DisplayRow> = if flat {
        db.list()
            .iter()
            .filter(|t| task_type.map_or(true, |ty| t.task_type == ty))
            .map(|t| DisplayRow {
                key: t.id,
                display_id: t.display_id,
                depth: 0,
                title: t.title.clone(),
                status: t.status,
                priority: t.priority,
                task_type: t.task_type,
                parent_id: t.parent_id,
            })
            .collect()
    } else {
        project(db.list(), task_type)
    };
    print_rows(&rows);
}

fn print_rows(rows: &[DisplayRow]) {
    println!(
        "{:<5} {:<7} {:<12} {:<9} {}",
        "ID", "Type", "Status", "Priority", "Title"
    );
    for row in rows {
        println!(
            "{:<5} {:<7} {:<12} {:<9} {}",
            row.display_id,
            row.task_type.label(),
            row.status.label(),
            row.priority.label(),
            row.indented_title()
        );
    }
}

/// View a single task's full details.
pub fn cmd_view(db: &Database, id: String) {
    let id = resolve_or_exit(db, &id);
    let Some(task) = db.get(&id) else {
        unreachable!("resolved id is present");
    };
    let parent = task
        .parent_id
        .and_then(|p| db.get(&p))
        .map(|p| format!("[{}] {}", p.display_id, p.title));
    println!("ID:          {} ({})", task.display_id, task.id);
    println!("Title:       {}", task.title);
    println!("Status:      {}", task.status.label());
    println!("Priority:    {}", task.priority.label());
    println!("Type:        {}", task.task_type.label());
    println!("Parent:      {}", parent.as_deref().unwrap_or("-"));
    println!("Created:     {}", task.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated:     {}", task.updated_at.format("%Y-%m-%d %H:%M"));
    if !task.description.is_empty() {
        println!("\n{}", task.description);
    }
}

/// Update fields on a task.
pub fn cmd_update(
    db: &mut Database,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    task_type: Option<TaskType>,
    parent: Option<String>,
    clear_parent: bool,
) {
    let id = resolve_or_exit(db, &id);
    if let Some(t) = &title {
        if t.trim().is_empty() {
            eprintln!("Title must not be empty.");
            std::process::exit(1);
        }
    }
    let parent_id = if clear_parent {
        Some(None)
    } else {
        parent.map(|p| Some(resolve_or_exit(db, &p)))
    };
    let patch = TaskPatch {
        title,
        description: desc,
        status,
        priority,
        task_type,
        parent_id,
    };
    if db.update(&id, patch) {
        println!("Updated task");
    } else {
        eprintln!("Task not found");
        std::process::exit(1);
    }
}

/// Delete a task after confirmation.
pub fn cmd_delete(db: &mut Database, id: String, yes: bool) {
    let id = resolve_or_exit(db, &id);
    if !yes {
        let Some(task) = db.get(&id) else { return };
        print!("Delete task {} '{}'? [y/N] ", task.display_id, task.title);
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() || !matches!(answer.trim(), "y" | "Y") {
            println!("Cancelled.");
            return;
        }
    }
    if db.delete(&id) {
        println!("Deleted task");
    } else {
        eprintln!("Task not found");
        std::process::exit(1);
    }
}

/// Cycle a task's status.
pub fn cmd_status(db: &mut Database, id: String, reverse: bool) {
    let id = resolve_or_exit(db, &id);
    match advance_status(db, &id, reverse) {
        Some(status) => println!("Status: {}", status.label()),
        None => {
            eprintln!("Task not found");
            std::process::exit(1);
        }
    }
}

/// Cycle a task's priority.
pub fn cmd_priority(db: &mut Database, id: String) {
    let id = resolve_or_exit(db, &id);
    match advance_priority(db, &id) {
        Some(priority) => println!("Priority: {}", priority.label()),
        None => {
            eprintln!("Task not found");
            std::process::exit(1);
        }
    }
}

/// Clear dangling parent references durably.
pub fn cmd_repair(db: &mut Database) {
    let repaired = db.repair_orphans();
    if repaired == 0 {
        println!("No orphaned tasks.");
    } else {
        println!("Repaired {repaired} orphaned task(s).");
    }
}

/// Generate shell completion scripts to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open_with_tasks() -> (tempfile::TempDir, Database, Uuid) {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(&dir.path().join("tasks.json"));
        let id = db.create(NewTask {
            title: "only".to_string(),
            ..NewTask::default()
        });
        (dir, db, id)
    }

    #[test]
    fn resolve_accepts_display_id() {
        let (_dir, db, id) = open_with_tasks();
        assert_eq!(resolve_task(&db, "1"), Ok(id));
    }

    #[test]
    fn resolve_accepts_full_id() {
        let (_dir, db, id) = open_with_tasks();
        assert_eq!(resolve_task(&db, &id.to_string()), Ok(id));
    }

    #[test]
    fn resolve_rejects_unknown_references() {
        let (_dir, db, _id) = open_with_tasks();
        assert!(resolve_task(&db, "99").is_err());
        assert!(resolve_task(&db, &Uuid::new_v4().to_string()).is_err());
        assert!(resolve_task(&db, "not-an-id").is_err());
    }
}
