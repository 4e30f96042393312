//! # taskman
//!
//! A keyboard-driven task tracker for individuals and small teams, with
//! hierarchical work items (Epics → Stories/Tasks/Bugs) persisted to a local
//! JSON file.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive UI (default command)
//! tm
//!
//! # Add a task via CLI
//! tm add "Implement user authentication" --type story --priority high
//!
//! # List tasks as an indented hierarchy
//! tm list
//!
//! # Cycle a task's status
//! tm status 3
//! ```
//!
//! Data is stored in `./tasks.json` by default; pass `--db <path>` to use
//! another file. Set `RUST_LOG` to control log output on stderr.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod db;
pub mod fields;
pub mod store;
pub mod task;
pub mod transition;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod form;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use db::Database;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(|| PathBuf::from("tasks.json"));
    let command = cli.command.unwrap_or(Commands::Ui);

    // Completions and the UI manage their own database lifetime.
    match &command {
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        Commands::Ui => {
            cmd_ui(&db_path);
            return;
        }
        _ => {}
    }

    let mut db = Database::open(&db_path);

    match command {
        Commands::Ui | Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Add {
            title,
            desc,
            status,
            priority,
            task_type,
            parent,
        } => cmd_add(&mut db, title, desc, status, priority, task_type, parent),

        Commands::List { task_type, flat } => cmd_list(&db, task_type, flat),

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update {
            id,
            title,
            desc,
            status,
            priority,
            task_type,
            parent,
            clear_parent,
        } => cmd_update(
            &mut db,
            id,
            title,
            desc,
            status,
            priority,
            task_type,
            parent,
            clear_parent,
        ),

        Commands::Delete { id, yes } => cmd_delete(&mut db, id, yes),

        Commands::Status { id, reverse } => cmd_status(&mut db, id, reverse),

        Commands::Priority { id } => cmd_priority(&mut db, id),

        Commands::Repair => cmd_repair(&mut db),
    }
}
