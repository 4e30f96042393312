use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed task tracker.
/// Storage defaults to ./tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tm", version, about = "Keyboard-driven hierarchical task tracker")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Launches the interactive UI when no subcommand is given.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
