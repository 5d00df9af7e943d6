use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dk", about = concat!("[·] deck v", env!("CARGO_PKG_VERSION"), " - your to-dos in one file"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this slot file instead of discovering deck.json
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task to the end of the list
    Add(AddArgs),
    /// List tasks
    List(ListArgs),
    /// Toggle a task between active and completed
    Toggle(ToggleArgs),
    /// Replace a task's title and description
    Edit(EditArgs),
    /// Delete a task
    Rm(RmArgs),
    /// Move a task to a new position
    Mv(MvArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title (must be non-empty after trimming)
    pub title: String,
    /// Task description (may be empty)
    #[arg(default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// View to show (all, active, completed)
    #[arg(long, default_value = "all")]
    pub filter: String,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New title (must be non-empty after trimming)
    pub title: String,
    /// New description (must be non-empty after trimming)
    pub description: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Current position, 1-based within the selected view
    pub from: usize,
    /// Target position, 1-based within the selected view
    pub to: usize,
    /// View the positions refer to (all, active, completed)
    #[arg(long, default_value = "all")]
    pub filter: String,
}
