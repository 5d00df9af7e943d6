use std::error::Error;
use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::{print_task_line, task_to_json};
use crate::io::slot::{FileSlot, SlotError};
use crate::model::task::Filter;
use crate::store::{StoreError, TaskStore};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let json = cli.json;
    let mut store = open_store(cli.file)?;

    match cli.command {
        Commands::Add(args) => cmd_add(&mut store, args),
        Commands::List(args) => cmd_list(&mut store, args, json),
        Commands::Toggle(args) => cmd_toggle(&mut store, args),
        Commands::Edit(args) => cmd_edit(&mut store, args),
        Commands::Rm(args) => cmd_rm(&mut store, args),
        Commands::Mv(args) => cmd_mv(&mut store, args),
    }
}

/// Open the store on the slot named by `--file`, or discover `deck.json`
/// upward from the working directory.
///
/// A corrupt slot is downgraded to a warning and an empty store, so one bad
/// file never locks the user out; read failures still abort the command.
fn open_store(file: Option<PathBuf>) -> Result<TaskStore<FileSlot>, Box<dyn Error>> {
    let slot = match file {
        Some(path) => FileSlot::new(path),
        None => FileSlot::discover(&std::env::current_dir()?),
    };
    match TaskStore::open(slot.clone()) {
        Ok(store) => Ok(store),
        Err(e @ SlotError::Decode { .. }) => {
            eprintln!("warning: {}; starting with an empty task list", e);
            Ok(TaskStore::empty(slot))
        }
        Err(e) => Err(e.into()),
    }
}

/// A failed save is a warning, not a failure: the mutation already landed
/// in memory and the command's visible effect stands.
fn warn_on_save_failure(result: Result<(), StoreError>) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(()) => Ok(()),
        Err(StoreError::Save(e)) => {
            eprintln!("warning: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_filter(s: &str) -> Result<Filter, Box<dyn Error>> {
    Filter::parse(s).ok_or_else(|| format!("unknown filter '{}' (expected all, active, or completed)", s).into())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_add(store: &mut TaskStore<FileSlot>, args: AddArgs) -> Result<(), Box<dyn Error>> {
    // The store takes what it is given; non-empty enforcement lives here
    if args.title.trim().is_empty() {
        return Err("title cannot be empty".into());
    }
    match store.add(args.title, args.description) {
        Ok(id) => {
            println!("{}", id);
            Ok(())
        }
        Err(StoreError::Save(e)) => {
            eprintln!("warning: {}", e);
            // The task was still added in memory; its id is the visible effect
            if let Some(task) = store.tasks().last() {
                println!("{}", task.id);
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_list(store: &mut TaskStore<FileSlot>, args: ListArgs, json: bool) -> Result<(), Box<dyn Error>> {
    store.set_filter(parse_filter(&args.filter)?);
    let view = store.filtered_view();

    if json {
        let tasks: Vec<_> = view.iter().map(|t| task_to_json(t)).collect();
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else {
        for (i, task) in view.iter().enumerate() {
            print_task_line(i + 1, task);
        }
    }
    Ok(())
}

fn cmd_toggle(store: &mut TaskStore<FileSlot>, args: ToggleArgs) -> Result<(), Box<dyn Error>> {
    // Unknown ids are silent no-ops: a stale id is not a user error
    warn_on_save_failure(store.toggle(&args.id))
}

fn cmd_edit(store: &mut TaskStore<FileSlot>, args: EditArgs) -> Result<(), Box<dyn Error>> {
    if args.title.trim().is_empty() {
        return Err("title cannot be empty".into());
    }
    if args.description.trim().is_empty() {
        return Err("description cannot be empty".into());
    }
    warn_on_save_failure(store.edit(&args.id, args.title, args.description))
}

fn cmd_rm(store: &mut TaskStore<FileSlot>, args: RmArgs) -> Result<(), Box<dyn Error>> {
    warn_on_save_failure(store.remove(&args.id))
}

fn cmd_mv(store: &mut TaskStore<FileSlot>, args: MvArgs) -> Result<(), Box<dyn Error>> {
    if args.from == 0 || args.to == 0 {
        return Err("positions are 1-based".into());
    }
    store.set_filter(parse_filter(&args.filter)?);
    warn_on_save_failure(store.move_filtered(args.from - 1, args.to - 1))
}
