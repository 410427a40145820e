//! Implementation of the `tasklock init` command.
//!
//! # What `tasklock init` does
//!
//! 1. Creates `.tasklock/` in the current directory
//! 2. Creates `tasks/`, `locks/` and `events/` under it
//! 3. Writes a default `config.yaml` (if missing)
//! 4. Writes a `.gitignore` excluding `locks/` (if missing)
//!
//! Running it again on an existing store only fills in what is missing.

use crate::config::Config;
use crate::context::StoreContext;
use crate::error::{LeaseError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use serde_json::json;
use std::env;
use std::fs;
use std::path::Path;

/// Execute the `tasklock init` command.
pub fn cmd_init() -> Result<()> {
    let cwd = env::current_dir().map_err(|e| {
        LeaseError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    let ctx = StoreContext::at(&cwd);

    let created = init_store(&ctx)?;

    if created {
        let config = Config::load_or_default(ctx.config_path())?;
        if config.record_events {
            let event = Event::new(EventAction::Init).with_details(json!({
                "root": ctx.root.display().to_string(),
            }));
            append_event(&ctx, &event)?;
        }

        println!("Initialized tasklock store.");
        println!();
        println!("Store:   {}", ctx.state_dir.display());
        println!("Config:  {}", ctx.config_path().display());
        println!();
        println!("Add a task with `tasklock add <ID>`.");
    } else {
        println!(
            "tasklock store already initialized at {}",
            ctx.state_dir.display()
        );
    }

    Ok(())
}

/// Create the store layout under `ctx`, returning whether the store was new.
pub(crate) fn init_store(ctx: &StoreContext) -> Result<bool> {
    let created = !ctx.state_dir.exists();

    for dir in [&ctx.tasks_dir, &ctx.locks_dir, &ctx.events_dir()] {
        create_dir(dir)?;
    }

    let config_path = ctx.config_path();
    if !config_path.exists() {
        atomic_write_file(&config_path, &Config::default().to_yaml()?)?;
    }

    let gitignore_path = ctx.state_dir.join(".gitignore");
    if !gitignore_path.exists() {
        atomic_write_file(
            &gitignore_path,
            "# Update guards are per-machine and short-lived\nlocks/\n",
        )?;
    }

    Ok(created)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to create directory '{}': {}",
            path.display(),
            e
        ))
    })
}
