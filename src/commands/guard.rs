//! Implementation of the `tasklock guard` commands.

use crate::cli::{GuardAction, GuardClearArgs, GuardCommand};
use crate::context::require_store;
use crate::error::{LeaseError, Result};
use crate::events::{Event, EventAction};
use crate::store::{TaskStore, clear_guard, list_guards};
use crate::task::validate_task_id;
use serde_json::json;

/// Dispatch guard subcommands.
pub fn dispatch_guard(guard_cmd: GuardCommand) -> Result<()> {
    match guard_cmd.action {
        GuardAction::List => cmd_guard_list(),
        GuardAction::Clear(args) => cmd_guard_clear(args),
    }
}

fn cmd_guard_list() -> Result<()> {
    let store = TaskStore::open(require_store()?)?;
    let stale_minutes = store.config().guard_stale_minutes;

    let guards = list_guards(store.context(), stale_minutes)?;

    if guards.is_empty() {
        println!("No update guards held.");
        return Ok(());
    }

    println!("Update guards ({}):", guards.len());
    println!();

    for guard in &guards {
        println!("  {}:", guard.task_id);
        println!("    Owner:      {}", guard.metadata.owner);
        if let Some(pid) = guard.metadata.pid {
            println!("    PID:        {}", pid);
        }
        println!(
            "    Created:    {}",
            guard.metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("    Age:        {}", guard.metadata.age_string());
        println!("    Action:     {}", guard.metadata.action);
        if guard.is_stale {
            println!("    Status:     STALE (exceeds {} min threshold)", stale_minutes);
        }
        println!("    Path:       {}", guard.path.display());
        println!();
    }

    let stale_count = guards.iter().filter(|g| g.is_stale).count();
    if stale_count > 0 {
        println!(
            "Note: {} guard(s) are stale. Use `tasklock guard clear <ID> --force` to clear.",
            stale_count
        );
    }

    Ok(())
}

fn cmd_guard_clear(args: GuardClearArgs) -> Result<()> {
    if !args.force {
        return Err(LeaseError::UserError(format!(
            "refusing to clear guard without --force flag.\n\n\
             Clearing a guard while its holder is still running lets two updates \
             of the same task interleave.\n\
             Only clear guards whose holder has crashed.\n\n\
             To clear the guard, run:\n  tasklock guard clear {} --force",
            args.task_id
        )));
    }

    let task_id = validate_task_id(&args.task_id)?;
    let store = TaskStore::open(require_store()?)?;
    let cleared = clear_guard(
        store.context(),
        task_id,
        store.config().guard_stale_minutes,
    )?;

    store.record(
        Event::new(EventAction::GuardClear)
            .with_task(cleared.task_id.as_str())
            .with_details(json!({
                "age_minutes": cleared.metadata.age().num_minutes(),
                "was_stale": cleared.is_stale,
                "owner": cleared.metadata.owner,
                "original_action": cleared.metadata.action,
            })),
    );

    println!("Cleared guard: {}", cleared.task_id);
    println!("  Owner:  {}", cleared.metadata.owner);
    println!("  Age:    {}", cleared.metadata.age_string());
    println!("  Action: {}", cleared.metadata.action);

    Ok(())
}
