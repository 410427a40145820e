//! Implementation of the `tasklock status` command.
//!
//! Without a task id, prints one line per task. With one, prints the task's
//! lease in detail followed by its most recent audit events.

use crate::cli::StatusArgs;
use crate::context::require_store;
use crate::error::Result;
use crate::events::{Event, read_recent_events};
use crate::lease::{Leasable, LeaseStatus};
use crate::store::TaskStore;
use chrono::DateTime;

const RECENT_EVENT_LIMIT: usize = 5;

/// Execute the `tasklock status` command.
pub fn cmd_status(args: StatusArgs) -> Result<()> {
    let store = TaskStore::open(require_store()?)?;

    match args.task_id {
        Some(task_id) => show_task(&store, &task_id),
        None => show_summary(&store),
    }
}

fn show_summary(store: &TaskStore) -> Result<()> {
    let tasks = store.list()?;
    if tasks.is_empty() {
        println!("No tasks. Add one with `tasklock add <ID>`.");
        return Ok(());
    }

    let width = tasks.iter().map(|t| t.id().len()).max().unwrap_or(0).max(2);
    let mut locked = 0;
    for task in &tasks {
        let status = store.leases().status(task);
        if matches!(status, LeaseStatus::Locked { .. }) {
            locked += 1;
        }
        println!(
            "{:<width$}  {:<24}  {}",
            task.id(),
            describe_status(&status),
            task.frontmatter.title,
            width = width
        );
    }

    println!();
    println!("{} task(s), {} locked", tasks.len(), locked);
    Ok(())
}

fn show_task(store: &TaskStore, task_id: &str) -> Result<()> {
    let task = store.get(task_id)?;
    let status = store.leases().status(&task);

    println!("Task:    {}", task.id());
    if !task.frontmatter.title.is_empty() {
        println!("Title:   {}", task.frontmatter.title);
    }
    if let Some(created) = task.frontmatter.created {
        println!("Created: {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Lease:   {}", describe_status(&status));

    if let Some(semaphore) = task.semaphore() {
        match semaphore.key_str() {
            Ok(key) => println!("  Key:      {}", key),
            Err(_) => println!("  Key:      (missing)"),
        }
        match semaphore.time {
            Some(ms) => match DateTime::from_timestamp_millis(ms) {
                Some(time) => {
                    println!("  Since:    {}", time.format("%Y-%m-%d %H:%M:%S%.3f UTC"))
                }
                None => println!("  Since:    {} ms", ms),
            },
            None => println!("  Since:    (missing)"),
        }
        match semaphore.ttl {
            Some(ttl) => println!("  TTL:      {} ms", ttl),
            None => println!("  TTL:      (missing)"),
        }
    }

    let events = read_recent_events(store.context(), Some(task.id()), RECENT_EVENT_LIMIT)?;
    if !events.is_empty() {
        println!();
        println!("Recent events:");
        for event in &events {
            println!("  {}", describe_event(event));
        }
    }

    Ok(())
}

/// `<timestamp>  <action>  <requestor or actor>` for one audit event.
fn describe_event(event: &Event) -> String {
    let who = event
        .details
        .get("requestor")
        .and_then(|v| v.as_str())
        .unwrap_or(&event.actor);
    format!(
        "{}  {:<11}  {}",
        event.ts.format("%Y-%m-%d %H:%M:%S UTC"),
        event.action,
        who
    )
}

/// One-line description of a lease status.
pub(crate) fn describe_status(status: &LeaseStatus) -> String {
    match status {
        LeaseStatus::Unlocked => "unlocked".to_string(),
        LeaseStatus::Locked { remaining_ms } => {
            format!("locked ({} left)", format_duration_ms(*remaining_ms))
        }
        LeaseStatus::Expired { expired_for_ms } => {
            format!("expired {} ago", format_duration_ms(*expired_for_ms))
        }
        LeaseStatus::Invalid(reason) => format!("INVALID ({})", reason),
    }
}

fn format_duration_ms(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else if ms < 3_600_000 {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1_000)
    } else {
        format!("{}h {}m", ms / 3_600_000, (ms % 3_600_000) / 60_000)
    }
}
