//! Audit event log for tasklock.
//!
//! Lease transitions are appended to `.tasklock/events/events.ndjson`, one
//! JSON object per line:
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (init, add, acquire, renew, release, ...)
//! - `actor`: `user@host` of the process that did it
//! - `task`: task id, for task events
//! - `details`: action-specific fields
//!
//! ```no_run
//! use tasklock::context::StoreContext;
//! use tasklock::events::{Event, EventAction, append_event};
//! use serde_json::json;
//!
//! let ctx = StoreContext::resolve()?;
//! let event = Event::new(EventAction::Acquire)
//!     .with_task("T1")
//!     .with_details(json!({"ttl": 30000}));
//! append_event(&ctx, &event)?;
//! # Ok::<(), tasklock::error::LeaseError>(())
//! ```

use crate::context::StoreContext;
use crate::error::{LeaseError, Result};
use crate::identity::local_identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Actions recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Store initialized
    Init,
    /// Task created
    Add,
    /// Lease granted (fresh or replacing an expired one)
    Acquire,
    /// Lease renewed by its holder
    Renew,
    /// Lease released by its holder
    Release,
    /// Acquire or release refused with a lock conflict
    Conflict,
    /// Leftover update guard removed by hand
    GuardClear,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventAction::Init => "init",
            EventAction::Add => "add",
            EventAction::Acquire => "acquire",
            EventAction::Renew => "renew",
            EventAction::Release => "release",
            EventAction::Conflict => "conflict",
            EventAction::GuardClear => "guard_clear",
        };
        f.pad(name)
    }
}

/// One audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub action: EventAction,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub details: Value,
}

impl Event {
    /// A new event stamped now, attributed to the current process.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: local_identity(),
            task: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task = Some(task_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            LeaseError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Path of the event log.
pub fn events_file_path(ctx: &StoreContext) -> PathBuf {
    ctx.events_dir().join("events.ndjson")
}

/// Append one event to the log, creating the file if needed.
pub fn append_event(ctx: &StoreContext, event: &Event) -> Result<()> {
    let events_file = events_file_path(ctx);
    let json_line = event.to_ndjson_line()?;

    let events_dir = ctx.events_dir();
    fs::create_dir_all(&events_dir).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to create events directory '{}': {}",
            events_dir.display(),
            e
        ))
    })?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            LeaseError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            LeaseError::UserError(format!(
                "failed to write event to '{}': {}",
                events_file.display(),
                e
            ))
        })
}

/// Read the last `limit` events, oldest first, optionally only those for
/// `task_id`. Unparseable lines are skipped.
pub fn read_recent_events(
    ctx: &StoreContext,
    task_id: Option<&str>,
    limit: usize,
) -> Result<Vec<Event>> {
    let events_file = events_file_path(ctx);
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(&events_file).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to open events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    let events: Vec<Event> = BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str::<Event>(&line).ok())
        .filter(|event| task_id.is_none() || event.task.as_deref() == task_id)
        .collect();

    let skip = events.len().saturating_sub(limit);
    Ok(events.into_iter().skip(skip).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, StoreContext) {
        let temp_dir = TempDir::new().unwrap();
        let ctx = StoreContext::at(temp_dir.path());
        (temp_dir, ctx)
    }

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Init);

        assert_eq!(event.action, EventAction::Init);
        assert!(!event.actor.is_empty());
        assert!(event.task.is_none());
        assert!(Utc::now().signed_duration_since(event.ts).num_minutes() < 1);
    }

    #[test]
    fn test_event_builder() {
        let event = Event::new(EventAction::Acquire)
            .with_task("T1")
            .with_details(json!({"ttl": 1000, "superseded": false}));

        assert_eq!(event.task.as_deref(), Some("T1"));
        assert_eq!(event.details["ttl"], 1000);
        assert_eq!(event.details["superseded"], false);
    }

    #[test]
    fn test_event_line_is_single_line_json() {
        let line = Event::new(EventAction::Conflict)
            .with_task("T1")
            .with_details(json!({"reason": "TaskAlreadyLocked"}))
            .to_ndjson_line()
            .unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("\"action\":\"conflict\""));
        let parsed: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.action, EventAction::Conflict);
    }

    #[test]
    fn test_untargeted_event_omits_task() {
        let line = Event::new(EventAction::Init).to_ndjson_line().unwrap();
        assert!(!line.contains("\"task\""));
    }

    #[test]
    fn test_action_display_matches_serde() {
        for action in [
            EventAction::Init,
            EventAction::Add,
            EventAction::Acquire,
            EventAction::Renew,
            EventAction::Release,
            EventAction::Conflict,
            EventAction::GuardClear,
        ] {
            let serialized = serde_json::to_string(&action).unwrap();
            assert_eq!(serialized, format!("\"{}\"", action));
        }
    }

    #[test]
    fn test_append_and_read_events() {
        let (_temp_dir, ctx) = create_test_store();

        append_event(&ctx, &Event::new(EventAction::Init)).unwrap();
        append_event(&ctx, &Event::new(EventAction::Add).with_task("T1")).unwrap();
        append_event(&ctx, &Event::new(EventAction::Acquire).with_task("T1")).unwrap();

        let content = fs::read_to_string(events_file_path(&ctx)).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.ends_with('\n'));

        let recent = read_recent_events(&ctx, None, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, EventAction::Add);
        assert_eq!(recent[1].action, EventAction::Acquire);
    }

    #[test]
    fn test_read_events_for_one_task() {
        let (_temp_dir, ctx) = create_test_store();

        append_event(&ctx, &Event::new(EventAction::Add).with_task("T1")).unwrap();
        append_event(&ctx, &Event::new(EventAction::Add).with_task("T2")).unwrap();
        append_event(&ctx, &Event::new(EventAction::Acquire).with_task("T1")).unwrap();
        append_event(&ctx, &Event::new(EventAction::Release).with_task("T1")).unwrap();

        let events = read_recent_events(&ctx, Some("T1"), 2).unwrap();
        let actions: Vec<EventAction> = events.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![EventAction::Acquire, EventAction::Release]);
        assert!(events.iter().all(|e| e.task.as_deref() == Some("T1")));

        assert_eq!(read_recent_events(&ctx, Some("T2"), 10).unwrap().len(), 1);
    }

    #[test]
    fn test_read_events_without_log() {
        let (_temp_dir, ctx) = create_test_store();
        assert!(read_recent_events(&ctx, None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_read_events_skips_garbage_lines() {
        let (_temp_dir, ctx) = create_test_store();
        append_event(&ctx, &Event::new(EventAction::Init)).unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(events_file_path(&ctx))
            .unwrap();
        writeln!(file, "not json").unwrap();
        append_event(&ctx, &Event::new(EventAction::Add)).unwrap();

        let events = read_recent_events(&ctx, None, 10).unwrap();
        assert_eq!(events.len(), 2);
    }
}
