//! File-backed task store.
//!
//! Tasks live in `.tasklock/tasks/<id>.md`. Every lease operation runs as a
//! guarded read-decide-write: the per-task update guard is taken, the task is
//! loaded, the [`LeaseManager`] decides, the task is saved if it changed, and
//! the guard is dropped. That supplies the atomicity the lease core leaves to
//! its caller, for every process sharing the same store directory.

pub mod guard;


use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::context::StoreContext;
use crate::error::{ArgumentReason, LeaseError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::lease::{LeaseDecision, LeaseManager, LeaseStatus, apply_lease};
use crate::task::{TaskFile, validate_task_id};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub use guard::{GuardInfo, UpdateGuard, acquire_update_guard, clear_guard, list_guards};

/// Result of a stored acquire or release: what was decided, and the task as
/// it now stands.
#[derive(Debug, Clone)]
pub struct LeaseOutcome {
    pub decision: LeaseDecision,
    pub task: TaskFile,
}

/// A task store rooted at a [`StoreContext`].
#[derive(Debug)]
pub struct TaskStore<C = SystemClock> {
    ctx: StoreContext,
    config: Config,
    leases: LeaseManager<C>,
}

impl TaskStore<SystemClock> {
    /// Open a store on the host clock, reading its `config.yaml`.
    pub fn open(ctx: StoreContext) -> Result<Self> {
        let config = Config::load_or_default(ctx.config_path())?;
        Ok(Self::with_clock(ctx, config, SystemClock))
    }
}

impl<C: Clock> TaskStore<C> {
    pub fn with_clock(ctx: StoreContext, config: Config, clock: C) -> Self {
        let leases = LeaseManager::with_clock(clock, config.lease_config());
        Self {
            ctx,
            config,
            leases,
        }
    }

    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn leases(&self) -> &LeaseManager<C> {
        &self.leases
    }

    /// Write a new task; fails if one with the same id exists.
    pub fn create(&self, task: &TaskFile) -> Result<PathBuf> {
        let id = validate_task_id(task.id())?;
        let _guard = acquire_update_guard(&self.ctx, id, "add")?;

        let path = self.ctx.task_path(id);
        if path.exists() {
            return Err(LeaseError::UserError(format!(
                "task '{}' already exists at: {}",
                id,
                path.display()
            )));
        }

        task.save(&path)?;
        self.record(Event::new(EventAction::Add).with_task(id).with_details(json!({
            "title": task.frontmatter.title,
        })));
        Ok(path)
    }

    /// Load a task by id, `None` if the store has no such task.
    pub fn load(&self, task_id: &str) -> Result<Option<TaskFile>> {
        let id = validate_task_id(task_id)?;
        let path = self.ctx.task_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let task = TaskFile::load(&path)?;
        if task.id() != id {
            return Err(LeaseError::UserError(format!(
                "task file '{}' declares id '{}'",
                path.display(),
                task.id()
            )));
        }
        Ok(Some(task))
    }

    /// Load a task that must exist.
    pub fn get(&self, task_id: &str) -> Result<TaskFile> {
        self.load(task_id)?
            .ok_or(LeaseError::InvalidArgument(ArgumentReason::TaskMissing))
    }

    /// All readable tasks, sorted by id.
    ///
    /// A task file that fails to parse is skipped with a warning, so one
    /// corrupt record does not hide the rest of the store.
    pub fn list(&self) -> Result<Vec<TaskFile>> {
        if !self.ctx.tasks_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.ctx.tasks_dir).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to read tasks directory '{}': {}",
                self.ctx.tasks_dir.display(),
                e
            ))
        })?;

        let mut tasks = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| LeaseError::UserError(format!("failed to read tasks entry: {}", e)))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            match TaskFile::load(&path) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable task file")
                }
            }
        }

        tasks.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(tasks)
    }

    /// Run `f` on the task under its update guard.
    ///
    /// `f` receives `None` when the task does not exist. The task is written
    /// back only when `f` succeeds and the record actually changed.
    pub fn update<R, F>(&self, task_id: &str, action: &str, f: F) -> Result<R>
    where
        F: FnOnce(Option<&mut TaskFile>) -> Result<R>,
    {
        let id = validate_task_id(task_id)?;
        let _guard = acquire_update_guard(&self.ctx, id, action)?;

        let Some(mut task) = self.load(id)? else {
            return f(None);
        };

        let before = task.to_string()?;
        let result = f(Some(&mut task))?;
        if task.to_string()? != before {
            debug!(task = id, action, "saving task");
            task.save(self.ctx.task_path(id))?;
        }
        Ok(result)
    }

    /// Acquire or renew the lease on a stored task.
    pub fn acquire(&self, task_id: &str, requestor_id: &str, ttl: Option<u64>) -> Result<LeaseOutcome> {
        let outcome = self.update(task_id, "acquire", |task| {
            let decision = self
                .leases
                .decide_acquire(ttl, requestor_id, task.as_deref())?;
            let task = task.ok_or(LeaseError::InvalidArgument(ArgumentReason::TaskMissing))?;
            apply_lease(task, &decision);
            Ok(LeaseOutcome {
                decision,
                task: task.clone(),
            })
        });
        self.record_outcome("acquire", task_id, requestor_id, outcome)
    }

    /// Release the lease on a stored task.
    pub fn release(&self, task_id: &str, requestor_id: &str) -> Result<LeaseOutcome> {
        let outcome = self.update(task_id, "release", |task| {
            let decision = self.leases.decide_release(requestor_id, task.as_deref())?;
            let task = task.ok_or(LeaseError::InvalidArgument(ArgumentReason::TaskMissing))?;
            apply_lease(task, &decision);
            Ok(LeaseOutcome {
                decision,
                task: task.clone(),
            })
        });
        self.record_outcome("release", task_id, requestor_id, outcome)
    }

    /// Whether `requestor_id` holds (or last held) the stored task's lease.
    pub fn is_holder(&self, task_id: &str, requestor_id: &str) -> Result<bool> {
        let task = self.get(task_id)?;
        self.leases.is_holder(&task, requestor_id)
    }

    /// Whether the stored task currently has a live lease.
    pub fn is_locked(&self, task_id: &str) -> Result<bool> {
        let task = self.get(task_id)?;
        self.leases.is_locked(&task)
    }

    /// Lease status of the stored task.
    pub fn status(&self, task_id: &str) -> Result<LeaseStatus> {
        let task = self.get(task_id)?;
        Ok(self.leases.status(&task))
    }

    fn record_outcome(
        &self,
        operation: &str,
        task_id: &str,
        requestor_id: &str,
        outcome: Result<LeaseOutcome>,
    ) -> Result<LeaseOutcome> {
        match outcome {
            Ok(outcome) => {
                if let Some(event) = decision_event(&outcome.decision, requestor_id) {
                    self.record(event.with_task(outcome.task.id()));
                }
                Ok(outcome)
            }
            Err(err) => {
                if let Some(reason) = err.conflict_reason() {
                    self.record(
                        Event::new(EventAction::Conflict)
                            .with_task(validate_task_id(task_id).unwrap_or(task_id))
                            .with_details(json!({
                                "operation": operation,
                                "requestor": requestor_id,
                                "reason": reason.as_str(),
                            })),
                    );
                }
                Err(err)
            }
        }
    }

    /// Append an audit event if enabled.
    ///
    /// The lease change has already been persisted at this point, so a
    /// failed append is logged instead of failing the operation.
    pub(crate) fn record(&self, event: Event) {
        if !self.config.record_events {
            return;
        }
        if let Err(e) = append_event(&self.ctx, &event) {
            warn!(action = %event.action, error = %e, "failed to append audit event");
        }
    }
}

fn decision_event(decision: &LeaseDecision, requestor_id: &str) -> Option<Event> {
    match decision {
        LeaseDecision::Grant {
            semaphore,
            superseded,
        } => Some(Event::new(EventAction::Acquire).with_details(json!({
            "requestor": requestor_id,
            "time": semaphore.time,
            "ttl": semaphore.ttl,
            "superseded": superseded,
        }))),
        LeaseDecision::Renew { time } => Some(Event::new(EventAction::Renew).with_details(json!({
            "requestor": requestor_id,
            "time": time,
        }))),
        LeaseDecision::Release => Some(Event::new(EventAction::Release).with_details(json!({
            "requestor": requestor_id,
        }))),
        LeaseDecision::Unchanged => None,
    }
}
