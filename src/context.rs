//! Store location resolution for tasklock.
//!
//! A task store is a `.tasklock/` directory. Commands find it by walking up
//! from the working directory, the same way git finds `.git/`, so they work
//! from any subdirectory of the project that owns the store.

use crate::error::{LeaseError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the store directory.
pub const STORE_DIR: &str = ".tasklock";

/// Resolved paths of a task store. All paths are absolute when resolved from
/// an absolute directory.
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Directory containing `.tasklock/`.
    pub root: PathBuf,

    /// The `.tasklock/` directory itself.
    pub state_dir: PathBuf,

    /// Task files, one `<id>.md` per task.
    pub tasks_dir: PathBuf,

    /// Update guards, one `<id>.lock` per task being updated.
    pub locks_dir: PathBuf,
}

impl StoreContext {
    /// Context for a store rooted at `root` (whether or not it exists yet).
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let state_dir = root.join(STORE_DIR);
        Self {
            tasks_dir: state_dir.join("tasks"),
            locks_dir: state_dir.join("locks"),
            state_dir,
            root,
        }
    }

    /// Find the nearest store at or above the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            LeaseError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Find the nearest store at or above `start`.
    pub fn resolve_from<P: AsRef<Path>>(start: P) -> Result<Self> {
        let start = start.as_ref();

        start
            .ancestors()
            .find(|dir| dir.join(STORE_DIR).is_dir())
            .map(Self::at)
            .ok_or_else(|| {
                LeaseError::UserError(format!(
                    "no tasklock store found in '{}' or any parent directory.\n\n\
                     Run `tasklock init` to create one.",
                    start.display()
                ))
            })
    }

    /// Whether the store directories exist.
    pub fn exists(&self) -> bool {
        self.state_dir.is_dir() && self.tasks_dir.is_dir()
    }

    /// Path to `config.yaml`.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join("config.yaml")
    }

    /// Directory holding the audit log.
    pub fn events_dir(&self) -> PathBuf {
        self.state_dir.join("events")
    }

    /// Path of the task file for `task_id`.
    pub fn task_path(&self, task_id: &str) -> PathBuf {
        self.tasks_dir.join(format!("{}.md", task_id))
    }

    /// Path of the update guard for `task_id`.
    pub fn guard_path(&self, task_id: &str) -> PathBuf {
        self.locks_dir.join(format!("{}.lock", task_id))
    }
}

/// Resolve the store from the working directory and check it is complete.
pub fn require_store() -> Result<StoreContext> {
    let ctx = StoreContext::resolve()?;
    if !ctx.exists() {
        return Err(LeaseError::UserError(format!(
            "tasklock store at '{}' is incomplete (missing tasks directory).\n\n\
             Run `tasklock init` to repair it.",
            ctx.state_dir.display()
        )));
    }
    Ok(ctx)
}
