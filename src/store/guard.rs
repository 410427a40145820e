//! Per-task update guards.
//!
//! The lease decision itself is not atomic: it reads the semaphore, decides,
//! and writes it back. The store serializes that sequence per task with a
//! guard file, `locks/<id>.lock`, created with **create_new** semantics so
//! only one process can hold it at a time.
//!
//! Each guard file contains JSON metadata:
//! - `owner`: `user@host` of the holder
//! - `pid`: process id (optional)
//! - `created_at`: RFC3339 timestamp
//! - `action`: the store operation in progress (acquire/release/...)
//!
//! Guards are released when the [`UpdateGuard`] is dropped. A process that
//! crashes mid-update leaves its guard behind; such guards show up as stale
//! in [`list_guards`] and can be removed with [`clear_guard`].

use crate::context::StoreContext;
use crate::error::{LeaseError, Result};
use crate::identity::local_identity;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Metadata stored in a guard file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardMetadata {
    /// Owner of the guard (`user@host`).
    pub owner: String,

    /// Process id of the holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// When the guard was taken.
    pub created_at: DateTime<Utc>,

    /// The store operation in progress.
    pub action: String,
}

impl GuardMetadata {
    /// Metadata for the current process, stamped now.
    pub fn new(action: &str) -> Self {
        Self {
            owner: local_identity(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    /// Read metadata from a guard file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to read guard file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to parse guard file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            LeaseError::UserError(format!("failed to serialize guard metadata: {}", e))
        })
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Age as `2d 3h`, `4h 10m` or `7m`.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let (days, hours, minutes) = (age.num_days(), age.num_hours(), age.num_minutes());

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Whether the guard is older than `stale_minutes`.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age().num_minutes() > i64::from(stale_minutes)
    }
}

/// A guard found on disk.
#[derive(Debug, Clone)]
pub struct GuardInfo {
    pub path: PathBuf,
    /// The task id the guard protects.
    pub task_id: String,
    pub metadata: GuardMetadata,
    pub is_stale: bool,
}

impl std::fmt::Display for GuardInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (owner: {}, age: {}, action: {}{})",
            self.task_id,
            self.metadata.owner,
            self.metadata.age_string(),
            self.metadata.action,
            if self.is_stale { ", STALE" } else { "" }
        )
    }
}

/// RAII handle on a guard file; the file is removed on drop.
#[derive(Debug)]
pub struct UpdateGuard {
    path: PathBuf,
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release update guard");
        }
    }
}

/// Take the update guard for `task_id`.
///
/// Fails with a `UserError` naming the current holder when the guard is
/// already taken. This is store-level contention, distinct from a lease
/// `LockConflict`: it only lasts for the duration of one update.
pub fn acquire_update_guard(ctx: &StoreContext, task_id: &str, action: &str) -> Result<UpdateGuard> {
    let path = ctx.guard_path(task_id);
    let metadata = GuardMetadata::new(action);

    fs::create_dir_all(&ctx.locks_dir).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to create locks directory '{}': {}",
            ctx.locks_dir.display(),
            e
        ))
    })?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                let holder = match GuardMetadata::from_file(&path) {
                    Ok(meta) => format!(
                        " by {} ({} ago, action: {})",
                        meta.owner,
                        meta.age_string(),
                        meta.action
                    ),
                    Err(_) => String::new(),
                };
                LeaseError::UserError(format!(
                    "task '{}' is being updated{}.\nGuard: {}",
                    task_id,
                    holder,
                    path.display()
                ))
            } else {
                LeaseError::UserError(format!(
                    "failed to create guard '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

    // From here on the file exists; the guard removes it on any failure.
    let guard = UpdateGuard { path };

    let json = metadata.to_json()?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| LeaseError::UserError(format!("failed to write guard metadata: {}", e)))?;

    Ok(guard)
}

/// List guards currently on disk, sorted by task id.
///
/// Files that are not `.lock` files or do not parse are skipped.
pub fn list_guards(ctx: &StoreContext, stale_minutes: u32) -> Result<Vec<GuardInfo>> {
    let mut guards = Vec::new();

    if !ctx.locks_dir.exists() {
        return Ok(guards);
    }

    let entries = fs::read_dir(&ctx.locks_dir).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to read locks directory '{}': {}",
            ctx.locks_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| LeaseError::UserError(format!("failed to read locks entry: {}", e)))?
            .path();

        if path.extension().and_then(|e| e.to_str()) != Some("lock") {
            continue;
        }
        let Some(task_id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let Ok(metadata) = GuardMetadata::from_file(&path) else {
            continue;
        };

        let is_stale = metadata.is_stale(stale_minutes);
        if is_stale {
            warn!(task = %task_id, owner = %metadata.owner, "stale update guard");
        }

        guards.push(GuardInfo {
            path,
            task_id,
            metadata,
            is_stale,
        });
    }

    guards.sort_by(|a, b| a.task_id.cmp(&b.task_id));
    Ok(guards)
}

/// Remove the guard for `task_id`, returning what was removed.
///
/// The caller is responsible for deciding that removal is safe.
pub fn clear_guard(ctx: &StoreContext, task_id: &str, stale_minutes: u32) -> Result<GuardInfo> {
    let path = ctx.guard_path(task_id);

    if !path.exists() {
        return Err(LeaseError::UserError(format!(
            "no update guard for task '{}' at: {}",
            task_id,
            path.display()
        )));
    }

    let metadata = GuardMetadata::from_file(&path)?;
    let is_stale = metadata.is_stale(stale_minutes);

    fs::remove_file(&path).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to clear guard '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(GuardInfo {
        path,
        task_id: task_id.to_string(),
        metadata,
        is_stale,
    })
}
