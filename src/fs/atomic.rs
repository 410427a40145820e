//! Atomic file replacement.
//!
//! Writes go to a temporary sibling file (`.{name}.{pid}.tmp`), are synced to
//! disk, and then renamed over the target. `rename` replaces an existing
//! target on every supported platform, and is atomic as long as both paths
//! are on the same filesystem, which holds because the temp file lives next to
//! the target.
//!
//! A crash between write and rename can leave the temp file behind; it is
//! never read back.

use crate::error::{LeaseError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically replace `path` with `content`, creating parent directories.
///
/// ```no_run
/// use tasklock::fs::atomic_write;
///
/// atomic_write("tasks/T1.md", b"---\nid: T1\n---\n")?;
/// # Ok::<(), tasklock::error::LeaseError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    if let Err(e) = write_synced(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LeaseError::UserError(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e
        ))
    })?;

    // Persist the directory entry as well; best effort.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// String convenience wrapper around [`atomic_write`].
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            LeaseError::UserError(format!("invalid file path '{}'", target.display()))
        })?;

    let temp_name = format!(".{}.{}.tmp", name, std::process::id());
    Ok(match target.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    })
}

fn write_synced(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        LeaseError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            LeaseError::UserError(format!(
                "failed to write temporary file '{}': {}",
                path.display(),
                e
            ))
        })
}
