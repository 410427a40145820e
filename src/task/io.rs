//! File I/O for task files.

use super::TaskFile;
use crate::error::{LeaseError, Result};
use std::path::Path;

impl TaskFile {
    /// Load a task file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to read task file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Atomically save the task file (temp file + rename).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_string()?;
        crate::fs::atomic_write_file(path, &content)
    }

    /// Render frontmatter and body back into file content.
    pub fn to_string(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.frontmatter).map_err(|e| {
            LeaseError::UserError(format!("failed to serialize task frontmatter: {}", e))
        })?;

        Ok(format!("---\n{}---\n{}", yaml, self.body))
    }
}
