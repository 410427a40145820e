//! Task record model for tasklock.
//!
//! A task is a markdown file with YAML frontmatter. The frontmatter carries
//! the task id and, while the task is leased, its `semaphore`:
//!
//! ```text
//! ---
//! id: T1
//! title: Rebuild search index
//! semaphore:
//!   key: 3f9a...c2
//!   time: 1700000000000
//!   ttl: 30000
//! ---
//!
//! Free-form notes.
//! ```
//!
//! Unknown frontmatter fields are kept in `extra` and written back unchanged,
//! and the body is preserved byte for byte.

use crate::error::{LeaseError, Result};
use crate::lease::Semaphore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod io;
mod lease;
#[cfg(test)]
mod tests;

const DELIMITER: &str = "---";

/// A parsed task file with frontmatter and markdown body.
#[derive(Debug, Clone)]
pub struct TaskFile {
    /// The parsed frontmatter fields.
    pub frontmatter: TaskFrontmatter,
    /// Everything after the closing `---` line, with original line endings.
    pub body: String,
}

/// Task frontmatter fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFrontmatter {
    /// Stable task identifier; the lease key is derived from it.
    pub id: String,

    /// Human-readable title.
    #[serde(default)]
    pub title: String,

    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Current lease, absent while the task is unlocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semaphore: Option<Semaphore>,

    /// Fields this version does not know about, in deterministic order.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl TaskFile {
    /// A new, unlocked task stamped with the current time.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            frontmatter: TaskFrontmatter {
                id: id.into(),
                title: title.into(),
                created: Some(Utc::now()),
                ..TaskFrontmatter::default()
            },
            body: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.frontmatter.id
    }

    /// Parse a task file from its content.
    ///
    /// Both LF and CRLF line endings are accepted. The id must be present
    /// and non-empty.
    ///
    /// ```
    /// use tasklock::task::TaskFile;
    ///
    /// let task = TaskFile::parse("---\nid: T1\ntitle: Reindex\n---\nNotes.\n").unwrap();
    /// assert_eq!(task.id(), "T1");
    /// assert!(task.frontmatter.semaphore.is_none());
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let (yaml, body) = split_frontmatter(content)?;

        let frontmatter: TaskFrontmatter = serde_yaml::from_str(yaml).map_err(|e| {
            LeaseError::UserError(format!("failed to parse task frontmatter: {}", e))
        })?;

        if frontmatter.id.trim().is_empty() {
            return Err(LeaseError::UserError(
                "task frontmatter has an empty 'id'".to_string(),
            ));
        }

        Ok(Self {
            frontmatter,
            body: body.to_string(),
        })
    }
}

/// Split `content` into the frontmatter YAML and the body.
fn split_frontmatter(content: &str) -> Result<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');

    let opening = lines.next().unwrap_or("");
    if trim_eol(opening) != DELIMITER {
        return Err(LeaseError::UserError(
            "task file must start with a '---' frontmatter line".to_string(),
        ));
    }

    let yaml_start = opening.len();
    let mut offset = yaml_start;
    for line in lines {
        if trim_eol(line) == DELIMITER {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(LeaseError::UserError(
        "task file is missing the closing '---' frontmatter line".to_string(),
    ))
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Check that a task id is usable as a file name.
///
/// Ids may contain ASCII letters, digits, `-`, `_` and `.`, and must not
/// start with `.`.
pub fn validate_task_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(LeaseError::UserError("task id must not be empty".to_string()));
    }
    if id.starts_with('.') {
        return Err(LeaseError::UserError(format!(
            "invalid task id '{}': must not start with '.'",
            id
        )));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(LeaseError::UserError(format!(
            "invalid task id '{}': unexpected character '{}'",
            id, bad
        )));
    }
    Ok(id)
}
