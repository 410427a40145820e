//! Tests for task file parsing, serialization and the lease slot.

use super::*;
use crate::clock::ManualClock;
use crate::key::derive_key;
use crate::lease::{Leasable, LeaseConfig, LeaseManager};
use tempfile::TempDir;

const MINIMAL_TASK: &str = r#"---
id: T1
title: Rebuild search index
---

## Notes
Run after the nightly import.
"#;

const LOCKED_TASK: &str = r#"---
id: T1
title: Rebuild search index
created: 2026-01-13T10:00:00Z
semaphore:
  key: abc123
  time: 1700000000000
  ttl: 1000
---
Body.
"#;

#[test]
fn test_parse_minimal_task() {
    let task = TaskFile::parse(MINIMAL_TASK).unwrap();
    assert_eq!(task.id(), "T1");
    assert_eq!(task.frontmatter.title, "Rebuild search index");
    assert!(task.frontmatter.semaphore.is_none());
    assert!(task.body.contains("## Notes"));
}

#[test]
fn test_parse_locked_task() {
    let task = TaskFile::parse(LOCKED_TASK).unwrap();
    let semaphore = task.semaphore().unwrap();
    assert_eq!(semaphore.key, "abc123");
    assert_eq!(semaphore.time, Some(1_700_000_000_000));
    assert_eq!(semaphore.ttl, Some(1000));
    assert!(task.frontmatter.created.is_some());
    assert_eq!(task.body, "Body.\n");
}

#[test]
fn test_parse_semaphore_missing_ttl_is_kept_for_reporting() {
    let content = "---\nid: T1\nsemaphore:\n  key: abc\n  time: 5\n---\n";
    let task = TaskFile::parse(content).unwrap();
    assert_eq!(task.semaphore().unwrap().ttl, None);
}

#[test]
fn test_parse_requires_id() {
    let err = TaskFile::parse("---\ntitle: no id\n---\n").unwrap_err();
    assert!(err.to_string().contains("failed to parse task frontmatter"));

    let err = TaskFile::parse("---\nid: ''\n---\n").unwrap_err();
    assert!(err.to_string().contains("empty 'id'"));
}

#[test]
fn test_roundtrip_preserves_unknown_fields_and_body() {
    let content = r#"---
id: T1
title: Test
queue: indexing
retry:
  max: 3
---

Content with special chars: < > & " '
"#;
    let task = TaskFile::parse(content).unwrap();
    let reparsed = TaskFile::parse(&task.to_string().unwrap()).unwrap();

    assert_eq!(reparsed.frontmatter.extra.len(), 2);
    assert!(reparsed.frontmatter.extra.contains_key("queue"));
    assert!(reparsed.frontmatter.extra.contains_key("retry"));
    assert_eq!(reparsed.body, task.body);
}

#[test]
fn test_parse_crlf_line_endings() {
    let content = "---\r\nid: T1\r\ntitle: Test\r\n---\r\nLine one\r\n";
    let task = TaskFile::parse(content).unwrap();
    assert_eq!(task.id(), "T1");
    assert_eq!(task.body, "Line one\r\n");
}

#[test]
fn test_parse_missing_delimiters() {
    let err = TaskFile::parse("id: T1\n---\n").unwrap_err();
    assert!(err.to_string().contains("must start with"));

    let err = TaskFile::parse("---\nid: T1\n\nno closing line\n").unwrap_err();
    assert!(err.to_string().contains("missing the closing"));
}

#[test]
fn test_body_separator_inside_body_is_kept() {
    let content = "---\nid: T1\n---\nabove\n---\nbelow\n";
    let task = TaskFile::parse(content).unwrap();
    assert_eq!(task.body, "above\n---\nbelow\n");
}

#[test]
fn test_unlocked_task_omits_semaphore() {
    let task = TaskFile::new("T1", "Test");
    let serialized = task.to_string().unwrap();
    assert!(!serialized.contains("semaphore"));
    assert!(serialized.contains("created:"));
}

#[test]
fn test_validate_task_id() {
    assert_eq!(validate_task_id(" T-1_a.b ").unwrap(), "T-1_a.b");
    assert!(validate_task_id("").is_err());
    assert!(validate_task_id(".hidden").is_err());
    assert!(validate_task_id("../escape").is_err());
    assert!(validate_task_id("a/b").is_err());
    assert!(validate_task_id("with space").is_err());
}

#[test]
fn test_lease_roundtrips_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("T1.md");
    let mgr = LeaseManager::with_clock(ManualClock::new(1_000), LeaseConfig::default());

    let mut task = TaskFile::parse(MINIMAL_TASK).unwrap();
    mgr.acquire(Some(500), "alice", Some(&mut task)).unwrap();
    task.save(&path).unwrap();

    let mut loaded = TaskFile::load(&path).unwrap();
    assert_eq!(
        loaded.semaphore().unwrap().key,
        derive_key("alice", "T1")
    );
    assert!(mgr.is_locked(&loaded).unwrap());
    assert_eq!(loaded.body, task.body);

    mgr.release("alice", Some(&mut loaded)).unwrap();
    loaded.save(&path).unwrap();

    let reloaded = TaskFile::load(&path).unwrap();
    assert!(reloaded.semaphore().is_none());
    assert!(!std::fs::read_to_string(&path).unwrap().contains("semaphore"));
}

#[test]
fn test_load_nonexistent_file() {
    let err = TaskFile::load("/nonexistent/path/T1.md").unwrap_err();
    assert!(err.to_string().contains("failed to read task file"));
}
