//! Implementation of the `tasklock add` command.

use crate::cli::AddArgs;
use crate::context::require_store;
use crate::error::Result;
use crate::store::TaskStore;
use crate::task::{TaskFile, validate_task_id};

/// Execute the `tasklock add` command.
///
/// Creates an unlocked task with the given id. The id must be unique within
/// the store.
pub fn cmd_add(args: AddArgs) -> Result<()> {
    let store = TaskStore::open(require_store()?)?;

    let task_id = validate_task_id(&args.task_id)?;
    let task = TaskFile::new(task_id, args.title.trim());
    let path = store.create(&task)?;

    println!("Added task {}", task_id);
    println!("  File: {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StoreContext;
    use crate::lease::Leasable;
    use crate::test_support::{DirGuard, create_test_store};
    use serial_test::serial;

    fn add_args(task_id: &str, title: &str) -> AddArgs {
        AddArgs {
            task_id: task_id.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    #[serial]
    fn test_add_creates_task_file() {
        let temp_dir = create_test_store();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_add(add_args("T1", "  Rebuild index ")).unwrap();

        let path = StoreContext::at(temp_dir.path()).task_path("T1");
        let task = TaskFile::load(&path).unwrap();
        assert_eq!(task.id(), "T1");
        assert_eq!(task.frontmatter.title, "Rebuild index");
        assert!(task.frontmatter.created.is_some());
        assert!(task.semaphore().is_none());
    }

    #[test]
    #[serial]
    fn test_add_duplicate_fails() {
        let temp_dir = create_test_store();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_add(add_args("T1", "")).unwrap();
        let err = cmd_add(add_args("T1", "")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    #[serial]
    fn test_add_rejects_bad_id() {
        let temp_dir = create_test_store();
        let _guard = DirGuard::new(temp_dir.path());

        assert!(cmd_add(add_args("../T1", "")).is_err());
    }

    #[test]
    #[serial]
    fn test_add_without_store_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        let err = cmd_add(add_args("T1", "")).unwrap_err();
        assert!(err.to_string().contains("tasklock init"));
    }
}
