//! CLI argument parsing for tasklock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};

/// tasklock: time-bounded, identity-scoped leases on tasks in a shared store.
///
/// Tasks are markdown files with YAML frontmatter under `.tasklock/tasks/`.
/// A lease records a hash of (requestor, task id), when it was taken, and how
/// long it lasts; once that window passes the task is free again.
#[derive(Parser, Debug)]
#[command(name = "tasklock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for tasklock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a task store in the current directory.
    ///
    /// Creates `.tasklock/` with its tasks and locks directories and a default
    /// `config.yaml`. Safe to run again.
    Init,

    /// Add a new task to the store.
    Add(AddArgs),

    /// Acquire (or renew) the lease on a task.
    ///
    /// Fails with exit code 3 if another requestor holds a live lease.
    Acquire(AcquireArgs),

    /// Release the lease on a task.
    ///
    /// Only the holder can release; releasing an unlocked task does nothing.
    Release(ReleaseArgs),

    /// Print whether a requestor holds the lease on a task.
    ///
    /// Prints `true` or `false`. Expiry is not considered: the last holder of
    /// an expired lease still matches.
    Holder(HolderArgs),

    /// Show lease status of one task or of every task.
    Status(StatusArgs),

    /// Print the lease key for a requestor and task.
    Key(KeyArgs),

    /// Update guard management commands.
    ///
    /// List or clear per-task update guards left behind by crashed processes.
    Guard(GuardCommand),
}

/// Arguments for the `add` command.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Unique id of the new task (e.g., T1).
    pub task_id: String,

    /// Human-readable title.
    #[arg(short, long, default_value = "")]
    pub title: String,
}

/// Arguments for the `acquire` command.
#[derive(Parser, Debug)]
pub struct AcquireArgs {
    /// Task ID to lease.
    pub task_id: String,

    /// Requestor identity (defaults to user@host).
    #[arg(short, long)]
    pub requestor: Option<String>,

    /// Lease length in milliseconds (0 or absent uses the configured default).
    #[arg(long)]
    pub ttl: Option<u64>,
}

/// Arguments for the `release` command.
#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    /// Task ID whose lease should be released.
    pub task_id: String,

    /// Requestor identity (defaults to user@host).
    #[arg(short, long)]
    pub requestor: Option<String>,
}

/// Arguments for the `holder` command.
#[derive(Parser, Debug)]
pub struct HolderArgs {
    /// Task ID to check.
    pub task_id: String,

    /// Requestor identity (defaults to user@host).
    #[arg(short, long)]
    pub requestor: Option<String>,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Show a single task in detail instead of the summary table.
    pub task_id: Option<String>,
}

/// Arguments for the `key` command.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Requestor identity.
    pub requestor: String,

    /// Task ID.
    pub task_id: String,
}

/// Guard subcommands.
#[derive(Parser, Debug)]
pub struct GuardCommand {
    #[command(subcommand)]
    pub action: GuardAction,
}

/// Available guard actions.
#[derive(Subcommand, Debug)]
pub enum GuardAction {
    /// List update guards currently on disk.
    ///
    /// Shows owner, age and the interrupted action for each guard.
    List,

    /// Remove the update guard of a task.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(GuardClearArgs),
}

/// Arguments for the `guard clear` command.
#[derive(Parser, Debug)]
pub struct GuardClearArgs {
    /// Task ID whose guard should be cleared.
    pub task_id: String,

    /// Force clearing the guard (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["tasklock", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
    }

    #[test]
    fn parse_add_with_title() {
        let cli = Cli::try_parse_from(["tasklock", "add", "T1", "--title", "Rebuild index"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.task_id, "T1");
            assert_eq!(args.title, "Rebuild index");
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn parse_acquire_defaults() {
        let cli = Cli::try_parse_from(["tasklock", "acquire", "T1"]).unwrap();
        if let Command::Acquire(args) = cli.command {
            assert_eq!(args.task_id, "T1");
            assert!(args.requestor.is_none());
            assert!(args.ttl.is_none());
        } else {
            panic!("Expected Acquire command");
        }
    }

    #[test]
    fn parse_acquire_full() {
        let cli = Cli::try_parse_from([
            "tasklock",
            "acquire",
            "T1",
            "-r",
            "worker-7",
            "--ttl",
            "1500",
        ])
        .unwrap();
        if let Command::Acquire(args) = cli.command {
            assert_eq!(args.requestor.as_deref(), Some("worker-7"));
            assert_eq!(args.ttl, Some(1500));
        } else {
            panic!("Expected Acquire command");
        }
    }

    #[test]
    fn parse_acquire_rejects_negative_ttl() {
        assert!(Cli::try_parse_from(["tasklock", "acquire", "T1", "--ttl", "-5"]).is_err());
    }

    #[test]
    fn parse_release_and_holder() {
        let cli = Cli::try_parse_from(["tasklock", "release", "T1", "--requestor", "bob"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Release(ReleaseArgs { ref requestor, .. }) if requestor.as_deref() == Some("bob")
        ));

        let cli = Cli::try_parse_from(["tasklock", "holder", "T1"]).unwrap();
        assert!(matches!(cli.command, Command::Holder(_)));
    }

    #[test]
    fn parse_status_optional_task() {
        let cli = Cli::try_parse_from(["tasklock", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status(StatusArgs { task_id: None })));

        let cli = Cli::try_parse_from(["tasklock", "status", "T1"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.task_id.as_deref(), Some("T1"));
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn parse_key() {
        let cli = Cli::try_parse_from(["tasklock", "key", "alice", "T1"]).unwrap();
        if let Command::Key(args) = cli.command {
            assert_eq!(args.requestor, "alice");
            assert_eq!(args.task_id, "T1");
        } else {
            panic!("Expected Key command");
        }
    }

    #[test]
    fn parse_guard_clear() {
        let cli = Cli::try_parse_from(["tasklock", "guard", "clear", "T1", "--force"]).unwrap();
        if let Command::Guard(GuardCommand {
            action: GuardAction::Clear(args),
        }) = cli.command
        {
            assert_eq!(args.task_id, "T1");
            assert!(args.force);
        } else {
            panic!("Expected Guard Clear command");
        }
    }

    #[test]
    fn parse_guard_list() {
        let cli = Cli::try_parse_from(["tasklock", "guard", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Guard(GuardCommand {
                action: GuardAction::List
            })
        ));
    }
}
