//! Command implementations for tasklock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod acquire;
mod add;
mod guard;
mod holder;
pub(crate) mod init;
mod release;
mod status;

use crate::cli::{Command, KeyArgs};
use crate::error::{ArgumentReason, LeaseError, Result};
use crate::key::derive_key;
use crate::task::validate_task_id;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(),
        Command::Add(args) => add::cmd_add(args),
        Command::Acquire(args) => acquire::cmd_acquire(args),
        Command::Release(args) => release::cmd_release(args),
        Command::Holder(args) => holder::cmd_holder(args),
        Command::Status(args) => status::cmd_status(args),
        Command::Key(args) => cmd_key(args),
        Command::Guard(guard_cmd) => guard::dispatch_guard(guard_cmd),
    }
}

/// Print the lease key for a requestor/task pair. Needs no store.
fn cmd_key(args: KeyArgs) -> Result<()> {
    if args.requestor.is_empty() {
        return Err(LeaseError::InvalidArgument(
            ArgumentReason::RequestorIdMissing,
        ));
    }
    let task_id = validate_task_id(&args.task_id)?;
    println!("{}", derive_key(&args.requestor, task_id));
    Ok(())
}
