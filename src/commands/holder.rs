//! Implementation of the `tasklock holder` command.

use crate::cli::HolderArgs;
use crate::context::require_store;
use crate::error::Result;
use crate::identity::local_identity;
use crate::store::TaskStore;

/// Execute the `tasklock holder` command.
///
/// Prints `true` or `false`. A task without a lease is a lock conflict
/// (exit code 3), not `false`.
pub fn cmd_holder(args: HolderArgs) -> Result<()> {
    let store = TaskStore::open(require_store()?)?;
    println!("{}", holder_line(&store, args)?);
    Ok(())
}

fn holder_line(store: &TaskStore, args: HolderArgs) -> Result<String> {
    let requestor = args.requestor.unwrap_or_else(local_identity);
    let holds = store.is_holder(&args.task_id, &requestor)?;
    Ok(holds.to_string())
}
