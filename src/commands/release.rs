//! Implementation of the `tasklock release` command.

use crate::cli::ReleaseArgs;
use crate::context::require_store;
use crate::error::Result;
use crate::identity::local_identity;
use crate::lease::LeaseDecision;
use crate::store::TaskStore;

/// Execute the `tasklock release` command.
pub fn cmd_release(args: ReleaseArgs) -> Result<()> {
    let store = TaskStore::open(require_store()?)?;
    let requestor = args.requestor.unwrap_or_else(local_identity);

    let outcome = store.release(&args.task_id, &requestor)?;

    if outcome.decision == LeaseDecision::Unchanged {
        println!("{} is not locked; nothing to release.", outcome.task.id());
    } else {
        println!("Released {}", outcome.task.id());
    }

    Ok(())
}
