//! Implementation of the `tasklock acquire` command.

use crate::cli::AcquireArgs;
use crate::context::require_store;
use crate::error::Result;
use crate::identity::local_identity;
use crate::lease::{Leasable, LeaseDecision, Semaphore};
use crate::store::TaskStore;
use chrono::DateTime;

/// Execute the `tasklock acquire` command.
///
/// Grants a fresh lease, renews the requestor's own live lease, or fails with
/// a lock conflict if someone else holds one.
pub fn cmd_acquire(args: AcquireArgs) -> Result<()> {
    let store = TaskStore::open(require_store()?)?;
    let requestor = args.requestor.unwrap_or_else(local_identity);

    let outcome = store.acquire(&args.task_id, &requestor, args.ttl)?;
    let task_id = outcome.task.id();

    match &outcome.decision {
        LeaseDecision::Grant { superseded, .. } => {
            println!("Acquired {} for {}", task_id, requestor);
            if *superseded {
                println!("  Replaced an expired lease.");
            }
        }
        LeaseDecision::Renew { .. } => println!("Renewed {} for {}", task_id, requestor),
        LeaseDecision::Release | LeaseDecision::Unchanged => {}
    }

    if let Some(semaphore) = outcome.task.semaphore() {
        print_window(semaphore);
    }

    Ok(())
}

fn print_window(semaphore: &Semaphore) {
    let (Ok(time), Ok(ttl)) = (semaphore.time_ms(), semaphore.ttl_ms()) else {
        return;
    };
    println!("  TTL:     {} ms", ttl);
    let expires = i64::try_from(ttl)
        .ok()
        .and_then(|ttl| time.checked_add(ttl))
        .and_then(DateTime::from_timestamp_millis);
    if let Some(expires) = expires {
        println!("  Expires: {}", expires.format("%Y-%m-%d %H:%M:%S%.3f UTC"));
    }
}
