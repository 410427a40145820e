//! Exit code constants for the tasklock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing task, I/O or config failure)
//! - 2: Invalid lease state (corrupted semaphore record)
//! - 3: Lock conflict (task locked by another holder, key mismatch)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, missing task, unreadable store or config.
pub const USER_ERROR: i32 = 1;

/// A task carries a malformed semaphore.
pub const INVALID_LEASE_STATE: i32 = 2;

/// Lease contention: the task is held by someone else or the key is wrong.
pub const LOCK_CONFLICT: i32 = 3;
