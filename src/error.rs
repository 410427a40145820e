//! Error types for tasklock.
//!
//! Uses thiserror for derive macros. Lease outcomes are classified so callers
//! can branch on them explicitly: contention is a `LockConflict`, caller
//! mistakes are `InvalidArgument`, and corrupted records are
//! `InvalidLeaseState`.

use crate::exit_codes;
use std::fmt;
use thiserror::Error;

/// Why a lease operation rejected its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentReason {
    /// The requestor identity was empty.
    RequestorIdMissing,
    /// No task was supplied (or the task store has no such task).
    TaskMissing,
}

impl ArgumentReason {
    /// Stable reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentReason::RequestorIdMissing => "RequestorIdMissing",
            ArgumentReason::TaskMissing => "TaskMissing",
        }
    }
}

impl fmt::Display for ArgumentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contention outcomes reported as `LeaseError::LockConflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// A holder check was made against a task with no semaphore.
    TaskNotLocked,
    /// Another requestor holds an unexpired lease.
    TaskAlreadyLocked,
    /// The requestor's key does not match the semaphore key.
    KeyInvalid,
}

impl ConflictReason {
    /// Stable reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::TaskNotLocked => "TaskNotLocked",
            ConflictReason::TaskAlreadyLocked => "TaskAlreadyLocked",
            ConflictReason::KeyInvalid => "KeyInvalid",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for tasklock operations.
#[derive(Error, Debug)]
pub enum LeaseError {
    /// Missing requestor or task on acquire/release.
    #[error("invalid argument: {0}")]
    InvalidArgument(ArgumentReason),

    /// A semaphore is present but malformed (e.g. its ttl is missing).
    #[error("invalid lease state: {0}")]
    InvalidLeaseState(String),

    /// Expected contention; callers decide whether to back off and retry.
    #[error("lock conflict: {0}")]
    LockConflict(ConflictReason),

    /// I/O, parse, config or store failure with a user-actionable message.
    #[error("{0}")]
    UserError(String),
}

impl LeaseError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LeaseError::InvalidArgument(_) => exit_codes::USER_ERROR,
            LeaseError::UserError(_) => exit_codes::USER_ERROR,
            LeaseError::InvalidLeaseState(_) => exit_codes::INVALID_LEASE_STATE,
            LeaseError::LockConflict(_) => exit_codes::LOCK_CONFLICT,
        }
    }

    /// The conflict reason, if this is a `LockConflict`.
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            LeaseError::LockConflict(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Result type alias for tasklock operations.
pub type Result<T> = std::result::Result<T, LeaseError>;
