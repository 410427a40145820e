//! Lease state machine for tasks.
//!
//! A task carries at most one [`Semaphore`]: the derived key of its holder,
//! the time the lease was last acquired or renewed, and how long it stays
//! valid. The [`LeaseManager`] decides acquire/release outcomes from that
//! record and a [`Clock`]; it keeps no state of its own.
//!
//! # States
//!
//! ```text
//! Unlocked --acquire(A)--> Locked(A)
//! Locked(A) --acquire(A)--> Locked(A)      time refreshed, ttl kept
//! Locked(A) --acquire(B)--> LockConflict(TaskAlreadyLocked)
//! Locked(A) --ttl elapses--> Unlocked      lazily, the record stays
//! Unlocked --acquire(B)--> Locked(B)       an expired record is replaced
//! Locked(A) --release(A)--> Unlocked       record cleared
//! ```
//!
//! # Atomicity
//!
//! Deciding and applying happen against whatever view of the task the caller
//! passes in. Two callers racing on separate copies of the same record can
//! both "acquire"; serialize read-decide-write externally (see
//! [`crate::store::TaskStore::update`]).

mod decision;

pub use decision::{LeaseDecision, apply_lease};

use crate::clock::{Clock, SystemClock};
use crate::error::{ArgumentReason, ConflictReason, LeaseError, Result};
use crate::key::derive_key;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lease length used when a caller does not ask for one.
pub const DEFAULT_TTL_MS: u64 = 30_000;

/// Reason codes reported when a semaphore record is incomplete.
const KEY_NOT_PRESENT: &str = "KeyNotPresent";
const TIME_NOT_PRESENT: &str = "TimeNotPresent";
const TTL_NOT_PRESENT: &str = "TimeToLiveNotPresent";

/// The lease record embedded in a task.
///
/// Every field deserializes leniently so that a damaged record can still be
/// loaded and reported; the accessors turn a missing part into
/// `InvalidLeaseState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semaphore {
    /// Derived key of the current holder.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,

    /// Milliseconds since the Unix epoch at the last acquire or renewal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    /// Milliseconds the lease stays valid after `time`; must be positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl Semaphore {
    /// Create a fully populated semaphore.
    pub fn new(key: impl Into<String>, time: i64, ttl: u64) -> Self {
        Self {
            key: key.into(),
            time: Some(time),
            ttl: Some(ttl),
        }
    }

    /// The holder key, or `InvalidLeaseState` if it is missing.
    pub fn key_str(&self) -> Result<&str> {
        if self.key.is_empty() {
            return Err(LeaseError::InvalidLeaseState(KEY_NOT_PRESENT.to_string()));
        }
        Ok(&self.key)
    }

    /// The acquisition time, or `InvalidLeaseState` if it is missing.
    pub fn time_ms(&self) -> Result<i64> {
        self.time
            .ok_or_else(|| LeaseError::InvalidLeaseState(TIME_NOT_PRESENT.to_string()))
    }

    /// The lease length, or `InvalidLeaseState` if it is missing or zero.
    pub fn ttl_ms(&self) -> Result<u64> {
        match self.ttl {
            Some(ttl) if ttl > 0 => Ok(ttl),
            _ => Err(LeaseError::InvalidLeaseState(TTL_NOT_PRESENT.to_string())),
        }
    }

    /// Check that the record is a full key/time/ttl triple.
    pub fn validate(&self) -> Result<()> {
        self.key_str()?;
        self.time_ms()?;
        self.ttl_ms()?;
        Ok(())
    }

    /// Milliseconds of validity left at `now`; zero or negative once expired.
    pub fn remaining_ms(&self, now: i64) -> Result<i64> {
        self.validate()?;
        let ttl = i64::try_from(self.ttl_ms()?).unwrap_or(i64::MAX);
        let elapsed = now.saturating_sub(self.time_ms()?);
        Ok(ttl.saturating_sub(elapsed))
    }

    /// Whether the lease is still live at `now` (`now - time < ttl`).
    pub fn is_live_at(&self, now: i64) -> Result<bool> {
        Ok(self.remaining_ms(now)? > 0)
    }
}

/// A record that can carry a lease.
///
/// Implemented by [`crate::task::TaskFile`]; any queue record with a stable
/// id and a semaphore slot can implement it.
pub trait Leasable {
    /// The stable, unique id the key is derived from.
    fn lease_id(&self) -> &str;

    /// The current semaphore, if any.
    fn semaphore(&self) -> Option<&Semaphore>;

    /// Mutable access to the current semaphore, if any.
    fn semaphore_mut(&mut self) -> Option<&mut Semaphore>;

    /// Replace (or clear, with `None`) the semaphore.
    fn set_semaphore(&mut self, semaphore: Option<Semaphore>);
}

/// Tunables for a [`LeaseManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseConfig {
    /// Lease length applied when acquire is called without a ttl (or with 0).
    pub default_ttl_ms: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

impl LeaseConfig {
    /// Pick the requested ttl, falling back to the default for `None` or 0.
    pub fn resolve_ttl(&self, ttl: Option<u64>) -> u64 {
        match ttl {
            Some(ttl) if ttl > 0 => ttl,
            _ => self.default_ttl_ms,
        }
    }
}

/// Observed lease state of a task, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseStatus {
    /// No semaphore on the task.
    Unlocked,
    /// A live lease with this many milliseconds left.
    Locked { remaining_ms: i64 },
    /// A semaphore whose window elapsed this many milliseconds ago.
    Expired { expired_for_ms: i64 },
    /// A semaphore that cannot be evaluated.
    Invalid(String),
}

/// Decides and applies lease transitions.
#[derive(Debug, Clone, Default)]
pub struct LeaseManager<C = SystemClock> {
    clock: C,
    config: LeaseConfig,
}

impl LeaseManager<SystemClock> {
    /// A manager on the host clock.
    pub fn new(config: LeaseConfig) -> Self {
        Self::with_clock(SystemClock, config)
    }
}

impl<C: Clock> LeaseManager<C> {
    /// A manager on an explicit clock.
    pub fn with_clock(clock: C, config: LeaseConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> &LeaseConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Milliseconds since the Unix epoch according to this manager's clock.
    pub fn current_time(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Whether the task holds a live lease.
    ///
    /// Fails with `InvalidLeaseState` when a semaphore is present without a
    /// usable ttl.
    pub fn is_locked<T: Leasable>(&self, task: &T) -> Result<bool> {
        self.is_locked_at(task, self.current_time())
    }

    fn is_locked_at<T: Leasable>(&self, task: &T, now: i64) -> Result<bool> {
        match task.semaphore() {
            Some(semaphore) => semaphore.is_live_at(now),
            None => Ok(false),
        }
    }

    /// Whether `requestor_id` is the holder recorded on the task.
    ///
    /// This is a key comparison only; an expired semaphore still answers
    /// `true` for its last holder. Asking about a task with no semaphore is a
    /// `LockConflict(TaskNotLocked)`; a semaphore without a key is
    /// `InvalidLeaseState`.
    pub fn is_holder<T: Leasable>(&self, task: &T, requestor_id: &str) -> Result<bool> {
        let semaphore = task
            .semaphore()
            .ok_or(LeaseError::LockConflict(ConflictReason::TaskNotLocked))?;

        Ok(derive_key(requestor_id, task.lease_id()) == semaphore.key_str()?)
    }

    /// Summarize the task's lease for display.
    pub fn status<T: Leasable>(&self, task: &T) -> LeaseStatus {
        let Some(semaphore) = task.semaphore() else {
            return LeaseStatus::Unlocked;
        };

        match semaphore.remaining_ms(self.current_time()) {
            Ok(remaining) if remaining > 0 => LeaseStatus::Locked {
                remaining_ms: remaining,
            },
            Ok(remaining) => LeaseStatus::Expired {
                expired_for_ms: -remaining,
            },
            Err(e) => LeaseStatus::Invalid(e.to_string()),
        }
    }

    /// Work out what acquiring the task would do, without touching it.
    ///
    /// Every check runs before a decision is returned, so a failed acquire
    /// never leaves a partial mutation behind.
    pub fn decide_acquire<T: Leasable>(
        &self,
        ttl: Option<u64>,
        requestor_id: &str,
        task: Option<&T>,
    ) -> Result<LeaseDecision> {
        let ttl = self.config.resolve_ttl(ttl);
        let task = validate_inputs(requestor_id, task)?;
        let now = self.current_time();

        if self.is_locked_at(task, now)? {
            if self.is_holder(task, requestor_id)? {
                debug!(task = task.lease_id(), "renewing lease");
                return Ok(LeaseDecision::Renew { time: now });
            }

            debug!(task = task.lease_id(), "lease held by another requestor");
            return Err(LeaseError::LockConflict(ConflictReason::TaskAlreadyLocked));
        }

        let superseded = task.semaphore().is_some();
        if superseded {
            info!(task = task.lease_id(), "replacing expired lease");
        } else {
            debug!(task = task.lease_id(), ttl, "granting lease");
        }

        Ok(LeaseDecision::Grant {
            semaphore: Semaphore::new(derive_key(requestor_id, task.lease_id()), now, ttl),
            superseded,
        })
    }

    /// Work out what releasing the task would do, without touching it.
    pub fn decide_release<T: Leasable>(
        &self,
        requestor_id: &str,
        task: Option<&T>,
    ) -> Result<LeaseDecision> {
        let task = validate_inputs(requestor_id, task)?;

        let Some(semaphore) = task.semaphore() else {
            debug!(task = task.lease_id(), "release of unlocked task");
            return Ok(LeaseDecision::Unchanged);
        };

        if derive_key(requestor_id, task.lease_id()) != semaphore.key_str()? {
            debug!(task = task.lease_id(), "release with foreign key");
            return Err(LeaseError::LockConflict(ConflictReason::KeyInvalid));
        }

        Ok(LeaseDecision::Release)
    }

    /// Acquire (or renew) the lease on `task` for `requestor_id`.
    ///
    /// A `ttl` of `None` or 0 uses the configured default. Renewal refreshes
    /// the timestamp and keeps the ttl chosen at the original acquisition.
    pub fn acquire<'t, T: Leasable>(
        &self,
        ttl: Option<u64>,
        requestor_id: &str,
        task: Option<&'t mut T>,
    ) -> Result<&'t mut T> {
        let decision = self.decide_acquire(ttl, requestor_id, task.as_deref())?;
        let task = task.ok_or(LeaseError::InvalidArgument(ArgumentReason::TaskMissing))?;
        apply_lease(task, &decision);
        Ok(task)
    }

    /// Release the lease on `task` held by `requestor_id`.
    ///
    /// Releasing a task with no semaphore is a no-op. A key mismatch is always
    /// a `LockConflict(KeyInvalid)`, even when the lease has expired.
    pub fn release<'t, T: Leasable>(
        &self,
        requestor_id: &str,
        task: Option<&'t mut T>,
    ) -> Result<&'t mut T> {
        let decision = self.decide_release(requestor_id, task.as_deref())?;
        let task = task.ok_or(LeaseError::InvalidArgument(ArgumentReason::TaskMissing))?;
        apply_lease(task, &decision);
        Ok(task)
    }
}

fn validate_inputs<'t, T: Leasable>(requestor_id: &str, task: Option<&'t T>) -> Result<&'t T> {
    if requestor_id.is_empty() {
        return Err(LeaseError::InvalidArgument(
            ArgumentReason::RequestorIdMissing,
        ));
    }
    task.ok_or(LeaseError::InvalidArgument(ArgumentReason::TaskMissing))
}
