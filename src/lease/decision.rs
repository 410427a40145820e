//! Lease decisions and their application to a task.

use super::{Leasable, Semaphore};

/// The outcome of a successful acquire or release decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseDecision {
    /// Install a fresh semaphore.
    ///
    /// `superseded` is set when an expired semaphore of a previous holder is
    /// being replaced; that holder is not notified.
    Grant {
        semaphore: Semaphore,
        superseded: bool,
    },
    /// The holder re-acquired a live lease: move its timestamp.
    Renew { time: i64 },
    /// Clear the semaphore.
    Release,
    /// Nothing to do (release of an unlocked task).
    Unchanged,
}

impl LeaseDecision {
    /// Short name used in audit events.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseDecision::Grant { .. } => "grant",
            LeaseDecision::Renew { .. } => "renew",
            LeaseDecision::Release => "release",
            LeaseDecision::Unchanged => "unchanged",
        }
    }

    /// Whether applying the decision changes the task.
    pub fn mutates(&self) -> bool {
        !matches!(self, LeaseDecision::Unchanged)
    }
}

/// Apply a decision to the task it was computed for.
///
/// A `Renew` against a task that has since lost its semaphore is ignored.
pub fn apply_lease<T: Leasable>(task: &mut T, decision: &LeaseDecision) {
    match decision {
        LeaseDecision::Grant { semaphore, .. } => task.set_semaphore(Some(semaphore.clone())),
        LeaseDecision::Renew { time } => {
            if let Some(semaphore) = task.semaphore_mut() {
                semaphore.time = Some(*time);
            }
        }
        LeaseDecision::Release => task.set_semaphore(None),
        LeaseDecision::Unchanged => {}
    }
}
