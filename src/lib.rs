//! tasklock: time-bounded, identity-scoped leases on tasks.
//!
//! A requestor acquires a task by writing a [`lease::Semaphore`] into it: a
//! SHA-512 key of (requestor, task id), the acquisition time, and a ttl. The
//! lease is live while `now - time < ttl`; nothing has to run to expire it.
//! The same requestor can renew its live lease, anyone can take over an
//! expired one, and only the holder can release.
//!
//! The lease core ([`lease`], [`key`], [`clock`]) works on any record that
//! implements [`lease::Leasable`]. The [`store`] module provides a file-backed
//! store of markdown task files that serializes read-decide-write per task,
//! and the `tasklock` binary exposes it on the command line.

pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod identity;
pub mod key;
pub mod lease;
pub mod store;
pub mod task;

#[cfg(test)]
mod test_support;
