//! Filesystem helpers for tasklock.
//!
//! Task records and config are replaced with atomic writes so a crash never
//! leaves a half-written semaphore behind.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_file};
