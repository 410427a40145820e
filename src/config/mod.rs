//! Configuration model for tasklock.
//!
//! `Config` represents `.tasklock/config.yaml`. Unknown fields are ignored,
//! missing fields fall back to defaults, and values are validated on load.

mod model;
mod operations;
pub mod types;


pub use model::Config;
