//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lease settings
    // =========================================================================
    /// Lease length in milliseconds when `acquire` is called without a ttl.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    // =========================================================================
    // Store settings
    // =========================================================================
    /// Minutes after which a leftover update guard is reported as stale.
    #[serde(default = "default_guard_stale_minutes")]
    pub guard_stale_minutes: u32,

    /// Whether lease transitions are appended to the audit event log.
    #[serde(default = "default_true")]
    pub record_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl_ms(),
            guard_stale_minutes: default_guard_stale_minutes(),
            record_events: default_true(),
        }
    }
}
