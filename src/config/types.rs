//! Default values for config fields.

use crate::lease::DEFAULT_TTL_MS;

pub(crate) fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}
pub(crate) fn default_guard_stale_minutes() -> u32 {
    10
}
pub(crate) fn default_true() -> bool {
    true
}
