//! Ownership key derivation.
//!
//! A lease records who holds it without storing the requestor identity in
//! cleartext: the semaphore carries a SHA-512 digest of the requestor id
//! followed by the task id. Only someone who knows both inputs can reproduce
//! the key, which makes it usable as a proof of ownership.

use sha2::{Digest, Sha512};

/// Derive the ownership key for a (requestor, task) pair.
///
/// The result is the lowercase hex encoding of the 512-bit digest, so it is
/// always 128 characters long. Inputs are hashed as-is; callers validate that
/// they are non-empty.
pub fn derive_key(requestor_id: &str, task_id: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(requestor_id.as_bytes());
    hasher.update(task_id.as_bytes());
    hex::encode(hasher.finalize())
}
