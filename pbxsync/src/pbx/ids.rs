//! Deterministic object identifiers.
//!
//! Xcode identifiers are 24 uppercase hex digits. Ours are derived from a
//! structural seed (parent id plus child name) so that rebuilding the same
//! group on a later run yields the same identifiers and the same file bytes.

use std::fmt;

use sha2::{Digest, Sha256};

/// Key of an entry in the project's `objects` table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive a 24-digit id from `seed`. `attempt` is mixed in only when
/// non-zero, to step past an id that is already taken.
pub fn derive_id(seed: &str, attempt: u32) -> ObjectId {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    if attempt > 0 {
        hasher.update(attempt.to_le_bytes());
    }
    let digest = hasher.finalize();
    ObjectId(hex::encode_upper(&digest[..12]))
}
