//! Quickcache Core - Key Derivation
//!
//! Turns (function identity, source snapshot, call arguments) into
//! stable cache keys. This crate performs no cache I/O; backends and the
//! call surface live in the crates built on top of it.

pub mod error;
pub mod key;
pub mod signature;
pub mod value;
pub mod vary;

// Re-export the working set so dependents need one import path.
pub use error::{
    ArgumentError, BackendError, CodecError, ConfigError, QuickCacheError, QuickCacheResult,
};
pub use key::{CacheKey, FnSpec, KeyBuilder};
pub use signature::{BoundArgs, CallArgs, Param, Signature};
pub use value::CacheValue;
pub use vary::{SkipFn, SkipPredicate, VaryFn, VaryOn, VaryPath};

use sha2::{Digest, Sha256};

/// Compute a truncated hex SHA-256 digest.
///
/// Used for vary-on value fingerprints, source hashes, and over-long key
/// compaction. `length` is clamped to the full 64-character digest.
pub fn content_hash(input: &[u8], length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let digest = hex::encode(hasher.finalize());
    if length >= digest.len() {
        digest
    } else {
        digest[..length].to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
