//! Cache backend trait.
//!
//! Backends store opaque byte payloads under string keys with a
//! per-entry time to live. The call surface owns value encoding;
//! backends never inspect payloads.

use quickcache_core::error::BackendError;
use std::time::Duration;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Pluggable cache backend.
///
/// Implementations must be thread-safe: one backend instance is shared
/// across every call site cached through it. Errors surface to callers
/// as-is, so a failing backend is distinguishable from a miss.
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in errors and log events.
    fn name(&self) -> &str;

    /// Fetch the payload stored under a key, or `None` on a miss.
    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Store a payload under a key with the given time to live.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> BackendResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> BackendResult<()>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries written.
    pub insertions: u64,
    /// Number of entries dropped by expiry or capacity.
    pub evictions: u64,
    /// Number of entries currently stored.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
