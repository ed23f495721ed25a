//! Tiered cache adapter.
//!
//! Chains backends fastest-first, each with its own TTL. Reads stop at
//! the first tier holding the key and promote the value into every
//! faster tier that missed, using the missed tier's own TTL. Writes and
//! deletes fan out to every tier.

use crate::backend::{BackendResult, CacheBackend};
use quickcache_core::error::ConfigError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One backend plus the TTL its entries are written with.
#[derive(Clone)]
pub struct Tier {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl Tier {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tier")
            .field("backend", &self.backend.name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Ordered chain of cache tiers, fastest first.
///
/// The adapter owns no entries; each backend keeps its own with its own
/// expiry. There is no cross-tier locking: concurrent callers racing on
/// a missed key may both recompute and both write, and the last write
/// wins.
#[derive(Debug, Clone)]
pub struct TieredCache {
    tiers: Vec<Tier>,
}

impl TieredCache {
    /// Build an adapter from (backend, TTL) pairs in fastest-first
    /// order. Pairs with a zero TTL are dropped; an empty result is a
    /// configuration error.
    pub fn new(pairs: Vec<(Arc<dyn CacheBackend>, Duration)>) -> Result<Self, ConfigError> {
        let tiers: Vec<Tier> = pairs
            .into_iter()
            .filter(|(_, ttl)| !ttl.is_zero())
            .map(|(backend, ttl)| Tier::new(backend, ttl))
            .collect();
        if tiers.is_empty() {
            return Err(ConfigError::NoUsableTiers);
        }
        Ok(Self { tiers })
    }

    /// Single-tier convenience constructor.
    pub fn single(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Result<Self, ConfigError> {
        Self::new(vec![(backend, ttl)])
    }

    /// The effective tiers, fastest first.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Read a key, stopping at the first tier that holds it.
    ///
    /// Every faster tier that missed is populated with the found value
    /// before returning. A miss in all tiers returns `None` and writes
    /// nothing.
    pub fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let mut missed: Vec<&Tier> = Vec::new();
        for tier in &self.tiers {
            match tier.backend.get(key)? {
                Some(value) => {
                    for faster in &missed {
                        faster.backend.set(key, &value, faster.ttl)?;
                    }
                    tracing::debug!(
                        key,
                        tier = tier.backend.name(),
                        promoted = missed.len(),
                        "cache hit"
                    );
                    return Ok(Some(value));
                }
                None => missed.push(tier),
            }
        }
        tracing::debug!(key, tiers = self.tiers.len(), "cache miss");
        Ok(None)
    }

    /// Write a value into every tier, each with its own TTL.
    pub fn set(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        for tier in &self.tiers {
            tier.backend.set(key, value, tier.ttl)?;
        }
        Ok(())
    }

    /// Remove a key from every tier.
    pub fn delete(&self, key: &str) -> BackendResult<()> {
        for tier in &self.tiers {
            tier.backend.delete(key)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================
