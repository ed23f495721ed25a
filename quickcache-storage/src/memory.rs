//! In-memory TTL cache backend.
//!
//! The process-local tier of a typical deployment: a map of entries with
//! absolute expiry instants behind an `RwLock`. Expired entries are
//! dropped lazily on read and swept on write when the entry cap is hit.

use crate::backend::{BackendResult, CacheBackend, CacheStats};
use quickcache_core::error::BackendError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory cache backend with per-entry expiry and an entry cap.
#[derive(Debug)]
pub struct InMemoryCache {
    name: String,
    entries: RwLock<HashMap<String, Entry>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryCache {
    /// Create a backend named `memory` with the default entry cap.
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Create a backend with a custom name for logs and errors.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
            max_entries: DEFAULT_MAX_ENTRIES,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cap the number of stored entries. A cap of zero is clamped to one.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Number of stored entries, counting expired ones not yet swept.
    pub fn len(&self) -> BackendResult<usize> {
        Ok(self.read_entries()?.len())
    }

    pub fn is_empty(&self) -> BackendResult<bool> {
        Ok(self.read_entries()?.is_empty())
    }

    /// Snapshot of usage counters.
    pub fn stats(&self) -> CacheStats {
        let entry_count = self
            .entries
            .read()
            .map(|entries| entries.len() as u64)
            .unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count,
        }
    }

    fn read_entries(&self) -> BackendResult<RwLockReadGuard<'_, HashMap<String, Entry>>> {
        self.entries.read().map_err(|_| BackendError::LockPoisoned {
            backend: self.name.clone(),
        })
    }

    fn write_entries(&self) -> BackendResult<RwLockWriteGuard<'_, HashMap<String, Entry>>> {
        self.entries.write().map_err(|_| BackendError::LockPoisoned {
            backend: self.name.clone(),
        })
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let entries = self.read_entries()?;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(entry.payload.clone()));
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return Ok(None);
                }
            }
        }
        // Expired under the read lock; re-check under the write lock in
        // case a writer refreshed the key in between.
        let mut entries = self.write_entries()?;
        let expired = entries.get(key).map(|entry| entry.is_expired(Instant::now()));
        match expired {
            Some(true) => {
                entries.remove(key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(false) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(entries.get(key).map(|entry| entry.payload.clone()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> BackendResult<()> {
        let now = Instant::now();
        let mut entries = self.write_entries()?;
        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            let swept = before - entries.len();
            if swept > 0 {
                self.evictions.fetch_add(swept as u64, Ordering::Relaxed);
            }
            if entries.len() >= self.max_entries {
                // Still full: drop the entry closest to expiry.
                let victim = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(victim) = victim {
                    entries.remove(&victim);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                payload: value.to_vec(),
                expires_at: now + ttl,
            },
        );
        self.insertions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self, key: &str) -> BackendResult<()> {
        let mut entries = self.write_entries()?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================
