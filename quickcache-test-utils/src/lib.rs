//! Test utilities for quickcache: recording and failing cache backends
//! plus small argument fixtures shared by integration tests.

use quickcache_core::error::BackendError;
use quickcache_core::CacheValue;
use quickcache_storage::{BackendResult, CacheBackend};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One observed backend operation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    Get { key: String },
    Set { key: String, ttl: Duration },
    Delete { key: String },
}

/// Cache backend that stores entries in memory (ignoring expiry) and
/// records every operation for assertions.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    name: String,
    entries: Mutex<HashMap<String, Vec<u8>>>,
    ops: Mutex<Vec<BackendOp>>,
}

impl RecordingBackend {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            ..Default::default()
        })
    }

    /// Pre-populate an entry without recording an operation.
    pub fn seed(&self, key: &str, value: &[u8]) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_vec());
        }
    }

    /// Every operation observed so far.
    pub fn ops(&self) -> Vec<BackendOp> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    /// Forget recorded operations, keeping stored entries.
    pub fn reset_ops(&self) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.clear();
        }
    }

    pub fn get_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, BackendOp::Get { .. }))
            .count()
    }

    pub fn set_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, BackendOp::Set { .. }))
            .count()
    }

    /// Whether a key is currently stored.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Payload currently stored under a key.
    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn record(&self, op: BackendOp) -> BackendResult<()> {
        self.ops
            .lock()
            .map_err(|_| BackendError::LockPoisoned {
                backend: self.name.clone(),
            })?
            .push(op);
        Ok(())
    }

    fn lock_entries(&self) -> BackendResult<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries.lock().map_err(|_| BackendError::LockPoisoned {
            backend: self.name.clone(),
        })
    }
}

impl CacheBackend for RecordingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        self.record(BackendOp::Get {
            key: key.to_string(),
        })?;
        Ok(self.lock_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> BackendResult<()> {
        self.record(BackendOp::Set {
            key: key.to_string(),
            ttl,
        })?;
        self.lock_entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> BackendResult<()> {
        self.record(BackendOp::Delete {
            key: key.to_string(),
        })?;
        self.lock_entries()?.remove(key);
        Ok(())
    }
}

/// Cache backend whose every operation fails.
#[derive(Debug)]
pub struct FailingBackend {
    name: String,
}

impl FailingBackend {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }

    fn fail(&self, op: &str) -> BackendError {
        BackendError::OperationFailed {
            backend: self.name.clone(),
            op: op.to_string(),
            reason: "injected failure".to_string(),
        }
    }
}

impl CacheBackend for FailingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _key: &str) -> BackendResult<Option<Vec<u8>>> {
        Err(self.fail("get"))
    }

    fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> BackendResult<()> {
        Err(self.fail("set"))
    }

    fn delete(&self, _key: &str) -> BackendResult<()> {
        Err(self.fail("delete"))
    }
}

/// A nested user argument for dotted-path tests.
pub fn user_fixture(id: i64, rev: &str) -> CacheValue {
    CacheValue::map([
        ("id", CacheValue::Int(id)),
        ("rev", CacheValue::Str(rev.to_string())),
        ("active", CacheValue::Bool(true)),
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_backend_roundtrip_and_ops() {
        let backend = RecordingBackend::new("test");
        backend.set("k", b"v", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(backend.get("absent").unwrap(), None);
        assert_eq!(
            backend.ops(),
            vec![
                BackendOp::Set {
                    key: "k".to_string(),
                    ttl: Duration::from_secs(5),
                },
                BackendOp::Get {
                    key: "k".to_string(),
                },
                BackendOp::Get {
                    key: "absent".to_string(),
                },
            ]
        );
        assert_eq!(backend.get_count(), 2);
        assert_eq!(backend.set_count(), 1);
    }

    #[test]
    fn test_seed_and_reset_leave_no_ops() {
        let backend = RecordingBackend::new("test");
        backend.seed("k", b"v");
        assert!(backend.ops().is_empty());
        backend.get("k").unwrap();
        backend.reset_ops();
        assert!(backend.ops().is_empty());
        assert!(backend.contains("k"));
    }

    #[test]
    fn test_failing_backend_fails_every_operation() {
        let backend = FailingBackend::new("down");
        assert!(backend.get("k").is_err());
        assert!(backend.set("k", b"v", Duration::from_secs(1)).is_err());
        assert!(backend.delete("k").is_err());
    }

    #[test]
    fn test_user_fixture_shape() {
        let user = user_fixture(7, "3-abc");
        assert_eq!(user.field("id"), Some(&CacheValue::Int(7)));
        assert_eq!(user.field("rev"), Some(&CacheValue::Str("3-abc".to_string())));
    }
}
