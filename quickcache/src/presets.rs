//! Ready-made tier arrangements.

use crate::builder::QuickCache;
use quickcache_core::error::ConfigError;
use quickcache_storage::{CacheBackend, InMemoryCache, TieredCache};
use std::sync::Arc;
use std::time::Duration;

/// The canonical two-tier arrangement: a short-lived in-process
/// `memoize` tier in front of a shared backend.
///
/// `ttl` is the shared tier's timeout and `memoize_ttl` the in-process
/// tier's. Either being zero drops that tier; both zero is a
/// configuration error. The returned builder still needs a vary-on
/// policy per call site.
pub fn tiered_quickcache(
    shared: Arc<dyn CacheBackend>,
    ttl: Duration,
    memoize_ttl: Duration,
) -> Result<QuickCache, ConfigError> {
    let memoize: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::with_name("memoize"));
    let cache = TieredCache::new(vec![(memoize, memoize_ttl), (shared, ttl)])?;
    Ok(QuickCache::new().cache(cache))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quickcache_core::signature::{Param, Signature};
    use quickcache_core::{BoundArgs, CallArgs, FnSpec, QuickCacheResult};
    use quickcache_test_utils::RecordingBackend;

    const SHARED_TTL: Duration = Duration::from_secs(300);
    const MEMOIZE_TTL: Duration = Duration::from_secs(10);

    fn make_spec() -> FnSpec {
        FnSpec::new(
            Signature::new("tests::lookup", vec![Param::required("id")]),
            "fn lookup(id: i64) -> i64 { id * 2 }",
        )
    }

    fn lookup_body(bound: &BoundArgs) -> QuickCacheResult<i64> {
        let id: i64 = bound.get_as("id")?;
        Ok(id * 2)
    }

    #[test]
    fn test_second_call_stays_in_memoize_tier() {
        let shared = RecordingBackend::new("shared");
        let cached = tiered_quickcache(shared.clone(), SHARED_TTL, MEMOIZE_TTL)
            .unwrap()
            .vary_on_all()
            .wrap(make_spec(), lookup_body)
            .unwrap();

        assert_eq!(cached.call(CallArgs::new().arg(&7i64)).unwrap(), 14);
        assert_eq!(shared.get_count(), 1);
        assert_eq!(shared.set_count(), 1);

        assert_eq!(cached.call(CallArgs::new().arg(&7i64)).unwrap(), 14);
        // Served by the memoize tier; the shared backend saw no new reads.
        assert_eq!(shared.get_count(), 1);
    }

    #[test]
    fn test_zero_memoize_ttl_reads_shared_every_call() {
        let shared = RecordingBackend::new("shared");
        let cached = tiered_quickcache(shared.clone(), SHARED_TTL, Duration::ZERO)
            .unwrap()
            .vary_on_all()
            .wrap(make_spec(), lookup_body)
            .unwrap();

        cached.call(CallArgs::new().arg(&7i64)).unwrap();
        cached.call(CallArgs::new().arg(&7i64)).unwrap();
        assert_eq!(shared.get_count(), 2);
        assert_eq!(shared.set_count(), 1);
    }

    #[test]
    fn test_both_ttls_zero_is_config_error() {
        let shared = RecordingBackend::new("shared");
        let err = tiered_quickcache(shared, Duration::ZERO, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ConfigError::NoUsableTiers));
    }

    #[test]
    fn test_shared_tier_writes_use_shared_ttl() {
        let shared = RecordingBackend::new("shared");
        let cached = tiered_quickcache(shared.clone(), SHARED_TTL, MEMOIZE_TTL)
            .unwrap()
            .vary_on_all()
            .wrap(make_spec(), lookup_body)
            .unwrap();
        cached.call(CallArgs::new().arg(&7i64)).unwrap();
        let ttls: Vec<Duration> = shared
            .ops()
            .iter()
            .filter_map(|op| match op {
                quickcache_test_utils::BackendOp::Set { ttl, .. } => Some(*ttl),
                _ => None,
            })
            .collect();
        assert_eq!(ttls, vec![SHARED_TTL]);
    }
}
