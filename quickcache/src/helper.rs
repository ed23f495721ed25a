//! The per-call cache flow around one wrapped function.
//!
//! `QuickCacheHelper` owns the untyped flow (bind, skip, key, tier I/O)
//! and `Cached<T>` layers the serde payload codec and the public call
//! surface on top. Both are immutable after construction, so sharing
//! them across threads needs no locking.

use quickcache_core::error::CodecError;
use quickcache_core::key::{CacheKey, FnSpec, KeyBuilder};
use quickcache_core::signature::{BoundArgs, CallArgs};
use quickcache_core::vary::SkipPredicate;
use quickcache_core::QuickCacheResult;
use quickcache_storage::TieredCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Untyped helper binding one function to its cache configuration.
#[derive(Debug, Clone)]
pub struct QuickCacheHelper {
    name: String,
    key_builder: KeyBuilder,
    skip: Option<SkipPredicate>,
    cache: TieredCache,
}

impl QuickCacheHelper {
    pub(crate) fn new(
        spec: &FnSpec,
        key_builder: KeyBuilder,
        skip: Option<SkipPredicate>,
        cache: TieredCache,
    ) -> Self {
        Self {
            name: spec.name().to_string(),
            key_builder,
            skip,
            cache,
        }
    }

    /// The wrapped function's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable function-identity prefix shared by every key this helper
    /// derives.
    pub fn prefix(&self) -> &str {
        self.key_builder.prefix()
    }

    /// Bind call arguments against the wrapped function's signature.
    pub fn bind(&self, args: &CallArgs) -> QuickCacheResult<BoundArgs> {
        self.key_builder.bind(args)
    }

    /// Evaluate the skip predicate for bound arguments.
    pub fn should_skip(&self, bound: &BoundArgs) -> QuickCacheResult<bool> {
        match &self.skip {
            Some(predicate) => predicate.should_skip(bound),
            None => Ok(false),
        }
    }

    /// Derive the cache key for bound arguments.
    pub fn cache_key(&self, bound: &BoundArgs) -> QuickCacheResult<CacheKey> {
        self.key_builder.cache_key(bound)
    }

    fn lookup(&self, key: &CacheKey) -> QuickCacheResult<Option<Vec<u8>>> {
        Ok(self.cache.get(key.as_str())?)
    }

    fn store(&self, key: &CacheKey, payload: &[u8]) -> QuickCacheResult<()> {
        Ok(self.cache.set(key.as_str(), payload)?)
    }

    fn remove(&self, key: &CacheKey) -> QuickCacheResult<()> {
        Ok(self.cache.delete(key.as_str())?)
    }
}

/// A wrapped function with transparent result caching.
pub struct Cached<T> {
    helper: QuickCacheHelper,
    function: Arc<dyn Fn(&BoundArgs) -> QuickCacheResult<T> + Send + Sync>,
}

impl<T> Cached<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(
        helper: QuickCacheHelper,
        function: Arc<dyn Fn(&BoundArgs) -> QuickCacheResult<T> + Send + Sync>,
    ) -> Self {
        Self { helper, function }
    }

    /// Call the wrapped function through the cache.
    ///
    /// A skipped call runs the body directly and touches no tier.
    /// Otherwise a hit returns the decoded cached value; a miss runs the
    /// body and stores the result in every tier.
    pub fn call(&self, args: CallArgs) -> QuickCacheResult<T> {
        let bound = self.helper.bind(&args)?;
        if self.helper.should_skip(&bound)? {
            tracing::debug!(function = self.helper.name(), "cache skipped");
            return (self.function)(&bound);
        }
        let key = self.helper.cache_key(&bound)?;
        if let Some(payload) = self.helper.lookup(&key)? {
            tracing::debug!(function = self.helper.name(), key = %key, "cache hit");
            return decode_payload(self.helper.name(), &payload);
        }
        tracing::debug!(function = self.helper.name(), key = %key, "cache miss");
        let value = (self.function)(&bound)?;
        let payload = encode_payload(self.helper.name(), &value)?;
        self.helper.store(&key, &payload)?;
        tracing::debug!(function = self.helper.name(), key = %key, "cache store");
        Ok(value)
    }

    /// Delete the entry a call with these arguments would read.
    pub fn clear(&self, args: CallArgs) -> QuickCacheResult<()> {
        let bound = self.helper.bind(&args)?;
        let key = self.helper.cache_key(&bound)?;
        tracing::debug!(function = self.helper.name(), key = %key, "cache clear");
        self.helper.remove(&key)
    }

    /// The key a call with these arguments would use.
    pub fn get_cache_key(&self, args: CallArgs) -> QuickCacheResult<CacheKey> {
        let bound = self.helper.bind(&args)?;
        self.helper.cache_key(&bound)
    }

    /// Read the cached value without computing on a miss.
    ///
    /// Returns `Ok(None)` when no tier holds the key. The skip predicate
    /// is not consulted here.
    pub fn get_cached_value(&self, args: CallArgs) -> QuickCacheResult<Option<T>> {
        let bound = self.helper.bind(&args)?;
        let key = self.helper.cache_key(&bound)?;
        match self.helper.lookup(&key)? {
            Some(payload) => Ok(Some(decode_payload(self.helper.name(), &payload)?)),
            None => Ok(None),
        }
    }

    /// Write a value under the key these arguments produce, without
    /// calling the function: `cached.set_cached_value(args)?.to(&value)?`.
    pub fn set_cached_value(&self, args: CallArgs) -> QuickCacheResult<SetCachedValue<'_, T>> {
        let bound = self.helper.bind(&args)?;
        let key = self.helper.cache_key(&bound)?;
        Ok(SetCachedValue {
            helper: &self.helper,
            key,
            _value: PhantomData,
        })
    }

    /// Stable function-identity prefix shared by this function's keys.
    pub fn prefix(&self) -> &str {
        self.helper.prefix()
    }

    /// The wrapped function's name.
    pub fn name(&self) -> &str {
        self.helper.name()
    }
}

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            helper: self.helper.clone(),
            function: Arc::clone(&self.function),
        }
    }
}

impl<T> fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cached")
            .field("function", &self.helper.name())
            .field("prefix", &self.helper.prefix())
            .finish()
    }
}

/// Terminal step of `set_cached_value`.
pub struct SetCachedValue<'a, T> {
    helper: &'a QuickCacheHelper,
    key: CacheKey,
    _value: PhantomData<T>,
}

impl<T> SetCachedValue<'_, T>
where
    T: Serialize,
{
    /// Store the value in every tier.
    pub fn to(self, value: &T) -> QuickCacheResult<()> {
        let payload = encode_payload(self.helper.name(), value)?;
        self.helper.store(&self.key, &payload)?;
        tracing::debug!(function = self.helper.name(), key = %self.key, "cache store");
        Ok(())
    }
}

fn encode_payload<T: Serialize>(function: &str, value: &T) -> QuickCacheResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        CodecError::EncodeFailed {
            context: function.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn decode_payload<T: DeserializeOwned>(function: &str, payload: &[u8]) -> QuickCacheResult<T> {
    serde_json::from_slice(payload).map_err(|e| {
        CodecError::DecodeFailed {
            context: function.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

// ============================================================================
// Tests
// ============================================================================
