//! Declarative configuration for cached functions.
//!
//! A `QuickCache` value is assembled once (typically at startup), then
//! cloned and refined per call site: the clone keeps the shared tiers
//! while each site adds its own vary-on policy and skip predicate. `wrap`
//! validates the whole configuration before any call runs.

use crate::helper::{Cached, QuickCacheHelper};
use quickcache_core::error::ConfigError;
use quickcache_core::key::{FnSpec, KeyBuilder};
use quickcache_core::signature::BoundArgs;
use quickcache_core::value::CacheValue;
use quickcache_core::vary::{SkipPredicate, VaryFn, VaryOn};
use quickcache_core::QuickCacheResult;
use quickcache_storage::{CacheBackend, TieredCache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Unparsed vary-on configuration. Paths are stored as written and
/// validated at `wrap` time, so every configuration mistake surfaces in
/// one place.
#[derive(Clone)]
enum VaryConfig {
    All,
    Paths(Vec<String>),
    Callable(VaryFn),
}

impl fmt::Debug for VaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaryConfig::All => write!(f, "All"),
            VaryConfig::Paths(paths) => f.debug_tuple("Paths").field(paths).finish(),
            VaryConfig::Callable(_) => write!(f, "Callable(..)"),
        }
    }
}

/// Builder for cached functions.
///
/// Required before `wrap`: a cache (`cache` or `tiers`) and a vary-on
/// policy. The skip predicate is optional.
#[derive(Debug, Clone, Default)]
pub struct QuickCache {
    cache: Option<TieredCache>,
    vary_on: Option<VaryConfig>,
    skip: Option<SkipPredicate>,
}

impl QuickCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already-built tiered cache.
    pub fn cache(mut self, cache: TieredCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the tiered cache from (backend, TTL) pairs, fastest first.
    /// Zero-TTL pairs are dropped.
    pub fn tiers(self, pairs: Vec<(Arc<dyn CacheBackend>, Duration)>) -> Result<Self, ConfigError> {
        Ok(self.cache(TieredCache::new(pairs)?))
    }

    /// Vary the cache key on these dotted paths.
    pub fn vary_on<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vary_on = Some(VaryConfig::Paths(
            paths.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Vary the cache key on every argument.
    pub fn vary_on_all(mut self) -> Self {
        self.vary_on = Some(VaryConfig::All);
        self
    }

    /// Vary the cache key on values computed from the bound arguments.
    pub fn vary_on_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&BoundArgs) -> QuickCacheResult<Vec<CacheValue>> + Send + Sync + 'static,
    {
        self.vary_on = Some(VaryConfig::Callable(Arc::new(f)));
        self
    }

    /// Bypass the cache whenever this argument is truthy.
    pub fn skip_arg(mut self, name: impl Into<String>) -> Self {
        self.skip = Some(SkipPredicate::argument(name));
        self
    }

    /// Bypass the cache whenever this predicate returns true.
    pub fn skip_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&BoundArgs) -> QuickCacheResult<bool> + Send + Sync + 'static,
    {
        self.skip = Some(SkipPredicate::callable(f));
        self
    }

    /// Finalize the configuration around one function.
    ///
    /// Fails when the cache or vary-on policy is missing, when a vary-on
    /// path is malformed or roots at no parameter, or when the skip
    /// argument names no parameter. Nothing here runs per call.
    pub fn wrap<T, F>(self, spec: FnSpec, function: F) -> Result<Cached<T>, ConfigError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&BoundArgs) -> QuickCacheResult<T> + Send + Sync + 'static,
    {
        let cache = self.cache.ok_or_else(|| ConfigError::MissingRequired {
            field: "cache".to_string(),
        })?;
        let vary_on = match self.vary_on {
            Some(VaryConfig::All) => VaryOn::all(),
            Some(VaryConfig::Paths(paths)) => VaryOn::paths(paths)?,
            Some(VaryConfig::Callable(f)) => VaryOn::Callable(f),
            None => {
                return Err(ConfigError::MissingRequired {
                    field: "vary_on".to_string(),
                })
            }
        };
        if let Some(SkipPredicate::Argument(name)) = &self.skip {
            if !spec.signature().has_param(name) {
                return Err(ConfigError::NotAParameter {
                    field: "skip_arg".to_string(),
                    name: name.clone(),
                    function: spec.name().to_string(),
                });
            }
        }
        let key_builder = KeyBuilder::new(&spec, vary_on)?;
        Ok(Cached::new(
            QuickCacheHelper::new(&spec, key_builder, self.skip, cache),
            Arc::new(function),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
