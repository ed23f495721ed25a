//! Quickcache - Tiered Function-Result Caching
//!
//! Wrap a function once, declare which arguments its cache key varies
//! on, and every call transparently consults an ordered chain of cache
//! tiers before running the body.
//!
//! # Design Philosophy
//!
//! Cache keys are too important to assemble by hand at every call site.
//! This crate derives them from three declared inputs: the function's
//! name, a hash of its source snapshot, and the vary-on values of the
//! call. Change the body and old entries are orphaned instead of served;
//! change an argument the key varies on and the call misses. A failing
//! backend raises, it is never folded into a miss.
//!
//! # Example
//!
//! ```ignore
//! let cache = TieredCache::single(Arc::new(InMemoryCache::new()), Duration::from_secs(60))?;
//! let base = QuickCache::new().cache(cache);
//!
//! let greet = cache_fn!(base.vary_on(["name"]), fn greet(name: String) -> String {
//!     format!("hi {name}")
//! })?;
//!
//! assert_eq!(greet.call(call_args!("Ann"))?, "hi Ann");
//! assert_eq!(greet.get_cached_value(call_args!("Ann"))?, Some("hi Ann".to_string()));
//! greet.clear(call_args!("Ann"))?;
//! ```

pub mod builder;
pub mod helper;
mod macros;
pub mod presets;

pub use builder::QuickCache;
pub use helper::{Cached, QuickCacheHelper, SetCachedValue};
pub use presets::tiered_quickcache;

// Re-export the core and storage surface so callers need one import.
pub use quickcache_core::{
    content_hash, ArgumentError, BackendError, BoundArgs, CacheKey, CacheValue, CallArgs,
    CodecError, ConfigError, FnSpec, KeyBuilder, Param, QuickCacheError, QuickCacheResult,
    Signature, SkipFn, SkipPredicate, VaryFn, VaryOn, VaryPath,
};
pub use quickcache_storage::{
    BackendResult, CacheBackend, CacheStats, InMemoryCache, Tier, TieredCache,
};
