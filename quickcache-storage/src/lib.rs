//! Quickcache Storage - Cache Backends and the Tiered Adapter
//!
//! Defines the backend abstraction the call surface caches through, an
//! in-memory TTL backend for the process-local tier, and the tiered
//! adapter that chains backends with per-tier timeouts and write-through
//! promotion.
//!
//! # Design Philosophy
//!
//! Backends store opaque bytes under string keys; they never see value
//! types or key semantics. Everything a backend can get wrong is an
//! explicit error: a failing backend is never reported as a cache miss,
//! so callers can tell "not cached" from "cache unavailable".

pub mod backend;
pub mod memory;
pub mod tiered;

// Re-export the storage surface for the facade crate
pub use backend::{BackendResult, CacheBackend, CacheStats};
pub use memory::InMemoryCache;
pub use tiered::{Tier, TieredCache};
