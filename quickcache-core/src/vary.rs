//! Vary-on policies and dotted-path resolution.
//!
//! The vary-on policy decides which parts of a call feed the cache key:
//! dotted paths walk from a bound argument into nested map fields, the
//! all-arguments form takes every bound value, and the callable form
//! hands the bound mapping to user code.

use crate::error::{ArgumentError, ConfigError, QuickCacheResult};
use crate::signature::{BoundArgs, Signature};
use crate::value::CacheValue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

static SEGMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid segment regex"));

/// A parsed dotted path such as `request.user.id`.
///
/// The first segment names a bound argument; the rest walk map fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryPath {
    raw: String,
    segments: Vec<String>,
}

impl VaryPath {
    /// Parse and validate a dotted path.
    ///
    /// Every segment must be an identifier, so empty paths, leading or
    /// trailing dots, and doubled dots are all rejected.
    pub fn parse(path: &str) -> Result<Self, ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::InvalidPath {
                path: path.to_string(),
                reason: "path is empty".to_string(),
            });
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        for segment in &segments {
            if !SEGMENT_PATTERN.is_match(segment) {
                return Err(ConfigError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("segment {:?} is not an identifier", segment),
                });
            }
        }
        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// The path as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The argument name this path starts from.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Walk the path against one call's bound arguments.
    pub fn resolve(&self, bound: &BoundArgs) -> QuickCacheResult<CacheValue> {
        let mut current = bound
            .get(self.root())
            .ok_or_else(|| ArgumentError::UnresolvedArgument {
                path: self.raw.clone(),
                name: self.root().to_string(),
            })?;
        for segment in &self.segments[1..] {
            current = match current {
                CacheValue::Map(_) => {
                    current
                        .field(segment)
                        .ok_or_else(|| ArgumentError::MissingAttribute {
                            path: self.raw.clone(),
                            segment: segment.clone(),
                        })?
                }
                other => {
                    return Err(ArgumentError::NotTraversable {
                        path: self.raw.clone(),
                        segment: segment.clone(),
                        kind: other.kind().to_string(),
                    }
                    .into())
                }
            };
        }
        Ok(current.clone())
    }
}

/// Signature for callable vary-on policies.
pub type VaryFn = Arc<dyn Fn(&BoundArgs) -> QuickCacheResult<Vec<CacheValue>> + Send + Sync>;

/// Which parts of a call feed the cache key.
#[derive(Clone)]
pub enum VaryOn {
    /// Every bound argument, in parameter order.
    AllArgs,
    /// The value reached by each dotted path, in declared order.
    Paths(Vec<VaryPath>),
    /// User code computes the values from the bound arguments.
    Callable(VaryFn),
}

impl VaryOn {
    /// Vary on every argument.
    pub fn all() -> Self {
        VaryOn::AllArgs
    }

    /// Vary on dotted paths.
    pub fn paths<I, S>(paths: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = paths
            .into_iter()
            .map(|p| VaryPath::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VaryOn::Paths(parsed))
    }

    /// Vary on values computed by a callable.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&BoundArgs) -> QuickCacheResult<Vec<CacheValue>> + Send + Sync + 'static,
    {
        VaryOn::Callable(Arc::new(f))
    }

    /// Check every path root against the declared parameters.
    pub fn validate_roots(&self, signature: &Signature) -> Result<(), ConfigError> {
        if let VaryOn::Paths(paths) = self {
            for path in paths {
                if !signature.has_param(path.root()) {
                    return Err(ConfigError::NotAParameter {
                        field: "vary_on".to_string(),
                        name: path.root().to_string(),
                        function: signature.function().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Evaluate the policy against one call's bound arguments.
    ///
    /// An empty path list is valid and yields no values: the function
    /// then has a single cache entry.
    pub fn evaluate(&self, bound: &BoundArgs) -> QuickCacheResult<Vec<CacheValue>> {
        match self {
            VaryOn::AllArgs => Ok(bound.in_order().iter().map(|(_, v)| v.clone()).collect()),
            VaryOn::Paths(paths) => paths.iter().map(|p| p.resolve(bound)).collect(),
            VaryOn::Callable(f) => f(bound),
        }
    }
}

impl fmt::Debug for VaryOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaryOn::AllArgs => write!(f, "AllArgs"),
            VaryOn::Paths(paths) => f.debug_tuple("Paths").field(paths).finish(),
            VaryOn::Callable(_) => write!(f, "Callable(..)"),
        }
    }
}

/// Signature for callable skip predicates.
pub type SkipFn = Arc<dyn Fn(&BoundArgs) -> QuickCacheResult<bool> + Send + Sync>;

/// Decides whether one call bypasses the cache entirely.
///
/// A skipped call reads no tier and writes no tier; the wrapped function
/// always runs.
#[derive(Clone)]
pub enum SkipPredicate {
    /// Skip when the named bound argument is truthy.
    Argument(String),
    /// Skip when user code says so.
    Callable(SkipFn),
}

impl SkipPredicate {
    pub fn argument(name: impl Into<String>) -> Self {
        SkipPredicate::Argument(name.into())
    }

    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&BoundArgs) -> QuickCacheResult<bool> + Send + Sync + 'static,
    {
        SkipPredicate::Callable(Arc::new(f))
    }

    /// Evaluate against one call's bound arguments.
    pub fn should_skip(&self, bound: &BoundArgs) -> QuickCacheResult<bool> {
        match self {
            SkipPredicate::Argument(name) => {
                let value = bound
                    .get(name)
                    .ok_or_else(|| ArgumentError::UnknownArgument {
                        function: bound.function().to_string(),
                        name: name.clone(),
                    })?;
                Ok(value.is_truthy())
            }
            SkipPredicate::Callable(f) => f(bound),
        }
    }
}

impl fmt::Debug for SkipPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipPredicate::Argument(name) => f.debug_tuple("Argument").field(name).finish(),
            SkipPredicate::Callable(_) => write!(f, "Callable(..)"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================
