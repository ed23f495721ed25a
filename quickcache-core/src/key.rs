//! Cache key construction.
//!
//! A key binds three things together: the function's name, a hash of its
//! source snapshot, and the call's vary-on values. Keys are plain ASCII
//! with no whitespace, so any string-keyed backend accepts them.
//!
//! Key layout: `quickcache.{name}.{source_hash}/{encoded_args}`.

use crate::content_hash;
use crate::error::{ConfigError, QuickCacheResult};
use crate::signature::{BoundArgs, CallArgs, Signature};
use crate::value::CacheValue;
use crate::vary::VaryOn;
use std::fmt;

/// Namespace shared by every generated key.
const KEY_NAMESPACE: &str = "quickcache";

/// Function names longer than this are shortened in the prefix.
const MAX_NAME_LEN: usize = 40;

/// Joined vary-on encodings longer than this collapse to a single hash.
const MAX_ARGS_LEN: usize = 150;

/// Hex length of the source hash embedded in the prefix.
const SOURCE_HASH_LEN: usize = 8;

/// Hex length of the hash replacing an over-long args string.
const ARGS_HASH_LEN: usize = 32;

/// A fully-derived cache key.
///
/// Only `KeyBuilder` constructs these; the inner string is the exact key
/// handed to cache backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn new(inner: String) -> Self {
        Self(inner)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of a wrapped function: its signature plus a snapshot of its
/// source text.
///
/// The source snapshot feeds the key prefix, so editing a function's
/// body orphans its old cache entries instead of serving them.
#[derive(Debug, Clone, PartialEq)]
pub struct FnSpec {
    signature: Signature,
    source: String,
}

impl FnSpec {
    pub fn new(signature: Signature, source: impl Into<String>) -> Self {
        Self {
            signature,
            source: source.into(),
        }
    }

    /// The function name as declared in the signature.
    pub fn name(&self) -> &str {
        self.signature.function()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Derives cache keys for one wrapped function.
///
/// The prefix, including the source hash, is computed once here rather
/// than per call.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    signature: Signature,
    vary_on: VaryOn,
    prefix: String,
}

impl KeyBuilder {
    /// Build a key builder, checking the vary-on policy against the
    /// function's declared parameters.
    pub fn new(spec: &FnSpec, vary_on: VaryOn) -> Result<Self, ConfigError> {
        vary_on.validate_roots(spec.signature())?;
        Ok(Self {
            signature: spec.signature().clone(),
            vary_on,
            prefix: build_prefix(spec),
        })
    }

    /// The stable function-identity prefix every key this builder
    /// derives starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Bind one call's arguments against the function signature.
    pub fn bind(&self, args: &CallArgs) -> QuickCacheResult<BoundArgs> {
        self.signature.bind(args)
    }

    /// Derive the cache key for bound arguments.
    pub fn cache_key(&self, bound: &BoundArgs) -> QuickCacheResult<CacheKey> {
        let values = self.vary_on.evaluate(bound)?;
        let mut args = values
            .iter()
            .map(CacheValue::encode_for_key)
            .collect::<Vec<_>>()
            .join(",");
        if args.len() > MAX_ARGS_LEN {
            args = format!("H{}", content_hash(args.as_bytes(), ARGS_HASH_LEN));
        }
        Ok(CacheKey::new(format!(
            "{}.{}/{}",
            KEY_NAMESPACE, self.prefix, args
        )))
    }
}

/// The first 40 characters of the function name (".." marks truncation)
/// followed by an 8-hex source hash.
fn build_prefix(spec: &FnSpec) -> String {
    let name = spec.name();
    let shortened = if name.chars().count() > MAX_NAME_LEN {
        let head: String = name.chars().take(MAX_NAME_LEN).collect();
        format!("{}..", head)
    } else {
        name.to_string()
    };
    format!(
        "{}.{}",
        shortened,
        content_hash(spec.source().as_bytes(), SOURCE_HASH_LEN)
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Param;

    fn make_spec(name: &str, source: &str) -> FnSpec {
        FnSpec::new(
            Signature::new(
                name,
                vec![
                    Param::required("user"),
                    Param::required("label"),
                    Param::with_default("count", CacheValue::Int(1)),
                ],
            ),
            source,
        )
    }

    fn make_builder(vary_on: VaryOn) -> KeyBuilder {
        KeyBuilder::new(&make_spec("demo::describe", "fn describe() {}"), vary_on).unwrap()
    }

    fn make_args() -> CallArgs {
        CallArgs::new()
            .named_value(
                "user",
                CacheValue::map([("id", CacheValue::Int(7))]),
            )
            .named_value("label", CacheValue::Str("primary".to_string()))
    }

    #[test]
    fn test_prefix_is_name_plus_source_hash() {
        let builder = make_builder(VaryOn::all());
        let prefix = builder.prefix();
        assert!(prefix.starts_with("demo::describe."));
        let hash = &prefix["demo::describe.".len()..];
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_prefix_shortens_long_names() {
        let name = "n".repeat(60);
        let spec = FnSpec::new(
            Signature::new(name, vec![Param::required("user")]),
            "fn n() {}",
        );
        let builder = KeyBuilder::new(&spec, VaryOn::all()).unwrap();
        // 40 name chars + ".." + "." + 8 hash chars
        assert_eq!(builder.prefix().len(), 40 + 2 + 1 + 8);
        assert!(builder.prefix().contains(".."));
    }

    #[test]
    fn test_cache_key_shape() {
        let builder = make_builder(VaryOn::paths(["label"]).unwrap());
        let bound = builder.bind(&make_args()).unwrap();
        let key = builder.cache_key(&bound).unwrap();
        let expected_prefix = format!("quickcache.{}/", builder.prefix());
        assert!(key.as_str().starts_with(&expected_prefix));
        let args = &key.as_str()[expected_prefix.len()..];
        assert!(args.starts_with('u'));
        assert_eq!(args.len(), 33);
    }

    #[test]
    fn test_same_arguments_same_key() {
        let builder = make_builder(VaryOn::all());
        let first = builder.cache_key(&builder.bind(&make_args()).unwrap()).unwrap();
        let second = builder.cache_key(&builder.bind(&make_args()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_arguments_different_key() {
        let builder = make_builder(VaryOn::all());
        let first = builder.cache_key(&builder.bind(&make_args()).unwrap()).unwrap();
        let other_args = make_args().named_value("count", CacheValue::Int(2));
        let second = builder.cache_key(&builder.bind(&other_args).unwrap()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_ignored_argument_does_not_change_key() {
        let builder = make_builder(VaryOn::paths(["label"]).unwrap());
        let first = builder.cache_key(&builder.bind(&make_args()).unwrap()).unwrap();
        let other_args = make_args().named_value("count", CacheValue::Int(9));
        let second = builder.cache_key(&builder.bind(&other_args).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_source_change_changes_prefix_and_keys() {
        let a = KeyBuilder::new(&make_spec("demo::describe", "fn describe() { 1 }"), VaryOn::all())
            .unwrap();
        let b = KeyBuilder::new(&make_spec("demo::describe", "fn describe() { 2 }"), VaryOn::all())
            .unwrap();
        assert_ne!(a.prefix(), b.prefix());
        let key_a = a.cache_key(&a.bind(&make_args()).unwrap()).unwrap();
        let key_b = b.cache_key(&b.bind(&make_args()).unwrap()).unwrap();
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_over_long_args_collapse_to_hash() {
        let params: Vec<Param> = (0..6).map(|i| Param::required(format!("p{}", i))).collect();
        let spec = FnSpec::new(Signature::new("demo::wide", params), "fn wide() {}");
        let builder = KeyBuilder::new(&spec, VaryOn::all()).unwrap();
        let mut args = CallArgs::new();
        for i in 0..6 {
            args = args.value(CacheValue::Str(format!("value-{}", i)));
        }
        let key = builder.cache_key(&builder.bind(&args).unwrap()).unwrap();
        let tail = key.as_str().split('/').next_back().unwrap();
        assert!(tail.starts_with('H'));
        assert_eq!(tail.len(), 1 + 32);
    }

    #[test]
    fn test_no_vary_values_leaves_args_empty() {
        let builder = make_builder(VaryOn::paths(Vec::<String>::new()).unwrap());
        let key = builder.cache_key(&builder.bind(&make_args()).unwrap()).unwrap();
        assert!(key.as_str().ends_with('/'));
    }

    #[test]
    fn test_key_is_ascii_without_whitespace() {
        let builder = make_builder(VaryOn::all());
        let args = make_args().named_value("count", CacheValue::Str("hello world \u{1F980}".into()));
        let key = builder.cache_key(&builder.bind(&args).unwrap()).unwrap();
        assert!(key.as_str().is_ascii());
        assert!(!key.as_str().contains(char::is_whitespace));
    }

    #[test]
    fn test_builder_rejects_unknown_vary_root() {
        let spec = make_spec("demo::describe", "fn describe() {}");
        let err = KeyBuilder::new(&spec, VaryOn::paths(["nope"]).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAParameter { .. }));
    }

    #[test]
    fn test_display_matches_as_str() {
        let builder = make_builder(VaryOn::all());
        let key = builder.cache_key(&builder.bind(&make_args()).unwrap()).unwrap();
        assert_eq!(key.to_string(), key.as_str());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::signature::Param;
    use proptest::prelude::*;

    fn builder_for(count: usize, source: &str) -> KeyBuilder {
        let params: Vec<Param> = (0..count).map(|i| Param::required(format!("p{}", i))).collect();
        let spec = FnSpec::new(Signature::new("prop::subject", params), source);
        KeyBuilder::new(&spec, VaryOn::all()).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn prop_key_is_stable_across_builders(
            values in proptest::collection::vec("[a-zA-Z0-9]{0,12}", 0..5),
        ) {
            let mut args = CallArgs::new();
            for v in &values {
                args = args.value(CacheValue::Str(v.clone()));
            }
            let a = builder_for(values.len(), "fn subject() {}");
            let b = builder_for(values.len(), "fn subject() {}");
            let key_a = a.cache_key(&a.bind(&args).unwrap()).unwrap();
            let key_b = b.cache_key(&b.bind(&args).unwrap()).unwrap();
            prop_assert_eq!(key_a, key_b);
        }

        #[test]
        fn prop_args_section_is_bounded(
            values in proptest::collection::vec("[a-zA-Z0-9]{0,20}", 0..10),
        ) {
            let mut args = CallArgs::new();
            for v in &values {
                args = args.value(CacheValue::Str(v.clone()));
            }
            let builder = builder_for(values.len(), "fn subject() {}");
            let key = builder.cache_key(&builder.bind(&args).unwrap()).unwrap();
            let tail = key.as_str().split('/').next_back().unwrap();
            prop_assert!(tail.len() <= 150);
            prop_assert!(key.as_str().is_ascii());
        }

        #[test]
        fn prop_distinct_strings_produce_distinct_keys(
            a in "[a-z]{1,16}",
            b in "[a-z]{1,16}",
        ) {
            prop_assume!(a != b);
            let builder = builder_for(1, "fn subject() {}");
            let key_a = builder
                .cache_key(&builder.bind(&CallArgs::new().value(CacheValue::Str(a))).unwrap())
                .unwrap();
            let key_b = builder
                .cache_key(&builder.bind(&CallArgs::new().value(CacheValue::Str(b))).unwrap())
                .unwrap();
            prop_assert_ne!(key_a, key_b);
        }
    }
}
