//! Canonical value model for call arguments.
//!
//! `CacheValue` is the library's view of an argument: a small tree of
//! primitives that can be fingerprinted deterministically. Values convert
//! in from any `Serialize` type and back out to any `DeserializeOwned`
//! type through `serde_json`.

use crate::content_hash;
use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Hex length of the fingerprint embedded in encoded values.
pub(crate) const VALUE_HASH_LEN: usize = 32;

/// A call argument in canonical form.
///
/// Maps are ordered, so the encoded form of a value never depends on
/// insertion order. Sets keep elements as given; ordering and duplicates
/// are erased during encoding instead.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<CacheValue>),
    Set(Vec<CacheValue>),
    Map(BTreeMap<String, CacheValue>),
}

impl CacheValue {
    /// Convert any serializable value into canonical form.
    ///
    /// Non-finite floats follow `serde_json`'s rendering and arrive as
    /// `Null`; values `serde_json` cannot represent at all, such as maps
    /// with non-string keys, fail with a codec error.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        let json = serde_json::to_value(value).map_err(|e| CodecError::EncodeFailed {
            context: "call argument".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_json(json))
    }

    /// Convert a JSON value into canonical form.
    ///
    /// Numbers become `Int` when they fit in `i64`, otherwise `Float`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CacheValue::Null,
            serde_json::Value::Bool(b) => CacheValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CacheValue::Int(i)
                } else {
                    CacheValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => CacheValue::Str(s),
            serde_json::Value::Array(items) => {
                CacheValue::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(fields) => CacheValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the value back as JSON for typed extraction.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CacheValue::Null => serde_json::Value::Null,
            CacheValue::Bool(b) => serde_json::Value::Bool(*b),
            CacheValue::Int(i) => serde_json::Value::from(*i),
            CacheValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CacheValue::Str(s) => serde_json::Value::String(s.clone()),
            CacheValue::Bytes(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
            CacheValue::List(items) | CacheValue::Set(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            CacheValue::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Extract a typed value.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        serde_json::from_value(self.to_json()).map_err(|e| CodecError::DecodeFailed {
            context: format!("{} value", self.kind()),
            reason: e.to_string(),
        })
    }

    /// Name of this value's variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Null => "null",
            CacheValue::Bool(_) => "bool",
            CacheValue::Int(_) => "int",
            CacheValue::Float(_) => "float",
            CacheValue::Str(_) => "string",
            CacheValue::Bytes(_) => "bytes",
            CacheValue::List(_) => "list",
            CacheValue::Set(_) => "set",
            CacheValue::Map(_) => "map",
        }
    }

    /// Look up a named field. Only maps have fields.
    pub fn field(&self, name: &str) -> Option<&CacheValue> {
        match self {
            CacheValue::Map(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Truthiness for skip predicates: null, false, zero, and empty
    /// values are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            CacheValue::Null => false,
            CacheValue::Bool(b) => *b,
            CacheValue::Int(i) => *i != 0,
            CacheValue::Float(f) => *f != 0.0,
            CacheValue::Str(s) => !s.is_empty(),
            CacheValue::Bytes(b) => !b.is_empty(),
            CacheValue::List(items) | CacheValue::Set(items) => !items.is_empty(),
            CacheValue::Map(fields) => !fields.is_empty(),
        }
    }

    /// Build a list value.
    pub fn list<I: IntoIterator<Item = CacheValue>>(items: I) -> Self {
        CacheValue::List(items.into_iter().collect())
    }

    /// Build a set value.
    pub fn set<I: IntoIterator<Item = CacheValue>>(items: I) -> Self {
        CacheValue::Set(items.into_iter().collect())
    }

    /// Build a map value from (name, value) pairs.
    pub fn map<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CacheValue)>,
    {
        CacheValue::Map(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Encode this value for key derivation.
    ///
    /// Scalars keep a readable rendering; text, bytes, and containers
    /// collapse to a tagged fingerprint. The tags keep differently-typed
    /// values with identical bytes from colliding.
    pub fn encode_for_key(&self) -> String {
        match self {
            CacheValue::Null => "N".to_string(),
            CacheValue::Bool(b) => b.to_string(),
            CacheValue::Int(i) => i.to_string(),
            CacheValue::Float(f) => format!("{:?}", f),
            CacheValue::Str(s) => format!("u{}", content_hash(s.as_bytes(), VALUE_HASH_LEN)),
            CacheValue::Bytes(bytes) => format!("b{}", content_hash(bytes, VALUE_HASH_LEN)),
            CacheValue::List(items) => {
                let joined = items
                    .iter()
                    .map(Self::encode_for_key)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("L{}", content_hash(joined.as_bytes(), VALUE_HASH_LEN))
            }
            CacheValue::Set(items) => {
                let mut parts: Vec<String> = items.iter().map(Self::encode_for_key).collect();
                parts.sort();
                parts.dedup();
                format!(
                    "S{}",
                    content_hash(parts.join(",").as_bytes(), VALUE_HASH_LEN)
                )
            }
            CacheValue::Map(fields) => {
                let joined = fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.encode_for_key()))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("D{}", content_hash(joined.as_bytes(), VALUE_HASH_LEN))
            }
        }
    }
}

// === Conversions ===

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Bool(value)
    }
}

impl From<i32> for CacheValue {
    fn from(value: i32) -> Self {
        CacheValue::Int(i64::from(value))
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Int(value)
    }
}

impl From<u32> for CacheValue {
    fn from(value: u32) -> Self {
        CacheValue::Int(i64::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Float(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Str(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Str(value)
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        CacheValue::Bytes(value)
    }
}

impl<T: Into<CacheValue>> From<Option<T>> for CacheValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => CacheValue::Null,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================
