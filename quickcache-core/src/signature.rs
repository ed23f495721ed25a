//! Function signatures and call-argument binding.
//!
//! A `Signature` declares ordered parameters with optional defaults,
//! `CallArgs` carries one call's positional and named arguments, and
//! `bind` produces the name-to-value mapping the vary-on layer resolves
//! against.

use crate::error::{ArgumentError, CodecError, QuickCacheError, QuickCacheResult};
use crate::value::CacheValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    default: Option<CacheValue>,
}

impl Param {
    /// A parameter the caller must supply.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter filled from a default when the caller omits it.
    pub fn with_default(name: impl Into<String>, default: CacheValue) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> Option<&CacheValue> {
        self.default.as_ref()
    }
}

/// Arguments for one call: positional values plus named values.
///
/// Conversion failures during construction are carried until `bind`, so
/// call sites can assemble arguments without handling errors mid-chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<CacheValue>,
    named: Vec<(String, CacheValue)>,
    defect: Option<CodecError>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument, converting it to canonical form.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match CacheValue::from_serialize(value) {
            Ok(v) => self.positional.push(v),
            Err(e) => self.record_defect(e),
        }
        self
    }

    /// Append a named argument, converting it to canonical form.
    pub fn named_arg<T: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        match CacheValue::from_serialize(value) {
            Ok(v) => self.named.push((name.into(), v)),
            Err(e) => self.record_defect(e),
        }
        self
    }

    /// Append an already-canonical positional argument.
    pub fn value(mut self, value: CacheValue) -> Self {
        self.positional.push(value);
        self
    }

    /// Append an already-canonical named argument.
    pub fn named_value(mut self, name: impl Into<String>, value: CacheValue) -> Self {
        self.named.push((name.into(), value));
        self
    }

    pub fn positional(&self) -> &[CacheValue] {
        &self.positional
    }

    pub fn named(&self) -> &[(String, CacheValue)] {
        &self.named
    }

    fn record_defect(&mut self, defect: CodecError) {
        if self.defect.is_none() {
            self.defect = Some(defect);
        }
    }
}

/// The name-to-value mapping for one call, in declared parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs {
    function: String,
    values: Vec<(String, CacheValue)>,
}

impl BoundArgs {
    /// Name of the function these arguments were bound against.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Value bound to a parameter name.
    pub fn get(&self, name: &str) -> Option<&CacheValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Typed extraction of a bound argument.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> QuickCacheResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| ArgumentError::UnknownArgument {
                function: self.function.clone(),
                name: name.to_string(),
            })?;
        value.extract().map_err(QuickCacheError::from)
    }

    /// All bound values in declared parameter order.
    pub fn in_order(&self) -> &[(String, CacheValue)] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered parameter list for one function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    function: String,
    params: Vec<Param>,
}

impl Signature {
    pub fn new(function: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            function: function.into(),
            params,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Whether a parameter with this name is declared.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name() == name)
    }

    /// Bind call arguments to parameter names.
    ///
    /// Positional values fill parameters in declaration order, named
    /// values fill by name, and defaults cover the rest. Arguments that
    /// failed canonical conversion when the `CallArgs` was assembled
    /// surface here as their original codec error.
    pub fn bind(&self, args: &CallArgs) -> QuickCacheResult<BoundArgs> {
        if let Some(defect) = &args.defect {
            return Err(defect.clone().into());
        }
        if args.positional.len() > self.params.len() {
            return Err(ArgumentError::TooManyPositional {
                function: self.function.clone(),
                expected: self.params.len(),
                got: args.positional.len(),
            }
            .into());
        }

        let mut slots: Vec<Option<CacheValue>> = vec![None; self.params.len()];
        for (i, value) in args.positional.iter().enumerate() {
            slots[i] = Some(value.clone());
        }
        for (name, value) in &args.named {
            let index = self
                .params
                .iter()
                .position(|p| p.name() == name.as_str())
                .ok_or_else(|| ArgumentError::UnknownArgument {
                    function: self.function.clone(),
                    name: name.clone(),
                })?;
            if slots[index].is_some() {
                return Err(ArgumentError::DuplicateArgument {
                    function: self.function.clone(),
                    name: name.clone(),
                }
                .into());
            }
            slots[index] = Some(value.clone());
        }

        let mut values = Vec::with_capacity(self.params.len());
        for (param, slot) in self.params.iter().zip(slots) {
            let value = match slot {
                Some(v) => v,
                None => match param.default_value() {
                    Some(default) => default.clone(),
                    None => {
                        return Err(ArgumentError::MissingArgument {
                            function: self.function.clone(),
                            name: param.name().to_string(),
                        }
                        .into())
                    }
                },
            };
            values.push((param.name().to_string(), value));
        }

        Ok(BoundArgs {
            function: self.function.clone(),
            values,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================
