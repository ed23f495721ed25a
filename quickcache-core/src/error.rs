//! Error types for quickcache operations

use thiserror::Error;

/// Configuration errors, raised when a cached function is assembled.
///
/// These never occur per call: a successfully wrapped function cannot
/// hit them again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid vary-on path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{field} refers to {name:?}, which is not a parameter of {function}")]
    NotAParameter {
        field: String,
        name: String,
        function: String,
    },

    #[error("No cache tiers remain after dropping zero-timeout tiers")]
    NoUsableTiers,
}

/// Argument binding and vary-on resolution errors.
///
/// Raised per call, always before any cache backend is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Unknown argument {name:?} for {function}")]
    UnknownArgument { function: String, name: String },

    #[error("Missing required argument {name:?} for {function}")]
    MissingArgument { function: String, name: String },

    #[error("Duplicate value for argument {name:?} of {function}")]
    DuplicateArgument { function: String, name: String },

    #[error("{function} takes at most {expected} positional arguments, got {got}")]
    TooManyPositional {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Vary-on path {path:?} references no bound argument {name:?}")]
    UnresolvedArgument { path: String, name: String },

    #[error("Vary-on path {path:?} has no attribute {segment:?}")]
    MissingAttribute { path: String, segment: String },

    #[error("Vary-on path {path:?} cannot traverse {kind} value at {segment:?}")]
    NotTraversable {
        path: String,
        segment: String,
        kind: String,
    },
}

/// Encode/decode errors at the cached-payload boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode value for {context}: {reason}")]
    EncodeFailed { context: String, reason: String },

    #[error("Failed to decode cached payload for {context}: {reason}")]
    DecodeFailed { context: String, reason: String },
}

/// Cache backend errors.
///
/// Backends surface these to callers unchanged; a failing backend is
/// never reported as a cache miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Cache backend {backend} lock poisoned")]
    LockPoisoned { backend: String },

    #[error("Cache backend {backend} failed during {op}: {reason}")]
    OperationFailed {
        backend: String,
        op: String,
        reason: String,
    },
}

/// Master error type for all quickcache errors
#[derive(Debug, Clone, Error)]
pub enum QuickCacheError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type alias for quickcache operations
pub type QuickCacheResult<T> = Result<T, QuickCacheError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_missing_required() {
        let err = ConfigError::MissingRequired {
            field: "vary_on".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required configuration field: vary_on"
        );
    }

    #[test]
    fn test_config_error_display_not_a_parameter() {
        let err = ConfigError::NotAParameter {
            field: "skip_arg".to_string(),
            name: "force".to_string(),
            function: "greet".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "skip_arg refers to \"force\", which is not a parameter of greet"
        );
    }

    #[test]
    fn test_argument_error_display_unknown() {
        let err = ArgumentError::UnknownArgument {
            function: "greet".to_string(),
            name: "nope".to_string(),
        };
        assert!(err.to_string().contains("Unknown argument"));
        assert!(err.to_string().contains("greet"));
    }

    #[test]
    fn test_argument_error_display_too_many_positional() {
        let err = ArgumentError::TooManyPositional {
            function: "greet".to_string(),
            expected: 1,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "greet takes at most 1 positional arguments, got 3"
        );
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::DecodeFailed {
            context: "greet".to_string(),
            reason: "expected string".to_string(),
        };
        assert!(err.to_string().contains("Failed to decode cached payload"));
        assert!(err.to_string().contains("expected string"));
    }

    #[test]
    fn test_backend_error_display_lock_poisoned() {
        let err = BackendError::LockPoisoned {
            backend: "memory".to_string(),
        };
        assert_eq!(err.to_string(), "Cache backend memory lock poisoned");
    }

    #[test]
    fn test_master_error_from_variants() {
        let config: QuickCacheError = ConfigError::NoUsableTiers.into();
        assert!(matches!(config, QuickCacheError::Config(_)));

        let argument: QuickCacheError = ArgumentError::MissingArgument {
            function: "greet".to_string(),
            name: "name".to_string(),
        }
        .into();
        assert!(matches!(argument, QuickCacheError::Argument(_)));

        let codec: QuickCacheError = CodecError::EncodeFailed {
            context: "greet".to_string(),
            reason: "loop".to_string(),
        }
        .into();
        assert!(matches!(codec, QuickCacheError::Codec(_)));

        let backend: QuickCacheError = BackendError::OperationFailed {
            backend: "redis".to_string(),
            op: "get".to_string(),
            reason: "connection refused".to_string(),
        }
        .into();
        assert!(matches!(backend, QuickCacheError::Backend(_)));
    }

    #[test]
    fn test_master_error_display_wraps_inner() {
        let err: QuickCacheError = ConfigError::MissingRequired {
            field: "cache".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Config error: Missing required configuration field: cache"
        );
    }
}
