//! Call-site macros.
//!
//! `cache_fn!` is the declaration-side sugar: it defines a plain
//! function, captures its name, parameter list, and source text as an
//! `FnSpec`, and hands everything to `QuickCache::wrap`. `call_args!`
//! is the call-side sugar for assembling positional and named arguments.

/// Assemble [`CallArgs`](crate::CallArgs) from positional and `name =`
/// named arguments.
///
/// ```ignore
/// let args = call_args!("Ann", force = true);
/// ```
#[macro_export]
macro_rules! call_args {
    // Step rules stay above the catch-all entry: a recursive `@step`
    // call is itself a plain token sequence and would match it.
    (@step $args:expr, $name:ident = $value:expr, $($rest:tt)*) => {{
        let args = $args.named_arg(stringify!($name), &$value);
        $crate::call_args!(@step args, $($rest)*)
    }};
    (@step $args:expr, $name:ident = $value:expr) => {
        $args.named_arg(stringify!($name), &$value)
    };
    (@step $args:expr, $value:expr, $($rest:tt)*) => {{
        let args = $args.arg(&$value);
        $crate::call_args!(@step args, $($rest)*)
    }};
    (@step $args:expr, $value:expr) => {
        $args.arg(&$value)
    };
    (@step $args:expr,) => {
        $args
    };
    () => {
        $crate::CallArgs::new()
    };
    ($($rest:tt)*) => {{
        let args = $crate::CallArgs::new();
        $crate::call_args!(@step args, $($rest)*)
    }};
}

/// Define a function and wrap it in a cache in one declaration.
///
/// Parameters may carry `= default` values; defaults participate in
/// binding and key derivation but not in the generated function's own
/// signature, which callers never invoke directly anyway. The stringified
/// declaration doubles as the source snapshot, so editing the body (or a
/// default) re-keys the cache.
///
/// Evaluates to `Result<Cached<Ret>, ConfigError>`.
///
/// ```ignore
/// let greet = cache_fn!(base.vary_on(["name"]), fn greet(name: String) -> String {
///     format!("hi {name}")
/// })?;
/// ```
#[macro_export]
macro_rules! cache_fn {
    ($builder:expr, fn $name:ident($($param:ident: $ty:ty $(= $default:expr)?),* $(,)?) -> $ret:ty $body:block) => {{
        fn $name($($param: $ty),*) -> $ret $body
        let wrapped: ::std::result::Result<$crate::Cached<$ret>, $crate::ConfigError> = (|| {
            let params = vec![
                $($crate::cache_fn!(@param $param: $ty $(= $default)?)),*
            ];
            let spec = $crate::FnSpec::new(
                $crate::Signature::new(
                    concat!(module_path!(), "::", stringify!($name)),
                    params,
                ),
                stringify!(fn $name($($param: $ty $(= $default)?),*) -> $ret $body),
            );
            $builder.wrap(spec, move |bound: &$crate::BoundArgs| {
                $(let $param: $ty = bound.get_as(stringify!($param))?;)*
                ::std::result::Result::Ok($name($($param),*))
            })
        })();
        wrapped
    }};
    (@param $param:ident: $ty:ty) => {
        $crate::Param::required(stringify!($param))
    };
    (@param $param:ident: $ty:ty = $default:expr) => {
        $crate::Param::with_default(
            stringify!($param),
            $crate::CacheValue::from_serialize::<$ty>(&$default).map_err(|e| {
                $crate::ConfigError::InvalidValue {
                    field: stringify!($param).to_string(),
                    value: stringify!($default).to_string(),
                    reason: e.to_string(),
                }
            })?,
        )
    };
}

// ============================================================================
// Tests
// ============================================================================
