use std::collections::HashMap;
use std::sync::OnceLock;

use gridcalc_model::{ErrorKind, Value};
use gridcalc_query::{DebugLog, FacadeLog};

pub mod broadcast;
pub mod matrix;

// Built-in functions registered with the inventory-backed registry live in
// dedicated modules to avoid merge conflicts.
mod builtins_query;
mod builtins_select;

pub(crate) const VAR_ARGS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    NonVolatile,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadSafety {
    ThreadSafe,
    NotThreadSafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySupport {
    ScalarOnly,
    SupportsArrays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Any,
    Number,
    Text,
    Bool,
}

/// Host-provided evaluation context.
///
/// Arguments arrive already evaluated (the host is eager); the context only
/// carries the surrounding cell metadata and collaborator hooks. Every
/// method has a default so minimal hosts implement nothing.
pub trait FunctionContext {
    /// Diagnostic sink for functions that log one line per invocation.
    ///
    /// Defaults to the `log`-facade adapter.
    fn debug_log(&self) -> &dyn DebugLog {
        static FACADE: FacadeLog = FacadeLog;
        &FACADE
    }

    /// Originating cell in A1 form, for diagnostic context.
    fn current_cell(&self) -> Option<&str> {
        None
    }

    /// Re-evaluates a formula string on behalf of the export passthrough
    /// function. Hosts without a parser return `None`.
    fn evaluate_formula(&self, _formula: &str) -> Option<Value> {
        None
    }
}

pub type FunctionImpl = fn(&dyn FunctionContext, &[Value]) -> Value;

#[derive(Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub volatility: Volatility,
    pub thread_safety: ThreadSafety,
    pub array_support: ArraySupport,
    pub return_type: ValueType,
    pub arg_types: &'static [ValueType],
    pub implementation: FunctionImpl,
}

inventory::collect!(FunctionSpec);

/// Iterate all [`FunctionSpec`] registrations collected via [`inventory`].
///
/// Primarily intended for cross-crate test coverage over the registered
/// surface.
pub fn iter_function_specs() -> impl Iterator<Item = &'static FunctionSpec> {
    inventory::iter::<FunctionSpec>.into_iter()
}

fn registry() -> &'static HashMap<String, &'static FunctionSpec> {
    static REGISTRY: OnceLock<HashMap<String, &'static FunctionSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        for spec in inventory::iter::<FunctionSpec> {
            map.insert(spec.name.to_ascii_uppercase(), spec);
        }
        map
    })
}

pub fn lookup_function(name: &str) -> Option<&'static FunctionSpec> {
    let upper = name.to_ascii_uppercase();
    if let Some(spec) = registry().get(&upper).copied() {
        return Some(spec);
    }

    // Excel stores newer functions in files with an `_xlfn.` prefix (e.g.
    // `_xlfn.CHOOSECOLS`). For evaluation these are aliases of the
    // unprefixed built-in.
    if let Some(stripped) = upper.strip_prefix("_XLFN.") {
        return registry().get(stripped).copied();
    }

    None
}

pub fn call_function(ctx: &dyn FunctionContext, name: &str, args: &[Value]) -> Value {
    let spec = match lookup_function(name) {
        Some(spec) => spec,
        None => return Value::Error(ErrorKind::Name),
    };

    if args.len() < spec.min_args || args.len() > spec.max_args {
        return Value::Error(ErrorKind::Value);
    }

    (spec.implementation)(ctx, args)
}
