//! Array-aware function evaluation core for a worksheet calculation engine.
//!
//! Ordinary scalar functions become range-capable through the broadcast
//! protocol in [`functions::broadcast`]: any registered function can accept
//! array arguments at designated positions and map element-wise over them,
//! the way implicit intersection and array formulas behave in spreadsheets.
//!
//! The function surface (`CHOOSE`, `CHOOSECOLS`, `QUERY`, and the Google
//! export passthrough) is registered through the inventory-backed registry
//! in [`functions`]; hosts evaluate with [`call_function`] after resolving
//! and evaluating arguments themselves.

pub mod functions;

pub use functions::{call_function, iter_function_specs, lookup_function};
pub use functions::{FunctionContext, FunctionImpl, FunctionSpec};
pub use gridcalc_model::{flatten_single, Array, ErrorKind, Value};
pub use gridcalc_query::{DebugLog, FacadeLog};
