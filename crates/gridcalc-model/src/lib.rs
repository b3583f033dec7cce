//! `gridcalc-model` defines the evaluated value model shared by the
//! calculation engine and its collaborators.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the function-evaluation core (broadcast, selection, query bridging)
//! - host evaluators marshalling results into cells
//! - IPC boundaries via `serde` (JSON-safe schema)

mod error;
mod value;

pub use error::ErrorKind;
pub use value::{flatten_single, Array, Value};
