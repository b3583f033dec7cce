//! In-process relational bridge for worksheet query evaluation.
//!
//! One invocation materializes a rectangular data range into an ephemeral
//! in-memory SQLite table named `sheet`, runs the caller's query against it,
//! and marshals the result set back into the worksheet value model. The
//! table lives exactly as long as the invocation; nothing is cached or
//! shared between calls, so concurrent recalculation never collides on the
//! fixed table name.
//!
//! Failures never escape as faults: every engine error or internal coercion
//! fault is logged to the caller's diagnostic sink and converted into a
//! `#VALUE!` error value at the bridge boundary.

mod bridge;
mod diag;
mod schema;

pub use bridge::{run_query, DataRow, QueryContext};
pub use diag::{DebugLog, FacadeLog};
pub use schema::{ColumnType, TableSchema};
