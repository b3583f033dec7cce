use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ErrorKind;

/// A single evaluated worksheet datum.
///
/// The enum uses an explicit `{type, value}` tagged layout for stable IPC.
///
/// `Array` is the carrier used at function-call boundaries; array *cells*
/// are always scalar variants, never nested arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Empty / unset cell value.
    Blank,
    /// Boolean.
    Bool(bool),
    /// Whole number. Kept distinct from [`Value::Number`] so tabular type
    /// inference can tell INT columns from REAL columns.
    Int(i64),
    /// IEEE-754 double precision number.
    Number(f64),
    /// Plain string (not rich text).
    Text(String),
    /// Worksheet error value.
    Error(ErrorKind),
    /// Rectangular array result.
    Array(Array),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Runtime type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Blank => "blank",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Blank
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<ErrorKind> for Value {
    fn from(value: ErrorKind) -> Self {
        Value::Error(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blank => f.write_str(""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Error(e) => write!(f, "{e}"),
            // Arrays display as their top-left cell, matching how a host
            // renders an un-spilled array result.
            Value::Array(a) => match a.values.first() {
                Some(v) => fmt::Display::fmt(v, f),
                None => Ok(()),
            },
        }
    }
}

/// Immutable rectangular grid of scalar values, row-major.
///
/// Invariant: `values.len() == rows * cols`, and every row has the same
/// length by construction. Functions return new arrays instead of mutating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Array {
    pub rows: usize,
    pub cols: usize,
    /// Cell values in row-major order.
    pub values: Vec<Value>,
}

impl Array {
    pub fn new(rows: usize, cols: usize, values: Vec<Value>) -> Self {
        debug_assert_eq!(rows * cols, values.len());
        Self { rows, cols, values }
    }

    /// The 0×0 array, returned where the original data carries nothing to
    /// evaluate.
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds an array from rows, validating that they form a rectangle.
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Result<Self, ErrorKind> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(row_count * col_count);
        for row in rows {
            if row.len() != col_count {
                return Err(ErrorKind::Value);
            }
            values.extend(row);
        }
        Ok(Self::new(row_count, col_count, values))
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// First cell of the array, or `Blank` when empty.
    pub fn top_left(&self) -> Value {
        self.values.first().cloned().unwrap_or(Value::Blank)
    }
}

/// Reduces a value to a single scalar by repeatedly taking the top-left cell
/// of any array, the way implicit intersection collapses a range argument.
///
/// An empty array flattens to `Blank`.
pub fn flatten_single(mut value: Value) -> Value {
    loop {
        match value {
            Value::Array(arr) => match arr.values.into_iter().next() {
                Some(first) => value = first,
                None => return Value::Blank,
            },
            scalar => return scalar,
        }
    }
}
