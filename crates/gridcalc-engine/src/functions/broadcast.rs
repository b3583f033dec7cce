use std::ops::Range;

use gridcalc_model::{flatten_single, Array, ErrorKind, Value};

use crate::functions::{FunctionContext, FunctionImpl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Shape {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
}

pub(crate) fn value_shape(value: &Value) -> Option<Shape> {
    match value {
        Value::Array(arr) => Some(Shape {
            rows: arr.rows,
            cols: arr.cols,
        }),
        _ => None,
    }
}

/// Shape of the first array among the broadcast-eligible positions, which
/// fixes the output dimensions for the whole call.
pub(crate) fn primary_shape(args: &[Value], eligible: &Range<usize>) -> Option<Shape> {
    for index in eligible.clone() {
        let Some(value) = args.get(index) else {
            break;
        };
        if let Some(shape) = value_shape(value) {
            return Some(shape);
        }
    }
    None
}

/// Maps a scalar implementation element-wise over array arguments.
///
/// Arguments at positions inside `eligible` may be arrays; all other
/// positions always pass through unchanged. When no eligible argument is an
/// array, `f` is invoked verbatim and its result returned as-is (error
/// values included).
///
/// Otherwise the output takes the primary shape, and each output cell is
/// `f` applied to a substituted argument list: eligible arrays contribute
/// their own `(row, col)` cell, eligible scalars repeat. A secondary array
/// that has no cell at the primary coordinate yields `#VALUE!` at that
/// output cell only; the rest of the output is unaffected. A nested array
/// produced by `f` flattens to its first cell.
///
/// The walk is an explicit row/column loop, so stack depth stays flat no
/// matter how large the range is, and the per-cell invocation sees only
/// scalars at eligible positions. Errors are data here: the protocol never
/// fails and never short-circuits on error cells.
pub fn broadcast_subset(
    ctx: &dyn FunctionContext,
    args: &[Value],
    eligible: Range<usize>,
    f: FunctionImpl,
) -> Value {
    let Some(shape) = primary_shape(args, &eligible) else {
        return f(ctx, args);
    };

    let mut out = Vec::with_capacity(shape.rows * shape.cols);
    let mut substituted = args.to_vec();
    for row in 0..shape.rows {
        for col in 0..shape.cols {
            let mut out_of_bounds = false;
            for index in eligible.clone() {
                if index >= args.len() {
                    break;
                }
                if let Value::Array(arr) = &args[index] {
                    match arr.get(row, col) {
                        Some(cell) => substituted[index] = cell.clone(),
                        None => {
                            out_of_bounds = true;
                            break;
                        }
                    }
                }
            }
            out.push(if out_of_bounds {
                Value::Error(ErrorKind::Value)
            } else {
                flatten_single(f(ctx, &substituted))
            });
        }
    }
    Value::Array(Array::new(shape.rows, shape.cols, out))
}

/// Generic entry point: every argument from `start` onward is
/// broadcast-eligible.
pub fn broadcast_from(
    ctx: &dyn FunctionContext,
    args: &[Value],
    start: usize,
    f: FunctionImpl,
) -> Value {
    broadcast_subset(ctx, args, start..args.len(), f)
}
