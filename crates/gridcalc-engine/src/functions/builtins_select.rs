use gridcalc_model::{flatten_single, Array, ErrorKind, Value};

use crate::functions::broadcast;
use crate::functions::matrix::{extract_column, transpose};
use crate::functions::{ArraySupport, FunctionContext, FunctionSpec, VAR_ARGS};
use crate::functions::{ThreadSafety, ValueType, Volatility};

inventory::submit! {
    FunctionSpec {
        name: "CHOOSE",
        min_args: 2,
        max_args: VAR_ARGS,
        volatility: Volatility::NonVolatile,
        thread_safety: ThreadSafety::ThreadSafe,
        array_support: ArraySupport::SupportsArrays,
        return_type: ValueType::Any,
        arg_types: &[ValueType::Number, ValueType::Any],
        implementation: choose_fn,
    }
}

fn choose_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    if args[0].is_array() {
        // Only the index argument maps element-wise; the choice list is
        // shared across every output cell.
        return broadcast::broadcast_subset(ctx, args, 0..1, choose_scalar);
    }
    choose_scalar(ctx, args)
}

fn choose_scalar(_ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    if let Value::Error(e) = &args[0] {
        return Value::Error(*e);
    }
    let choices = &args[1..];

    let Some(index) = numeric_index(&args[0]) else {
        return Value::Error(ErrorKind::Value);
    };
    // 1-based, floored before the bounds check.
    let index = index.floor() - 1.0;
    if !index.is_finite() || index < 0.0 || index >= choices.len() as f64 {
        return Value::Error(ErrorKind::Value);
    }

    let chosen = &choices[index as usize];
    if chosen.is_array() {
        return flatten_single(chosen.clone());
    }
    chosen.clone()
}

fn numeric_index(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Number(n) => Some(*n),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

inventory::submit! {
    FunctionSpec {
        name: "CHOOSECOLS",
        min_args: 2,
        max_args: VAR_ARGS,
        volatility: Volatility::NonVolatile,
        thread_safety: ThreadSafety::ThreadSafe,
        array_support: ArraySupport::SupportsArrays,
        return_type: ValueType::Any,
        arg_types: &[ValueType::Any, ValueType::Number],
        implementation: choosecols_fn,
    }
}

fn choosecols_fn(_ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    let cells = match &args[0] {
        Value::Array(arr) => arr.clone(),
        Value::Error(e) => return Value::Error(*e),
        scalar => Array::new(1, 1, vec![scalar.clone()]),
    };
    let width = cells.cols as i64;

    let mut picked = Vec::with_capacity((args.len() - 1) * cells.rows);
    for arg in &args[1..] {
        if let Value::Error(e) = arg {
            return Value::Error(*e);
        }
        let Some(col) = column_index(arg) else {
            return Value::Error(ErrorKind::Value);
        };
        // 1-based; negative counts back from the last column.
        if col == 0 || col.abs() > width {
            return Value::Error(ErrorKind::Value);
        }
        let effective = if col > 0 { col - 1 } else { width + col };
        match extract_column(&cells, effective as usize) {
            Some(column) => picked.extend(column),
            None => return Value::Error(ErrorKind::Value),
        }
    }

    // Columns were collected as rows; transpose restores row-major form.
    let collected = Array::new(args.len() - 1, cells.rows, picked);
    Value::Array(transpose(&collected))
}

fn column_index(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        Value::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|n| n.trunc() as i64))
        }
        _ => None,
    }
}
