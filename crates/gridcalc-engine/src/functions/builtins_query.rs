use gridcalc_model::{flatten_single, Array, ErrorKind, Value};
use gridcalc_query::{run_query, DataRow, QueryContext};

use crate::functions::{ArraySupport, FunctionContext, FunctionSpec};
use crate::functions::{ThreadSafety, ValueType, Volatility};

inventory::submit! {
    FunctionSpec {
        name: "QUERY",
        min_args: 2,
        max_args: 3,
        volatility: Volatility::NonVolatile,
        thread_safety: ThreadSafety::ThreadSafe,
        array_support: ArraySupport::SupportsArrays,
        return_type: ValueType::Any,
        arg_types: &[ValueType::Any, ValueType::Text, ValueType::Number],
        implementation: query_fn,
    }
}

/// QUERY(data, query, headers = -1).
///
/// Runs a declarative query across a data range by handing it to the
/// relational bridge; grid columns are keyed by their spreadsheet column
/// letters (`A`, `B`, ...), which is how the query refers to them.
fn query_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    let data = match &args[0] {
        Value::Array(arr) => arr.clone(),
        Value::Error(e) => return Value::Error(*e),
        scalar => Array::new(1, 1, vec![scalar.clone()]),
    };

    let query = match flatten_single(args[1].clone()) {
        Value::Text(s) => s,
        Value::Error(e) => return Value::Error(e),
        other => other.to_string(),
    };

    let header_rows = match args.get(2) {
        Some(arg) => match header_count(arg) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        },
        None => -1,
    };

    let rows = data_rows(&data);
    let bridge_ctx = QueryContext {
        log: ctx.debug_log(),
        cell: ctx.current_cell(),
    };
    run_query(&bridge_ctx, &rows, &query, header_rows)
}

fn data_rows(data: &Array) -> Vec<DataRow> {
    (0..data.rows)
        .map(|row| {
            (0..data.cols)
                .map(|col| {
                    let cell = data.get(row, col).cloned().unwrap_or(Value::Blank);
                    (column_letter(col), cell)
                })
                .collect()
        })
        .collect()
}

/// Spreadsheet column label for a 0-based index (`A`, ..., `Z`, `AA`, ...).
fn column_letter(mut index: usize) -> String {
    let mut label = String::new();
    loop {
        label.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label
}

fn header_count(value: &Value) -> Result<i64, ErrorKind> {
    match flatten_single(value.clone()) {
        Value::Int(i) => Ok(i),
        Value::Number(n) if n.is_finite() => Ok(n.trunc() as i64),
        Value::Text(s) => s.trim().parse::<i64>().map_err(|_| ErrorKind::Value),
        Value::Blank => Ok(-1),
        Value::Error(e) => Err(e),
        _ => Err(ErrorKind::Value),
    }
}

inventory::submit! {
    FunctionSpec {
        name: "__XLUDF.DUMMYFUNCTION",
        min_args: 1,
        max_args: 1,
        // Depends on host state the dependency graph cannot see.
        volatility: Volatility::Volatile,
        thread_safety: ThreadSafety::NotThreadSafe,
        array_support: ArraySupport::ScalarOnly,
        return_type: ValueType::Any,
        arg_types: &[ValueType::Text],
        implementation: dummyfunction_fn,
    }
}

/// Google Sheets inserts `__xludf.DUMMYFUNCTION` when exporting formulas it
/// cannot represent, keeping the original formula as a text literal. The
/// text is handed back to the host for evaluation.
fn dummyfunction_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    let formula = match flatten_single(args[0].clone()) {
        Value::Text(s) => s,
        Value::Error(e) => return Value::Error(e),
        other => other.to_string(),
    };
    match ctx.evaluate_formula(&format!("={formula}")) {
        Some(value) => value,
        None => Value::Error(ErrorKind::Name),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::column_letter;

    #[test]
    fn column_letters_extend_past_z() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
    }
}
