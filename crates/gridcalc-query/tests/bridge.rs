use std::fmt;
use std::sync::Mutex;

use gridcalc_model::{Array, ErrorKind, Value};
use gridcalc_query::{run_query, DataRow, DebugLog, QueryContext};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct CaptureLog(Mutex<Vec<String>>);

impl CaptureLog {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn failure_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains("failed"))
            .collect()
    }
}

impl DebugLog for CaptureLog {
    fn write_debug_log(&self, line: fmt::Arguments<'_>) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

fn row(cells: &[(&str, Value)]) -> DataRow {
    cells
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn grid(values: &[&[i64]], keys: &[&str]) -> Vec<DataRow> {
    values
        .iter()
        .map(|cells| {
            keys.iter()
                .zip(cells.iter())
                .map(|(key, v)| (key.to_string(), Value::Int(*v)))
                .collect()
        })
        .collect()
}

#[test]
fn select_with_where_filters_rows() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = vec![
        row(&[("name", Value::Text("a".into())), ("n", Value::Int(1))]),
        row(&[("name", Value::Text("b".into())), ("n", Value::Int(2))]),
    ];

    let result = run_query(&ctx, &data, "select n where n > 1", -1);
    assert_eq!(result, Value::Array(Array::new(1, 1, vec![Value::Int(2)])));

    // The adapted statement (with the injected table reference) is logged.
    assert!(log
        .lines()
        .iter()
        .any(|line| line.contains("select n from sheet where n > 1")));
    assert!(log.failure_lines().is_empty());
}

#[test]
fn multi_column_select_keeps_column_order() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = grid(&[&[1, 10], &[2, 20], &[3, 30]], &["a", "b"]);

    let result = run_query(&ctx, &data, "select b, a where a >= 2", -1);
    assert_eq!(
        result,
        Value::Array(Array::new(
            2,
            2,
            vec![Value::Int(20), Value::Int(2), Value::Int(30), Value::Int(3)],
        ))
    );
}

#[test]
fn empty_data_returns_empty_array() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };

    assert_eq!(
        run_query(&ctx, &[], "select n where n > 1", -1),
        Value::Array(Array::empty())
    );
    assert_eq!(
        run_query(&ctx, &[Vec::new()], "select n where n > 1", -1),
        Value::Array(Array::empty())
    );
    // No table was created, so nothing was logged either.
    assert!(log.lines().is_empty());
}

#[test]
fn no_matching_rows_returns_empty_array() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = grid(&[&[1], &[2]], &["n"]);

    assert_eq!(
        run_query(&ctx, &data, "select n where n > 99", -1),
        Value::Array(Array::empty())
    );
}

#[test]
fn unsupported_first_row_type_is_a_value_error() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = vec![row(&[("a", Value::Blank), ("b", Value::Int(1))])];

    let first = run_query(&ctx, &data, "select b where b > 0", -1);
    assert_eq!(first, Value::Error(ErrorKind::Value));

    // Idempotent failure: a repeat invocation sees no leftover state.
    let second = run_query(&ctx, &data, "select b where b > 0", -1);
    assert_eq!(second, first);
    assert_eq!(log.failure_lines().len(), 2);
}

#[test]
fn engine_failure_logs_once_with_query_text() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: Some("B2"),
    };
    let data = grid(&[&[1]], &["n"]);

    // No WHERE keyword means no table reference is injected; the engine's
    // own error surfaces as #VALUE!.
    let query = "select missing_column";
    assert_eq!(run_query(&ctx, &data, query, -1), Value::Error(ErrorKind::Value));

    let failures = log.failure_lines();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains(query));
    assert!(failures[0].contains("B2"));
}

#[test]
fn later_row_coercion_fault_is_a_value_error() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = vec![
        row(&[("n", Value::Int(1))]),
        row(&[("n", Value::Text("not a number".into()))]),
    ];

    assert_eq!(
        run_query(&ctx, &data, "select n where n > 0", -1),
        Value::Error(ErrorKind::Value)
    );
    assert_eq!(log.failure_lines().len(), 1);
}

#[test]
fn quote_bearing_text_round_trips_unchanged() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let tricky = r#"he said "hi", then 'bye'; -- done"#;
    let data = vec![row(&[("s", Value::Text(tricky.into()))])];

    let result = run_query(&ctx, &data, "select s where _row >= 0", -1);
    assert_eq!(
        result,
        Value::Array(Array::new(1, 1, vec![Value::Text(tricky.into())]))
    );
}

#[test]
fn blank_cells_bind_null() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = vec![
        row(&[("n", Value::Int(1))]),
        row(&[("n", Value::Blank)]),
        row(&[("n", Value::Int(3))]),
    ];

    let result = run_query(&ctx, &data, "select _row where n is null", -1);
    assert_eq!(result, Value::Array(Array::new(1, 1, vec![Value::Int(1)])));
}

#[test]
fn boolean_columns_store_zero_and_one() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = vec![
        row(&[("flag", Value::Bool(true))]),
        row(&[("flag", Value::Bool(false))]),
    ];

    let result = run_query(&ctx, &data, "select flag where _row >= 0", -1);
    assert_eq!(
        result,
        Value::Array(Array::new(2, 1, vec![Value::Int(1), Value::Int(0)]))
    );
}

#[test]
fn null_leading_column_reports_no_usable_result() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = grid(&[&[1]], &["n"]);

    assert_eq!(
        run_query(&ctx, &data, "select null, n where n > 0", -1),
        Value::Array(Array::empty())
    );
}

#[test]
fn mixed_numeric_cells_coerce_to_real_columns() {
    let log = CaptureLog::default();
    let ctx = QueryContext {
        log: &log,
        cell: None,
    };
    let data = vec![
        row(&[("x", Value::Number(1.5))]),
        row(&[("x", Value::Int(2))]),
        row(&[("x", Value::Text("3.25".into()))]),
    ];

    let result = run_query(&ctx, &data, "select x where x > 1.75", -1);
    assert_eq!(
        result,
        Value::Array(Array::new(2, 1, vec![Value::Number(2.0), Value::Number(3.25)]))
    );
}
