use std::fmt;

use gridcalc_model::{flatten_single, Array, ErrorKind, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use thiserror::Error;

use crate::diag::DebugLog;
use crate::schema::{ColumnType, TableSchema};

/// One worksheet row presented to the bridge: ordered column-key/value
/// pairs. The first row's keys define the table schema; all rows are
/// assumed to share the same keys.
pub type DataRow = Vec<(String, Value)>;

/// Explicit per-invocation context.
///
/// The sink and cell coordinate travel with the call instead of living in
/// ambient state, so independent invocations stay isolated.
pub struct QueryContext<'a> {
    /// Diagnostic sink owned by the calculation host.
    pub log: &'a dyn DebugLog,
    /// Originating cell in A1 form, when known.
    pub cell: Option<&'a str>,
}

impl QueryContext<'_> {
    fn debug(&self, line: fmt::Arguments<'_>) {
        match self.cell {
            Some(cell) => self.log.write_debug_log(format_args!("{cell}: {line}")),
            None => self.log.write_debug_log(line),
        }
    }
}

/// Internal fault carrier. Converted to a `#VALUE!` error value at the
/// bridge boundary; never part of the public API.
#[derive(Debug, Error)]
pub(crate) enum QueryError {
    #[error("engine error #{code}: {message}")]
    Engine { code: i32, message: String },
    #[error("unhandled {type_name} value in column {column}")]
    UnsupportedType {
        type_name: &'static str,
        column: String,
    },
    #[error("cannot store {type_name} value in {target} column {column}")]
    Coercion {
        type_name: &'static str,
        target: &'static str,
        column: String,
    },
    #[error("unreadable {type_name} column in result row {row}")]
    Marshal { type_name: &'static str, row: usize },
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => e.extended_code,
            _ => rusqlite::ffi::SQLITE_ERROR,
        };
        QueryError::Engine {
            code,
            message: err.to_string(),
        }
    }
}

/// Runs a declarative query across worksheet-resident tabular data.
///
/// The incoming expression has no `FROM` clause; the bridge splices in
/// `from sheet` ahead of the first `WHERE` keyword before submission.
///
/// `header_rows` is reserved configuration and currently has no effect.
// TODO Detect or read explicit header rows.
pub fn run_query(
    ctx: &QueryContext<'_>,
    data: &[DataRow],
    query: &str,
    _header_rows: i64,
) -> Value {
    let Some(first_row) = data.first() else {
        return Value::Array(Array::empty());
    };
    if first_row.is_empty() {
        return Value::Array(Array::empty());
    }

    match execute(ctx, data, query) {
        Ok(result) => Value::Array(result),
        Err(err) => {
            ctx.debug(format_args!("sheet query {query} failed: {err}"));
            Value::Error(ErrorKind::Value)
        }
    }
}

/// Steps 2–6: infer, materialize, adapt, execute, marshal. The connection
/// (and with it the ephemeral table) drops on every exit path.
fn execute(ctx: &QueryContext<'_>, data: &[DataRow], query: &str) -> Result<Array, QueryError> {
    let schema = TableSchema::infer(&data[0])?;

    let mut conn = Connection::open_in_memory()?;

    let create = schema.create_table_sql();
    ctx.debug(format_args!("evaluating sheet query: {create}"));
    conn.execute(&create, [])?;

    let inserted = insert_rows(&mut conn, &schema, data)?;
    ctx.debug(format_args!(
        "evaluating sheet query: {} ({inserted} rows)",
        schema.insert_sql()
    ));

    let adapted = inject_from_clause(query);
    let result = fetch_rows(&conn, &adapted)?;
    ctx.debug(format_args!("evaluating sheet query: {adapted}"));
    Ok(result)
}

/// Populates `sheet` in one transaction, keyed by row ordinal.
fn insert_rows(
    conn: &mut Connection,
    schema: &TableSchema,
    data: &[DataRow],
) -> Result<usize, QueryError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&schema.insert_sql())?;
        for (ordinal, row) in data.iter().enumerate() {
            let mut params: Vec<SqlValue> = Vec::with_capacity(schema.columns.len() + 1);
            params.push(SqlValue::Integer(ordinal as i64));
            for (column, ty) in &schema.columns {
                let cell = row
                    .iter()
                    .find(|(key, _)| key == column)
                    .map(|(_, value)| value)
                    .unwrap_or(&Value::Blank);
                params.push(bind_cell(cell, *ty, column)?);
            }
            stmt.execute(rusqlite::params_from_iter(params))?;
        }
    }
    tx.commit()?;
    Ok(data.len())
}

/// Coerces one cell to its column's storage type.
///
/// Blanks (including unresolvable array cells flattened to blank) bind the
/// engine's NULL; text binds as a parameter, which neutralizes quote and
/// delimiter characters without manual escaping.
fn bind_cell(cell: &Value, ty: ColumnType, column: &str) -> Result<SqlValue, QueryError> {
    let scalar = flatten_single(cell.clone());
    if matches!(scalar, Value::Blank) {
        return Ok(SqlValue::Null);
    }
    match ty {
        ColumnType::SmallInt => Ok(SqlValue::Integer(i64::from(truthiness(&scalar, column)?))),
        ColumnType::Int => Ok(SqlValue::Integer(integer_cast(&scalar, column)?)),
        ColumnType::Real => Ok(SqlValue::Real(float_cast(&scalar, column)?)),
        ColumnType::Text => Ok(SqlValue::Text(text_cast(&scalar, column)?)),
    }
}

fn truthiness(scalar: &Value, column: &str) -> Result<bool, QueryError> {
    match scalar {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Text(s) => Ok(!s.is_empty() && s != "0"),
        other => Err(coercion(other, "TINYINT", column)),
    }
}

fn integer_cast(scalar: &Value, column: &str) -> Result<i64, QueryError> {
    match scalar {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) if n.is_finite() => Ok(*n as i64),
        Value::Text(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(i);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n as i64),
                _ => Err(coercion(scalar, "INT", column)),
            }
        }
        other => Err(coercion(other, "INT", column)),
    }
}

fn float_cast(scalar: &Value, column: &str) -> Result<f64, QueryError> {
    match scalar {
        Value::Number(n) => Ok(*n),
        Value::Int(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| coercion(scalar, "REAL", column)),
        other => Err(coercion(other, "REAL", column)),
    }
}

fn text_cast(scalar: &Value, column: &str) -> Result<String, QueryError> {
    match scalar {
        Value::Text(s) => Ok(s.clone()),
        Value::Bool(_) | Value::Int(_) | Value::Number(_) => Ok(scalar.to_string()),
        other => Err(coercion(other, "TEXT", column)),
    }
}

fn coercion(scalar: &Value, target: &'static str, column: &str) -> QueryError {
    QueryError::Coercion {
        type_name: scalar.type_name(),
        target,
        column: column.to_string(),
    }
}

/// Splices `from sheet` ahead of the first case-insensitive `WHERE`.
///
/// Expressions without a `WHERE` keyword are submitted unchanged and surface
/// the engine's own missing-table error through the failure path.
fn inject_from_clause(query: &str) -> String {
    match query.to_ascii_uppercase().find("WHERE") {
        Some(pos) => format!("{}from sheet {}", &query[..pos], &query[pos..]),
        None => query.to_string(),
    }
}

/// Consumes the result set into a rectangular array, in engine iteration
/// order.
fn fetch_rows(conn: &Connection, statement: &str) -> Result<Array, QueryError> {
    let mut stmt = conn.prepare(statement)?;
    let cols = stmt.column_count();
    if cols == 0 {
        return Ok(Array::empty());
    }

    let mut rows = stmt.query([])?;
    let mut values: Vec<Value> = Vec::new();
    let mut row_count = 0usize;
    while let Some(row) = rows.next()? {
        // "No value" probe: a NULL leading column on the first result row
        // means the statement selected nothing usable.
        if row_count == 0 && matches!(row.get_ref(0)?, ValueRef::Null) {
            return Ok(Array::empty());
        }
        for col in 0..cols {
            values.push(marshal_cell(row.get_ref(col)?, row_count)?);
        }
        row_count += 1;
    }

    if row_count == 0 {
        return Ok(Array::empty());
    }
    Ok(Array::new(row_count, cols, values))
}

fn marshal_cell(cell: ValueRef<'_>, row: usize) -> Result<Value, QueryError> {
    match cell {
        ValueRef::Null => Ok(Value::Blank),
        ValueRef::Integer(i) => Ok(Value::Int(i)),
        ValueRef::Real(n) => Ok(Value::Number(n)),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Value::Text(s.to_string())),
            Err(_) => Err(QueryError::Marshal {
                type_name: "text",
                row,
            }),
        },
        ValueRef::Blob(_) => Err(QueryError::Marshal {
            type_name: "blob",
            row,
        }),
    }
}
