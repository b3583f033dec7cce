use gridcalc_model::{flatten_single, Value};

use crate::bridge::QueryError;

/// Storage type of an inferred table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    SmallInt,
    Int,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::SmallInt => "TINYINT",
            ColumnType::Int => "INT",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Ordered column layout for one ephemeral table, inferred once per
/// invocation from the first data row.
///
/// Invariant: every subsequent row's cell is coercible to its column's type
/// or is null; cells that are not coerce-able fault the whole invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub columns: Vec<(String, ColumnType)>,
}

impl TableSchema {
    /// Maps each first-row value (flattened to a scalar) to a storage type.
    ///
    /// Only boolean, integer, number and text cells are mappable; anything
    /// else aborts the invocation before any table exists.
    pub(crate) fn infer(first_row: &[(String, Value)]) -> Result<Self, QueryError> {
        let mut columns = Vec::with_capacity(first_row.len());
        for (name, value) in first_row {
            let scalar = flatten_single(value.clone());
            let ty = match scalar {
                Value::Bool(_) => ColumnType::SmallInt,
                Value::Int(_) => ColumnType::Int,
                Value::Number(_) => ColumnType::Real,
                Value::Text(_) => ColumnType::Text,
                other => {
                    return Err(QueryError::UnsupportedType {
                        type_name: other.type_name(),
                        column: name.clone(),
                    });
                }
            };
            columns.push((name.clone(), ty));
        }
        Ok(Self { columns })
    }

    pub(crate) fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{name} {}", ty.sql_name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE sheet(_row INTEGER PRIMARY KEY, {columns})")
    }

    pub(crate) fn insert_sql(&self) -> String {
        // `_row` plus one placeholder per data column.
        let placeholders = (1..=self.columns.len() + 1)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO sheet VALUES({placeholders})")
    }
}
