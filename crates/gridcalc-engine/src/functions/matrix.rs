use gridcalc_model::{Array, Value};

/// Returns a new array with rows and columns swapped
/// (`result[c][r] = input[r][c]`).
pub fn transpose(input: &Array) -> Array {
    let mut values = Vec::with_capacity(input.values.len());
    for col in 0..input.cols {
        for row in 0..input.rows {
            values.push(input.get(row, col).cloned().unwrap_or(Value::Blank));
        }
    }
    Array::new(input.cols, input.rows, values)
}

/// Column `index` (0-based) as an owned sequence of length `input.rows`,
/// or `None` when the index is out of range.
pub fn extract_column(input: &Array, index: usize) -> Option<Vec<Value>> {
    if index >= input.cols {
        return None;
    }
    Some(
        (0..input.rows)
            .map(|row| input.get(row, index).cloned().unwrap_or(Value::Blank))
            .collect(),
    )
}
