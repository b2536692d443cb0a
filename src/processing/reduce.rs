//! Reduction operations for [`crate::types::DataSet`].

use crate::error::{StockError, StockResult};
use crate::types::{DataSet, DataType, Value};

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
}

impl ReduceOp {
    /// `None` if an integer sum overflows.
    fn combine_i64(self, acc: Option<i64>, v: i64) -> Option<i64> {
        match (self, acc) {
            (_, None) => Some(v),
            (ReduceOp::Min, Some(a)) => Some(a.min(v)),
            (ReduceOp::Max, Some(a)) => Some(a.max(v)),
            (_, Some(a)) => a.checked_add(v),
        }
    }

    fn combine_f64(self, acc: Option<f64>, v: f64) -> f64 {
        match (self, acc) {
            (_, None) => v,
            (ReduceOp::Min, Some(a)) => a.min(v),
            (ReduceOp::Max, Some(a)) => a.max(v),
            (_, Some(a)) => a + v,
        }
    }
}

/// Reduce a column using a built-in [`ReduceOp`].
///
/// - Returns `None` if `column` does not exist in the schema.
/// - For `Sum`/`Min`/`Max`, returns `Some(Value::Null)` if there are no non-null values or the
///   column is not numeric.
/// - For `Count`, always returns `Some(Value::Int64(row_count))`.
/// - An integer `Sum` that does not fit in an `i64` fails with [`StockError::Overflow`].
pub fn reduce(dataset: &DataSet, column: &str, op: ReduceOp) -> StockResult<Option<Value>> {
    let Some(idx) = dataset.schema.index_of(column) else {
        return Ok(None);
    };

    if op == ReduceOp::Count {
        return Ok(Some(Value::Int64(dataset.row_count() as i64)));
    }

    let out = match dataset.schema.fields[idx].data_type {
        DataType::Int64 => dataset
            .rows
            .iter()
            .try_fold(None, |acc, row| match row.get(idx) {
                Some(Value::Int64(v)) => op.combine_i64(acc, *v).map(Some),
                _ => Some(acc),
            })
            .ok_or_else(|| StockError::Overflow {
                column: column.to_string(),
            })?
            .map(Value::Int64),
        DataType::Float64 => dataset
            .reduce_rows(None, |acc, row| match row.get(idx) {
                Some(Value::Float64(v)) => Some(op.combine_f64(acc, *v)),
                _ => acc,
            })
            .map(Value::Float64),
        DataType::Utf8 => None,
    };

    Ok(Some(out.unwrap_or(Value::Null)))
}
