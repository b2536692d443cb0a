//! Group-by aggregation for [`crate::types::DataSet`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{StockError, StockResult};
use crate::types::{DataSet, Value, ValueKey};

/// How a non-key column is combined across the rows of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Keep the value of the first row of the group.
    First,
    /// Add numeric values. Nulls are skipped; non-numeric values keep the first value. Integer
    /// sums that overflow fail with [`StockError::Overflow`].
    Sum,
}

/// Group rows by the columns at `keys` and combine the remaining columns with `ops`.
///
/// `ops` holds one entry per schema field; entries for key columns are ignored. The output keeps
/// the input schema unchanged, has one row per distinct key, and lists groups in the order their
/// first row appears in the input.
///
/// # Panics
///
/// Panics if a key index is out of range or `ops` does not have one entry per schema field.
pub fn group_by(dataset: &DataSet, keys: &[usize], ops: &[AggregateOp]) -> StockResult<DataSet> {
    let width = dataset.schema.len();
    assert!(
        ops.len() == width,
        "aggregate op count {} does not match schema length {}",
        ops.len(),
        width
    );
    assert!(
        keys.iter().all(|&k| k < width),
        "group key index out of range for schema length {width}"
    );

    let mut slots: HashMap<Vec<ValueKey>, usize> = HashMap::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();

    for row in &dataset.rows {
        let key: Vec<ValueKey> = keys.iter().map(|&k| row[k].key()).collect();
        match slots.entry(key) {
            Entry::Occupied(slot) => {
                let acc = &mut rows[*slot.get()];
                for (col, op) in ops.iter().enumerate() {
                    if *op == AggregateOp::Sum && !keys.contains(&col) {
                        acc[col] = add(&acc[col], &row[col]).ok_or_else(|| StockError::Overflow {
                            column: dataset.schema.fields[col].name.clone(),
                        })?;
                    }
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(rows.len());
                rows.push(row.clone());
            }
        }
    }

    Ok(DataSet::new(dataset.schema.clone(), rows))
}

fn add(acc: &Value, next: &Value) -> Option<Value> {
    Some(match (acc, next) {
        (Value::Int64(a), Value::Int64(b)) => Value::Int64(a.checked_add(*b)?),
        (Value::Float64(a), Value::Float64(b)) => Value::Float64(a + b),
        (Value::Null, v) => v.clone(),
        (a, _) => a.clone(),
    })
}
