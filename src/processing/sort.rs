//! Stable sorting for [`crate::types::DataSet`].

use crate::types::DataSet;

/// Returns a copy of `dataset` sorted by `column`, or `None` if the column does not exist.
///
/// The sort is stable, so rows with equal values keep their relative order. Ordering follows
/// [`crate::types::Value::sort_cmp`].
pub fn sort_by(dataset: &DataSet, column: &str, ascending: bool) -> Option<DataSet> {
    let idx = dataset.schema.index_of(column)?;
    Some(sort_by_index(dataset, idx, ascending))
}

pub(crate) fn sort_by_index(dataset: &DataSet, idx: usize, ascending: bool) -> DataSet {
    let mut rows = dataset.rows.clone();
    rows.sort_by(|a, b| {
        let ord = a[idx].sort_cmp(&b[idx]);
        if ascending { ord } else { ord.reverse() }
    });
    DataSet::new(dataset.schema.clone(), rows)
}
