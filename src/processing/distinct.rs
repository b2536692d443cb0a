//! Exact-duplicate removal for [`crate::types::DataSet`].

use std::collections::HashSet;

use crate::types::{DataSet, ValueKey};

/// Returns a copy of `dataset` without rows that repeat an earlier row in every column.
///
/// The first occurrence of each row is kept and input order is preserved, so applying this
/// twice yields the same dataset as applying it once.
pub fn distinct(dataset: &DataSet) -> DataSet {
    let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(dataset.row_count());
    dataset.filter_rows(|row| seen.insert(row.iter().map(|v| v.key()).collect()))
}

#[cfg(test)]
mod tests {
    use super::distinct;
    use crate::columns::inventory_schema;
    use crate::types::{DataSet, Value};

    fn rec(name: &str, qty: i64, price: f64) -> Vec<Value> {
        vec![
            Value::Utf8(name.to_string()),
            Value::Utf8("Cat1".to_string()),
            Value::Int64(qty),
            Value::Float64(price),
        ]
    }

    #[test]
    fn removes_only_rows_equal_in_every_column() {
        let ds = DataSet::new(
            inventory_schema(),
            vec![
                rec("Produit A", 10, 100.0),
                rec("Produit C", 15, 150.0),
                rec("Produit A", 10, 100.0),
                rec("Produit A", 11, 100.0),
            ],
        );

        let out = distinct(&ds);
        assert_eq!(
            out.rows,
            vec![rec("Produit A", 10, 100.0), rec("Produit C", 15, 150.0), rec("Produit A", 11, 100.0)]
        );
    }

    #[test]
    fn is_idempotent() {
        let ds = DataSet::new(
            inventory_schema(),
            vec![rec("A", 1, 1.0), rec("A", 1, 1.0), rec("B", 2, 2.0)],
        );
        let once = distinct(&ds);
        let twice = distinct(&once);
        assert_eq!(once, twice);
        assert_eq!(twice.row_count(), 2);
    }
}
