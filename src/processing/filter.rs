//! Row filtering for [`crate::types::DataSet`].

use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`DataSet::filter_rows`].
pub fn filter<F>(dataset: &DataSet, predicate: F) -> DataSet
where
    F: FnMut(&[Value]) -> bool,
{
    dataset.filter_rows(predicate)
}

#[cfg(test)]
mod tests {
    use super::filter;
    use crate::columns::inventory_schema;
    use crate::types::{DataSet, Value};

    fn sample_dataset() -> DataSet {
        let rows = vec![
            vec![
                Value::Utf8("Produit A".to_string()),
                Value::Utf8("Cat1".to_string()),
                Value::Int64(10),
                Value::Float64(100.0),
            ],
            vec![
                Value::Utf8("Produit B".to_string()),
                Value::Utf8("Cat2".to_string()),
                Value::Int64(5),
                Value::Float64(200.0),
            ],
            vec![
                Value::Utf8("Produit C".to_string()),
                Value::Utf8("Cat1".to_string()),
                Value::Int64(2),
                Value::Float64(50.0),
            ],
        ];

        DataSet::new(inventory_schema(), rows)
    }

    #[test]
    fn schema_index_of_works() {
        let ds = sample_dataset();
        assert_eq!(ds.schema.index_of("name"), Some(0));
        assert_eq!(ds.schema.index_of("unit_price"), Some(3));
        assert_eq!(ds.schema.index_of("missing"), None);
    }

    #[test]
    fn filter_rows_by_numeric_predicate() {
        let ds = sample_dataset();
        let qty_idx = ds.schema.index_of("quantity").unwrap();

        let out = ds.filter_rows(|row| matches!(row.get(qty_idx), Some(Value::Int64(v)) if *v < 10));

        assert_eq!(out.schema, ds.schema);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows, ds.rows[1..].to_vec());
        // Original unchanged
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn filter_rows_by_text_predicate() {
        let ds = sample_dataset();
        let cat_idx = ds.schema.index_of("category").unwrap();

        let out = filter(&ds, |row| row[cat_idx].as_str() == Some("Cat1"));

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows, vec![ds.rows[0].clone(), ds.rows[2].clone()]);
    }

    #[test]
    fn filter_rows_can_return_empty_dataset() {
        let ds = sample_dataset();
        let out = ds.filter_rows(|_| false);
        assert_eq!(out.schema, ds.schema);
        assert!(out.rows.is_empty());
    }
}
