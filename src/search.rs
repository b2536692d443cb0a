//! In-memory search over a consolidated dataset.
//!
//! Every filter returns a new, narrowed [`DataSet`] and leaves its input untouched. Inventory
//! columns are located through the engine's [`ColumnMapping`], so the same engine works on
//! canonical and localized headers.

use crate::columns::{ColumnIndex, ColumnMapping, InventoryColumn};
use crate::error::{StockError, StockResult};
use crate::processing::filter;
use crate::processing::sort::sort_by_index;
use crate::types::DataSet;

/// Free-text search parameters for [`QueryEngine::search`]. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    /// Case-insensitive substring of the category.
    pub category: Option<String>,
    /// Inclusive `(min, max)` unit price bounds.
    pub price_range: Option<(f64, f64)>,
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.price_range.is_none()
    }
}

/// Stateless filters over inventory datasets.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    mapping: ColumnMapping,
}

impl QueryEngine {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Rows whose name contains `needle`, ignoring case. `None` or an empty needle keeps every row.
    pub fn by_name_contains(&self, ds: &DataSet, needle: Option<&str>) -> StockResult<DataSet> {
        let idx = self.columns(ds)?.name;
        Ok(contains(ds, idx, needle))
    }

    /// Rows whose category contains `needle`, ignoring case. `None` or an empty needle keeps every
    /// row.
    pub fn by_category_contains(&self, ds: &DataSet, needle: Option<&str>) -> StockResult<DataSet> {
        let idx = self.columns(ds)?.category;
        Ok(contains(ds, idx, needle))
    }

    /// Rows whose name is exactly `name`.
    pub fn filter_by_name(&self, ds: &DataSet, name: &str) -> StockResult<DataSet> {
        if name.is_empty() {
            return Err(StockError::EmptyArgument("name"));
        }
        let idx = self.columns(ds)?.name;
        Ok(filter(ds, |row| row[idx].as_str() == Some(name)))
    }

    /// Rows whose category is exactly `category`.
    pub fn filter_by_category(&self, ds: &DataSet, category: &str) -> StockResult<DataSet> {
        if category.is_empty() {
            return Err(StockError::EmptyArgument("category"));
        }
        let idx = self.columns(ds)?.category;
        Ok(filter(ds, |row| row[idx].as_str() == Some(category)))
    }

    /// Rows with `min <= unit_price <= max`.
    pub fn by_price_range(&self, ds: &DataSet, min: f64, max: f64) -> StockResult<DataSet> {
        if min > max {
            return Err(StockError::InvalidRange { min, max });
        }
        let idx = self.columns(ds)?.unit_price;
        Ok(filter(ds, |row| {
            row[idx].as_f64().is_some_and(|p| (min..=max).contains(&p))
        }))
    }

    /// Rows with `quantity >= min`.
    pub fn by_min_quantity(&self, ds: &DataSet, min: i64) -> StockResult<DataSet> {
        if min < 0 {
            return Err(StockError::InvalidQuantity(min));
        }
        let idx = self.columns(ds)?.quantity;
        let min = min as f64;
        Ok(filter(ds, |row| row[idx].as_f64().is_some_and(|q| q >= min)))
    }

    /// Stable sort on `column`, given either as a schema field name or as a canonical inventory
    /// column name.
    pub fn sort_by(&self, ds: &DataSet, column: &str, ascending: bool) -> StockResult<DataSet> {
        let idx = match ds.schema.index_of(column) {
            Some(idx) => idx,
            None => {
                let canonical = InventoryColumn::ALL
                    .into_iter()
                    .find(|c| c.name() == column)
                    .ok_or_else(|| StockError::UnknownColumn(column.to_string()))?;
                self.columns(ds)
                    .map_err(|_| StockError::UnknownColumn(column.to_string()))?
                    .get(canonical)
            }
        };
        Ok(sort_by_index(ds, idx, ascending))
    }

    /// Apply the name, category and price filters of `query` in that order, each only if set.
    pub fn search(&self, ds: &DataSet, query: &SearchQuery) -> StockResult<DataSet> {
        let mut result = self.by_name_contains(ds, query.name.as_deref())?;
        result = self.by_category_contains(&result, query.category.as_deref())?;
        if let Some((min, max)) = query.price_range {
            result = self.by_price_range(&result, min, max)?;
        }
        Ok(result)
    }

    fn columns(&self, ds: &DataSet) -> StockResult<ColumnIndex> {
        self.mapping.locate_in(&ds.schema)
    }
}

fn contains(ds: &DataSet, idx: usize, needle: Option<&str>) -> DataSet {
    match needle {
        Some(needle) if !needle.is_empty() => {
            let needle = needle.to_lowercase();
            filter(ds, |row| {
                row[idx]
                    .as_str()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
        }
        _ => ds.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryEngine, SearchQuery};
    use crate::columns::inventory_schema;
    use crate::error::StockError;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn rec(name: &str, cat: &str, qty: i64, price: f64) -> Vec<Value> {
        vec![
            Value::Utf8(name.to_string()),
            Value::Utf8(cat.to_string()),
            Value::Int64(qty),
            Value::Float64(price),
        ]
    }

    fn furniture() -> DataSet {
        DataSet::new(
            inventory_schema(),
            vec![
                rec("Chaise", "Meubles", 10, 20.0),
                rec("Table", "Meubles", 5, 50.0),
                rec("Armoire", "Meubles", 3, 100.0),
                rec("Chaise longue", "Extérieur", 7, 150.0),
            ],
        )
    }

    fn names(ds: &DataSet) -> Vec<&str> {
        ds.rows.iter().filter_map(|r| r[0].as_str()).collect()
    }

    #[test]
    fn combined_search_narrows_to_chaise() {
        let ds = furniture();
        let query = SearchQuery {
            name: Some("Chaise".to_string()),
            category: Some("Meubles".to_string()),
            price_range: Some((10.0, 50.0)),
        };
        let found = QueryEngine::default().search(&ds, &query).unwrap();
        assert_eq!(names(&found), vec!["Chaise"]);
        assert_eq!(ds.row_count(), 4);
    }

    #[test]
    fn empty_search_keeps_everything() {
        let ds = furniture();
        let query = SearchQuery::default();
        assert!(query.is_empty());
        assert_eq!(QueryEngine::default().search(&ds, &query).unwrap(), ds);
    }

    #[test]
    fn contains_filters_ignore_case() {
        let ds = furniture();
        let engine = QueryEngine::default();
        let found = engine.by_name_contains(&ds, Some("CHAISE")).unwrap();
        assert_eq!(names(&found), vec!["Chaise", "Chaise longue"]);

        let found = engine.by_category_contains(&ds, Some("extérieur")).unwrap();
        assert_eq!(names(&found), vec!["Chaise longue"]);

        assert_eq!(engine.by_name_contains(&ds, Some("")).unwrap().row_count(), 4);
    }

    #[test]
    fn exact_filters_reject_empty_arguments() {
        let ds = furniture();
        let engine = QueryEngine::default();
        assert_eq!(names(&engine.filter_by_name(&ds, "Chaise").unwrap()), vec!["Chaise"]);
        assert_eq!(engine.filter_by_category(&ds, "Meubles").unwrap().row_count(), 3);
        assert!(matches!(
            engine.filter_by_name(&ds, ""),
            Err(StockError::EmptyArgument("name"))
        ));
        assert!(matches!(
            engine.filter_by_category(&ds, ""),
            Err(StockError::EmptyArgument("category"))
        ));
    }

    #[test]
    fn numeric_filters_are_inclusive_and_validate_bounds() {
        let ds = furniture();
        let engine = QueryEngine::default();
        assert_eq!(
            names(&engine.by_price_range(&ds, 50.0, 150.0).unwrap()),
            vec!["Table", "Armoire", "Chaise longue"]
        );
        assert_eq!(
            names(&engine.by_min_quantity(&ds, 7).unwrap()),
            vec!["Chaise", "Chaise longue"]
        );
        assert!(matches!(
            engine.by_price_range(&ds, 60.0, 10.0),
            Err(StockError::InvalidRange { .. })
        ));
        assert!(matches!(
            engine.by_min_quantity(&ds, -1),
            Err(StockError::InvalidQuantity(-1))
        ));
    }

    #[test]
    fn sort_by_accepts_canonical_names_on_localized_headers() {
        let schema = Schema::new(vec![
            Field::new("Nom du Produit", DataType::Utf8),
            Field::new("Catégorie", DataType::Utf8),
            Field::new("Quantité", DataType::Int64),
            Field::new("Prix Unitaire", DataType::Float64),
        ]);
        let ds = DataSet::new(schema, furniture().rows);
        let engine = QueryEngine::default();

        let sorted = engine.sort_by(&ds, "quantity", false).unwrap();
        assert_eq!(
            names(&sorted),
            vec!["Chaise", "Chaise longue", "Table", "Armoire"]
        );
        let sorted = engine.sort_by(&ds, "Prix Unitaire", true).unwrap();
        assert_eq!(names(&sorted)[0], "Chaise");

        assert!(matches!(
            engine.sort_by(&ds, "colour", true),
            Err(StockError::UnknownColumn(c)) if c == "colour"
        ));
    }
}
