//! Aggregate statistics and derived views over a consolidated dataset.
//!
//! A [`ReportEngine`] borrows a non-empty inventory dataset and computes:
//!
//! - [`ReportEngine::total_stock_value`]: `Σ quantity * unit_price`
//! - [`ReportEngine::count_by_category`]: number of records per category
//! - [`ReportEngine::critical_stock`]: records below a quantity threshold
//! - [`ReportEngine::summary_report`]: per-category totals plus an all-categories row
//!
//! Reports are plain [`DataSet`]s and are written with [`export()`].
//!
//! ```rust
//! use stock_consolidator::columns::inventory_schema;
//! use stock_consolidator::report::ReportEngine;
//! use stock_consolidator::types::{DataSet, Value};
//!
//! # fn main() -> Result<(), stock_consolidator::StockError> {
//! let ds = DataSet::new(
//!     inventory_schema(),
//!     vec![
//!         vec![Value::Utf8("Produit A".into()), Value::Utf8("Cat1".into()), Value::Int64(10), Value::Float64(100.0)],
//!         vec![Value::Utf8("Produit B".into()), Value::Utf8("Cat2".into()), Value::Int64(5), Value::Float64(200.0)],
//!         vec![Value::Utf8("Produit C".into()), Value::Utf8("Cat1".into()), Value::Int64(2), Value::Float64(50.0)],
//!     ],
//! );
//!
//! let engine = ReportEngine::new(&ds)?;
//! assert_eq!(engine.total_stock_value(), 2100.0);
//! assert_eq!(engine.critical_stock(5)?.row_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod export;

use std::collections::BTreeMap;
use std::path::Path;

use crate::columns::{ColumnIndex, ColumnMapping};
use crate::error::{StockError, StockResult};
use crate::processing::sort::sort_by_index;
use crate::processing::{AggregateOp, ReduceOp, group_by, reduce};
use crate::types::{DataSet, DataType, Field, Schema, Value};

pub use export::{ExportFormat, export};

/// Label of the synthetic grand-total row appended by [`ReportEngine::summary_report`].
pub const DEFAULT_TOTAL_LABEL: &str = "All categories";

/// Order of the per-category rows in a summary report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryOrder {
    /// Sorted by category name.
    #[default]
    Alphabetical,
    /// In the order each category first appears in the dataset.
    FirstSeen,
}

/// Options controlling report generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// How dataset headers map to canonical inventory columns.
    pub mapping: ColumnMapping,
    /// Label of the grand-total row in summary reports.
    pub total_label: String,
    pub category_order: CategoryOrder,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            mapping: ColumnMapping::default(),
            total_label: DEFAULT_TOTAL_LABEL.to_string(),
            category_order: CategoryOrder::default(),
        }
    }
}

/// Schema of [`ReportEngine::summary_report`] output.
pub fn summary_schema() -> Schema {
    Schema::new(vec![
        Field::new("category", DataType::Utf8),
        Field::new("total_quantity", DataType::Int64),
        Field::new("total_value", DataType::Float64),
    ])
}

/// Computes reports over one immutable inventory dataset.
#[derive(Debug, Clone)]
pub struct ReportEngine<'a> {
    data: &'a DataSet,
    columns: ColumnIndex,
    options: ReportOptions,
}

impl<'a> ReportEngine<'a> {
    /// Create an engine with default [`ReportOptions`].
    pub fn new(data: &'a DataSet) -> StockResult<Self> {
        Self::with_options(data, ReportOptions::default())
    }

    /// Create an engine.
    ///
    /// Fails with [`StockError::EmptyInput`] if `data` has no rows, or
    /// [`StockError::SchemaViolation`] if the inventory columns cannot be located.
    pub fn with_options(data: &'a DataSet, options: ReportOptions) -> StockResult<Self> {
        if data.is_empty() {
            return Err(StockError::EmptyInput);
        }
        let columns = options.mapping.locate_in(&data.schema)?;
        Ok(Self {
            data,
            columns,
            options,
        })
    }

    pub fn data(&self) -> &DataSet {
        self.data
    }

    /// Sum of `quantity * unit_price` over every record. Records missing either value count as 0.
    pub fn total_stock_value(&self) -> f64 {
        let ColumnIndex {
            quantity,
            unit_price,
            ..
        } = self.columns;
        self.data.reduce_rows(0.0, |acc, row| {
            acc + line_value(&row[quantity], &row[unit_price]).unwrap_or(0.0)
        })
    }

    /// Number of records per category.
    pub fn count_by_category(&self) -> BTreeMap<String, usize> {
        let idx = self.columns.category;
        self.data.reduce_rows(BTreeMap::new(), |mut counts, row| {
            if let Some(category) = row[idx].as_str() {
                *counts.entry(category.to_string()).or_insert(0) += 1;
            }
            counts
        })
    }

    /// Records whose quantity is strictly below `threshold`, in dataset order.
    ///
    /// Fails with [`StockError::InvalidThreshold`] if `threshold` is negative.
    pub fn critical_stock(&self, threshold: i64) -> StockResult<DataSet> {
        if threshold < 0 {
            return Err(StockError::InvalidThreshold(threshold));
        }
        let idx = self.columns.quantity;
        let limit = threshold as f64;
        Ok(self
            .data
            .filter_rows(|row| row[idx].as_f64().is_some_and(|q| q < limit)))
    }

    /// One row per category with `(category, total_quantity, total_value)`, followed by a
    /// grand-total row labelled [`ReportOptions::total_label`].
    ///
    /// Fails with [`StockError::Overflow`] if a quantity total does not fit in an `i64`.
    pub fn summary_report(&self) -> StockResult<DataSet> {
        let ColumnIndex {
            category,
            quantity,
            unit_price,
            ..
        } = self.columns;

        let lines: Vec<Vec<Value>> = self
            .data
            .rows
            .iter()
            .map(|row| {
                vec![
                    row[category].clone(),
                    Value::Int64(row[quantity].as_i64().unwrap_or(0)),
                    Value::Float64(line_value(&row[quantity], &row[unit_price]).unwrap_or(0.0)),
                ]
            })
            .collect();
        let per_line = DataSet::new(summary_schema(), lines);

        let grouped = group_by(
            &per_line,
            &[0],
            &[AggregateOp::First, AggregateOp::Sum, AggregateOp::Sum],
        )?;
        let mut summary = match self.options.category_order {
            CategoryOrder::Alphabetical => sort_by_index(&grouped, 0, true),
            CategoryOrder::FirstSeen => grouped,
        };

        let total_quantity = reduce(&per_line, "total_quantity", ReduceOp::Sum)?.unwrap_or(Value::Null);
        let total_value = reduce(&per_line, "total_value", ReduceOp::Sum)?.unwrap_or(Value::Null);
        summary.rows.push(vec![
            Value::Utf8(self.options.total_label.clone()),
            total_quantity,
            total_value,
        ]);
        Ok(summary)
    }

    /// Write `data` (typically a report produced by this engine) to `path`.
    pub fn export(&self, data: &DataSet, path: impl AsRef<Path>, format: ExportFormat) -> StockResult<()> {
        export(data, path, format)
    }
}

fn line_value(quantity: &Value, unit_price: &Value) -> Option<f64> {
    Some(quantity.as_f64()? * unit_price.as_f64()?)
}

#[cfg(test)]
mod tests {
    use super::{CategoryOrder, ReportEngine, ReportOptions};
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

    fn products() -> DataSet {
        DataSet::new(
            inventory_schema(),
            vec![
                rec("Produit A", "Cat1", 10, 100.0),
                rec("Produit B", "Cat2", 5, 200.0),
                rec("Produit C", "Cat1", 2, 50.0),
            ],
        )
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

    #[test]
    fn empty_dataset_is_rejected() {
        let ds = DataSet::empty(inventory_schema());
        assert!(matches!(ReportEngine::new(&ds), Err(StockError::EmptyInput)));
    }

    #[test]
    fn dataset_without_inventory_columns_is_rejected() {
        let schema = Schema::new(vec![Field::new("sku", DataType::Utf8)]);
        let ds = DataSet::new(schema, vec![vec![Value::Utf8("X".to_string())]]);
        assert!(matches!(
            ReportEngine::new(&ds),
            Err(StockError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn total_stock_value_is_sum_of_line_values() {
        let ds = products();
        let engine = ReportEngine::new(&ds).unwrap();
        assert_eq!(engine.total_stock_value(), 2100.0);
    }

    #[test]
    fn counts_records_per_category() {
        let ds = products();
        let counts = ReportEngine::new(&ds).unwrap().count_by_category();
        assert_eq!(counts["Cat1"], 2);
        assert_eq!(counts["Cat2"], 1);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn critical_stock_is_strictly_below_threshold() {
        let ds = products();
        let engine = ReportEngine::new(&ds).unwrap();

        let below_five = engine.critical_stock(5).unwrap();
        assert_eq!(below_five.rows, vec![rec("Produit C", "Cat1", 2, 50.0)]);

        let below_ten = engine.critical_stock(10).unwrap();
        assert_eq!(below_ten.row_count(), 2);
        assert!(below_ten.rows.iter().all(|r| r[2].as_i64().unwrap() < 10));

        assert_eq!(engine.critical_stock(0).unwrap().row_count(), 0);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let ds = products();
        let engine = ReportEngine::new(&ds).unwrap();
        assert!(matches!(
            engine.critical_stock(-1),
            Err(StockError::InvalidThreshold(-1))
        ));
    }

    #[test]
    fn summary_report_totals_each_category_and_appends_grand_total() {
        let ds = furniture();
        let summary = ReportEngine::new(&ds).unwrap().summary_report().unwrap();

        assert_eq!(
            summary.rows,
            vec![
                vec![
                    Value::Utf8("Extérieur".to_string()),
                    Value::Int64(7),
                    Value::Float64(1050.0)
                ],
                vec![
                    Value::Utf8("Meubles".to_string()),
                    Value::Int64(18),
                    Value::Float64(750.0)
                ],
                vec![
                    Value::Utf8("All categories".to_string()),
                    Value::Int64(25),
                    Value::Float64(1800.0)
                ],
            ]
        );
    }

    #[test]
    fn summary_report_can_keep_first_seen_order_and_custom_label() {
        let ds = furniture();
        let options = ReportOptions {
            total_label: "Toutes".to_string(),
            category_order: CategoryOrder::FirstSeen,
            ..Default::default()
        };
        let summary = ReportEngine::with_options(&ds, options)
            .unwrap()
            .summary_report()
            .unwrap();

        let labels: Vec<&str> = summary.rows.iter().filter_map(|r| r[0].as_str()).collect();
        assert_eq!(labels, vec!["Meubles", "Extérieur", "Toutes"]);
    }

    #[test]
    fn summary_report_rejects_overflowing_quantity_totals() {
        let ds = DataSet::new(
            inventory_schema(),
            vec![rec("Chaise", "Meubles", i64::MAX, 1.0), rec("Table", "Salon", 1, 1.0)],
        );
        assert!(matches!(
            ReportEngine::new(&ds).unwrap().summary_report(),
            Err(StockError::Overflow { .. })
        ));
    }

    #[test]
    fn works_on_localized_headers() {
        let schema = Schema::new(vec![
            Field::new("Nom du Produit", DataType::Utf8),
            Field::new("Quantité", DataType::Int64),
            Field::new("Prix Unitaire", DataType::Float64),
            Field::new("Catégorie", DataType::Utf8),
        ]);
        let ds = DataSet::new(
            schema,
            vec![vec![
                Value::Utf8("Chaise".to_string()),
                Value::Int64(4),
                Value::Float64(2.5),
                Value::Utf8("Meubles".to_string()),
            ]],
        );
        assert_eq!(ReportEngine::new(&ds).unwrap().total_stock_value(), 10.0);
    }
}
