//! `stock-consolidator` merges CSV inventory files into one authoritative dataset, stores it in
//! SQLite, and derives search results and stock reports from it.
//!
//! Every component works on an in-memory [`types::DataSet`] with the canonical inventory schema
//! `name, category, quantity, unit_price` ([`columns::inventory_schema`]). Source files may use
//! localized headers (`Nom du Produit`, `Catégorie`, `Quantité`, `Prix Unitaire`); the
//! [`columns::ColumnMapping`] layer resolves them.
//!
//! ## Pipeline
//!
//! - [`ingestion`]: read CSV files into datasets, with optional [`ingestion::IngestionObserver`]
//!   callbacks
//! - [`validation`]: check that two datasets are compatible before a merge
//! - [`consolidation`]: merge two datasets, or consolidate a whole directory
//! - [`store`]: persist records ([`store::TableStore`], [`store::SqliteStore`])
//! - [`search`]: free-text and numeric filters over a dataset
//! - [`report`]: stock value, critical stock, per-category summary, and CSV/JSON/text export
//! - [`manager`]: one handle tying the above together
//!
//! ## Quick example: consolidate a directory
//!
//! ```no_run
//! use stock_consolidator::config::StockConfig;
//! use stock_consolidator::manager::{ReportKind, StockManager};
//! use stock_consolidator::report::ExportFormat;
//!
//! # fn main() -> Result<(), stock_consolidator::StockError> {
//! let mut manager = StockManager::open(StockConfig::default())?;
//! manager.initialize()?;
//!
//! let consolidation = manager.consolidate_directory("stock/")?;
//! println!("rows={}", consolidation.dataset.row_count());
//!
//! manager.generate_report(ReportKind::Summary, "summary.csv", ExportFormat::Csv)?;
//! manager.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick example: merge two datasets
//!
//! ```rust
//! use stock_consolidator::columns::inventory_schema;
//! use stock_consolidator::consolidation::Consolidator;
//! use stock_consolidator::types::{DataSet, Value};
//!
//! # fn main() -> Result<(), stock_consolidator::StockError> {
//! let row = |name: &str, qty: i64| {
//!     vec![Value::Utf8(name.into()), Value::Utf8("Meubles".into()), Value::Int64(qty), Value::Float64(20.0)]
//! };
//! let existing = DataSet::new(inventory_schema(), vec![row("Chaise", 10)]);
//! let incoming = DataSet::new(inventory_schema(), vec![row("Chaise", 5)]);
//!
//! let merged = Consolidator::default().merge(&existing, &incoming)?;
//! assert_eq!(merged.rows, vec![row("Chaise", 15)]);
//! # Ok(())
//! # }
//! ```

pub mod columns;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod ingestion;
pub mod manager;
pub mod processing;
pub mod report;
pub mod search;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{StockError, StockResult};
