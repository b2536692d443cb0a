//! In-memory relational operators over [`crate::types::DataSet`].
//!
//! Consolidation, search and reporting are built from this small set of operators instead of a
//! dataframe library:
//!
//! - [`filter()`]: row filtering by predicate
//! - [`reduce()`]: common reductions (count/sum/min/max)
//! - [`group_by()`]: group-by-aggregate with per-column [`AggregateOp`]s
//! - [`sort_by()`]: stable sort on one column
//! - [`distinct()`]: exact-duplicate removal
//!
//! ## Example: filter → reduce
//!
//! ```rust
//! use stock_consolidator::columns::inventory_schema;
//! use stock_consolidator::processing::{ReduceOp, filter, reduce};
//! use stock_consolidator::types::{DataSet, Value};
//!
//! let ds = DataSet::new(
//!     inventory_schema(),
//!     vec![
//!         vec![Value::Utf8("Chaise".into()), Value::Utf8("Meubles".into()), Value::Int64(10), Value::Float64(20.0)],
//!         vec![Value::Utf8("Table".into()), Value::Utf8("Meubles".into()), Value::Int64(5), Value::Float64(50.0)],
//!         vec![Value::Utf8("Parasol".into()), Value::Utf8("Extérieur".into()), Value::Int64(7), Value::Float64(150.0)],
//!     ],
//! );
//!
//! let cat_idx = ds.schema.index_of("category").unwrap();
//! let furniture = filter(&ds, |row| row[cat_idx].as_str() == Some("Meubles"));
//!
//! let total = reduce(&furniture, "quantity", ReduceOp::Sum).unwrap();
//! assert_eq!(total, Some(Value::Int64(15)));
//! ```

pub mod distinct;
pub mod filter;
pub mod group;
pub mod reduce;
pub mod sort;

pub use distinct::distinct;
pub use filter::filter;
pub use group::{AggregateOp, group_by};
pub use reduce::{ReduceOp, reduce};
pub use sort::sort_by;
