//! Persistent storage of consolidated inventory records.
//!
//! [`TableStore`] is the seam between the orchestrator and a backing database; [`SqliteStore`] is
//! the implementation used by the CLI. Records live in one table, `stocks`:
//!
//! | column       | type                                |
//! |--------------|-------------------------------------|
//! | `id`         | `INTEGER PRIMARY KEY AUTOINCREMENT` |
//! | `name`       | `TEXT NOT NULL`                     |
//! | `category`   | `TEXT NOT NULL`                     |
//! | `quantity`   | `INTEGER NOT NULL`                  |
//! | `unit_price` | `REAL NOT NULL`                     |
//!
//! ```rust
//! use stock_consolidator::columns::inventory_schema;
//! use stock_consolidator::store::{Criterion, QueryCriteria, SqliteStore, StoreColumn, TableStore};
//! use stock_consolidator::types::{DataSet, Value};
//!
//! # fn main() -> Result<(), stock_consolidator::StockError> {
//! let mut store = SqliteStore::open_in_memory()?;
//! store.ensure_schema()?;
//! store.insert(&DataSet::new(
//!     inventory_schema(),
//!     vec![vec![Value::Utf8("Chaise".into()), Value::Utf8("Meubles".into()), Value::Int64(10), Value::Float64(20.0)]],
//! ))?;
//!
//! let criteria = QueryCriteria::new().with(Criterion::equals(StoreColumn::Category, "Meubles")?);
//! assert_eq!(store.query(&criteria)?.row_count(), 1);
//! store.close()?;
//! # Ok(())
//! # }
//! ```

pub mod criteria;
pub mod sqlite;

use crate::error::StockResult;
use crate::types::{DataSet, Value};

pub use criteria::{Criterion, QueryCriteria, StoreColumn, store_schema};
pub use sqlite::SqliteStore;

/// A backing store for inventory records.
///
/// Every method fails with [`crate::StockError::StoreClosed`] once [`TableStore::close`] has been
/// called.
pub trait TableStore {
    /// Create the `stocks` table if it does not exist.
    fn ensure_schema(&self) -> StockResult<()>;

    /// Append every record of `dataset` in one transaction and return the number inserted.
    ///
    /// The dataset must contain the canonical `name`, `category`, `quantity` and `unit_price`
    /// columns ([`crate::StockError::SchemaViolation`] otherwise); other columns are ignored.
    fn insert(&mut self, dataset: &DataSet) -> StockResult<usize>;

    /// Records matching every criterion, in id order, with schema [`store_schema`].
    fn query(&self, criteria: &QueryCriteria) -> StockResult<DataSet>;

    /// Apply `changes` to the record with primary key `id` and return the number of rows changed.
    fn update(&mut self, id: i64, changes: &[(StoreColumn, Value)]) -> StockResult<usize>;

    /// Release the underlying connection.
    fn close(&mut self) -> StockResult<()>;
}
