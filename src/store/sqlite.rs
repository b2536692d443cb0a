//! SQLite-backed [`TableStore`].

use std::path::{Path, PathBuf};

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use tracing::{debug, info};

use crate::columns::ColumnMapping;
use crate::error::{StockError, StockResult};
use crate::types::{DataSet, Value};

use super::TableStore;
use super::criteria::{QueryCriteria, StoreColumn, store_schema};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS stocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    unit_price REAL NOT NULL
)";

const INSERT_ROW: &str =
    "INSERT INTO stocks (name, category, quantity, unit_price) VALUES (?1, ?2, ?3, ?4)";

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Int64(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Float64(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Utf8(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// A [`TableStore`] holding the single `stocks` table in a SQLite database.
///
/// The connection is owned by the store and released by [`TableStore::close`] or on drop.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> StockResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened stock database");
        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StockResult<Self> {
        Ok(Self {
            conn: Some(Connection::open_in_memory()?),
            path: None,
        })
    }

    /// Database file path, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> StockResult<&Connection> {
        self.conn.as_ref().ok_or(StockError::StoreClosed)
    }

    fn conn_mut(&mut self) -> StockResult<&mut Connection> {
        self.conn.as_mut().ok_or(StockError::StoreClosed)
    }
}

impl TableStore for SqliteStore {
    fn ensure_schema(&self) -> StockResult<()> {
        self.conn()?.execute_batch(CREATE_TABLE)?;
        Ok(())
    }

    fn insert(&mut self, dataset: &DataSet) -> StockResult<usize> {
        let idx = ColumnMapping::canonical().locate_in(&dataset.schema)?;
        let columns = [
            (StoreColumn::Name, idx.name),
            (StoreColumn::Category, idx.category),
            (StoreColumn::Quantity, idx.quantity),
            (StoreColumn::UnitPrice, idx.unit_price),
        ];
        let records = dataset
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                columns
                    .iter()
                    .map(|&(column, at)| {
                        column
                            .check_stored(row[at].clone())
                            .map_err(|message| StockError::InvalidRecord {
                                row: i + 1,
                                message,
                            })
                    })
                    .collect::<StockResult<Vec<_>>>()
            })
            .collect::<StockResult<Vec<_>>>()?;

        let conn = self.conn_mut()?;
        // Dropping an uncommitted transaction rolls it back.
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_ROW)?;
            for record in &records {
                stmt.execute(params_from_iter(record.iter()))?;
            }
        }
        tx.commit()?;

        debug!(rows = dataset.row_count(), "inserted records");
        Ok(dataset.row_count())
    }

    fn query(&self, criteria: &QueryCriteria) -> StockResult<DataSet> {
        let (clause, values) = criteria.to_where_clause();
        let sql = format!(
            "SELECT id, name, category, quantity, unit_price FROM stocks{clause} ORDER BY id"
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |r| {
                Ok(vec![
                    Value::Int64(r.get(0)?),
                    Value::Utf8(r.get(1)?),
                    Value::Utf8(r.get(2)?),
                    Value::Int64(r.get(3)?),
                    Value::Float64(r.get(4)?),
                ])
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DataSet::new(store_schema(), rows))
    }

    fn update(&mut self, id: i64, changes: &[(StoreColumn, Value)]) -> StockResult<usize> {
        if id <= 0 {
            return Err(StockError::InvalidId(id));
        }
        let mut values = changes
            .iter()
            .map(|(column, value)| {
                if *column == StoreColumn::Id {
                    return Err(StockError::InvalidUpdate {
                        message: "the id column cannot be updated".to_string(),
                    });
                }
                column
                    .check_stored(value.clone())
                    .map_err(|message| StockError::InvalidUpdate { message })
            })
            .collect::<StockResult<Vec<_>>>()?;

        let conn = self.conn()?;
        if changes.is_empty() {
            return Ok(0);
        }

        let assignments = changes
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column.name(), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE stocks SET {assignments} WHERE id = ?{}",
            changes.len() + 1
        );
        values.push(Value::Int64(id));

        let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
        debug!(id, changed, "updated record");
        Ok(changed)
    }

    fn close(&mut self) -> StockResult<()> {
        let conn = self.conn.take().ok_or(StockError::StoreClosed)?;
        conn.close().map_err(|(_, e)| StockError::Store(e))?;
        info!("closed stock database");
        Ok(())
    }
}
