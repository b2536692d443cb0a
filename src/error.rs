use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationFailure;

/// Convenience result type used across the crate.
pub type StockResult<T> = Result<T, StockError>;

/// Error type returned by ingestion, consolidation, storage, search and reporting.
///
/// Validation failures have their own type ([`ValidationFailure`]) because the validator returns
/// them as values; they only become a `StockError` when a caller treats them as fatal.
#[derive(Debug, Error)]
pub enum StockError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backing store error.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The store handle was used after [`crate::store::TableStore::close`].
    #[error("store is closed")]
    StoreClosed,

    /// Two sources are not compatible for a merge.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    /// The input headers do not conform to the expected columns.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// An integer aggregate does not fit in 64 bits.
    #[error("integer overflow while summing column '{column}'")]
    Overflow { column: String },

    /// Consolidation produced no usable rows.
    #[error("no usable rows: {message}")]
    EmptyResult { message: String },

    /// A dataset is missing required inventory columns.
    #[error("missing required columns: {}", missing.join(", "))]
    SchemaViolation { missing: Vec<String> },

    /// A record cannot be written to the store; `row` is 1-based.
    #[error("invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    #[error("invalid id {0}: must be a positive integer")]
    InvalidId(i64),

    #[error("invalid threshold {0}: must be >= 0")]
    InvalidThreshold(i64),

    #[error("invalid price range: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid minimum quantity {0}: must be >= 0")]
    InvalidQuantity(i64),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unsupported export format '{0}' (expected csv, json or text)")]
    UnsupportedFormat(String),

    /// A required filter argument was empty.
    #[error("argument '{0}' must not be empty")]
    EmptyArgument(&'static str),

    /// A report was requested over a dataset with no rows.
    #[error("dataset is empty")]
    EmptyInput,

    /// A query criterion was rejected at construction.
    #[error("invalid criterion: {message}")]
    InvalidCriterion { message: String },

    /// A store update was rejected before reaching the store.
    #[error("invalid update: {message}")]
    InvalidUpdate { message: String },

    /// Writing an export failed.
    #[error("failed to write '{}': {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StockError {
    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }
}
