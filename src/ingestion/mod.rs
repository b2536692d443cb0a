//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - detects the format by file extension (or you can override via [`IngestionOptions`])
//! - reads the file into an inventory [`crate::types::DataSet`] using the configured column
//!   mapping
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The CSV readers themselves live in [`csv`].

pub mod csv;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use unified::{IngestionFormat, IngestionOptions, ingest_from_path, severity_for_error};
