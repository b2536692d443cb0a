//! Consolidation of inventory sources into one authoritative dataset.
//!
//! Two modes are supported:
//!
//! - [`Consolidator::merge`]: fold an incoming dataset into an existing one. Both must pass
//!   [`crate::validation::validate`]; records sharing a merge key `(name, category)` are
//!   aggregated (quantities summed, first unit price kept).
//! - [`Consolidator::consolidate_directory`]: read every CSV file in a directory, skip the ones
//!   that cannot be parsed, and clean the concatenation (incomplete rows dropped, exact
//!   duplicates removed).
//!
//! The "first unit price wins" rule silently discards later prices for the same item. It is kept
//! on purpose; changing it needs a product decision.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::columns::inventory_schema;
use crate::error::{StockError, StockResult};
use crate::ingestion::csv::ingest_csv_inferred_from_path;
use crate::ingestion::{IngestionFormat, IngestionOptions, ingest_from_path};
use crate::processing::{AggregateOp, distinct, group_by};
use crate::report::{ExportFormat, export};
use crate::types::DataSet;
use crate::validation::validate;

/// Options controlling consolidation.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationOptions {
    /// Per-file ingestion settings (column mapping, observer).
    pub ingestion: IngestionOptions,
    /// Read source files on the rayon thread pool. Results are still combined in sorted
    /// filename order.
    pub parallel: bool,
}

/// A source file left out of a directory consolidation.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: StockError,
}

impl fmt::Display for SkippedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Result of [`Consolidator::consolidate_directory`].
#[derive(Debug)]
pub struct Consolidation {
    /// The consolidated dataset (canonical inventory schema).
    pub dataset: DataSet,
    /// Files that were read, in processing order.
    pub loaded_files: Vec<PathBuf>,
    /// Files that could not be parsed, with the reason.
    pub skipped_files: Vec<SkippedFile>,
    /// Rows read across all loaded files.
    pub rows_read: usize,
    /// Rows dropped because they contained an empty cell.
    pub incomplete_rows_dropped: usize,
    /// Exact duplicate rows removed.
    pub duplicates_removed: usize,
}

/// Sources read from a directory, before cleaning.
#[derive(Debug)]
pub struct LoadedSources {
    /// Concatenation of every successfully parsed file.
    pub dataset: DataSet,
    pub loaded_files: Vec<PathBuf>,
    pub skipped_files: Vec<SkippedFile>,
}

/// Merges and consolidates inventory datasets.
#[derive(Debug, Clone, Default)]
pub struct Consolidator {
    options: ConsolidationOptions,
}

impl Consolidator {
    pub fn new(options: ConsolidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConsolidationOptions {
        &self.options
    }

    /// Merge `incoming` into `existing`.
    ///
    /// Fails with [`StockError::Validation`] if `validate(incoming, existing)` fails. Otherwise
    /// returns a dataset with `existing`'s schema holding one row per merge key, in the order
    /// keys first appear (existing records before incoming ones). Quantities are summed; every
    /// other column keeps the first record's value.
    pub fn merge(&self, existing: &DataSet, incoming: &DataSet) -> StockResult<DataSet> {
        validate(incoming, existing)?;
        let idx = self.options.ingestion.mapping.locate_in(&existing.schema)?;

        let mut combined = existing.clone();
        combined.rows.extend(incoming.rows.iter().cloned());

        let ops: Vec<AggregateOp> = (0..existing.schema.len())
            .map(|col| {
                if col == idx.quantity {
                    AggregateOp::Sum
                } else {
                    AggregateOp::First
                }
            })
            .collect();

        let merged = group_by(&combined, &[idx.name, idx.category], &ops)?;

        debug!(
            existing = existing.row_count(),
            incoming = incoming.row_count(),
            merged = merged.row_count(),
            "merged datasets"
        );
        Ok(merged)
    }

    /// Merge the CSV file at `incoming_path` into the CSV file at `existing_path` and rewrite
    /// `existing_path` with the result (original headers, no index column).
    ///
    /// Both files are read with inferred column types so that their schemas can be validated
    /// against each other as written.
    pub fn import_file(
        &self,
        existing_path: impl AsRef<Path>,
        incoming_path: impl AsRef<Path>,
    ) -> StockResult<DataSet> {
        let existing_path = existing_path.as_ref();
        let incoming_path = incoming_path.as_ref();

        let existing = ingest_csv_inferred_from_path(existing_path)?;
        let incoming = ingest_csv_inferred_from_path(incoming_path)?;
        let merged = self.merge(&existing, &incoming)?;

        replace_with(existing_path, &merged)?;
        info!(
            database = %existing_path.display(),
            incoming = %incoming_path.display(),
            rows = merged.row_count(),
            "imported file"
        );
        Ok(merged)
    }

    /// Read every tabular file directly inside `dir`, in sorted filename order.
    ///
    /// Files that fail to parse are recorded in [`LoadedSources::skipped_files`] and logged;
    /// they never fail the call. A missing or unreadable directory does.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> StockResult<LoadedSources> {
        let dir = dir.as_ref();
        let paths = list_sources(dir)?;
        let ingestion = &self.options.ingestion;

        let results: Vec<(PathBuf, StockResult<DataSet>)> = if self.options.parallel {
            paths
                .into_par_iter()
                .map(|path| {
                    let result = ingest_from_path(&path, ingestion);
                    (path, result)
                })
                .collect()
        } else {
            paths
                .into_iter()
                .map(|path| {
                    let result = ingest_from_path(&path, ingestion);
                    (path, result)
                })
                .collect()
        };

        let mut dataset = DataSet::empty(inventory_schema());
        let mut loaded_files = Vec::new();
        let mut skipped_files = Vec::new();
        for (path, result) in results {
            match result {
                Ok(ds) => {
                    debug!(path = %path.display(), rows = ds.row_count(), "loaded source");
                    dataset.rows.extend(ds.rows);
                    loaded_files.push(path);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping source file");
                    skipped_files.push(SkippedFile { path, error });
                }
            }
        }

        Ok(LoadedSources {
            dataset,
            loaded_files,
            skipped_files,
        })
    }

    /// Consolidate every tabular file in `dir` into one dataset.
    ///
    /// Fails with [`StockError::EmptyResult`] if no usable row remains (empty directory, only
    /// empty or unparseable files, or only incomplete rows).
    pub fn consolidate_directory(&self, dir: impl AsRef<Path>) -> StockResult<Consolidation> {
        let dir = dir.as_ref();
        let loaded = self.load_directory(dir)?;

        let rows_read = loaded.dataset.row_count();
        let complete = drop_incomplete_rows(&loaded.dataset);
        let deduped = remove_duplicates(&complete);

        if deduped.is_empty() {
            return Err(StockError::EmptyResult {
                message: format!(
                    "{} ({} files loaded, {} skipped)",
                    dir.display(),
                    loaded.loaded_files.len(),
                    loaded.skipped_files.len()
                ),
            });
        }

        let consolidation = Consolidation {
            rows_read,
            incomplete_rows_dropped: rows_read - complete.row_count(),
            duplicates_removed: complete.row_count() - deduped.row_count(),
            dataset: deduped,
            loaded_files: loaded.loaded_files,
            skipped_files: loaded.skipped_files,
        };

        info!(
            dir = %dir.display(),
            files = consolidation.loaded_files.len(),
            skipped = consolidation.skipped_files.len(),
            rows = consolidation.dataset.row_count(),
            incomplete = consolidation.incomplete_rows_dropped,
            duplicates = consolidation.duplicates_removed,
            "consolidated directory"
        );
        Ok(consolidation)
    }
}

/// Drop every row holding at least one empty cell.
pub fn drop_incomplete_rows(dataset: &DataSet) -> DataSet {
    dataset.filter_rows(|row| !row.iter().any(|v| v.is_null()))
}

/// Remove rows equal in every column to an earlier row. Idempotent.
pub fn remove_duplicates(dataset: &DataSet) -> DataSet {
    distinct(dataset)
}

/// Write `data` as CSV next to `path`, then rename it over `path`. A failed write leaves the
/// original file as it was.
fn replace_with(path: &Path, data: &DataSet) -> StockResult<()> {
    let staging = staging_path(path);
    let written = export(data, &staging, ExportFormat::Csv).and_then(|()| {
        fs::rename(&staging, path).map_err(|e| StockError::write_failure(path, e))
    });
    if written.is_err() {
        fs::remove_file(&staging).ok();
    }
    written
}

/// `<file name>.tmp` in the same directory, so the final rename stays on one filesystem.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("database.csv"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn list_sources(dir: &Path) -> StockResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if IngestionFormat::from_path(entry.path()).is_some() {
            paths.push(entry.into_path());
        } else {
            debug!(path = %entry.path().display(), "ignoring non-tabular file");
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::{Consolidator, drop_incomplete_rows, remove_duplicates};
    use crate::columns::inventory_schema;
    use crate::error::StockError;
    use crate::types::{DataSet, DataType, Field, Schema, Value};
    use crate::validation::ValidationFailure;

    fn rec(name: &str, cat: &str, qty: i64, price: f64) -> Vec<Value> {
        vec![
            Value::Utf8(name.to_string()),
            Value::Utf8(cat.to_string()),
            Value::Int64(qty),
            Value::Float64(price),
        ]
    }

    fn inventory(rows: Vec<Vec<Value>>) -> DataSet {
        DataSet::new(inventory_schema(), rows)
    }

    #[test]
    fn merge_sums_quantities_and_keeps_existing_price() {
        let existing = inventory(vec![
            rec("Chaise", "Meubles", 10, 20.0),
            rec("Table", "Meubles", 5, 50.0),
        ]);
        let incoming = inventory(vec![
            rec("Chaise", "Meubles", 5, 25.0),
            rec("Armoire", "Meubles", 3, 100.0),
        ]);

        let merged = Consolidator::default().merge(&existing, &incoming).unwrap();

        assert_eq!(merged.schema, existing.schema);
        assert_eq!(
            merged.rows,
            vec![
                rec("Chaise", "Meubles", 15, 20.0),
                rec("Table", "Meubles", 5, 50.0),
                rec("Armoire", "Meubles", 3, 100.0),
            ]
        );
    }

    #[test]
    fn merge_output_has_one_row_per_key_with_summed_quantity() {
        let existing = inventory(vec![
            rec("A", "Cat1", 1, 1.0),
            rec("A", "Cat1", 2, 2.0),
            rec("A", "Cat2", 4, 3.0),
        ]);
        let incoming = inventory(vec![rec("A", "Cat2", 8, 4.0), rec("B", "Cat1", 16, 5.0)]);

        let merged = Consolidator::default().merge(&existing, &incoming).unwrap();

        let mut expected: HashMap<(String, String), i64> = HashMap::new();
        for row in existing.rows.iter().chain(&incoming.rows) {
            let key = (row[0].to_string(), row[1].to_string());
            *expected.entry(key).or_default() += row[2].as_i64().unwrap();
        }
        let keys: HashSet<_> = expected.keys().cloned().collect();

        assert_eq!(merged.row_count(), keys.len());
        for row in &merged.rows {
            let key = (row[0].to_string(), row[1].to_string());
            assert_eq!(row[2].as_i64(), Some(expected[&key]));
        }
        // First encountered price per key.
        assert_eq!(merged.rows[0][3], Value::Float64(1.0));
        assert_eq!(merged.rows[1][3], Value::Float64(3.0));
    }

    #[test]
    fn merge_keeps_localized_column_order() {
        let schema = Schema::new(vec![
            Field::new("Nom du Produit", DataType::Utf8),
            Field::new("Quantité", DataType::Int64),
            Field::new("Prix Unitaire", DataType::Float64),
            Field::new("Catégorie", DataType::Utf8),
        ]);
        let row = |n: &str, q: i64, p: f64| {
            vec![
                Value::Utf8(n.to_string()),
                Value::Int64(q),
                Value::Float64(p),
                Value::Utf8("Meubles".to_string()),
            ]
        };
        let existing = DataSet::new(schema.clone(), vec![row("Chaise", 10, 20.0), row("Table", 5, 50.0)]);
        let incoming = DataSet::new(schema.clone(), vec![row("Chaise", 5, 20.0)]);

        let merged = Consolidator::default().merge(&existing, &incoming).unwrap();

        assert_eq!(merged.schema, schema);
        assert_eq!(merged.rows, vec![row("Chaise", 15, 20.0), row("Table", 5, 50.0)]);
    }

    #[test]
    fn merge_is_fatal_on_validation_failure() {
        let existing = inventory(vec![rec("Chaise", "Meubles", 10, 20.0)]);
        let mut bad = rec("Armoire", "Meubles", 3, 100.0);
        bad[2] = Value::Null;
        let incoming = inventory(vec![bad]);

        let err = Consolidator::default().merge(&existing, &incoming).unwrap_err();
        assert!(matches!(
            err,
            StockError::Validation(ValidationFailure::EmptyCell { row: 1, .. })
        ));
    }

    #[test]
    fn merge_requires_merge_key_columns() {
        let schema = Schema::new(vec![
            Field::new("sku", DataType::Utf8),
            Field::new("quantity", DataType::Int64),
        ]);
        let ds = DataSet::new(
            schema,
            vec![vec![Value::Utf8("X".to_string()), Value::Int64(1)]],
        );

        let err = Consolidator::default().merge(&ds, &ds).unwrap_err();
        assert!(matches!(err, StockError::SchemaViolation { .. }));
    }

    #[test]
    fn drop_incomplete_rows_removes_rows_with_any_null() {
        let mut partial = rec("B", "Cat1", 1, 1.0);
        partial[3] = Value::Null;
        let ds = inventory(vec![rec("A", "Cat1", 1, 1.0), partial]);

        let out = drop_incomplete_rows(&ds);
        assert_eq!(out.rows, vec![rec("A", "Cat1", 1, 1.0)]);
    }

    #[test]
    fn remove_duplicates_twice_matches_once() {
        let ds = inventory(vec![
            rec("Produit A", "Cat1", 10, 100.0),
            rec("Produit B", "Cat2", 5, 200.0),
            rec("Produit C", "Cat1", 15, 150.0),
            rec("Produit A", "Cat1", 10, 100.0),
        ]);
        let once = remove_duplicates(&ds);
        assert_eq!(once.row_count(), 3);
        assert_eq!(remove_duplicates(&once).row_count(), once.row_count());
    }
}
