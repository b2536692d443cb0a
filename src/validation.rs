//! Schema and type compatibility checks between two datasets.
//!
//! [`validate`] never fails loudly: it returns a [`ValidationResult`] and leaves it to the caller
//! to decide whether a failure is fatal (an explicit merge) or merely reported (a file skipped
//! during directory consolidation).

use thiserror::Error;

use crate::types::{DataSet, DataType};

/// Outcome of [`validate`].
pub type ValidationResult = Result<(), ValidationFailure>;

/// Reason a source is not compatible with its reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Column names or their order differ.
    #[error("column names do not match: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A column has a different type in the source than in the reference.
    #[error("column '{column}' has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    /// The source contains an empty cell. `row` is 1-based over data rows.
    #[error("empty cell at row {row} column '{column}'")]
    EmptyCell { row: usize, column: String },
}

/// Check that `source` can be merged into `reference`.
///
/// Checks run in order and stop at the first failure:
///
/// 1. column names and order are identical ([`ValidationFailure::SchemaMismatch`])
/// 2. column types are identical pairwise ([`ValidationFailure::TypeMismatch`]). A source column
///    holding only empty cells has no observable type and is left to the next check.
/// 3. `source` has no null cells ([`ValidationFailure::EmptyCell`])
pub fn validate(source: &DataSet, reference: &DataSet) -> ValidationResult {
    let found: Vec<&str> = source.schema.field_names().collect();
    let expected: Vec<&str> = reference.schema.field_names().collect();
    if found != expected {
        return Err(ValidationFailure::SchemaMismatch {
            expected: expected.into_iter().map(str::to_owned).collect(),
            found: found.into_iter().map(str::to_owned).collect(),
        });
    }

    for (col, (src, refr)) in source
        .schema
        .fields
        .iter()
        .zip(&reference.schema.fields)
        .enumerate()
    {
        if src.data_type != refr.data_type && !all_null(source, col) {
            return Err(ValidationFailure::TypeMismatch {
                column: src.name.clone(),
                expected: refr.data_type,
                found: src.data_type,
            });
        }
    }

    if let Some((row, col)) = source.first_null() {
        return Err(ValidationFailure::EmptyCell {
            row: row + 1,
            column: source.schema.fields[col].name.clone(),
        });
    }

    Ok(())
}

fn all_null(dataset: &DataSet, col: usize) -> bool {
    dataset.rows.iter().all(|row| row[col].is_null())
}
