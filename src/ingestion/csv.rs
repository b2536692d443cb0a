//! CSV ingestion implementation.
//!
//! Three readers share the same cell rules (trimmed text, empty cells become
//! [`Value::Null`]) and differ in how the output schema is chosen:
//!
//! - [`ingest_csv_from_path`]: an explicit [`Schema`] the headers must contain
//! - [`ingest_inventory_csv_from_path`]: the canonical inventory schema, with headers resolved
//!   through a [`ColumnMapping`]
//! - [`ingest_csv_inferred_from_path`]: the file's own headers, with column types inferred

use std::path::Path;

use crate::columns::{ColumnMapping, InventoryColumn, inventory_schema};
use crate::error::{StockError, StockResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

fn reader_from_path(path: impl AsRef<Path>) -> StockResult<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?)
}

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ).
/// - Each value is parsed according to the schema field type.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> StockResult<DataSet> {
    let mut rdr = reader_from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> StockResult<DataSet> {
    let headers = rdr.headers()?.clone();

    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let mut col_idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match headers.iter().position(|h| h.trim() == field.name) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(StockError::SchemaMismatch {
                    message: format!(
                        "missing required column '{field}'. headers={:?}",
                        headers.iter().collect::<Vec<_>>(),
                        field = field.name
                    ),
                });
            }
        }
    }

    read_rows(rdr, schema, &col_idxs, parse_typed_value)
}

/// Ingest an inventory CSV file into a [`DataSet`] with the canonical inventory schema.
///
/// Headers are resolved through `mapping`, so localized display names are accepted. Extra
/// columns are ignored. `quantity` must be a non-negative integer (an integral decimal such as
/// `10.0` is accepted) and `unit_price` a non-negative number.
pub fn ingest_inventory_csv_from_path(
    path: impl AsRef<Path>,
    mapping: &ColumnMapping,
) -> StockResult<DataSet> {
    let mut rdr = reader_from_path(path)?;
    ingest_inventory_csv_from_reader(&mut rdr, mapping)
}

/// Ingest inventory CSV data from an existing CSV reader.
pub fn ingest_inventory_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    mapping: &ColumnMapping,
) -> StockResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let located = mapping.locate(headers.iter()).map_err(|e| match e {
        StockError::SchemaViolation { missing } => StockError::SchemaMismatch {
            message: format!(
                "missing required columns {missing:?}. headers={:?}",
                headers.iter().collect::<Vec<_>>()
            ),
        },
        other => other,
    })?;

    let col_idxs: Vec<usize> = InventoryColumn::ALL.iter().map(|c| located.get(*c)).collect();
    read_rows(rdr, &inventory_schema(), &col_idxs, parse_inventory_value)
}

/// Ingest a CSV file keeping its own headers and inferring each column's type.
///
/// A column is [`DataType::Int64`] if every non-empty cell parses as an integer, otherwise
/// [`DataType::Float64`] if every non-empty cell parses as a number, otherwise
/// [`DataType::Utf8`]. A column with no non-empty cells is `Utf8`.
pub fn ingest_csv_inferred_from_path(path: impl AsRef<Path>) -> StockResult<DataSet> {
    let mut rdr = reader_from_path(path)?;
    ingest_csv_inferred_from_reader(&mut rdr)
}

/// Ingest CSV data with inferred types from an existing CSV reader.
pub fn ingest_csv_inferred_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> StockResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

    let fields: Vec<Field> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = records
                .iter()
                .map(|r| r.get(idx).unwrap_or("").trim())
                .filter(|c| !c.is_empty());
            Field::new(name.trim(), infer_type(cells))
        })
        .collect();
    let schema = Schema::new(fields);

    let mut rows = Vec::with_capacity(records.len());
    for (row_idx0, record) in records.iter().enumerate() {
        let mut row = Vec::with_capacity(schema.len());
        for (idx, field) in schema.fields.iter().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            row.push(parse_typed_value(row_idx0 + 2, &field.name, field.data_type, raw)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn infer_type<'a>(cells: impl Iterator<Item = &'a str>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for cell in cells {
        let cell_type = if cell.parse::<i64>().is_ok() {
            DataType::Int64
        } else if cell.parse::<f64>().is_ok() {
            DataType::Float64
        } else {
            return DataType::Utf8;
        };
        inferred = Some(match (inferred, cell_type) {
            (Some(DataType::Float64), _) | (_, DataType::Float64) => DataType::Float64,
            _ => DataType::Int64,
        });
    }
    inferred.unwrap_or(DataType::Utf8)
}

type CellParser = fn(usize, &str, DataType, &str) -> StockResult<Value>;

fn read_rows<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
    col_idxs: &[usize],
    parse: CellParser,
) -> StockResult<DataSet> {
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (field, &csv_idx) in schema.fields.iter().zip(col_idxs.iter()) {
            let raw = record.get(csv_idx).unwrap_or("");
            row.push(parse(user_row, &field.name, field.data_type, raw)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

fn parse_error(row: usize, column: &str, raw: &str, message: impl Into<String>) -> StockError {
    StockError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message: message.into(),
    }
}

fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> StockResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| parse_error(row, column, raw, e.to_string())),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| parse_error(row, column, raw, e.to_string())),
    }
}

fn parse_inventory_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> StockResult<Value> {
    let trimmed = raw.trim();
    let value = match data_type {
        // Columns holding a missing value are often written as decimals ("10.0").
        DataType::Int64 if trimmed.contains('.') => {
            let v = trimmed
                .parse::<f64>()
                .map_err(|e| parse_error(row, column, raw, e.to_string()))?;
            if v.fract() != 0.0 || !v.is_finite() {
                return Err(parse_error(row, column, raw, "expected a whole number"));
            }
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if v < i64::MIN as f64 || v >= i64::MAX as f64 {
                return Err(parse_error(row, column, raw, "out of range for a 64-bit integer"));
            }
            Value::Int64(v as i64)
        }
        _ => parse_typed_value(row, column, data_type, raw)?,
    };

    match value.as_f64() {
        Some(v) if v < 0.0 => Err(parse_error(row, column, raw, "must be non-negative")),
        _ => Ok(value),
    }
}
