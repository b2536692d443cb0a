//! Serialization of datasets to report files.
//!
//! - `csv`: header + rows, comma-delimited, no index column
//! - `json`: one JSON object per row, newline-delimited, keys in column order
//! - `text`: right-aligned fixed-width table with a header line

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use crate::error::{StockError, StockResult};
use crate::types::{DataSet, Field, Value};

/// Output format for [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    /// Conventional file extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = StockError;

    /// Parses `csv`, `json`, `text` or `txt` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(StockError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Text => "text",
        })
    }
}

/// Write `data` to `path` in `format`, replacing any existing file.
///
/// Any I/O failure (including failure to create the file) is reported as
/// [`StockError::WriteFailure`].
pub fn export(data: &DataSet, path: impl AsRef<Path>, format: ExportFormat) -> StockResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| StockError::write_failure(path, e))?;
    let mut out = BufWriter::new(file);

    let written = match format {
        ExportFormat::Csv => write_csv(data, &mut out),
        ExportFormat::Json => write_json(data, &mut out),
        ExportFormat::Text => write_text(data, &mut out),
    };
    written
        .and_then(|()| out.flush())
        .map_err(|e| StockError::write_failure(path, e))?;

    info!(path = %path.display(), %format, rows = data.row_count(), "exported dataset");
    Ok(())
}

/// Write `data` as CSV with a header row.
pub fn write_csv<W: Write>(data: &DataSet, out: W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(data.schema.field_names())?;
    for row in &data.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()
}

struct JsonRecord<'a> {
    fields: &'a [Field],
    row: &'a [Value],
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in self.fields.iter().zip(self.row) {
            map.serialize_entry(&field.name, value)?;
        }
        map.end()
    }
}

/// Write `data` as newline-delimited JSON objects, one per row.
pub fn write_json<W: Write>(data: &DataSet, mut out: W) -> io::Result<()> {
    for row in &data.rows {
        let record = JsonRecord {
            fields: &data.schema.fields,
            row,
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Write `data` as a plain fixed-width table. Every column is right-aligned to its widest cell
/// (header included) and columns are separated by two spaces.
pub fn write_text<W: Write>(data: &DataSet, mut out: W) -> io::Result<()> {
    let rendered: Vec<Vec<String>> = data
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = data
        .schema
        .field_names()
        .map(|name| name.chars().count())
        .collect();
    for row in &rendered {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<&str> = data.schema.field_names().collect();
    write_text_line(&mut out, &header, &widths)?;
    for row in &rendered {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        write_text_line(&mut out, &cells, &widths)?;
    }
    Ok(())
}

fn write_text_line<W: Write>(out: &mut W, cells: &[&str], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{line}")
}
