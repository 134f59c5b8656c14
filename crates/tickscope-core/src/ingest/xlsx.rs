//! Spreadsheet reader. Only the first worksheet is read.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, XlsxError, open_workbook_from_rs};

use crate::dataset::{Cell, Dataset};
use crate::dates::parse_datetime;
use crate::ingest::csv::{dedupe_headers, header_name};
use crate::ingest::{IngestionError, SourceKind};

/// Parse XLSX bytes into a raw dataset. The first row is the header.
///
/// # Errors
///
/// [`IngestionError::Unparseable`] when the workbook cannot be opened or has
/// no worksheet or header row.
pub fn read(bytes: &[u8]) -> Result<Dataset, IngestionError> {
    let unparseable = |reason: String| IngestionError::Unparseable {
        kind: SourceKind::Xlsx,
        reason,
    };

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: XlsxError| unparseable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unparseable("workbook has no worksheets".to_string()))?
        .map_err(|e| unparseable(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| unparseable("worksheet is empty".to_string()))?;
    let columns = dedupe_headers(
        header
            .iter()
            .enumerate()
            .map(|(i, data)| header_name(i, &cell_from_data(data).as_text().unwrap_or_default()))
            .collect(),
    );

    let mut dataset = Dataset::new(columns);
    for row in rows {
        dataset.push_row(row.iter().map(cell_from_data).collect());
    }
    tracing::debug!(rows = dataset.len(), "read first worksheet");
    Ok(dataset)
}

/// Map one spreadsheet value onto the canonical cell type.
#[must_use]
pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(text) => Cell::from_raw(text),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::Bool(value) => Cell::Text(if *value { "True" } else { "False" }.to_string()),
        Data::DateTime(value) => value
            .as_datetime()
            .map_or_else(|| Cell::Number(value.as_f64()), Cell::DateTime),
        Data::DateTimeIso(text) => parse_datetime(text).map_or_else(|| Cell::from_raw(text), Cell::DateTime),
        Data::DurationIso(text) => Cell::from_raw(text),
    }
}
