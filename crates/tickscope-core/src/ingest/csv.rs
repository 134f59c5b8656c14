//! Delimited-text reader.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::dataset::{Cell, Dataset};
use crate::ingest::{IngestionError, SourceKind};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode bytes as UTF-8, falling back to Latin-1 (ISO-8859-1).
///
/// Latin-1 maps every byte to a code point, so the fallback cannot fail.
#[must_use]
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            tracing::debug!("input is not valid UTF-8, decoding as Latin-1");
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Parse CSV bytes into a raw (untyped) dataset. The first record is the
/// header; short rows are padded with empty cells.
///
/// # Errors
///
/// [`IngestionError::Unparseable`] when there is no header, a record is
/// malformed, or a record has more fields than the header.
pub fn read(bytes: &[u8]) -> Result<Dataset, IngestionError> {
    let text = decode(bytes);
    let unparseable = |reason: String| IngestionError::Unparseable {
        kind: SourceKind::Csv,
        reason,
    };

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = dedupe_headers(
        reader
            .headers()
            .map_err(|e| unparseable(e.to_string()))?
            .iter()
            .enumerate()
            .map(|(i, name)| header_name(i, name))
            .collect(),
    );
    if headers.is_empty() {
        return Err(unparseable("no header row".to_string()));
    }

    let width = headers.len();
    let mut dataset = Dataset::new(headers);
    for record in reader.records() {
        let record = record.map_err(|e| unparseable(e.to_string()))?;
        if record.len() > width {
            let line = record.position().map_or(0, ::csv::Position::line);
            return Err(unparseable(format!(
                "line {line}: expected {width} fields, found {}",
                record.len()
            )));
        }
        dataset.push_row(record.iter().map(Cell::from_raw).collect());
    }
    Ok(dataset)
}

/// Header cell as a column name; blank headers get a positional name.
pub(crate) fn header_name(index: usize, raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("Unnamed: {index}")
    } else {
        name.to_string()
    }
}

/// Rename repeated header names `name.1`, `name.2`, ... so every column
/// stays addressable.
pub(crate) fn dedupe_headers(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            out.push(name);
            continue;
        }
        let mut renamed = format!("{name}.{count}");
        while taken.contains(&renamed) {
            *count += 1;
            renamed = format!("{name}.{count}");
        }
        *count += 1;
        tracing::warn!(column = %name, renamed = %renamed, "renamed repeated header");
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    out
}
