//! Turning uploaded or exported files into a canonical [`Dataset`].
//!
//! Every source goes through the same two steps: a format reader
//! ([`csv`](self::csv) or [`xlsx`]) produces a raw table, then
//! [`normalize`] enforces the key invariants and types the creation-date
//! column. A failure at either step yields no dataset at all.

pub mod csv;
pub mod upload;
pub mod xlsx;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::{Cell, Dataset};
use crate::dates::parse_datetime;
use crate::error::ErrorCode;
use crate::schema::DatasetSchema;

/// Errors raised while ingesting a file.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("could not parse {kind} content: {reason}")]
    Unparseable { kind: SourceKind, reason: String },

    #[error("malformed upload: {0}")]
    InvalidUpload(String),

    #[error("key column '{0}' is missing from the file")]
    MissingKeyColumn(String),

    #[error("data row {} has no ticket key", .row + 1)]
    MissingKey { row: usize },

    #[error("ticket key '{key}' appears on data rows {} and {}", .first_row + 1, .row + 1)]
    DuplicateKey {
        key: String,
        first_row: usize,
        row: usize,
    },
}

impl IngestionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Unparseable { .. } | Self::InvalidUpload(_) => {
                ErrorCode::UnparseableContent
            }
            Self::UnsupportedFileType(_) => ErrorCode::UnsupportedFileType,
            Self::MissingKeyColumn(_) | Self::MissingKey { .. } => ErrorCode::MissingKey,
            Self::DuplicateKey { .. } => ErrorCode::DuplicateKey,
        }
    }
}

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Csv,
    Xlsx,
}

impl SourceKind {
    /// Pick the format from a file name's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`IngestionError::UnsupportedFileType`] for anything but `.csv` and
    /// `.xlsx`.
    pub fn from_file_name(name: &str) -> Result<Self, IngestionError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(IngestionError::UnsupportedFileType(name.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        })
    }
}

/// What to do when two rows share a ticket key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    #[default]
    Reject,
    /// The later row replaces the earlier one, keeping the earlier position.
    LastWriteWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOptions {
    pub schema: DatasetSchema,
    pub duplicate_keys: DuplicateKeyPolicy,
}

/// Parse raw file bytes into a canonical dataset.
///
/// # Errors
///
/// Any [`IngestionError`] from the format reader, a missing key column or
/// key value, or a duplicate key under [`DuplicateKeyPolicy::Reject`].
pub fn normalize(
    bytes: &[u8],
    kind: SourceKind,
    options: &IngestOptions,
) -> Result<Dataset, IngestionError> {
    let raw = match kind {
        SourceKind::Csv => csv::read(bytes)?,
        SourceKind::Xlsx => xlsx::read(bytes)?,
    };
    let dataset = finalize(raw, options)?;
    info!(
        source = %kind,
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "normalized dataset"
    );
    Ok(dataset)
}

/// Read a `.csv` or `.xlsx` file from disk and normalize it.
///
/// # Errors
///
/// [`IngestionError::Io`] if the file cannot be read, otherwise the same
/// errors as [`normalize`].
pub fn load_file(path: &Path, options: &IngestOptions) -> Result<Dataset, IngestionError> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let kind = SourceKind::from_file_name(name)?;
    let bytes = std::fs::read(path).map_err(|source| IngestionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    normalize(&bytes, kind, options)
}

/// Enforce key invariants and type the creation-date column.
///
/// Also used for tracker-fetched data, which arrives already tabular.
///
/// # Errors
///
/// See [`normalize`].
pub fn finalize(raw: Dataset, options: &IngestOptions) -> Result<Dataset, IngestionError> {
    let schema = &options.schema;
    let key_col = raw
        .column_index(&schema.key_column)
        .ok_or_else(|| IngestionError::MissingKeyColumn(schema.key_column.clone()))?;
    let created_col = raw.column_index(&schema.created_column);

    let (columns, rows) = raw.into_parts();
    let mut out = Dataset::new(columns);
    // key -> (source row, output position)
    let mut positions: HashMap<String, (usize, usize)> = HashMap::with_capacity(rows.len());
    let mut unparsed_dates = 0usize;

    for (row, mut cells) in rows.into_iter().enumerate() {
        let key = cells[key_col]
            .as_text()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(IngestionError::MissingKey { row })?;

        if let Some(col) = created_col {
            if let Cell::Text(text) = &cells[col] {
                match parse_datetime(text) {
                    Some(dt) => cells[col] = Cell::DateTime(dt),
                    None => unparsed_dates += 1,
                }
            }
        }

        match positions.get(&key).copied() {
            None => {
                positions.insert(key, (row, out.len()));
                out.push_row(cells);
            }
            Some((first_row, position)) => match options.duplicate_keys {
                DuplicateKeyPolicy::Reject => {
                    return Err(IngestionError::DuplicateKey {
                        key,
                        first_row,
                        row,
                    });
                }
                DuplicateKeyPolicy::LastWriteWins => {
                    debug!(%key, first_row, row, "duplicate key, keeping the later row");
                    out.replace_row(position, cells);
                }
            },
        }
    }

    if unparsed_dates > 0 {
        debug!(
            column = %schema.created_column,
            count = unparsed_dates,
            "creation dates left unparsed"
        );
    }
    Ok(out)
}
