//! Declarative filter configuration.
//!
//! The file format is JSON:
//!
//! ```json
//! { "filters": [
//!     { "column": "Person", "filter_type": "dropdown" },
//!     { "column": "Created Date", "filter_type": "date" }
//! ] }
//! ```
//!
//! `filter_type` accepts the UI-flavoured names (`dropdown`, `date`,
//! `numeric`) and the canonical ones (`categorical`, `date_range`,
//! `numeric_range`). Anything else is a [`ConfigError::UnknownFilterType`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::schema::PERSON_COLUMN;

/// Errors raised while loading or applying filter configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read filter config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse filter config: {0}")]
    Parse(String),

    #[error("unknown filter type '{filter_type}' for column '{column}'")]
    UnknownFilterType { column: String, filter_type: String },

    #[error("filter column '{0}' is not present in the dataset")]
    UnknownColumn(String),

    #[error("numeric filter column '{0}' has no numeric values")]
    NoNumericValues(String),

    #[error("filter dimension '{0}' is declared more than once")]
    DuplicateDimension(String),

    #[error("composite column '{0}' only supports categorical filters")]
    CompositeNotCategorical(String),
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Parse(_) => ErrorCode::ConfigParseError,
            Self::UnknownFilterType { .. } => ErrorCode::UnknownFilterType,
            Self::CompositeNotCategorical(_) => ErrorCode::CompositeNotCategorical,
            Self::UnknownColumn(_) => ErrorCode::UnknownColumn,
            Self::NoNumericValues(_) => ErrorCode::NoNumericValues,
            Self::DuplicateDimension(_) => ErrorCode::DuplicateDimension,
        }
    }
}

/// How a dimension is filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Categorical,
    DateRange,
    NumericRange,
}

impl FilterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::DateRange => "date_range",
            Self::NumericRange => "numeric_range",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "categorical" | "dropdown" => Ok(Self::Categorical),
            "date_range" | "date" => Ok(Self::DateRange),
            "numeric_range" | "numeric" => Ok(Self::NumericRange),
            _ => Err(s.to_string()),
        }
    }
}

/// One declared filter: a column (or the `Person` composite) and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterEntry {
    pub column: String,
    pub filter_type: FilterKind,
}

impl FilterEntry {
    #[must_use]
    pub fn new(column: impl Into<String>, filter_type: FilterKind) -> Self {
        Self {
            column: column.into(),
            filter_type,
        }
    }
}

/// The full declarative filter list, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    pub filters: Vec<FilterEntry>,
}

#[derive(Deserialize)]
struct RawFilterConfig {
    filters: Vec<RawFilterEntry>,
}

#[derive(Deserialize)]
struct RawFilterEntry {
    column: String,
    filter_type: String,
}

impl Default for FilterConfig {
    /// The dashboard's stock sidebar: people, priority, status, created date.
    fn default() -> Self {
        Self {
            filters: vec![
                FilterEntry::new(PERSON_COLUMN, FilterKind::Categorical),
                FilterEntry::new("Priority", FilterKind::Categorical),
                FilterEntry::new("Status", FilterKind::Categorical),
                FilterEntry::new("Created Date", FilterKind::DateRange),
            ],
        }
    }
}

impl FilterConfig {
    /// Parse a JSON filter declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::UnknownFilterType`] for an unrecognized `filter_type`.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: RawFilterConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let filters = parsed
            .filters
            .into_iter()
            .map(|entry| {
                let kind = FilterKind::from_str(&entry.filter_type).map_err(|filter_type| {
                    ConfigError::UnknownFilterType {
                        column: entry.column.clone(),
                        filter_type,
                    }
                })?;
                Ok(FilterEntry::new(entry.column, kind))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { filters })
    }

    /// Load a JSON filter declaration from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`FilterConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            filters = config.filters.len(),
            "loaded filter config"
        );
        Ok(config)
    }
}
