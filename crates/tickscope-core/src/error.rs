use std::fmt;

/// Machine-readable error codes shared by every tickscope error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    UnknownFilterType,
    UnknownColumn,
    NoNumericValues,
    DuplicateDimension,
    CompositeNotCategorical,
    UnsupportedFileType,
    UnparseableContent,
    MissingColumn,
    MissingKey,
    DuplicateKey,
    UnknownDimension,
    SelectionKindMismatch,
    InvalidRange,
    TrackerRequestFailed,
    TrackerResponseInvalid,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::UnknownFilterType => "E1002",
            Self::UnknownColumn => "E1003",
            Self::NoNumericValues => "E1004",
            Self::DuplicateDimension => "E1005",
            Self::CompositeNotCategorical => "E1006",
            Self::UnsupportedFileType => "E2001",
            Self::UnparseableContent => "E2002",
            Self::MissingColumn => "E2003",
            Self::MissingKey => "E2004",
            Self::DuplicateKey => "E2005",
            Self::UnknownDimension => "E3001",
            Self::SelectionKindMismatch => "E3002",
            Self::InvalidRange => "E3003",
            Self::TrackerRequestFailed => "E4001",
            Self::TrackerResponseInvalid => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownFilterType => "Unknown filter type",
            Self::UnknownColumn => "Column not present in dataset",
            Self::NoNumericValues => "Numeric filter column has no numeric values",
            Self::DuplicateDimension => "Filter declared twice",
            Self::CompositeNotCategorical => "Person filter must be a dropdown",
            Self::UnsupportedFileType => "Unsupported file type",
            Self::UnparseableContent => "File content could not be parsed",
            Self::MissingColumn => "Required column missing",
            Self::MissingKey => "Ticket key missing",
            Self::DuplicateKey => "Duplicate ticket key",
            Self::UnknownDimension => "Unknown filter dimension",
            Self::SelectionKindMismatch => "Selection does not match filter kind",
            Self::InvalidRange => "Range start is after range end",
            Self::TrackerRequestFailed => "Issue tracker request failed",
            Self::TrackerResponseInvalid => "Issue tracker response invalid",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix syntax in tickscope.toml or the filter config file and retry.")
            }
            Self::UnknownFilterType => Some(
                "Use one of: dropdown, date, numeric (or categorical, date_range, numeric_range).",
            ),
            Self::UnknownColumn => Some("Check the filter column against the dataset header row."),
            Self::NoNumericValues => Some("Declare the column as a dropdown filter instead."),
            Self::DuplicateDimension => Some("Remove the repeated entry from the filter config."),
            Self::CompositeNotCategorical => {
                Some("Declare the Person column with filter_type = \"dropdown\".")
            }
            Self::UnsupportedFileType => Some("Provide a .csv or .xlsx export."),
            Self::UnparseableContent => Some("Re-export the file and check its encoding."),
            Self::MissingColumn => Some("Map the column name under [schema] in tickscope.toml."),
            Self::MissingKey => Some("Every row needs a ticket key."),
            Self::DuplicateKey => Some(
                "Deduplicate the export or set ingest.duplicate_keys = \"last_write_wins\".",
            ),
            Self::UnknownDimension | Self::SelectionKindMismatch => {
                Some("Run `tks filters` to list available dimensions and their kinds.")
            }
            Self::TrackerRequestFailed => {
                Some("Check the server URL and the JIRA_USERNAME / JIRA_API_KEY variables.")
            }
            Self::InvalidRange => Some("Swap the bounds so the start is not after the end."),
            Self::TrackerResponseInvalid => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 17] = [
        ErrorCode::ConfigParseError,
        ErrorCode::UnknownFilterType,
        ErrorCode::UnknownColumn,
        ErrorCode::NoNumericValues,
        ErrorCode::DuplicateDimension,
        ErrorCode::CompositeNotCategorical,
        ErrorCode::UnsupportedFileType,
        ErrorCode::UnparseableContent,
        ErrorCode::MissingColumn,
        ErrorCode::MissingKey,
        ErrorCode::DuplicateKey,
        ErrorCode::UnknownDimension,
        ErrorCode::SelectionKindMismatch,
        ErrorCode::InvalidRange,
        ErrorCode::TrackerRequestFailed,
        ErrorCode::TrackerResponseInvalid,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::DuplicateKey.to_string(), "E2005");
    }
}
