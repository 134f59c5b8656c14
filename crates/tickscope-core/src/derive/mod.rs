//! Aggregate views over a (usually filtered) dataset, shaped for charting.

pub mod daily;
pub mod people;

use crate::error::ErrorCode;

pub use daily::{DailyPriorityRow, DailyPriorityTable, build_daily_priority_counts};
pub use people::{PersonCountRow, PersonCountTable, build_person_counts};

/// Errors raised while building a derived table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    #[error("required column '{0}' is missing from the dataset")]
    MissingColumn(String),
}

impl DeriveError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn(_) => ErrorCode::MissingColumn,
        }
    }
}

fn require(dataset: &crate::dataset::Dataset, column: &str) -> Result<(), DeriveError> {
    if dataset.has_column(column) {
        Ok(())
    } else {
        Err(DeriveError::MissingColumn(column.to_string()))
    }
}
