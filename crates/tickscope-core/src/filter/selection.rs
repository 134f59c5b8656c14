//! User-chosen restrictions, one per filter dimension.
//!
//! A fresh [`FilterState`] is unrestricted on every dimension. Categorical
//! selections follow the "empty means all" convention: clearing a selection
//! lifts the restriction rather than filtering everything out.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::filter::config::FilterKind;
use crate::filter::definition::{DimensionId, FilterRegistry};

/// Errors raised when mutating a [`FilterState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown filter dimension '{0}'")]
    UnknownDimension(String),

    #[error("dimension '{dimension}' is a {actual} filter, not {requested}")]
    KindMismatch {
        dimension: String,
        actual: FilterKind,
        requested: FilterKind,
    },

    #[error("range for dimension '{0}' starts after it ends")]
    InvertedRange(String),
}

impl FilterError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownDimension(_) => ErrorCode::UnknownDimension,
            Self::KindMismatch { .. } => ErrorCode::SelectionKindMismatch,
            Self::InvertedRange(_) => ErrorCode::InvalidRange,
        }
    }
}

/// Selected values plus the search text narrowing the visible options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSelection {
    pub selected: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl CategoricalSelection {
    /// Flip one value in or out of the selection. Returns whether the value
    /// is selected afterwards.
    pub fn toggle(&mut self, value: &str) -> bool {
        if self.selected.remove(value) {
            false
        } else {
            self.selected.insert(value.to_string());
            true
        }
    }

    /// Set or clear the search text. Blank text clears it.
    pub fn set_search(&mut self, text: Option<&str>) {
        self.search = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    /// The options matching the search text (case-insensitive substring).
    #[must_use]
    pub fn visible_options<'a>(&self, options: &'a [String]) -> Vec<&'a str> {
        match &self.search {
            None => options.iter().map(String::as_str).collect(),
            Some(needle) => {
                let needle = needle.to_lowercase();
                options
                    .iter()
                    .filter(|opt| opt.to_lowercase().contains(&needle))
                    .map(String::as_str)
                    .collect()
            }
        }
    }

    /// Replace the selection with every currently visible option.
    pub fn select_all(&mut self, options: &[String]) -> usize {
        let visible: BTreeSet<String> = self
            .visible_options(options)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.selected = visible;
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

/// Inclusive calendar-date range; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Inclusive numeric range; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRangeSelection {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The current restriction on one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSelection {
    Categorical(CategoricalSelection),
    DateRange(DateRangeSelection),
    NumericRange(NumericRangeSelection),
}

impl FilterSelection {
    #[must_use]
    pub fn unrestricted(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Categorical => Self::Categorical(CategoricalSelection::default()),
            FilterKind::DateRange => Self::DateRange(DateRangeSelection::default()),
            FilterKind::NumericRange => Self::NumericRange(NumericRangeSelection::default()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Categorical(_) => FilterKind::Categorical,
            Self::DateRange(_) => FilterKind::DateRange,
            Self::NumericRange(_) => FilterKind::NumericRange,
        }
    }

    /// True when the selection admits every row.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        match self {
            Self::Categorical(c) => c.selected.is_empty(),
            Self::DateRange(r) => r.start.is_none() && r.end.is_none(),
            Self::NumericRange(r) => r.min.is_none() && r.max.is_none(),
        }
    }
}

/// One session's selections, keyed by dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    selections: BTreeMap<DimensionId, FilterSelection>,
}

impl FilterState {
    /// An unrestricted selection for every dimension in `registry`.
    #[must_use]
    pub fn unrestricted(registry: &FilterRegistry) -> Self {
        Self {
            selections: registry
                .iter()
                .map(|def| (def.id.clone(), FilterSelection::unrestricted(def.kind)))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &DimensionId) -> Option<&FilterSelection> {
        self.selections.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DimensionId, &FilterSelection)> {
        self.selections.iter()
    }

    /// Dimensions currently restricting rows.
    pub fn active(&self) -> impl Iterator<Item = (&DimensionId, &FilterSelection)> {
        self.selections.iter().filter(|(_, s)| !s.is_unrestricted())
    }

    /// Replace a dimension's selection wholesale.
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown or the selection kind differs.
    pub fn set(&mut self, id: &DimensionId, selection: FilterSelection) -> Result<(), FilterError> {
        let slot = self.slot(id)?;
        if slot.kind() != selection.kind() {
            return Err(FilterError::KindMismatch {
                dimension: id.to_string(),
                actual: slot.kind(),
                requested: selection.kind(),
            });
        }
        *slot = selection;
        Ok(())
    }

    /// Toggle one categorical value. Returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown or not categorical.
    pub fn toggle(&mut self, id: &DimensionId, value: &str) -> Result<bool, FilterError> {
        Ok(self.categorical_mut(id)?.toggle(value))
    }

    /// Set the search text narrowing a categorical dimension's options.
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown or not categorical.
    pub fn search(&mut self, id: &DimensionId, text: Option<&str>) -> Result<(), FilterError> {
        self.categorical_mut(id)?.set_search(text);
        Ok(())
    }

    /// Select every option currently visible under the search text.
    /// Returns the number of selected values.
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown or not categorical.
    pub fn select_all(
        &mut self,
        registry: &FilterRegistry,
        id: &DimensionId,
    ) -> Result<usize, FilterError> {
        let options = registry
            .get(id)
            .ok_or_else(|| FilterError::UnknownDimension(id.to_string()))?
            .options()
            .to_vec();
        Ok(self.categorical_mut(id)?.select_all(&options))
    }

    /// Drop every selected value (back to "all").
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown or not categorical.
    pub fn clear(&mut self, id: &DimensionId) -> Result<(), FilterError> {
        self.categorical_mut(id)?.clear();
        Ok(())
    }

    /// Set an inclusive date range; `None` bounds stay open.
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown, not a date range, or `start > end`.
    pub fn set_date_range(
        &mut self,
        id: &DimensionId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), FilterError> {
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(FilterError::InvertedRange(id.to_string()));
        }
        self.set(
            id,
            FilterSelection::DateRange(DateRangeSelection { start, end }),
        )
    }

    /// Set an inclusive numeric range; `None` bounds stay open.
    ///
    /// # Errors
    ///
    /// Fails if the dimension is unknown, not numeric, or `min > max`.
    pub fn set_numeric_range(
        &mut self,
        id: &DimensionId,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<(), FilterError> {
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            return Err(FilterError::InvertedRange(id.to_string()));
        }
        self.set(
            id,
            FilterSelection::NumericRange(NumericRangeSelection { min, max }),
        )
    }

    fn slot(&mut self, id: &DimensionId) -> Result<&mut FilterSelection, FilterError> {
        self.selections
            .get_mut(id)
            .ok_or_else(|| FilterError::UnknownDimension(id.to_string()))
    }

    fn categorical_mut(
        &mut self,
        id: &DimensionId,
    ) -> Result<&mut CategoricalSelection, FilterError> {
        match self.slot(id)? {
            FilterSelection::Categorical(c) => Ok(c),
            other => Err(FilterError::KindMismatch {
                dimension: id.to_string(),
                actual: other.kind(),
                requested: FilterKind::Categorical,
            }),
        }
    }
}
