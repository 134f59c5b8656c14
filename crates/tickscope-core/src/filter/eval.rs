//! Row filtering.
//!
//! Each dimension is turned into a [`DimensionFilter`] strategy and run
//! against the full dataset on its own. The per-dimension row sets are then
//! intersected by row position, so the result never depends on the order in
//! which dimensions are declared or selected.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::filter::definition::{ColumnRef, DimensionId, FilterDefinition, FilterRegistry};
use crate::filter::selection::{
    CategoricalSelection, DateRangeSelection, FilterSelection, FilterState, NumericRangeSelection,
};

/// Rows that survived filtering plus any dimension that fell back to
/// unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    /// Surviving row positions in ascending order.
    pub rows: Vec<usize>,
    /// Composite dimensions whose selection matched nothing and was ignored.
    pub fallbacks: Vec<DimensionId>,
}

impl FilterOutcome {
    /// Materialize the surviving rows as a new dataset.
    #[must_use]
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        dataset.select_rows(&self.rows)
    }
}

/// One dimension's row predicate.
pub trait DimensionFilter {
    fn matches(&self, dataset: &Dataset, row: usize) -> bool;

    /// Whether an empty match set should be ignored instead of applied.
    fn falls_back_when_empty(&self) -> bool {
        false
    }
}

/// Exact membership on a single physical column.
pub struct CategoricalFilter<'a> {
    column: Option<usize>,
    selected: &'a BTreeSet<String>,
}

impl DimensionFilter for CategoricalFilter<'_> {
    fn matches(&self, dataset: &Dataset, row: usize) -> bool {
        self.column
            .and_then(|c| dataset.row(row)[c].as_text())
            .is_some_and(|v| self.selected.contains(v.as_ref()))
    }
}

/// Membership on any of several columns (the `Person` dimension).
pub struct CompositeFilter<'a> {
    columns: Vec<usize>,
    selected: &'a BTreeSet<String>,
}

impl DimensionFilter for CompositeFilter<'_> {
    fn matches(&self, dataset: &Dataset, row: usize) -> bool {
        let cells = dataset.row(row);
        self.columns.iter().any(|&c| {
            cells[c]
                .as_text()
                .is_some_and(|v| self.selected.contains(v.as_ref()))
        })
    }

    fn falls_back_when_empty(&self) -> bool {
        true
    }
}

/// Inclusive numeric range. Missing or non-numeric values fail.
pub struct NumericRangeFilter {
    column: Option<usize>,
    min: f64,
    max: f64,
}

impl DimensionFilter for NumericRangeFilter {
    fn matches(&self, dataset: &Dataset, row: usize) -> bool {
        self.column
            .and_then(|c| dataset.row(row)[c].as_number())
            .is_some_and(|v| v >= self.min && v <= self.max)
    }
}

/// Inclusive calendar-date range. Missing or unparseable values fail.
pub struct DateRangeFilter {
    column: Option<usize>,
    start: NaiveDate,
    end: NaiveDate,
}

impl DimensionFilter for DateRangeFilter {
    fn matches(&self, dataset: &Dataset, row: usize) -> bool {
        self.column
            .and_then(|c| dataset.row(row)[c].as_datetime())
            .is_some_and(|dt| {
                let day = dt.date();
                day >= self.start && day <= self.end
            })
    }
}

/// Build the strategy for one dimension, or `None` when its selection is
/// unrestricted (or does not match the definition's kind).
#[must_use]
pub fn strategy<'a>(
    definition: &'a FilterDefinition,
    selection: &'a FilterSelection,
    dataset: &Dataset,
) -> Option<Box<dyn DimensionFilter + 'a>> {
    if selection.is_unrestricted() {
        return None;
    }
    match (selection, &definition.source) {
        (
            FilterSelection::Categorical(CategoricalSelection { selected, .. }),
            ColumnRef::Composite(columns),
        ) => Some(Box::new(CompositeFilter {
            columns: columns
                .iter()
                .filter_map(|c| dataset.column_index(c))
                .collect(),
            selected,
        })),
        (
            FilterSelection::Categorical(CategoricalSelection { selected, .. }),
            ColumnRef::Physical(column),
        ) => Some(Box::new(CategoricalFilter {
            column: dataset.column_index(column),
            selected,
        })),
        (FilterSelection::NumericRange(NumericRangeSelection { min, max }), ColumnRef::Physical(column)) => {
            Some(Box::new(NumericRangeFilter {
                column: dataset.column_index(column),
                min: min.unwrap_or(f64::NEG_INFINITY),
                max: max.unwrap_or(f64::INFINITY),
            }))
        }
        (FilterSelection::DateRange(DateRangeSelection { start, end }), ColumnRef::Physical(column)) => {
            Some(Box::new(DateRangeFilter {
                column: dataset.column_index(column),
                start: start.unwrap_or(NaiveDate::MIN),
                end: end.unwrap_or(NaiveDate::MAX),
            }))
        }
        _ => {
            warn!(dimension = %definition.id, "selection does not fit dimension, ignoring");
            None
        }
    }
}

/// Rows of `dataset` satisfying every selection in `state`.
#[must_use]
pub fn evaluate(dataset: &Dataset, registry: &FilterRegistry, state: &FilterState) -> FilterOutcome {
    let mut surviving: Vec<bool> = vec![true; dataset.len()];
    let mut fallbacks = Vec::new();

    for definition in registry.iter() {
        let Some(selection) = state.get(&definition.id) else {
            continue;
        };
        let Some(filter) = strategy(definition, selection, dataset) else {
            continue;
        };

        let matched: Vec<bool> = (0..dataset.len())
            .map(|row| filter.matches(dataset, row))
            .collect();
        let hits = matched.iter().filter(|m| **m).count();

        if hits == 0 && filter.falls_back_when_empty() {
            warn!(
                dimension = %definition.id,
                "selection matched no rows, leaving dimension unrestricted"
            );
            fallbacks.push(definition.id.clone());
            continue;
        }

        debug!(dimension = %definition.id, hits, "applied filter");
        for (keep, hit) in surviving.iter_mut().zip(matched) {
            *keep &= hit;
        }
    }

    let rows: Vec<usize> = surviving
        .iter()
        .enumerate()
        .filter_map(|(i, keep)| keep.then_some(i))
        .collect();
    debug!(total = dataset.len(), kept = rows.len(), "filters evaluated");

    FilterOutcome { rows, fallbacks }
}

/// Convenience wrapper: the filtered rows as a new dataset.
#[must_use]
pub fn filter_dataset(dataset: &Dataset, registry: &FilterRegistry, state: &FilterState) -> Dataset {
    evaluate(dataset, registry, state).apply(dataset)
}
