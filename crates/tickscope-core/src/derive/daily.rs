use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::derive::{DeriveError, require};
use crate::model::{Priority, TicketColumns, tickets};
use crate::schema::DatasetSchema;

/// Tickets created on one day at one priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPriorityRow {
    pub date: NaiveDate,
    pub priority: Priority,
    pub count: usize,
}

/// Ticket counts per (day, priority), ordered by day then urgency.
///
/// Days with no tickets are absent; there is no zero-filling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DailyPriorityTable {
    rows: Vec<DailyPriorityRow>,
}

impl DailyPriorityTable {
    #[must_use]
    pub fn rows(&self) -> &[DailyPriorityRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct days present, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let mut last = None;
        self.rows.iter().filter_map(move |row| {
            if last == Some(row.date) {
                None
            } else {
                last = Some(row.date);
                Some(row.date)
            }
        })
    }

    /// Whole days between the first and last day present; zero when empty.
    #[must_use]
    pub fn days_spanned(&self) -> i64 {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn count(&self, date: NaiveDate, priority: Priority) -> usize {
        self.rows
            .iter()
            .find(|r| r.date == date && r.priority == priority)
            .map_or(0, |r| r.count)
    }
}

/// Count tickets per creation day and priority.
///
/// Rows whose creation date does not parse, or whose priority is missing or
/// not one of the four known levels, are skipped.
///
/// # Errors
///
/// [`DeriveError::MissingColumn`] if the creation-date or priority column is
/// absent from `dataset`.
pub fn build_daily_priority_counts(
    dataset: &Dataset,
    schema: &DatasetSchema,
) -> Result<DailyPriorityTable, DeriveError> {
    require(dataset, &schema.created_column)?;
    require(dataset, &schema.priority_column)?;

    let columns = TicketColumns::resolve(dataset, schema);
    let mut counts: BTreeMap<(NaiveDate, Priority), usize> = BTreeMap::new();
    let mut skipped = 0usize;

    for ticket in tickets(dataset, &columns) {
        match (ticket.created(), ticket.priority()) {
            (Some(created), Some(priority)) => {
                *counts.entry((created.date(), priority)).or_default() += 1;
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "rows without a usable date or priority left out of daily counts");
    }

    Ok(DailyPriorityTable {
        rows: counts
            .into_iter()
            .map(|((date, priority), count)| DailyPriorityRow {
                date,
                priority,
                count,
            })
            .collect(),
    })
}
