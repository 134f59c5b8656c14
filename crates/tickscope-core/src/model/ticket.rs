use std::borrow::Cow;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::dataset::{Cell, Dataset};
use crate::model::priority::Priority;
use crate::schema::DatasetSchema;

/// Column positions of the well-known ticket fields, resolved once per
/// dataset so per-row access avoids name lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketColumns {
    pub key: Option<usize>,
    pub created: Option<usize>,
    pub priority: Option<usize>,
    pub assignee: Option<usize>,
    pub status: Option<usize>,
    /// History author columns present in the dataset, in slot order.
    pub changed_by: Vec<usize>,
}

impl TicketColumns {
    #[must_use]
    pub fn resolve(dataset: &Dataset, schema: &DatasetSchema) -> Self {
        Self {
            key: dataset.column_index(&schema.key_column),
            created: dataset.column_index(&schema.created_column),
            priority: dataset.column_index(&schema.priority_column),
            assignee: dataset.column_index(&schema.assignee_column),
            status: dataset.column_index(&schema.status_column),
            changed_by: schema
                .changed_by_columns()
                .iter()
                .filter_map(|name| dataset.column_index(name))
                .collect(),
        }
    }
}

/// Typed, borrowed view of one ticket row.
#[derive(Debug, Clone, Copy)]
pub struct TicketView<'a> {
    cells: &'a [Cell],
    columns: &'a TicketColumns,
}

impl<'a> TicketView<'a> {
    #[must_use]
    pub const fn new(cells: &'a [Cell], columns: &'a TicketColumns) -> Self {
        Self { cells, columns }
    }

    fn cell(&self, col: Option<usize>) -> Option<&'a Cell> {
        col.map(|c| &self.cells[c])
    }

    fn text(&self, col: Option<usize>) -> Option<Cow<'a, str>> {
        self.cell(col).and_then(Cell::as_text)
    }

    #[must_use]
    pub fn key(&self) -> Option<Cow<'a, str>> {
        self.text(self.columns.key)
    }

    #[must_use]
    pub fn created(&self) -> Option<NaiveDateTime> {
        self.cell(self.columns.created).and_then(Cell::as_datetime)
    }

    /// The ticket priority; `None` when missing or not one of the four
    /// known levels.
    #[must_use]
    pub fn priority(&self) -> Option<Priority> {
        self.text(self.columns.priority)
            .and_then(|raw| Priority::from_str(&raw).ok())
    }

    #[must_use]
    pub fn assignee(&self) -> Option<Cow<'a, str>> {
        self.text(self.columns.assignee)
    }

    #[must_use]
    pub fn status(&self) -> Option<Cow<'a, str>> {
        self.text(self.columns.status)
    }

    /// Non-empty history authors in slot order, duplicates included.
    pub fn history_authors(&self) -> impl Iterator<Item = Cow<'a, str>> + use<'a> {
        let cells = self.cells;
        let columns = self.columns;
        columns
            .changed_by
            .iter()
            .filter_map(move |&c| cells[c].as_text())
    }
}

/// Iterate every row of `dataset` as a [`TicketView`].
pub fn tickets<'a>(
    dataset: &'a Dataset,
    columns: &'a TicketColumns,
) -> impl Iterator<Item = TicketView<'a>> + use<'a> {
    dataset.rows().map(move |cells| TicketView::new(cells, columns))
}
