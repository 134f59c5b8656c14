//! The canonical ticket table.
//!
//! Every ingestion source (CSV, XLSX, tracker API) produces a [`Dataset`]:
//! an ordered list of column names plus rows of typed [`Cell`]s. All filter
//! and aggregation code consumes this shape and nothing else.
//!
//! Rows are addressed by their position. Positions are stable for the
//! lifetime of a dataset, which is what lets the filter evaluator intersect
//! per-dimension results by row identity.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::dates::parse_datetime;

/// Text values treated as missing, matching common spreadsheet exports.
const NULL_MARKERS: &[&str] = &["", "NaN", "nan", "NA", "N/A", "null", "NULL", "None"];

static EMPTY_CELL: Cell = Cell::Empty;

/// A single typed value in the canonical table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Build a cell from raw delimited text, mapping null markers to
    /// [`Cell::Empty`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if NULL_MARKERS.contains(&raw.trim()) {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Categorical rendering of the value; `None` for empty cells.
    ///
    /// Integral numbers render without a fractional part so `3` read from a
    /// spreadsheet and `"3"` read from CSV compare equal.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(Cow::Borrowed(text.as_str())),
            Self::Number(value) => Some(Cow::Owned(format_number(*value))),
            Self::DateTime(dt) => Some(Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        }
    }

    /// Numeric reading of the value, parsing text when necessary.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Empty | Self::DateTime(_) => None,
        }
    }

    /// Timestamp reading of the value, parsing text leniently.
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Text(text) => parse_datetime(text),
            Self::Empty | Self::Number(_) => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::from_raw(&value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Column-named, row-addressed table of ticket data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Create an empty dataset with the given header.
    ///
    /// When a header repeats a name, lookups resolve to its first occurrence.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from sparse `(column, value)` records.
    ///
    /// The header is the union of every record's columns in first-seen order;
    /// columns a record does not mention are [`Cell::Empty`].
    #[must_use]
    pub fn from_records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (String, Cell)>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut sparse_rows: Vec<Vec<(usize, Cell)>> = Vec::new();

        for record in records {
            let mut sparse = Vec::new();
            for (name, cell) in record {
                let col = *index.entry(name.clone()).or_insert_with(|| {
                    columns.push(name);
                    columns.len() - 1
                });
                sparse.push((col, cell));
            }
            sparse_rows.push(sparse);
        }

        let mut dataset = Self::new(columns);
        for sparse in sparse_rows {
            let mut row = vec![Cell::Empty; dataset.columns.len()];
            for (col, cell) in sparse {
                row[col] = cell;
            }
            dataset.rows.push(row);
        }
        dataset
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(cells);
    }

    /// Replace the row at `row`, padding or truncating it to the header width.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn replace_row(&mut self, row: usize, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows[row] = cells;
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of one row, in header order.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Cell] {
        &self.rows[row]
    }

    /// Iterate rows in position order.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// The cell at (`row`, `column`), or [`Cell::Empty`] when the column
    /// does not exist.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> &Cell {
        self.column_index(column)
            .map_or(&EMPTY_CELL, |col| &self.rows[row][col])
    }

    /// Every cell of a column, in row order. Empty when the column is absent.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a Cell> + use<'a> {
        let col = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| col.map(|c| &row[c]))
    }

    /// Split into header and rows, consuming the dataset.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }

    /// A new dataset holding only the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: rows.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
