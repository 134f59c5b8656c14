//! Typed filter definitions, recomputed from the dataset on every load.
//!
//! A [`FilterRegistry`] is a view over (config, dataset): it owns no state
//! that outlives the dataset it was built from. Each definition is keyed by a
//! stable [`DimensionId`] so selections and UI wiring never match on raw
//! column names.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::filter::config::{ConfigError, FilterConfig, FilterEntry, FilterKind};
use crate::schema::{DatasetSchema, PERSON_COLUMN};

/// Stable identifier of one filter dimension (`"created-date"`, `"person"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionId(String);

impl DimensionId {
    /// Derive the identifier from a column name: lowercase ASCII
    /// alphanumerics joined by single dashes.
    #[must_use]
    pub fn from_column(column: &str) -> Self {
        let mut slug = String::with_capacity(column.len());
        let mut pending_dash = false;
        for ch in column.chars() {
            if ch.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(ch.to_lowercase());
            } else {
                pending_dash = true;
            }
        }
        Self(slug)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The physical column(s) a dimension reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Physical(String),
    /// Virtual column spanning several physical columns; a row matches when
    /// any of them does.
    Composite(Vec<String>),
}

/// Bounds derived from the dataset at definition time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bounds {
    /// Sorted distinct non-null values.
    Values(Vec<String>),
    Span { min: f64, max: f64 },
    /// Resolved from the dataset's own span at evaluation time.
    Deferred,
}

/// One filterable dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDefinition {
    pub id: DimensionId,
    /// Column name as declared in the filter config.
    pub column: String,
    pub kind: FilterKind,
    pub bounds: Bounds,
    #[serde(skip)]
    pub source: ColumnRef,
}

impl FilterDefinition {
    /// Categorical options, or an empty slice for range dimensions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.bounds {
            Bounds::Values(values) => values,
            Bounds::Span { .. } | Bounds::Deferred => &[],
        }
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self.source, ColumnRef::Composite(_))
    }

    /// Earliest and latest calendar dates in the dimension's column.
    ///
    /// `None` for composite dimensions or when no value parses as a date.
    #[must_use]
    pub fn date_span(&self, dataset: &Dataset) -> Option<(NaiveDate, NaiveDate)> {
        let ColumnRef::Physical(column) = &self.source else {
            return None;
        };
        dataset
            .column_values(column)
            .filter_map(|cell| cell.as_datetime().map(|dt| dt.date()))
            .fold(None, |span, date| match span {
                None => Some((date, date)),
                Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
            })
    }
}

/// All filter definitions for the current dataset, in config order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterRegistry {
    definitions: Vec<FilterDefinition>,
}

impl FilterRegistry {
    /// Build one definition per config entry against `dataset`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownColumn`] if a physical column is absent.
    /// - [`ConfigError::NoNumericValues`] if a numeric column has no numeric values.
    /// - [`ConfigError::CompositeNotCategorical`] if `Person` is not categorical.
    /// - [`ConfigError::DuplicateDimension`] if two entries share an id.
    pub fn build(
        config: &FilterConfig,
        dataset: &Dataset,
        schema: &DatasetSchema,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(config.filters.len());

        for entry in &config.filters {
            let definition = build_definition(entry, dataset, schema)?;
            if !seen.insert(definition.id.clone()) {
                return Err(ConfigError::DuplicateDimension(definition.id.to_string()));
            }
            tracing::debug!(
                dimension = %definition.id,
                kind = %definition.kind,
                options = definition.options().len(),
                "built filter definition"
            );
            definitions.push(definition);
        }

        Ok(Self { definitions })
    }

    #[must_use]
    pub fn get(&self, id: &DimensionId) -> Option<&FilterDefinition> {
        self.definitions.iter().find(|d| &d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.definitions.iter()
    }

    #[must_use]
    pub fn definitions(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn build_definition(
    entry: &FilterEntry,
    dataset: &Dataset,
    schema: &DatasetSchema,
) -> Result<FilterDefinition, ConfigError> {
    let id = DimensionId::from_column(&entry.column);

    if entry.column == PERSON_COLUMN {
        if entry.filter_type != FilterKind::Categorical {
            return Err(ConfigError::CompositeNotCategorical(entry.column.clone()));
        }
        if !dataset.has_column(&schema.assignee_column) {
            return Err(ConfigError::UnknownColumn(schema.assignee_column.clone()));
        }
        let columns: Vec<String> = schema
            .person_columns()
            .into_iter()
            .filter(|c| dataset.has_column(c))
            .collect();
        let values = distinct_values(dataset, &columns);
        return Ok(FilterDefinition {
            id,
            column: entry.column.clone(),
            kind: FilterKind::Categorical,
            bounds: Bounds::Values(values),
            source: ColumnRef::Composite(columns),
        });
    }

    if !dataset.has_column(&entry.column) {
        return Err(ConfigError::UnknownColumn(entry.column.clone()));
    }

    let bounds = match entry.filter_type {
        FilterKind::Categorical => {
            Bounds::Values(distinct_values(dataset, std::slice::from_ref(&entry.column)))
        }
        FilterKind::NumericRange => {
            let (min, max) = dataset
                .column_values(&entry.column)
                .filter_map(crate::dataset::Cell::as_number)
                .fold(None, |span: Option<(f64, f64)>, v| match span {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                })
                .ok_or_else(|| ConfigError::NoNumericValues(entry.column.clone()))?;
            Bounds::Span { min, max }
        }
        FilterKind::DateRange => Bounds::Deferred,
    };

    Ok(FilterDefinition {
        id,
        column: entry.column.clone(),
        kind: entry.filter_type,
        bounds,
        source: ColumnRef::Physical(entry.column.clone()),
    })
}

fn distinct_values(dataset: &Dataset, columns: &[String]) -> Vec<String> {
    let mut values = BTreeSet::new();
    for column in columns {
        for cell in dataset.column_values(column) {
            if let Some(text) = cell.as_text() {
                values.insert(text.into_owned());
            }
        }
    }
    values.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;
    use crate::error::ErrorCode;

    fn dataset() -> Dataset {
        let rows = [
            ("T1", "Alice", "Bob", "High", "5"),
            ("T2", "Bob", "", "Low", "15"),
            ("T3", "", "Carol", "High", "n/a"),
        ];
        Dataset::from_records(rows.iter().map(|(key, assignee, author, prio, pts)| {
            vec![
                ("JIRA Key".to_string(), Cell::from(*key)),
                ("Assignee".to_string(), Cell::from(*assignee)),
                ("Changed By 0".to_string(), Cell::from(*author)),
                ("Priority".to_string(), Cell::from(*prio)),
                ("Points".to_string(), Cell::from(*pts)),
                ("Created Date".to_string(), Cell::from("2024-01-02")),
            ]
        }))
    }

    fn config(entries: &[(&str, FilterKind)]) -> FilterConfig {
        FilterConfig {
            filters: entries
                .iter()
                .map(|(c, k)| FilterEntry::new(*c, *k))
                .collect(),
        }
    }

    #[test]
    fn dimension_ids_are_slugs() {
        assert_eq!(DimensionId::from_column("Created Date").as_str(), "created-date");
        assert_eq!(DimensionId::from_column("  Root  Cause!").as_str(), "root-cause");
        assert_eq!(DimensionId::from_column("Person").as_str(), "person");
    }

    #[test]
    fn categorical_values_are_sorted_and_distinct() {
        let registry = FilterRegistry::build(
            &config(&[("Priority", FilterKind::Categorical)]),
            &dataset(),
            &DatasetSchema::default(),
        )
        .expect("build");
        let def = registry.get(&DimensionId::from_column("Priority")).expect("def");
        assert_eq!(def.options(), ["High", "Low"]);
    }

    #[test]
    fn person_unions_assignee_and_history_authors() {
        let registry = FilterRegistry::build(
            &config(&[("Person", FilterKind::Categorical)]),
            &dataset(),
            &DatasetSchema::default(),
        )
        .expect("build");
        let def = &registry.definitions()[0];
        assert!(def.is_composite());
        assert_eq!(def.options(), ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn numeric_bounds_skip_unparseable_values() {
        let registry = FilterRegistry::build(
            &config(&[("Points", FilterKind::NumericRange)]),
            &dataset(),
            &DatasetSchema::default(),
        )
        .expect("build");
        assert_eq!(
            registry.definitions()[0].bounds,
            Bounds::Span { min: 5.0, max: 15.0 }
        );
    }

    #[test]
    fn numeric_filter_on_text_column_fails() {
        let err = FilterRegistry::build(
            &config(&[("Assignee", FilterKind::NumericRange)]),
            &dataset(),
            &DatasetSchema::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoNumericValues(ref c) if c == "Assignee"));
    }

    #[test]
    fn date_range_defers_bounds() {
        let ds = dataset();
        let registry = FilterRegistry::build(
            &config(&[("Created Date", FilterKind::DateRange)]),
            &ds,
            &DatasetSchema::default(),
        )
        .expect("build");
        let def = &registry.definitions()[0];
        assert_eq!(def.bounds, Bounds::Deferred);
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).expect("date");
        assert_eq!(def.date_span(&ds), Some((day, day)));
    }

    #[test]
    fn unknown_column_and_duplicates_are_rejected() {
        let ds = dataset();
        let schema = DatasetSchema::default();
        let err = FilterRegistry::build(&config(&[("Severity", FilterKind::Categorical)]), &ds, &schema)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownColumn(ref c) if c == "Severity"));

        let err = FilterRegistry::build(
            &config(&[
                ("Priority", FilterKind::Categorical),
                ("Priority", FilterKind::Categorical),
            ]),
            &ds,
            &schema,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDimension(ref id) if id == "priority"));
    }

    #[test]
    fn person_must_be_categorical() {
        let err = FilterRegistry::build(
            &config(&[("Person", FilterKind::DateRange)]),
            &dataset(),
            &DatasetSchema::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CompositeNotCategorical(_)));
        assert_eq!(err.code(), ErrorCode::CompositeNotCategorical);
        assert_eq!(err.code().code(), "E1006");
    }
}
