//! Renderer-agnostic chart descriptions.
//!
//! A [`ChartSpec`] is plain data: a horizontal bar chart with its categories
//! listed top to bottom, one series per legend entry, and a pixel height
//! that grows with the number of categories. Front ends serialize it to JSON
//! and hand it to whatever plotting library they use.

use std::fmt::Display;

use serde::Serialize;
use tracing::warn;

use crate::derive::{DailyPriorityTable, PersonCountTable};
use crate::model::Priority;

const MIN_HEIGHT: u32 = 600;
const HEIGHT_SCALE: u64 = 5000;
const DAYS_PER_SCALE: u64 = 250;
const PEOPLE_PER_SCALE: u64 = 120;

pub const ASSIGNEE_COLOR: &str = "#006400";
pub const CONTRIBUTOR_COLOR: &str = "#93c47d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Stacked,
    Grouped,
}

/// Why a chart carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    NoData,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub name: String,
    pub color: String,
    /// One value per category, aligned with [`ChartSpec::categories`].
    pub values: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub mode: BarMode,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

impl ChartSpec {
    /// An empty chart titled after the reason it is empty.
    #[must_use]
    pub fn placeholder(kind: Placeholder) -> Self {
        let title = match kind {
            Placeholder::NoData => "No data",
            Placeholder::Error => "Error",
        };
        Self {
            title: title.to_string(),
            x_title: String::new(),
            y_title: String::new(),
            mode: BarMode::Grouped,
            categories: Vec::new(),
            series: Vec::new(),
            height: MIN_HEIGHT,
            placeholder: Some(kind),
        }
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }
}

fn scaled_height(units: u64, per_scale: u64) -> u32 {
    let height = units.saturating_mul(HEIGHT_SCALE) / per_scale;
    u32::try_from(height).unwrap_or(u32::MAX).max(MIN_HEIGHT)
}

/// Height of the daily chart for a table spanning `days` days.
#[must_use]
pub fn daily_chart_height(days: i64) -> u32 {
    scaled_height(u64::try_from(days).unwrap_or(0), DAYS_PER_SCALE)
}

/// Height of the people chart for `people` rows.
#[must_use]
pub fn people_chart_height(people: usize) -> u32 {
    scaled_height(u64::try_from(people).unwrap_or(u64::MAX), PEOPLE_PER_SCALE)
}

/// Stacked bars of tickets opened per day, one segment per priority.
#[must_use]
pub fn daily_priority_chart(table: &DailyPriorityTable) -> ChartSpec {
    if table.is_empty() {
        return ChartSpec::placeholder(Placeholder::NoData);
    }

    let days: Vec<_> = table.days().collect();
    let series = Priority::STACK_ORDER
        .iter()
        .map(|&priority| Series {
            name: priority.to_string(),
            color: priority.color().to_string(),
            values: days.iter().map(|&day| table.count(day, priority)).collect(),
        })
        .filter(|s| s.values.iter().any(|&v| v > 0))
        .collect();

    ChartSpec {
        title: "Tickets Opened per Day".to_string(),
        x_title: "Number of Tickets".to_string(),
        y_title: "Date".to_string(),
        mode: BarMode::Stacked,
        categories: days
            .iter()
            .map(|d| d.format("%a, %Y-%m-%d").to_string())
            .collect(),
        series,
        height: daily_chart_height(table.days_spanned()),
        placeholder: None,
    }
}

/// Grouped bars of assigned vs contributed tickets per person.
#[must_use]
pub fn person_counts_chart(table: &PersonCountTable) -> ChartSpec {
    if table.is_empty() {
        return ChartSpec::placeholder(Placeholder::NoData);
    }

    let rows = table.rows();
    ChartSpec {
        title: "Assignee and Contributor Counts".to_string(),
        x_title: "Tickets".to_string(),
        y_title: "Person".to_string(),
        mode: BarMode::Grouped,
        categories: rows.iter().map(|r| r.person.clone()).collect(),
        series: vec![
            Series {
                name: "Contributor Count".to_string(),
                color: CONTRIBUTOR_COLOR.to_string(),
                values: rows.iter().map(|r| r.contributor_count).collect(),
            },
            Series {
                name: "Assignee Count".to_string(),
                color: ASSIGNEE_COLOR.to_string(),
                values: rows.iter().map(|r| r.assignee_count).collect(),
            },
        ],
        height: people_chart_height(rows.len()),
        placeholder: None,
    }
}

/// Render a derived table, or an "Error" placeholder if building it failed.
pub fn render_or_placeholder<T, E: Display>(
    chart: &str,
    table: Result<T, E>,
    render: impl FnOnce(&T) -> ChartSpec,
) -> ChartSpec {
    match table {
        Ok(table) => render(&table),
        Err(err) => {
            warn!(chart, error = %err, "chart data unavailable, rendering placeholder");
            ChartSpec::placeholder(Placeholder::Error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, Dataset};
    use crate::derive::{DeriveError, build_daily_priority_counts, build_person_counts};
    use crate::schema::DatasetSchema;

    #[test]
    fn heights_have_a_floor_and_scale_linearly() {
        assert_eq!(daily_chart_height(0), 600);
        assert_eq!(daily_chart_height(30), 600);
        assert_eq!(daily_chart_height(250), 5000);
        assert_eq!(daily_chart_height(-3), 600);
        assert_eq!(people_chart_height(10), 600);
        assert_eq!(people_chart_height(120), 5000);
        assert_eq!(people_chart_height(24), 1000);
    }

    #[test]
    fn empty_tables_render_no_data() {
        let chart = daily_priority_chart(&DailyPriorityTable::default());
        assert_eq!(chart.placeholder, Some(Placeholder::NoData));
        assert_eq!(chart.title, "No data");
        assert!(person_counts_chart(&PersonCountTable::default()).is_placeholder());
    }

    #[test]
    fn builder_failure_renders_error() {
        let failed: Result<PersonCountTable, DeriveError> =
            Err(DeriveError::MissingColumn("Assignee".into()));
        let chart = render_or_placeholder("people", failed, person_counts_chart);
        assert_eq!(chart.placeholder, Some(Placeholder::Error));
        assert_eq!(chart.title, "Error");
    }

    #[test]
    fn daily_chart_stacks_low_to_highest() {
        let ds = Dataset::from_records(
            [("2024-01-01", "Highest"), ("2024-01-01", "Low"), ("2024-01-03", "Low")]
                .iter()
                .map(|(d, p)| {
                    vec![
                        ("Created Date".to_string(), Cell::from(*d)),
                        ("Priority".to_string(), Cell::from(*p)),
                    ]
                }),
        );
        let table = build_daily_priority_counts(&ds, &DatasetSchema::default()).expect("table");
        let chart = daily_priority_chart(&table);

        assert_eq!(chart.mode, BarMode::Stacked);
        assert_eq!(chart.categories, ["Mon, 2024-01-01", "Wed, 2024-01-03"]);
        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Low", "Highest"]);
        assert_eq!(chart.series[0].values, [1, 1]);
        assert_eq!(chart.series[0].color, "#008000");
        assert_eq!(chart.series[1].values, [1, 0]);
        assert_eq!(chart.series[1].color, "#ff0000");
    }

    #[test]
    fn people_chart_groups_both_counts() {
        let ds = Dataset::from_records(vec![vec![
            ("JIRA Key".to_string(), Cell::from("T1")),
            ("Assignee".to_string(), Cell::from("Alice")),
            ("Changed By 0".to_string(), Cell::from("Bob")),
        ]]);
        let table = build_person_counts(&ds, &DatasetSchema::default()).expect("table");
        let chart = person_counts_chart(&table);
        assert_eq!(chart.mode, BarMode::Grouped);
        assert_eq!(chart.categories, ["Alice", "Bob"]);
        assert_eq!(chart.series[0].color, CONTRIBUTOR_COLOR);
        assert_eq!(chart.series[0].values, [0, 1]);
        assert_eq!(chart.series[1].values, [1, 0]);
    }
}
