//! `tks report`: the two dashboard tables for the current selections.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use serde::Serialize;
use tickscope_core::Snapshot;
use tickscope_core::config::ProjectConfig;
use tickscope_core::derive::{DailyPriorityTable, PersonCountTable};
use tickscope_core::filter::{DimensionId, FilterSelection};

use super::{InputArgs, SelectionArgs, apply_selections, load_session};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `tks report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Report payload for `tks report`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub input: String,
    pub total_rows: usize,
    pub kept_rows: usize,
    pub selections: BTreeMap<&'a DimensionId, &'a FilterSelection>,
    /// Dimensions whose selection matched nothing and was ignored.
    pub fallbacks: &'a [DimensionId],
    /// `None` when the table could not be built from this export.
    pub daily: Option<&'a DailyPriorityTable>,
    pub people: Option<&'a PersonCountTable>,
}

impl<'a> Report<'a> {
    fn new(
        input: &Path,
        snapshot: &'a Snapshot,
        selections: BTreeMap<&'a DimensionId, &'a FilterSelection>,
    ) -> Self {
        Self {
            input: input.display().to_string(),
            total_rows: snapshot.total_rows,
            kept_rows: snapshot.filtered.rows.len(),
            selections,
            fallbacks: snapshot.fallbacks(),
            daily: snapshot.daily.as_ref(),
            people: snapshot.people.as_ref(),
        }
    }
}

/// Execute `tks report`.
pub fn run_report(
    args: &ReportArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut session = load_session(project_root, config, &args.input, output)?;
    apply_selections(&mut session, &args.selection, output)?;

    let snapshot = session.snapshot();
    let report = Report::new(&args.input.input, &snapshot, session.state().active().collect());
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &Report<'_>, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "input  total  kept  fallbacks")?;
    writeln!(
        w,
        "{}  {}  {}  {}",
        report.input,
        report.total_rows,
        report.kept_rows,
        join_ids(report.fallbacks)
    )?;

    writeln!(w)?;
    match report.daily {
        Some(daily) => {
            writeln!(w, "date  priority  count")?;
            for row in daily.rows() {
                writeln!(w, "{}  {}  {}", row.date, row.priority, row.count)?;
            }
        }
        None => writeln!(w, "daily: unavailable")?,
    }

    writeln!(w)?;
    match report.people {
        Some(people) => {
            writeln!(w, "person  assignee  contributor")?;
            for row in people.rows() {
                writeln!(
                    w,
                    "{}  {}  {}",
                    row.person, row.assignee_count, row.contributor_count
                )?;
            }
        }
        None => writeln!(w, "people: unavailable")?,
    }
    Ok(())
}

fn render_pretty(report: &Report<'_>, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Report")?;
    pretty_kv(w, "Input", &report.input)?;
    pretty_kv(
        w,
        "Tickets",
        format!("{} of {} kept", report.kept_rows, report.total_rows),
    )?;
    for (id, selection) in &report.selections {
        pretty_kv(w, id.as_str(), describe_selection(selection))?;
    }
    if !report.fallbacks.is_empty() {
        pretty_kv(
            w,
            "Ignored",
            format!("{} (matched nothing)", join_ids(report.fallbacks)),
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Tickets per day by priority")?;
    match report.daily {
        Some(daily) if daily.is_empty() => writeln!(w, "No data")?,
        Some(daily) => {
            for day in daily.days() {
                let counts: Vec<String> = daily
                    .rows()
                    .iter()
                    .filter(|row| row.date == day)
                    .map(|row| format!("{} {}", row.priority, row.count))
                    .collect();
                writeln!(w, "{:<16} {}", day.format("%a %Y-%m-%d"), counts.join(", "))?;
            }
        }
        None => writeln!(w, "Unavailable for this export")?,
    }

    writeln!(w)?;
    pretty_section(w, "People")?;
    match report.people {
        Some(people) if people.is_empty() => writeln!(w, "No data")?,
        Some(people) => {
            writeln!(w, "{:<24} {:>8} {:>12}", "PERSON", "ASSIGNED", "CONTRIBUTED")?;
            for row in people.rows() {
                writeln!(
                    w,
                    "{:<24} {:>8} {:>12}",
                    row.person, row.assignee_count, row.contributor_count
                )?;
            }
        }
        None => writeln!(w, "Unavailable for this export")?,
    }
    Ok(())
}

fn join_ids(ids: &[DimensionId]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(DimensionId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_selection(selection: &FilterSelection) -> String {
    fn bound<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(String::new, |v| v.to_string())
    }

    match selection {
        FilterSelection::Categorical(sel) => sel
            .selected
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        FilterSelection::DateRange(range) => {
            format!("{}..{}", bound(range.start), bound(range.end))
        }
        FilterSelection::NumericRange(range) => {
            format!("{}..{}", bound(range.min), bound(range.max))
        }
    }
}
