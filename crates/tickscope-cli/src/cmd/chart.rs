//! `tks chart`: one bar chart, as a renderer-agnostic spec.

use std::io::{self, Write};
use std::path::Path;

use clap::{Args, ValueEnum};
use tickscope_core::chart::{ChartSpec, Placeholder};
use tickscope_core::config::ProjectConfig;

use super::{InputArgs, SelectionArgs, apply_selections, load_session};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    /// Tickets opened per day, stacked by priority.
    Daily,
    /// Assigned and contributed ticket counts per person.
    People,
}

/// Arguments for `tks chart`.
#[derive(Args, Debug)]
pub struct ChartArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Which chart to build.
    #[arg(long, value_enum, default_value_t = ChartKind::Daily)]
    pub kind: ChartKind,
}

/// Execute `tks chart`.
pub fn run_chart(
    args: &ChartArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut session = load_session(project_root, config, &args.input, output)?;
    apply_selections(&mut session, &args.selection, output)?;

    let snapshot = session.snapshot();
    let chart = match args.kind {
        ChartKind::Daily => &snapshot.daily_chart,
        ChartKind::People => &snapshot.people_chart,
    };
    render_mode(output, chart, render_text, render_pretty)
}

fn placeholder_note(kind: Placeholder) -> &'static str {
    match kind {
        Placeholder::NoData => "no tickets match the current selections",
        Placeholder::Error => "this export lacks a column the chart needs",
    }
}

fn render_text(chart: &ChartSpec, w: &mut dyn Write) -> io::Result<()> {
    if let Some(kind) = chart.placeholder {
        return writeln!(w, "{}: {}", chart.title, placeholder_note(kind));
    }
    let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
    writeln!(w, "category  {}", names.join("  "))?;
    for (i, category) in chart.categories.iter().enumerate() {
        let values: Vec<String> = chart
            .series
            .iter()
            .map(|s| s.values.get(i).copied().unwrap_or_default().to_string())
            .collect();
        writeln!(w, "{category}  {}", values.join("  "))?;
    }
    Ok(())
}

fn render_pretty(chart: &ChartSpec, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &chart.title)?;
    if let Some(kind) = chart.placeholder {
        return writeln!(w, "{}", placeholder_note(kind));
    }
    pretty_kv(w, "X axis", &chart.x_title)?;
    pretty_kv(w, "Y axis", &chart.y_title)?;
    pretty_kv(w, "Bars", format!("{:?}", chart.mode).to_lowercase())?;
    pretty_kv(w, "Height", format!("{}px", chart.height))?;
    pretty_kv(w, "Categories", chart.categories.len().to_string())?;
    writeln!(w)?;
    for series in &chart.series {
        let total: usize = series.values.iter().sum();
        writeln!(w, "{:<20} {:>6}  ({})", series.name, total, series.color)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickscope_core::chart::{BarMode, Series};

    fn spec() -> ChartSpec {
        ChartSpec {
            title: "Ticket Count per Person".into(),
            x_title: "Count".into(),
            y_title: "Person".into(),
            mode: BarMode::Grouped,
            categories: vec!["Alice".into(), "Bob".into()],
            series: vec![
                Series {
                    name: "Contributor Count".into(),
                    color: "#93c47d".into(),
                    values: vec![0, 1],
                },
                Series {
                    name: "Assignee Count".into(),
                    color: "#006400".into(),
                    values: vec![2, 1],
                },
            ],
            height: 600,
            placeholder: None,
        }
    }

    #[test]
    fn text_lists_one_line_per_category() {
        let mut buf = Vec::new();
        render_text(&spec(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            text,
            "category  Contributor Count  Assignee Count\nAlice  0  2\nBob  1  1\n"
        );
    }

    #[test]
    fn placeholders_explain_themselves() {
        let mut buf = Vec::new();
        render_pretty(&ChartSpec::placeholder(Placeholder::NoData), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("No data\n"));
        assert!(text.contains("no tickets match"));
    }

    #[test]
    fn pretty_totals_each_series() {
        let mut buf = Vec::new();
        render_pretty(&spec(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Bars:        grouped"));
        assert!(text.contains("Assignee Count            3"));
    }
}
