//! `tks filters`: the dimensions a dashboard over this export would offer.

use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use tickscope_core::Session;
use tickscope_core::config::ProjectConfig;
use tickscope_core::filter::{Bounds, FilterDefinition, FilterKind, FilterSelection};

use super::{InputArgs, fail, split_assignment};
use crate::output::{CliError, OutputMode, Renderable, pretty_kv, pretty_rule, render_list};

/// Arguments for `tks filters`.
#[derive(Args, Debug)]
pub struct FiltersArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only show options of DIM containing TEXT, e.g. `person=ali`.
    #[arg(long, value_name = "DIM=TEXT")]
    pub search: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Span {
    Numeric { min: f64, max: f64 },
    Date { min: NaiveDate, max: NaiveDate },
}

impl Span {
    fn describe(&self) -> String {
        match self {
            Self::Numeric { min, max } => format!("{min}..{max}"),
            Self::Date { min, max } => format!("{min}..{max}"),
        }
    }
}

/// One row of `tks filters` output.
#[derive(Debug, Serialize)]
pub struct DimensionRow {
    id: String,
    column: String,
    kind: FilterKind,
    composite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    span: Option<Span>,
}

impl DimensionRow {
    fn build(def: &FilterDefinition, session: &Session) -> Self {
        let (options, search) = match session.state().get(&def.id) {
            Some(FilterSelection::Categorical(sel)) => (
                Some(
                    sel.visible_options(def.options())
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                ),
                sel.search.clone(),
            ),
            _ => (None, None),
        };
        let span = match (&def.bounds, def.kind) {
            (Bounds::Span { min, max }, _) => Some(Span::Numeric {
                min: *min,
                max: *max,
            }),
            (Bounds::Deferred, FilterKind::DateRange) => def
                .date_span(session.dataset())
                .map(|(min, max)| Span::Date { min, max }),
            _ => None,
        };
        Self {
            id: def.id.to_string(),
            column: def.column.clone(),
            kind: def.kind,
            composite: def.is_composite(),
            options,
            search,
            span,
        }
    }

    fn detail(&self) -> String {
        if let Some(options) = &self.options {
            return format!("{} options", options.len());
        }
        self.span
            .as_ref()
            .map_or_else(|| "no dated rows".to_string(), Span::describe)
    }
}

impl Renderable for DimensionRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", self.id)?;
        pretty_rule(w)?;
        pretty_kv(w, "Column", &self.column)?;
        let kind = if self.composite {
            format!("{} (any of several columns)", self.kind)
        } else {
            self.kind.to_string()
        };
        pretty_kv(w, "Kind", kind)?;
        if let Some(search) = &self.search {
            pretty_kv(w, "Search", search)?;
        }
        match (&self.options, &self.span) {
            (Some(options), _) => {
                pretty_kv(w, "Options", options.len().to_string())?;
                for option in options {
                    writeln!(w, "  - {option}")?;
                }
            }
            (None, Some(span)) => pretty_kv(w, "Span", span.describe())?,
            (None, None) => pretty_kv(w, "Span", "-")?,
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}  {}  {}", self.id, self.kind, self.column, self.detail())
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "KIND", "COLUMN", "DETAIL"]
    }
}

/// Execute `tks filters`.
pub fn run_filters(
    args: &FiltersArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut session = super::load_session(project_root, config, &args.input, output)?;

    for raw in &args.search {
        let (id, text) =
            split_assignment(raw, "--search").map_err(|e| fail(output, &e))?;
        session
            .state_mut()
            .search(&id, Some(text))
            .map_err(|e| fail(output, &CliError::from_code(e.code(), e.to_string())))?;
    }

    let rows: Vec<DimensionRow> = session
        .registry()
        .iter()
        .map(|def| DimensionRow::build(def, &session))
        .collect();
    render_list(&rows, output)?;
    Ok(())
}
