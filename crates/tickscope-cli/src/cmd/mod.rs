pub mod chart;
pub mod completions;
pub mod fetch;
pub mod filters;
pub mod report;

use std::path::{Path, PathBuf};

use clap::Args;
use tickscope_core::Session;
use tickscope_core::config::ProjectConfig;
use tickscope_core::dates::parse_date;
use tickscope_core::error::ErrorCode;
use tickscope_core::filter::{ConfigError, DimensionId, FilterError, FilterKind};
use tickscope_core::ingest::load_file;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// The export every read command works on.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Ticket export to load (.csv or .xlsx), relative to the current directory.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// Selections applied before anything is summarized.
///
/// Dimensions are named by id (`created-date`) or by column (`"Created Date"`).
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Select categorical values, e.g. `priority=High,Low` (repeatable).
    #[arg(long = "select", value_name = "DIM=VALUES")]
    pub select: Vec<String>,

    /// Select every option containing TEXT, case-insensitively.
    #[arg(long = "select-matching", value_name = "DIM=TEXT")]
    pub select_matching: Vec<String>,

    /// Restrict a date or numeric dimension, e.g. `story-points=3..8`.
    /// Either bound may be left empty.
    #[arg(long = "range", value_name = "DIM=LO..HI")]
    pub range: Vec<String>,
}

/// Render `error` and turn it into the `anyhow` error that ends the command.
pub fn fail(output: OutputMode, error: &CliError) -> anyhow::Error {
    if let Err(e) = render_error(output, error) {
        return e;
    }
    anyhow::anyhow!("{}", error.message)
}

/// Load the filter config and the export, and start a session over them.
pub fn load_session(
    project_root: &Path,
    config: &ProjectConfig,
    input: &InputArgs,
    output: OutputMode,
) -> anyhow::Result<Session> {
    let filters = config.load_filter_config(project_root).map_err(|e| {
        let code = e
            .downcast_ref::<ConfigError>()
            .map_or(ErrorCode::ConfigParseError, ConfigError::code);
        fail(output, &CliError::from_code(code, format!("{e:#}")))
    })?;

    let path = project_root.join(&input.input);
    let dataset = load_file(&path, &config.ingest_options())
        .map_err(|e| fail(output, &CliError::from_code(e.code(), e.to_string())))?;
    debug!(path = %path.display(), rows = dataset.len(), "loaded export");

    Session::new(config.schema.clone(), filters, dataset)
        .map_err(|e| fail(output, &CliError::from_code(e.code(), e.to_string())))
}

/// Apply every `--select`, `--select-matching`, and `--range` flag in order.
pub fn apply_selections(
    session: &mut Session,
    args: &SelectionArgs,
    output: OutputMode,
) -> anyhow::Result<()> {
    apply_selections_inner(session, args).map_err(|e| fail(output, &e))
}

fn apply_selections_inner(session: &mut Session, args: &SelectionArgs) -> Result<(), CliError> {
    for raw in &args.select {
        let (id, values) = split_assignment(raw, "--select")?;
        for value in values.split(',').map(str::trim).filter(|v| !v.is_empty()) {
            session
                .state_mut()
                .toggle(&id, value)
                .map_err(|e| filter_error(&e))?;
        }
    }

    for raw in &args.select_matching {
        let (id, text) = split_assignment(raw, "--select-matching")?;
        let registry = session.registry().clone();
        let state = session.state_mut();
        state.search(&id, Some(text)).map_err(|e| filter_error(&e))?;
        let selected = state
            .select_all(&registry, &id)
            .map_err(|e| filter_error(&e))?;
        state.search(&id, None).map_err(|e| filter_error(&e))?;
        debug!(dimension = %id, selected, "selected matching options");
    }

    for raw in &args.range {
        let (id, bounds) = split_assignment(raw, "--range")?;
        let (lo, hi) = bounds.split_once("..").ok_or_else(|| {
            CliError::with_suggestion(
                format!("invalid --range value '{raw}'"),
                "use DIM=LO..HI, e.g. --range created-date=2024-01-01..2024-01-31",
            )
        })?;
        let kind = session
            .registry()
            .get(&id)
            .map(|def| def.kind)
            .ok_or_else(|| filter_error(&FilterError::UnknownDimension(id.to_string())))?;

        let state = session.state_mut();
        let applied = match kind {
            FilterKind::DateRange => state.set_date_range(
                &id,
                parse_bound(lo, raw, parse_date)?,
                parse_bound(hi, raw, parse_date)?,
            ),
            FilterKind::NumericRange => {
                let number = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
                state.set_numeric_range(
                    &id,
                    parse_bound(lo, raw, number)?,
                    parse_bound(hi, raw, number)?,
                )
            }
            FilterKind::Categorical => Err(FilterError::KindMismatch {
                dimension: id.to_string(),
                actual: FilterKind::Categorical,
                requested: FilterKind::NumericRange,
            }),
        };
        applied.map_err(|e| filter_error(&e))?;
    }

    Ok(())
}

fn split_assignment<'a>(raw: &'a str, flag: &str) -> Result<(DimensionId, &'a str), CliError> {
    match raw.split_once('=') {
        Some((dim, value)) if !dim.trim().is_empty() => {
            Ok((DimensionId::from_column(dim.trim()), value.trim()))
        }
        _ => Err(CliError::with_suggestion(
            format!("invalid {flag} value '{raw}'"),
            format!("use {flag} DIM=VALUE; run `tks filters` to list dimensions"),
        )),
    }
}

/// Empty bounds are open; anything else must parse.
fn parse_bound<T>(
    text: &str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, CliError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse(text).map(Some).ok_or_else(|| {
        CliError::with_suggestion(
            format!("invalid bound '{text}' in --range '{raw}'"),
            "dates are YYYY-MM-DD, numbers are plain decimals",
        )
    })
}

fn filter_error(e: &FilterError) -> CliError {
    CliError::from_code(e.code(), e.to_string())
}
