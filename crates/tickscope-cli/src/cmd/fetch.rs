//! `tks fetch`: pull tickets from the tracker's search API into a CSV export.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use serde::Serialize;
use tickscope_core::config::ProjectConfig;
use tickscope_core::dataset::{Cell, Dataset};
use tickscope_core::dates::TRACKER_DATE_FORMAT;
use tickscope_core::error::ErrorCode;
use tickscope_core::ingest::finalize;
use tickscope_core::tracker::{
    FlattenOptions, Issue, SearchResponse, TrackerClient, TrackerError, fetch_dataset,
};
use tracing::{debug, info};

use super::fail;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode};

const SEARCH_PATH: &str = "/rest/api/2/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Arguments for `tks fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Tracker base URL (overrides `tracker.server`).
    #[arg(long)]
    pub server: Option<String>,

    /// Search query (overrides `tracker.jql`).
    #[arg(long)]
    pub jql: Option<String>,

    /// Issues per request (overrides `tracker.page_size`).
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Where to write the CSV export.
    #[arg(short, long, value_name = "FILE", default_value = "tickets.csv")]
    pub output: PathBuf,
}

/// Blocking client for the tracker's REST search endpoint.
pub struct JiraClient {
    agent: ureq::Agent,
    search_url: String,
    authorization: String,
}

impl JiraClient {
    pub fn new(server: &str, username: &str, api_key: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{api_key}"));
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            search_url: search_url(server),
            authorization: format!("Basic {token}"),
        }
    }

    fn search(
        &self,
        jql: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchResponse, TrackerError> {
        debug!(start_at, max_results, "tracker search request");
        let response = self
            .agent
            .get(&self.search_url)
            .set("Accept", "application/json")
            .set("Authorization", &self.authorization)
            .query("jql", jql)
            .query("startAt", &start_at.to_string())
            .query("maxResults", &max_results.to_string())
            .query("expand", "changelog")
            .call()
            .map_err(|err| TrackerError::Request(format!("{}: {err}", self.search_url)))?;

        response
            .into_json::<SearchResponse>()
            .map_err(|err| TrackerError::InvalidResponse(err.to_string()))
    }
}

impl TrackerClient for JiraClient {
    fn total(&self, jql: &str) -> Result<usize, TrackerError> {
        Ok(self.search(jql, 0, 0)?.total)
    }

    fn page(
        &self,
        jql: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<Vec<Issue>, TrackerError> {
        Ok(self.search(jql, start_at, max_results)?.issues)
    }
}

fn search_url(server: &str) -> String {
    format!("{}{SEARCH_PATH}", server.trim_end_matches('/'))
}

/// Summary payload for `tks fetch`.
#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub server: String,
    pub jql: String,
    pub tickets: usize,
    pub columns: usize,
    pub output: String,
}

/// Execute `tks fetch`.
pub fn run_fetch(
    args: &FetchArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let Some(server) = args.server.as_deref().or(config.tracker.server.as_deref()) else {
        return Err(fail(
            output,
            &CliError::with_suggestion(
                "no tracker server configured",
                "pass --server or set tracker.server in tickscope.toml",
            ),
        ));
    };
    let (Ok(username), Ok(api_key)) = (
        std::env::var("JIRA_USERNAME"),
        std::env::var("JIRA_API_KEY"),
    ) else {
        return Err(fail(
            output,
            &CliError::from_code(
                ErrorCode::TrackerRequestFailed,
                "tracker credentials are not set",
            ),
        ));
    };

    let jql = args.jql.as_deref().unwrap_or(&config.tracker.jql);
    let page_size = args.page_size.unwrap_or(config.tracker.page_size);
    let options = FlattenOptions {
        custom_fields: config.tracker.custom_fields.clone(),
        history_cap: config.schema.history_cap,
        now: chrono::Utc::now(),
    };

    let client = JiraClient::new(server, &username, &api_key);
    let raw = fetch_dataset(&client, jql, page_size, &options)
        .map_err(|e| fail(output, &CliError::from_code(e.code(), e.to_string())))?;
    let dataset = finalize(raw, &config.ingest_options())
        .map_err(|e| fail(output, &CliError::from_code(e.code(), e.to_string())))?;

    let path = project_root.join(&args.output);
    write_csv(&path, &dataset)?;
    info!(path = %path.display(), tickets = dataset.len(), "wrote tracker export");

    let report = FetchReport {
        server: server.to_string(),
        jql: jql.to_string(),
        tickets: dataset.len(),
        columns: dataset.columns().len(),
        output: args.output.display().to_string(),
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}  {}  {}", r.tickets, r.columns, r.output),
        |r, w| {
            pretty_section(w, "Fetch")?;
            pretty_kv(w, "Server", &r.server)?;
            pretty_kv(w, "Query", &r.jql)?;
            pretty_kv(w, "Tickets", r.tickets.to_string())?;
            pretty_kv(w, "Columns", r.columns.to_string())?;
            pretty_kv(w, "Written", &r.output)
        },
    )
}

/// Write `dataset` as CSV, timestamps in the tracker's own export format.
fn write_csv(path: &Path, dataset: &Dataset) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(|cell| match cell {
            Cell::DateTime(dt) => dt.format(TRACKER_DATE_FORMAT).to_string(),
            other => other.as_text().map(std::borrow::Cow::into_owned).unwrap_or_default(),
        }))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
