#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use tickscope_core::config::load_project_config;
use tickscope_core::error::ErrorCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tickscope: filter and summarize issue-tracker exports",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, env, and project config.
    fn output_mode(&self, config_output: Option<&str>) -> OutputMode {
        output::resolve_output_mode(self.format, self.json, config_output)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "List filter dimensions for an export",
        long_about = "Load an export and list every filter dimension with its kind and options or span.",
        after_help = "EXAMPLES:\n    # List dimensions of an export\n    tks filters --input defects.csv\n\n    # Narrow the options shown for one dimension\n    tks filters --input defects.csv --search person=ali\n\n    # Emit machine-readable output\n    tks filters --input defects.csv --json"
    )]
    Filters(cmd::filters::FiltersArgs),

    #[command(
        next_help_heading = "Read",
        about = "Summarize filtered tickets",
        long_about = "Apply selections to an export and print the daily-priority and per-person tables.",
        after_help = "EXAMPLES:\n    # Summarize the whole export\n    tks report --input defects.csv\n\n    # Only high priority tickets touched by Alice in January\n    tks report --input defects.csv --select priority=High --select person=Alice \\\n        --range created-date=2024-01-01..2024-01-31\n\n    # Emit machine-readable output\n    tks report --input defects.csv --json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Read",
        about = "Emit a bar chart specification",
        long_about = "Build the daily-priority or per-person bar chart for the filtered tickets.",
        after_help = "EXAMPLES:\n    # Chart spec for the per-person counts\n    tks chart --input defects.csv --kind people --json\n\n    # Daily chart for tickets with 3 to 8 story points\n    tks chart --input defects.csv --kind daily --range story-points=3..8"
    )]
    Chart(cmd::chart::ChartArgs),

    #[command(
        next_help_heading = "Import",
        about = "Fetch tickets from the issue tracker",
        long_about = "Query the issue tracker, flatten every ticket with its status history, and write a CSV export.",
        after_help = "EXAMPLES:\n    # Fetch with the configured server and query\n    JIRA_USERNAME=me JIRA_API_KEY=... tks fetch --output defects.csv\n\n    # Override the query\n    tks fetch --jql 'project = UAT ORDER BY created DESC' --output uat.csv"
    )]
    Fetch(cmd::fetch::FetchArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for tks.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tks completions bash > ~/.local/share/bash-completion/completions/tks\n\n    # Generate zsh completions\n    tks completions zsh > ~/.zfunc/_tks"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TICKSCOPE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tickscope=debug,info"
        } else {
            "tickscope=info,warn"
        })
    });

    let format = env::var("TICKSCOPE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays parseable.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Completions(ref args) = cli.command {
        return cmd::completions::run_completions(args.shell, &mut Cli::command());
    }

    let project_root = env::current_dir()?;
    let config = match load_project_config(&project_root) {
        Ok(config) => config,
        Err(e) => {
            let output = cli.output_mode(None);
            render_error(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            )?;
            return Err(e);
        }
    };
    let output = cli.output_mode(config.output.as_deref());

    match cli.command {
        Commands::Filters(ref args) => {
            cmd::filters::run_filters(args, output, &project_root, &config)
        }
        Commands::Report(ref args) => cmd::report::run_report(args, output, &project_root, &config),
        Commands::Chart(ref args) => cmd::chart::run_chart(args, output, &project_root, &config),
        Commands::Fetch(ref args) => cmd::fetch::run_fetch(args, output, &project_root, &config),
        Commands::Completions(_) => Ok(()),
    }
}
