use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `tks completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to emit the script for (bash, zsh, fish, elvish, powershell).
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print a completion script for `tks` to stdout.
///
/// The script covers the subcommands (`filters`, `report`, `chart`, `fetch`),
/// their flags, and the enumerated values of `--format` and `chart --kind`.
/// Dimension ids and option values depend on the loaded export and are not
/// completed.
///
/// # Errors
///
/// Never fails today; the `Result` keeps the handler signature uniform.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    generate(shell, command, "tks", &mut std::io::stdout().lock());
    Ok(())
}
