use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// `tk completions <shell>`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to emit a completion script for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print the `tk` completion script for `shell`, built from the clap
/// definition in `command`.
///
/// # Errors
///
/// None in practice: `clap_complete` panics on write failure instead of
/// returning an error.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    generate(shell, command, "tk", &mut out);
    Ok(())
}
