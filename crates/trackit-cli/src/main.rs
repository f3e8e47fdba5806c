#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use trackit_core::config::discover_config;
use trackit_core::timing::{self, TimingReport, Timings};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "trackit: replay a dated command log against a project tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit per-command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Read configuration from FILE instead of discovering it.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Replay a command log and write one outcome per command",
        after_help = "EXAMPLES:\n    # Replay and print JSON outcomes\n    tk run --users users.json --commands commands.json --json\n\n    # Write outcomes to a file, acknowledgements included\n    tk run --users users.json --commands commands.json -o out.json --include-acks --json"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        about = "Load the inputs and summarize them without replaying",
        after_help = "EXAMPLES:\n    tk check --users users.json --commands commands.json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tk completions bash > /etc/bash_completion.d/tk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRACKIT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "trackit=debug,info"
        } else {
            "trackit=info,warn"
        })
    });

    let format = env::var("TRACKIT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

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

fn print_timing_report(report: &TimingReport) -> anyhow::Result<()> {
    if report.is_empty() {
        eprintln!("timing report: no samples recorded");
    } else {
        eprintln!("timing report:");
        eprintln!("{}", report.display_table());
        eprintln!("timing report (json):");
        eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let timing_enabled = cli.timing || timing::timing_enabled_from_env();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let loaded = discover_config(&project_root, cli.config.as_deref())?;
    if let Some(source) = &loaded.source {
        info!(config = %source.display(), "configuration loaded");
    }
    let output = output::resolve_output_mode(cli.json, loaded.config.output.format.as_deref());

    let report = match cli.command {
        Commands::Run(ref args) => Some(cmd::run::run_run(
            args,
            &loaded.config,
            output,
            Timings::new(timing_enabled),
        )?),
        Commands::Check(ref args) => {
            let source = loaded.source.as_ref().map(|path| path.display().to_string());
            cmd::check::run_check(args, source, output)?;
            None
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)?;
            None
        }
    };

    if timing_enabled {
        print_timing_report(&report.unwrap_or_default())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["tk", "--timing", "check", "--users", "u", "--commands", "c"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from([
            "tk", "run", "--users", "u", "--commands", "c", "--json", "--config", "x.toml",
        ]);
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.users, PathBuf::from("u"));
        assert!(!args.include_acks);
        assert!(args.output.is_none());
    }

    #[test]
    fn run_requires_both_inputs() {
        assert!(Cli::try_parse_from(["tk", "run", "--users", "u"]).is_err());
    }

    #[test]
    fn output_short_flag() {
        let cli = Cli::parse_from([
            "tk", "run", "--users", "u", "--commands", "c", "-o", "out.json", "--include-acks",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(args.include_acks);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
