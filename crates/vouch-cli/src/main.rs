use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use vouch_cli::OutputFormat;

#[derive(Parser)]
#[command(name = "vouch")]
#[command(about = "Validate documents against declarative field rules", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an input document against a rule book
    Check {
        /// Rule book file (YAML, TOML or JSON)
        #[arg(short, long, env = "VOUCH_RULES")]
        rules: PathBuf,

        /// Input document (JSON, or YAML by extension)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Check that every rule in a rule book can be built
    Lint {
        /// Rule book file (YAML, TOML or JSON)
        #[arg(short, long, env = "VOUCH_RULES")]
        rules: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing, RUST_LOG refines the -v/-d level
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(vouch_cli::log_filter(cli.verbose, cli.debug, &directives))
        .with_target(cli.debug) // Show target module in debug mode
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            rules,
            input,
            format,
        } => {
            let outcome = vouch_cli::check(&rules, &input)?;
            println!("{}", vouch_cli::render(&outcome, format)?);
            Ok(if outcome.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Lint { rules } => {
            let book = vouch_cli::lint(&rules)?;
            println!("{} rules OK", book.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}
