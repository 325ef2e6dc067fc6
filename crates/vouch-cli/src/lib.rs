//! Library interface for the vouch CLI

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vouch::{load_rule_book, Outcome, RuleBook, Validator};

/// How `vouch check` prints its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Log filter for the CLI.
///
/// `directives` uses `RUST_LOG` syntax. Targets it does not mention log at
/// the level picked by `-v`/`-d`, or INFO by default. Unparsable directives
/// are skipped.
pub fn log_filter(verbose: bool, debug: bool, directives: &str) -> EnvFilter {
    let level = if debug {
        LevelFilter::TRACE
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}

/// Load a rule book and make sure every rule in it can be built.
pub fn lint(rules: &Path) -> Result<RuleBook> {
    let book = load_rule_book(rules)
        .with_context(|| format!("Failed to load rule book {}", rules.display()))?;
    book.finalize()
        .with_context(|| format!("Invalid rule in {}", rules.display()))?;
    info!("{} rules in {} are valid", book.len(), rules.display());
    Ok(book)
}

/// Read an input document. YAML for `.yaml`/`.yml`, JSON otherwise.
pub fn read_input(path: &Path) -> Result<Validator> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let data: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML input {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON input {}", path.display()))?
    };

    Ok(Validator::from_json(data)?)
}

/// Validate an input document against a rule book file.
pub fn check(rules: &Path, input: &Path) -> Result<Outcome> {
    let book = lint(rules)?;
    let validator = read_input(input)?;
    debug!("Read {} fields from {}", validator.input().len(), input.display());

    let outcome = validator.with(&book)?;
    info!(
        "{} fields passed, {} failed",
        outcome.params.len(),
        outcome.errors.len()
    );
    Ok(outcome)
}

pub fn render(outcome: &Outcome, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome)?,
        OutputFormat::Yaml => serde_yaml::to_string(outcome)?,
    })
}
