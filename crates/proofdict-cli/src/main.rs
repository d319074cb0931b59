#![deny(unsafe_code)]

//! proofdict CLI: check documents against a proofdict dictionary.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use proofdict_config::AppConfig;
use proofdict_core::scan::RefreshOutcome;
use proofdict_core::{
    Diagnostic, Document, DocumentKind, FileStore, HttpFetcher, Scanner, apply_fixes, build_info,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// proofdict: a dictionary-driven term checker for prose.
#[derive(Parser)]
#[command(name = "proofdict", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "proofdict.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files against the dictionary.
    Lint {
        /// Markdown or plain-text files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rewrite files with the suggested corrections.
        #[arg(long)]
        fix: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Inspect or manage the cached remote dictionary.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show when the dictionary was last fetched.
    Status,
    /// Remove the cached dictionary.
    Clear,
    /// Fetch the dictionary now, ignoring the update interval.
    Refresh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    let filter = log_filter(cli.verbose, &config);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
    debug!(version = %build_info::version_string(), config = %cli.config.display(), "Starting");

    match cli.command {
        Commands::Lint { files, fix, format } => {
            let clean = cmd_lint(config, &files, fix, format).await?;
            return Ok(if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Commands::Cache { action } => cmd_cache(config, action).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// -v flags override the configured level; RUST_LOG overrides both.
fn log_filter(verbose: u8, config: &AppConfig) -> &str {
    match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    }
}

fn build_scanner(config: AppConfig) -> Result<Scanner> {
    let store = Arc::new(FileStore::new(config.cache.dir.clone()));
    let fetcher = Arc::new(HttpFetcher::new()?);
    Ok(Scanner::new(config, store, fetcher))
}

/// Returns `true` when no diagnostics remain.
async fn cmd_lint(config: AppConfig, files: &[PathBuf], fix: bool, format: Format) -> Result<bool> {
    let scanner = build_scanner(config)?;
    let mut remaining = 0;
    let mut reports = Vec::with_capacity(files.len());

    for path in files {
        let diagnostics = lint_file(&scanner, path, fix).await?;
        remaining += diagnostics.len();
        match format {
            Format::Text => print!("{}", render_text(path, &diagnostics)),
            Format::Json => reports.push(serde_json::json!({
                "path": path.display().to_string(),
                "diagnostics": diagnostics,
            })),
        }
    }

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    info!(files = files.len(), remaining, "Lint finished");
    Ok(remaining == 0)
}

/// Scan one file, applying fixes first when asked. Returns what is left.
async fn lint_file(scanner: &Scanner, path: &Path, fix: bool) -> Result<Vec<Diagnostic>> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let kind = DocumentKind::from_path(path);
    let document = Document::new(source, kind);
    let diagnostics = scanner.scan(&document).await.diagnostics;
    if !fix || diagnostics.iter().all(|d| d.fix.is_none()) {
        return Ok(diagnostics);
    }

    let outcome = apply_fixes(document.source(), &diagnostics);
    tokio::fs::write(path, &outcome.output)
        .await
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(
        path = %path.display(),
        applied = outcome.applied,
        skipped = outcome.skipped,
        "Applied fixes"
    );

    let fixed = Document::new(outcome.output, kind);
    Ok(scanner.scan(&fixed).await.diagnostics)
}

/// `path:line:column: message`, continuation lines indented.
fn render_text(path: &Path, diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for d in diagnostics {
        let mut lines = d.message.lines();
        let first = lines.next().unwrap_or_default();
        out.push_str(&format!("{}:{}:{}: {first}\n", path.display(), d.line, d.column));
        for line in lines {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out
}

async fn cmd_cache(config: AppConfig, action: CacheAction) -> Result<()> {
    let locator = config.dictionary.dict_url.clone();
    let cache_dir = config.cache.dir.clone();
    let scanner = build_scanner(config)?;

    match action {
        CacheAction::Status => {
            let status = scanner.cache_status();
            match &locator {
                Some(locator) => println!("Dictionary: {}", locator.json_url()),
                None => println!("Dictionary: no dict_url configured"),
            }
            println!("Cache dir:  {}", cache_dir.display());
            println!("Updated:    {} ms since epoch", status.last_updated);
            match status.records {
                Some(n) => println!("Records:    {n}"),
                None => println!("Records:    none cached"),
            }
            println!("Expired:    {}", status.expired);
        }
        CacheAction::Clear => {
            scanner.clear_cache()?;
            println!("Cleared cache at '{}'.", cache_dir.display());
        }
        CacheAction::Refresh => match scanner.refresh(true).await? {
            RefreshOutcome::Updated { terms } => println!("Fetched {terms} dictionary records."),
            RefreshOutcome::Fresh => println!("Cached dictionary is up to date."),
            RefreshOutcome::Skipped => {
                println!("Nothing to refresh: no remote dictionary is in use.")
            }
        },
    }
    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        match config.source_mode() {
            Some(mode) => println!(
                "Configuration at '{}' is valid ({mode} dictionary).",
                config_path.display()
            ),
            None => println!(
                "Configuration at '{}' is valid but names no dictionary.",
                config_path.display()
            ),
        }
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path)
            .await
            .with_context(|| format!("invalid configuration '{}'", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}
