//! BigScore - weighted master score for crypto assets
//!
//! A CLI tool that asks several remote assessors for category sub-scores
//! in parallel and combines them into one coverage-weighted master score.
//!
//! Output contract:
//!   stdout - exactly one pretty-printed JSON report, on success only
//!   stderr - logs, progress, summary, and errors
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (configuration, context fetch, assessor, aggregation)

mod analysis;
mod assessor;
mod cli;
mod config;
mod context;
mod error;
mod models;
mod report;

use analysis::AggregationEngine;
use anyhow::{Context, Result};
use assessor::{AssessorInvoker, BackboardClient};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::InputContext;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("BigScore v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Scoring failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .bigscore.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    eprintln!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    eprintln!("   Fill in [assessors] with your assistant ids; the API key is read from BACKBOARD_API_KEY.");
    Ok(())
}

/// Initialize logging on stderr; stdout is reserved for the report.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one aggregation pass and print the report.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config =
        load_config(&args, Path::new(".")).context("Failed to load configuration")?;
    config.merge_with_args(&args);
    config.validate()?;

    let weights = config.weights()?;
    let categories = config.aggregation.categories.clone();
    debug!(
        "Categories: {:?}, policy: {:?}",
        categories, config.aggregation.failure_policy
    );

    // Step 1: Obtain the input context
    let context = get_context(&args, &config).await?;
    info!("Context ready for {}", context.name);

    // Step 2: Wire up the assessors
    let backend = BackboardClient::new(config.backboard_settings()?)
        .context("Failed to create assistant service client")?;
    let invoker = AssessorInvoker::new(
        Arc::new(backend),
        config.assessors.to_map(),
        config.retry_policy(),
    );
    let engine = AggregationEngine::new(invoker, config.aggregation.failure_policy);

    // Step 3: Fan out and aggregate
    let spinner = start_spinner(&args, categories.len());
    let deadline = Duration::from_secs(config.aggregation.timeout_seconds);
    let result = engine
        .aggregate_within(&context, &weights, &categories, deadline)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    // Step 4: Emit
    let json = report::generate_json_report(&report)?;
    println!("{}", json);

    if !args.quiet {
        eprintln!("\n{}", report::generate_summary(&report));
        eprintln!(
            "✅ Done in {:.1}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// A default file that exists but cannot be loaded is an error; only a
/// missing one falls back to the built-in defaults.
fn load_config(args: &Args, dir: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default_in(dir)? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Read the context file if given, otherwise run the fetcher.
async fn get_context(args: &Args, config: &Config) -> Result<InputContext> {
    if let Some(ref path) = args.context_file {
        return context::load_context_file(path)
            .with_context(|| format!("Failed to load context from {}", path.display()));
    }

    let entity = args.entity();
    context::fetch_context(&config.fetch_command(), entity)
        .await
        .with_context(|| format!("Failed to fetch context for {}", entity))
}

/// Spinner on stderr while assessors run; none in quiet mode.
fn start_spinner(args: &Args, count: usize) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Waiting for {} assessors...", count));
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}
