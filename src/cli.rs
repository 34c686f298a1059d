//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::FailurePolicy;
use crate::models::Category;
use clap::Parser;
use std::path::PathBuf;

/// BigScore - weighted master score for a crypto asset
///
/// Asks one remote assessor per category for a sub-score, then combines
/// the answers into a coverage-weighted master score. The report is printed
/// to stdout as JSON; logs and progress go to stderr.
///
/// Examples:
///   bigscore btc
///   bigscore --context-file btc.json --categories market,onchain
///   bigscore eth --failure-policy drop-failed --retries 2
///   bigscore --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Entity to score (ticker symbol or coin id), passed to the context fetcher
    #[arg(value_name = "SYMBOL", required_unless_present_any = ["init_config", "context_file"])]
    pub symbol: Option<String>,

    /// Read the input context from a JSON file instead of running the fetcher
    #[arg(long, value_name = "FILE")]
    pub context_file: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bigscore.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Categories to assess (comma-separated)
    ///
    /// Accepts full names or short aliases: market, dev, onchain, social.
    /// Categories not listed are reported as excluded.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub categories: Option<Vec<Category>>,

    /// What to do when some categories fail
    #[arg(long, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicy>,

    /// Assistant service base URL
    #[arg(long, value_name = "URL", env = "BACKBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Assistant service API key
    #[arg(long, env = "BACKBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Assistant id for the market integrity category
    #[arg(long, value_name = "ID", env = "BIGSCORE_MARKET_ASSISTANT")]
    pub market_assistant: Option<String>,

    /// Assistant id for the dev velocity category
    #[arg(long, value_name = "ID", env = "BIGSCORE_DEV_ASSISTANT")]
    pub dev_assistant: Option<String>,

    /// Assistant id for the on-chain security category
    #[arg(long, value_name = "ID", env = "BIGSCORE_ONCHAIN_ASSISTANT")]
    pub onchain_assistant: Option<String>,

    /// Assistant id for the social sentiment category
    #[arg(long, value_name = "ID", env = "BIGSCORE_SOCIAL_ASSISTANT")]
    pub social_assistant: Option<String>,

    /// Deadline for the whole aggregation in seconds
    ///
    /// In-flight assessor calls are abandoned when it expires.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Extra attempts for assessor calls that fail in transport
    #[arg(long, value_name = "NUM")]
    pub retries: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress or summary)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .bigscore.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref symbol) = self.symbol {
            if symbol.trim().is_empty() {
                return Err("Symbol must not be empty".to_string());
            }
        } else if self.context_file.is_none() {
            return Err("Either a SYMBOL or --context-file is required".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref categories) = self.categories {
            if categories.is_empty() {
                return Err("At least one category is required".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref path) = self.context_file {
            if !path.is_file() {
                return Err(format!("Context file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The entity label used for fetching and logging.
    pub fn entity(&self) -> &str {
        self.symbol.as_deref().unwrap_or("")
    }
}
