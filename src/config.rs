//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bigscore.toml` files. The API key is not part of the
//! file format; it comes from the environment or the command line.

use crate::analysis::FailurePolicy;
use crate::assessor::{BackboardSettings, RetryPolicy};
use crate::context::FetchCommand;
use crate::error::WeightError;
use crate::models::{Category, CategoryWeights};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".bigscore.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Assistant service settings.
    #[serde(default)]
    pub backboard: BackboardConfig,

    /// Assistant id per category.
    #[serde(default)]
    pub assessors: AssessorsConfig,

    /// Category weights.
    #[serde(default)]
    pub weights: WeightsConfig,

    /// Context fetcher settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Aggregation run settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// API key, never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Hosted assistant service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackboardConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Extra attempts on transport failure.
    #[serde(default)]
    pub retries: usize,

    /// Base delay between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for BackboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_request_timeout(),
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_api_url() -> String {
    "https://app.backboard.io/api".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Assistant id for each category. Unset ids cannot be assessed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessorsConfig {
    #[serde(default)]
    pub market_integrity: Option<String>,
    #[serde(default)]
    pub dev_velocity: Option<String>,
    #[serde(default)]
    pub on_chain_security: Option<String>,
    #[serde(default)]
    pub social_sentiment: Option<String>,
}

impl AssessorsConfig {
    pub fn get(&self, category: Category) -> Option<&str> {
        let id = match category {
            Category::MarketIntegrity => &self.market_integrity,
            Category::DevVelocity => &self.dev_velocity,
            Category::OnChainSecurity => &self.on_chain_security,
            Category::SocialSentiment => &self.social_sentiment,
        };
        id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Configured ids keyed by category.
    pub fn to_map(&self) -> HashMap<Category, String> {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.get(c).map(|id| (c, id.to_string())))
            .collect()
    }
}

/// Weight per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_market_weight")]
    pub market_integrity: f64,
    #[serde(default = "default_dev_weight")]
    pub dev_velocity: f64,
    #[serde(default = "default_onchain_weight")]
    pub on_chain_security: f64,
    #[serde(default = "default_social_weight")]
    pub social_sentiment: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            market_integrity: default_market_weight(),
            dev_velocity: default_dev_weight(),
            on_chain_security: default_onchain_weight(),
            social_sentiment: default_social_weight(),
        }
    }
}

fn default_market_weight() -> f64 {
    0.25
}

fn default_dev_weight() -> f64 {
    0.20
}

fn default_onchain_weight() -> f64 {
    0.35
}

fn default_social_weight() -> f64 {
    0.20
}

/// External context fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Program to run; the entity identifier is appended to `args`.
    #[serde(default = "default_context_command")]
    pub command: String,

    #[serde(default = "default_context_args")]
    pub args: Vec<String>,

    #[serde(default = "default_context_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            command: default_context_command(),
            args: default_context_args(),
            timeout_seconds: default_context_timeout(),
        }
    }
}

fn default_context_command() -> String {
    "node".to_string()
}

fn default_context_args() -> Vec<String> {
    vec!["backboard/scripts/get_context.js".to_string()]
}

fn default_context_timeout() -> u64 {
    60
}

/// Aggregation run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Categories to assess; the rest are reported as excluded.
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Deadline for the whole fan-out, in seconds.
    #[serde(default = "default_aggregation_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            failure_policy: FailurePolicy::default(),
            timeout_seconds: default_aggregation_timeout(),
        }
    }
}

fn default_categories() -> Vec<Category> {
    Category::DEFAULT_ENABLED.to_vec()
}

fn default_aggregation_timeout() -> u64 {
    300
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_default_in(Path::new("."))
    }

    /// Like [`load_default`](Self::load_default), looking in `dir`.
    pub fn load_default_in(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.backboard.api_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.aggregation.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.backboard.retries = retries;
        }
        if let Some(ref categories) = args.categories {
            self.aggregation.categories = categories.clone();
        }
        if let Some(policy) = args.failure_policy {
            self.aggregation.failure_policy = policy;
        }

        let overrides = [
            (&args.market_assistant, &mut self.assessors.market_integrity),
            (&args.dev_assistant, &mut self.assessors.dev_velocity),
            (&args.onchain_assistant, &mut self.assessors.on_chain_security),
            (&args.social_assistant, &mut self.assessors.social_sentiment),
        ];
        for (arg, slot) in overrides {
            if arg.is_some() {
                *slot = arg.clone();
            }
        }

        if args.api_key.is_some() {
            self.api_key = args.api_key.clone();
        }
    }

    /// Build the validated weight table.
    pub fn weights(&self) -> Result<CategoryWeights, WeightError> {
        CategoryWeights::new([
            (Category::MarketIntegrity, self.weights.market_integrity),
            (Category::DevVelocity, self.weights.dev_velocity),
            (Category::OnChainSecurity, self.weights.on_chain_security),
            (Category::SocialSentiment, self.weights.social_sentiment),
        ])
    }

    /// Settings for the assistant service client. Requires an API key.
    pub fn backboard_settings(&self) -> Result<BackboardSettings> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("Missing API key: set BACKBOARD_API_KEY or pass --api-key")?;

        Ok(BackboardSettings {
            api_url: self.backboard.api_url.clone(),
            api_key,
            timeout_seconds: self.backboard.timeout_seconds,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.backboard.retries,
            delay: Duration::from_millis(self.backboard.retry_delay_ms),
        }
    }

    pub fn fetch_command(&self) -> FetchCommand {
        FetchCommand {
            program: self.context.command.clone(),
            args: self.context.args.clone(),
            timeout: Duration::from_secs(self.context.timeout_seconds),
        }
    }

    /// Check weights, timeouts, and that every requested category has an
    /// assistant configured.
    pub fn validate(&self) -> Result<()> {
        self.weights().context("Invalid [weights] section")?;

        let timeouts = [
            ("backboard.timeout_seconds", self.backboard.timeout_seconds),
            ("context.timeout_seconds", self.context.timeout_seconds),
            ("aggregation.timeout_seconds", self.aggregation.timeout_seconds),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                anyhow::bail!("{} must be at least 1 second", key);
            }
        }

        let missing: Vec<&str> = self
            .aggregation
            .categories
            .iter()
            .filter(|c| self.assessors.get(**c).is_none())
            .map(|c| c.as_str())
            .collect();

        if !missing.is_empty() {
            anyhow::bail!(
                "No assistant id configured for: {} (set [assessors] in {} or pass --<category>-assistant)",
                missing.join(", "),
                DEFAULT_CONFIG_FILE
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
