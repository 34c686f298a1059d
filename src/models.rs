//! Data models for the score aggregator.
//!
//! This module contains the core data structures shared across the
//! pipeline: categories, the input context handed to assessors, the
//! validated sub-score record each assessor returns, the weight table,
//! and the final aggregate report.

use crate::error::{ParseError, WeightError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One independently scored dimension of an asset.
///
/// Declaration order is the canonical order used for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Liquidity, valuation and price behaviour.
    MarketIntegrity,
    /// Repository activity and maintenance health.
    DevVelocity,
    /// Contract ownership, deployer history and holder concentration.
    OnChainSecurity,
    /// Community sentiment. No assessor exists for it yet.
    SocialSentiment,
}

impl Category {
    /// Every category, in canonical order.
    pub const ALL: [Category; 4] = [
        Category::MarketIntegrity,
        Category::DevVelocity,
        Category::OnChainSecurity,
        Category::SocialSentiment,
    ];

    /// The categories assessed when none are requested explicitly.
    pub const DEFAULT_ENABLED: [Category; 3] = [
        Category::MarketIntegrity,
        Category::DevVelocity,
        Category::OnChainSecurity,
    ];

    /// Wire name, also the key of the category's sub-object in the context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MarketIntegrity => "market_integrity",
            Category::DevVelocity => "dev_velocity",
            Category::OnChainSecurity => "on_chain_security",
            Category::SocialSentiment => "social_sentiment",
        }
    }

    /// Human-readable title used in prompts and summaries.
    pub fn title(&self) -> &'static str {
        match self {
            Category::MarketIntegrity => "Market Integrity",
            Category::DevVelocity => "Dev Velocity",
            Category::OnChainSecurity => "On-chain Security",
            Category::SocialSentiment => "Social Sentiment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "market_integrity" | "market" => Ok(Category::MarketIntegrity),
            "dev_velocity" | "dev" | "developer" => Ok(Category::DevVelocity),
            "on_chain_security" | "onchain_security" | "onchain" | "on_chain" => {
                Ok(Category::OnChainSecurity)
            }
            "social_sentiment" | "social" => Ok(Category::SocialSentiment),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Facts about one entity, as produced by the context-fetch collaborator.
///
/// Category sub-objects are opaque to the pipeline; they are forwarded to
/// the matching assessor and nowhere else.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputContext {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_days: Option<i64>,

    #[serde(default, alias = "market_metrics", skip_serializing_if = "Option::is_none")]
    pub market_integrity: Option<Map<String, Value>>,

    #[serde(default, alias = "dev_stats", skip_serializing_if = "Option::is_none")]
    pub dev_velocity: Option<Map<String, Value>>,

    #[serde(default, alias = "trust_assessment", skip_serializing_if = "Option::is_none")]
    pub on_chain_security: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_sentiment: Option<Map<String, Value>>,

    /// Logo and contract verification signals; on-chain scope only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_signals: Option<Map<String, Value>>,
}

impl InputContext {
    /// The sub-object belonging to `category`, if the collaborator supplied one.
    pub fn category_data(&self, category: Category) -> Option<&Map<String, Value>> {
        match category {
            Category::MarketIntegrity => self.market_integrity.as_ref(),
            Category::DevVelocity => self.dev_velocity.as_ref(),
            Category::OnChainSecurity => self.on_chain_security.as_ref(),
            Category::SocialSentiment => self.social_sentiment.as_ref(),
        }
    }
}

/// A single assessor's answer, validated against the declared shape.
///
/// Only constructible through deserialization, which runs the checks in
/// `TryFrom<RawSubScore>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSubScore")]
pub struct SubScoreRecord {
    subscore: f64,
    confidence: Option<Value>,
    flags: Vec<String>,
    explanation: String,
    details: Map<String, Value>,
}

/// Wire shape before validation. `null` is accepted for every optional field.
#[derive(Deserialize)]
struct RawSubScore {
    subscore: f64,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    flags: Option<Vec<String>>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    details: Option<Map<String, Value>>,
}

impl TryFrom<RawSubScore> for SubScoreRecord {
    type Error = String;

    fn try_from(raw: RawSubScore) -> Result<Self, Self::Error> {
        if !raw.subscore.is_finite() || !(0.0..=100.0).contains(&raw.subscore) {
            return Err(format!("subscore {} is outside [0, 100]", raw.subscore));
        }

        Ok(Self {
            subscore: raw.subscore,
            confidence: raw.confidence,
            flags: raw.flags.unwrap_or_default(),
            explanation: raw.explanation.unwrap_or_default(),
            details: raw.details.unwrap_or_default(),
        })
    }
}

impl SubScoreRecord {
    /// Validate a decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        if !value.is_object() {
            return Err(ParseError::NotAnObject {
                found: json_type_name(&value),
            });
        }
        serde_json::from_value(value).map_err(|e| ParseError::Shape(e.to_string()))
    }

    pub fn subscore(&self) -> f64 {
        self.subscore
    }

    /// The confidence exactly as the assessor sent it.
    pub fn raw_confidence(&self) -> Option<&Value> {
        self.confidence.as_ref()
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Immutable weight per category.
///
/// Categories without an entry weigh zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWeights {
    weights: BTreeMap<Category, f64>,
}

impl CategoryWeights {
    /// Build a weight table, rejecting weights outside [0, 1] or a total above 1.
    pub fn new<I>(weights: I) -> Result<Self, WeightError>
    where
        I: IntoIterator<Item = (Category, f64)>,
    {
        let weights: BTreeMap<Category, f64> = weights.into_iter().collect();

        for (&category, &value) in &weights {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(WeightError::OutOfRange { category, value });
            }
        }

        let total: f64 = weights.values().sum();
        // Tolerate float noise from decimal weights such as 0.35 + 0.2.
        if total > 1.0 + 1e-9 {
            return Err(WeightError::TotalExceedsOne(total));
        }

        Ok(Self { weights })
    }

    pub fn get(&self, category: Category) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }

    /// Sum of weights over `categories`.
    pub fn coverage<'a, I>(&self, categories: I) -> f64
    where
        I: IntoIterator<Item = &'a Category>,
    {
        categories.into_iter().map(|c| self.get(*c)).sum()
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (Category::MarketIntegrity, 0.25),
                (Category::DevVelocity, 0.20),
                (Category::OnChainSecurity, 0.35),
                (Category::SocialSentiment, 0.20),
            ]),
        }
    }
}

/// The final output of one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateReport {
    /// Entity name from the input context.
    pub coin: String,
    pub master_score: f64,
    pub confidence: f64,
    pub coverage: f64,
    pub included_categories: Vec<Category>,
    pub excluded_categories: Vec<Category>,
    pub subscores: BTreeMap<Category, f64>,
    pub flags: Vec<String>,
    pub rationale: BTreeMap<Category, String>,
    pub details: BTreeMap<Category, Map<String, Value>>,
}
