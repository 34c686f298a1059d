//! Weighted aggregation of category sub-scores.
//!
//! The engine fans out one assessor call per requested category, waits for
//! all of them, and reduces the successful records into a coverage-weighted
//! master score. The reduction is keyed by category, never by arrival order,
//! so the result does not depend on which assessor answers first.

use crate::analysis::confidence::{normalize, DEFAULT_CONFIDENCE};
use crate::assessor::AssessorInvoker;
use crate::error::{AggregationError, AssessorError};
use crate::models::{AggregateReport, Category, CategoryWeights, InputContext, SubScoreRecord};
use crate::report::assemble;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to do when some, but not all, categories fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run on the first failed category.
    #[default]
    FailFast,
    /// Exclude failed categories and renormalize over the rest.
    DropFailed,
}

/// Weighted combination of a set of successful records.
#[derive(Debug, Clone)]
pub struct Tally {
    /// Included categories, in requested order.
    pub included: Vec<Category>,
    pub records: BTreeMap<Category, SubScoreRecord>,
    pub coverage: f64,
    pub master_score: f64,
    pub confidence: f64,
    pub flags: Vec<String>,
}

impl Tally {
    /// Combine `records` under `weights` at full precision.
    ///
    /// `order` fixes the order of `included`; categories in `order` without
    /// a record are skipped.
    pub fn compute(
        order: &[Category],
        records: BTreeMap<Category, SubScoreRecord>,
        weights: &CategoryWeights,
    ) -> Result<Self, AggregationError> {
        let included: Vec<Category> = order
            .iter()
            .copied()
            .filter(|c| records.contains_key(c))
            .collect();

        let coverage = weights.coverage(&included);
        if coverage <= 0.0 {
            return Err(AggregationError::ZeroCoverage);
        }

        let mut weighted_score = 0.0;
        let mut weighted_confidence = 0.0;
        for category in &included {
            let record = &records[category];
            let weight = weights.get(*category);
            let confidence = normalize(record.raw_confidence(), DEFAULT_CONFIDENCE);
            debug!(
                "[{}] subscore={} confidence={:.2} weight={}",
                category,
                record.subscore(),
                confidence,
                weight
            );
            weighted_score += weight * record.subscore();
            weighted_confidence += weight * confidence;
        }

        let flags = merge_flags(records.values());

        Ok(Self {
            included,
            coverage,
            master_score: weighted_score / coverage,
            confidence: weighted_confidence / coverage,
            flags,
            records,
        })
    }
}

/// Union of all flags, deduplicated and sorted.
pub fn merge_flags<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a SubScoreRecord>,
{
    records
        .into_iter()
        .flat_map(|r| r.flags().iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Deduplicate while keeping first-seen order.
fn dedup_categories(categories: &[Category]) -> Vec<Category> {
    let mut seen = BTreeSet::new();
    categories
        .iter()
        .copied()
        .filter(|c| seen.insert(*c))
        .collect()
}

/// Runs assessors concurrently and reduces their answers into a report.
pub struct AggregationEngine {
    invoker: AssessorInvoker,
    policy: FailurePolicy,
}

impl AggregationEngine {
    pub fn new(invoker: AssessorInvoker, policy: FailurePolicy) -> Self {
        Self { invoker, policy }
    }

    /// Assess every category in `categories` and aggregate the results.
    pub async fn aggregate(
        &self,
        context: &InputContext,
        weights: &CategoryWeights,
        categories: &[Category],
    ) -> Result<AggregateReport, AggregationError> {
        let requested = dedup_categories(categories);
        if requested.is_empty() {
            return Err(AggregationError::NoCategories);
        }

        info!(
            "Dispatching {} assessors for {}",
            requested.len(),
            context.name
        );

        // join_all yields results in request order regardless of completion order.
        let results = join_all(requested.iter().map(|&category| async move {
            (category, self.invoker.invoke(category, context).await)
        }))
        .await;

        let mut records = BTreeMap::new();
        let mut failures: Vec<AssessorError> = Vec::new();
        for (category, result) in results {
            match result {
                Ok(record) => {
                    records.insert(category, record);
                }
                Err(e) => failures.push(e),
            }
        }

        if records.is_empty() {
            return Err(AggregationError::AllFailed(failures));
        }

        if !failures.is_empty() {
            match self.policy {
                FailurePolicy::FailFast => {
                    return Err(AggregationError::Assessor(failures.remove(0)));
                }
                FailurePolicy::DropFailed => {
                    for failure in &failures {
                        warn!("Dropping {}: {}", failure.category(), failure);
                    }
                }
            }
        }

        let tally = Tally::compute(&requested, records, weights)?;
        info!(
            "Aggregated {} categories (coverage {:.2}): master score {:.2}",
            tally.included.len(),
            tally.coverage,
            tally.master_score
        );

        Ok(assemble(&context.name, &tally))
    }

    /// [`aggregate`](Self::aggregate) under a deadline.
    ///
    /// On expiry every in-flight assessor call is dropped and no report is produced.
    pub async fn aggregate_within(
        &self,
        context: &InputContext,
        weights: &CategoryWeights,
        categories: &[Category],
        deadline: Duration,
    ) -> Result<AggregateReport, AggregationError> {
        tokio::time::timeout(deadline, self.aggregate(context, weights, categories))
            .await
            .map_err(|_| AggregationError::TimedOut(deadline))?
    }
}
