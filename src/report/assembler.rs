//! Final report assembly.

use crate::analysis::Tally;
use crate::models::{AggregateReport, Category};

/// Round for presentation. Internal arithmetic always uses full precision.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shape a [`Tally`] into the public report.
///
/// Every category that was not included is listed as excluded, whether it
/// was never requested or its assessor failed.
pub fn assemble(coin: &str, tally: &Tally) -> AggregateReport {
    let excluded_categories = Category::ALL
        .into_iter()
        .filter(|c| !tally.included.contains(c))
        .collect();

    let records = move || {
        tally
            .included
            .iter()
            .filter_map(move |c| tally.records.get(c).map(|r| (*c, r)))
    };

    AggregateReport {
        coin: coin.to_string(),
        master_score: round2(tally.master_score),
        confidence: round2(tally.confidence),
        coverage: round2(tally.coverage),
        included_categories: tally.included.clone(),
        excluded_categories,
        subscores: records().map(|(c, r)| (c, r.subscore())).collect(),
        flags: tally.flags.clone(),
        rationale: records()
            .map(|(c, r)| (c, r.explanation().to_string()))
            .collect(),
        details: records().map(|(c, r)| (c, r.details().clone())).collect(),
    }
}
