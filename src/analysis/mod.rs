//! Analysis modules.
//!
//! Confidence normalization and the weighted aggregation engine.

pub mod aggregator;
pub mod confidence;

pub use aggregator::{AggregationEngine, FailurePolicy, Tally};
