//! Error taxonomy for the aggregation pipeline.
//!
//! Each layer owns its error type: the parser reports [`ParseError`], the
//! remote client reports [`TransportError`], the invoker wraps both into an
//! [`AssessorError`] tagged with the category, and the engine reports
//! [`AggregationError`]. The binary converts everything into `anyhow` at the
//! top level.

use crate::models::Category;
use std::time::Duration;
use thiserror::Error;

/// Failure to turn a raw assessor reply into a [`SubScoreRecord`](crate::models::SubScoreRecord).
#[derive(Error, Debug)]
pub enum ParseError {
    /// No `{ ... }` pair could be located in the text.
    #[error("no JSON object found in response")]
    NoJsonObject,

    /// The extracted slice is not valid JSON.
    #[error("invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// Valid JSON, but not a mapping.
    #[error("expected a JSON object but got {found}")]
    NotAnObject { found: &'static str },

    /// A mapping whose fields do not match the sub-score record shape.
    #[error("response does not match the sub-score shape: {0}")]
    Shape(String),
}

/// Failure talking to the remote assessor service.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("cannot connect to assessor service at {0}")]
    Connect(String),

    #[error("assessor service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed service response: missing `{0}`")]
    MissingField(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of a single category's assessment.
#[derive(Error, Debug)]
pub enum AssessorError {
    #[error("[{category}] no assistant id configured")]
    Unconfigured { category: Category },

    #[error("[{category}] assessor call failed: {source}")]
    Transport {
        category: Category,
        #[source]
        source: TransportError,
    },

    #[error("[{category}] assessor did not return a valid sub-score record.\nRAW:\n{raw}\nERROR: {source}")]
    InvalidResponse {
        category: Category,
        raw: String,
        #[source]
        source: ParseError,
    },
}

impl AssessorError {
    /// The category this failure belongs to.
    pub fn category(&self) -> Category {
        match self {
            AssessorError::Unconfigured { category }
            | AssessorError::Transport { category, .. }
            | AssessorError::InvalidResponse { category, .. } => *category,
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AssessorError::Transport { .. })
    }
}

/// Failure of a whole aggregation run.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("no categories requested")]
    NoCategories,

    #[error(transparent)]
    Assessor(#[from] AssessorError),

    #[error("every category failed ({} total); first: {}", .0.len(), .0.first().map(|e| e.to_string()).unwrap_or_default())]
    AllFailed(Vec<AssessorError>),

    #[error("coverage is zero: included categories carry no weight")]
    ZeroCoverage,

    #[error("aggregation timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Failure obtaining the input context for a run.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("failed to start context command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("context command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("context command produced no output")]
    Empty,

    #[error("context is not a valid JSON object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read context: {0}")]
    Io(#[from] std::io::Error),

    #[error("context command timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Invalid category weight table.
#[derive(Error, Debug, PartialEq)]
pub enum WeightError {
    #[error("weight for {category} must be within [0, 1], got {value}")]
    OutOfRange { category: Category, value: f64 },

    #[error("weights sum to {0}, which exceeds 1")]
    TotalExceedsOne(f64),
}
