//! Remote assessor access.
//!
//! This module turns one category of an input context into one validated
//! sub-score record: prompt construction, the remote backend, response
//! parsing, and the invoker that ties them together.

pub mod client;
pub mod invoker;
pub mod parser;
pub mod prompt;

pub use client::{AssessorBackend, BackboardClient, BackboardSettings};
pub use invoker::{AssessorInvoker, RetryPolicy};
