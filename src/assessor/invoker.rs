//! Single-category assessment.
//!
//! [`AssessorInvoker::invoke`] is the unit the aggregation engine fans out:
//! build the scoped prompt, ask the category's assistant in a fresh
//! session, and parse the reply. Parse failures keep the raw reply so a
//! misbehaving assistant can be diagnosed from the error alone.

use crate::assessor::client::AssessorBackend;
use crate::assessor::{parser, prompt};
use crate::error::AssessorError;
use crate::models::{Category, InputContext, SubScoreRecord};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry settings for transport failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    /// Extra attempts after the first. Zero means a single attempt.
    pub retries: usize,
    /// Delay before retry `n` is `n * delay`.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt`, saturating at `Duration::MAX`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
        self.delay.saturating_mul(factor)
    }
}

/// Invokes the remote assessor for one category at a time.
#[derive(Clone)]
pub struct AssessorInvoker {
    backend: Arc<dyn AssessorBackend>,
    assistants: HashMap<Category, String>,
    retry: RetryPolicy,
}

impl AssessorInvoker {
    pub fn new(
        backend: Arc<dyn AssessorBackend>,
        assistants: HashMap<Category, String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            assistants,
            retry,
        }
    }

    /// Assess `category` for the entity described by `context`.
    pub async fn invoke(
        &self,
        category: Category,
        context: &InputContext,
    ) -> Result<SubScoreRecord, AssessorError> {
        let assistant_id = self
            .assistants
            .get(&category)
            .filter(|id| !id.trim().is_empty())
            .ok_or(AssessorError::Unconfigured { category })?;

        let prompt = prompt::build_prompt(category, context);
        let raw = self.ask_with_retry(category, assistant_id, &prompt).await?;
        debug!("[{}] raw reply: {} bytes", category, raw.len());

        parser::parse(&raw).map_err(|source| AssessorError::InvalidResponse {
            category,
            raw,
            source,
        })
    }

    async fn ask_with_retry(
        &self,
        category: Category,
        assistant_id: &str,
        prompt: &str,
    ) -> Result<String, AssessorError> {
        let mut attempt = 0;
        loop {
            let result = self
                .backend
                .ask(assistant_id, prompt)
                .await
                .map_err(|source| AssessorError::Transport { category, source });

            match result {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_transient() && attempt < self.retry.retries => {
                    attempt += 1;
                    warn!("{}, retry {}/{}", e, attempt, self.retry.retries);
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
