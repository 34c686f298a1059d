//! Remote assessor backend.
//!
//! The [`AssessorBackend`] trait is the only seam between the pipeline and
//! the hosted assistant service. [`BackboardClient`] is the production
//! implementation over the service's REST API; tests substitute an
//! in-memory backend.

use crate::error::TransportError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One-shot conversation with a remote assistant.
#[async_trait]
pub trait AssessorBackend: Send + Sync {
    /// Open a fresh session with `assistant_id`, send `prompt`, and return
    /// the assistant's raw reply text.
    ///
    /// Implementations must not reuse sessions between calls.
    async fn ask(&self, assistant_id: &str, prompt: &str) -> Result<String, TransportError>;
}

/// Settings for [`BackboardClient`].
#[derive(Debug, Clone)]
pub struct BackboardSettings {
    pub api_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Thread creation response.
#[derive(Debug, Deserialize)]
struct ThreadResponse {
    thread_id: Option<String>,
}

/// Message response; only the reply text matters here.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

/// HTTP client for the hosted assistant service.
pub struct BackboardClient {
    settings: BackboardSettings,
    http_client: reqwest::Client,
}

impl BackboardClient {
    /// Create a client. Fails only if the TLS backend cannot be initialised.
    pub fn new(settings: BackboardSettings) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(concat!("bigscore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_url.trim_end_matches('/'), path)
    }

    async fn create_thread(&self, assistant_id: &str) -> Result<String, TransportError> {
        let url = self.url(&format!("assistants/{}/threads", assistant_id));
        debug!("Creating thread for assistant {}", assistant_id);

        let response = self
            .http_client
            .post(&url)
            .header("X-API-Key", &self.settings.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let thread: ThreadResponse = Self::check_status(response).await?.json().await?;
        thread.thread_id.ok_or(TransportError::MissingField("thread_id"))
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<String, TransportError> {
        let url = self.url(&format!("threads/{}/messages", thread_id));
        debug!("Sending {} byte prompt to thread {}", content.len(), thread_id);

        let response = self
            .http_client
            .post(&url)
            .header("X-API-Key", &self.settings.api_key)
            .form(&[("content", content), ("stream", "false")])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let message: MessageResponse = Self::check_status(response).await?.json().await?;
        message.content.ok_or(TransportError::MissingField("content"))
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(Duration::from_secs(self.settings.timeout_seconds))
        } else if e.is_connect() {
            TransportError::Connect(self.settings.api_url.clone())
        } else {
            TransportError::Http(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status { status, body })
    }
}

#[async_trait]
impl AssessorBackend for BackboardClient {
    async fn ask(&self, assistant_id: &str, prompt: &str) -> Result<String, TransportError> {
        let thread_id = self.create_thread(assistant_id).await?;
        self.add_message(&thread_id, prompt).await
    }
}
