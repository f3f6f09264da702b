//! Summarization backends and the bounded request wrapper.

use crate::error::{Result, SummaryError};
use crate::fallback::local_summary;
use crate::types::{Summary, SummaryRequest, SummarySource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for one summary request.
pub const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(12);

/// A backend that turns a notification into a structured summary.
///
/// Uses async_trait so `Arc<dyn Summarizer>` can be shared across tasks.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary>;
}

/// Shared summarizer reference.
pub type SummarizerRef = Arc<dyn Summarizer>;

/// Summarizer used when no backend is configured. Always fails, so callers
/// take the local fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSummarizer;

#[async_trait]
impl Summarizer for NullSummarizer {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn summarize(&self, _request: &SummaryRequest) -> Result<Summary> {
        Err(SummaryError::Unavailable)
    }
}

/// Summarizer that POSTs the request as JSON to an HTTP endpoint.
///
/// The endpoint receives `{title, body, appName, model?}` and must answer
/// with `{summary, actionItems, scheduledItems, priority}`.
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl HttpSummarizer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            model: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary> {
        let mut body = serde_json::to_value(request)
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;
        if let Some(model) = &self.model {
            body["model"] = serde_json::Value::String(model.clone());
        }

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SummaryError::Http {
                status: status.as_u16(),
            });
        }

        let mut summary = resp
            .json::<Summary>()
            .await
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;
        if summary.summary.trim().is_empty() {
            return Err(SummaryError::InvalidResponse("empty summary".to_string()));
        }
        summary.source = SummarySource::Ai;
        Ok(summary)
    }
}

/// Ask `summarizer` for a summary, bounded by `timeout`.
///
/// Never fails: errors and timeouts degrade to [`local_summary`].
pub async fn summarize_or_fallback(
    summarizer: &dyn Summarizer,
    request: &SummaryRequest,
    timeout: Duration,
) -> Summary {
    match tokio::time::timeout(timeout, summarizer.summarize(request)).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(SummaryError::Unavailable)) => {
            tracing::debug!(backend = summarizer.name(), "No summarizer, using local fallback");
            local_summary(request)
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = summarizer.name(), error = %e, "Summary failed, using local fallback");
            local_summary(request)
        }
        Err(_) => {
            let e = SummaryError::Timeout {
                seconds: timeout.as_secs(),
            };
            tracing::warn!(backend = summarizer.name(), error = %e, "Summary timed out, using local fallback");
            local_summary(request)
        }
    }
}
