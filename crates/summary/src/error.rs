//! Error types for summary requests.

use thiserror::Error;

/// Errors from a summarization backend.
///
/// None of these reach the user: callers degrade to the local fallback.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// No backend is configured.
    #[error("summarizer unavailable")]
    Unavailable,

    /// The request did not finish in time.
    #[error("summary request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Transport failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Http { status: u16 },

    /// Backend answered with a body we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, SummaryError>;
