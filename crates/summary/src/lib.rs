//! Notification summaries for the island.
//!
//! A notification is summarized by a remote backend when one is configured.
//! Every failure path (no backend, HTTP error, bad payload, timeout) lands on
//! the deterministic local heuristics in [`fallback`], so callers always get a
//! usable [`Summary`].

mod client;
mod error;
pub mod fallback;
mod types;

pub use client::{
    summarize_or_fallback, HttpSummarizer, NullSummarizer, Summarizer, SummarizerRef,
    DEFAULT_SUMMARY_TIMEOUT,
};
pub use error::{Result, SummaryError};
pub use fallback::{extract_when, local_summary, ExtractedWhen};
pub use types::{
    Priority, ScheduledItem, ScheduledItemType, Summary, SummaryRequest, SummarySource,
};
