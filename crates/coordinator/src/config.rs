//! Coordinator configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! no file at all) is valid.

use crate::error::{ConfigError, ConfigResult};
use crate::plugin::PulseColor;
use island_summary::{HttpSummarizer, NullSummarizer, SummarizerRef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "ISLAND_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Fade before Expanded → Opened.
    pub close_animation_ms: u64,
    /// Grace period after a transcript stops before the overlay hides.
    pub transcript_hide_delay_secs: u64,
    /// Delay before a notification deactivates itself (unless expanded).
    pub notification_check_delay_secs: u64,
    pub notification_auto_close_secs: u32,
    pub summary_timeout_secs: u64,
    /// Transcript lines kept; values above 50 are capped.
    pub transcript_capacity: usize,
    pub default_pulse_color: PulseColor,
    pub summarizer: Option<SummarizerConfig>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            close_animation_ms: 120,
            transcript_hide_delay_secs: 3,
            notification_check_delay_secs: 8,
            notification_auto_close_secs: 10,
            summary_timeout_secs: 12,
            transcript_capacity: island_transcript::TRANSCRIPT_CAPACITY,
            default_pulse_color: PulseColor::default(),
            summarizer: None,
        }
    }
}

/// HTTP summarization backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub endpoint: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl CoordinatorConfig {
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `$ISLAND_CONFIG` when set, defaults otherwise.
    pub fn from_env_or_default() -> ConfigResult<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn close_animation(&self) -> Duration {
        Duration::from_millis(self.close_animation_ms)
    }

    pub fn transcript_hide_delay(&self) -> Duration {
        Duration::from_secs(self.transcript_hide_delay_secs)
    }

    pub fn notification_check_delay(&self) -> Duration {
        Duration::from_secs(self.notification_check_delay_secs)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }

    /// HTTP summarizer when configured, otherwise one that always falls back.
    pub fn build_summarizer(&self) -> SummarizerRef {
        let Some(cfg) = &self.summarizer else {
            return Arc::new(NullSummarizer);
        };
        let mut summarizer = HttpSummarizer::new(cfg.endpoint.clone());
        if let Some(var) = &cfg.api_key_env {
            match std::env::var(var) {
                Ok(key) => summarizer = summarizer.with_api_key(key),
                Err(_) => tracing::warn!(env = %var, "Summarizer API key variable not set"),
            }
        }
        if let Some(model) = &cfg.model {
            summarizer = summarizer.with_model(model.clone());
        }
        Arc::new(summarizer)
    }
}
