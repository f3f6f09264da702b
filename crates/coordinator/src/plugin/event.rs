//! Events delivered to plugins through `Plugin::on_event`.

use island_summary::Summary;
use island_transcript::SpeakerType;
use serde::{Deserialize, Serialize};

/// Telephony state as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    #[default]
    Idle,
    Ringing,
    Offhook,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStateEvent {
    pub state: CallState,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl CallStateEvent {
    pub fn ringing(phone_number: impl Into<String>) -> Self {
        Self {
            state: CallState::Ringing,
            phone_number: Some(phone_number.into()),
        }
    }

    pub fn offhook() -> Self {
        Self {
            state: CallState::Offhook,
            phone_number: None,
        }
    }

    pub fn idle() -> Self {
        Self {
            state: CallState::Idle,
            phone_number: None,
        }
    }
}

/// Items produced by the speech-to-text feed during a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptFeed {
    Started,
    Chunk {
        text: String,
        is_partial: bool,
        speaker: SpeakerType,
    },
    Stopped,
}

impl TranscriptFeed {
    pub fn partial(text: impl Into<String>, speaker: SpeakerType) -> Self {
        TranscriptFeed::Chunk {
            text: text.into(),
            is_partial: true,
            speaker,
        }
    }

    pub fn final_text(text: impl Into<String>, speaker: SpeakerType) -> Self {
        TranscriptFeed::Chunk {
            text: text.into(),
            is_partial: false,
            speaker,
        }
    }
}

/// Name plus generation of a plugin-owned single-shot timer.
///
/// Plugins bump their own generation to invalidate a pending timer; the
/// coordinator never cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTag {
    pub name: &'static str,
    pub generation: u64,
}

impl TimerTag {
    pub const fn new(name: &'static str, generation: u64) -> Self {
        Self { name, generation }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PluginEvent {
    CallState(CallStateEvent),
    Transcript(TranscriptFeed),
    SummaryReady(Summary),
    Timer(TimerTag),
}

impl PluginEvent {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            PluginEvent::CallState(_) => "call_state",
            PluginEvent::Transcript(_) => "transcript",
            PluginEvent::SummaryReady(_) => "summary_ready",
            PluginEvent::Timer(_) => "timer",
        }
    }
}
