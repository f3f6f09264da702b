//! Live transcription of the current call.

use crate::error::SourceError;
use crate::plugin::{
    HostCommand, Plugin, PluginContext, PluginEvent, PluginId, PluginKind, PluginState, PulseColor,
    TimerTag, TranscriptFeed,
};
use crate::sources::{forward, TranscriptSource};
use island_transcript::{SpeakerType, TranscriptLog, TranscriptMessage, TRANSCRIPT_CAPACITY};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const TRANSCRIPT_PLUGIN_ID: &str = "call_transcript";

/// Timer armed by `stop_transcript`.
pub const TRANSCRIPT_HIDE_TIMER: &str = "transcript_hide";

/// Holds the rolling transcript and binds the overlay while a call is
/// transcribed.
pub struct CallTranscriptPlugin {
    id: PluginId,
    state: PluginState,
    log: TranscriptLog,
    partial_text: String,
    partial_speaker: Option<SpeakerType>,
    is_transcribing: bool,
    /// Bumped on every start/stop so an older hide check is ignored.
    session: u64,
    hide_delay: Duration,
    source: Option<Arc<dyn TranscriptSource>>,
    forwarder: Option<JoinHandle<()>>,
    demo_mode: bool,
}

impl CallTranscriptPlugin {
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            id: PluginId::new(TRANSCRIPT_PLUGIN_ID),
            state: PluginState::new(PulseColor::BLUE),
            log: TranscriptLog::with_capacity(TRANSCRIPT_CAPACITY),
            partial_text: String::new(),
            partial_speaker: None,
            is_transcribing: false,
            session: 0,
            hide_delay,
            source: None,
            forwarder: None,
            demo_mode: false,
        }
    }

    /// Shrink the retained history. Never grows past [`TRANSCRIPT_CAPACITY`].
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.log = TranscriptLog::with_capacity(capacity.min(TRANSCRIPT_CAPACITY));
        self
    }

    /// Subscribe to `source` when created.
    pub fn with_source(mut self, source: Arc<dyn TranscriptSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn messages(&self) -> &TranscriptLog {
        &self.log
    }

    pub fn partial_text(&self) -> &str {
        &self.partial_text
    }

    pub fn partial_speaker(&self) -> Option<&'static str> {
        self.partial_speaker.map(|s| s.label())
    }

    pub fn is_transcribing(&self) -> bool {
        self.is_transcribing
    }

    fn clear_partial(&mut self) {
        self.partial_text.clear();
        self.partial_speaker = None;
    }

    /// Record a chunk. Returns false when a final repeats the last final.
    pub fn add_message(&mut self, text: &str, speaker: SpeakerType, is_partial: bool) -> bool {
        if is_partial {
            self.partial_text = text.to_string();
            self.partial_speaker = Some(speaker);
            return true;
        }

        self.clear_partial();
        if self.log.repeats_last(text, speaker) {
            tracing::trace!(speaker = speaker.label(), "Duplicate final transcript suppressed");
            return false;
        }
        self.log.push(TranscriptMessage::new(text, speaker));
        true
    }

    pub fn start_transcript(&mut self) {
        self.session += 1;
        self.is_transcribing = true;
        self.clear_partial();
        self.state.activate(true);
        tracing::debug!(session = self.session, "Transcript started");
    }

    /// Stop transcribing and arm the hide check.
    pub fn stop_transcript(&mut self, ctx: &mut PluginContext) {
        self.session += 1;
        self.is_transcribing = false;
        self.clear_partial();
        self.state.set_pulse(false, None);
        ctx.schedule(self.hide_delay, TimerTag::new(TRANSCRIPT_HIDE_TIMER, self.session));
        tracing::debug!(session = self.session, "Transcript stopped");
    }

    fn on_hide_check(&mut self, tag: TimerTag, ctx: &mut PluginContext) {
        if tag.generation != self.session || self.is_transcribing {
            tracing::trace!(generation = tag.generation, "Stale transcript hide check");
            return;
        }
        self.state.deactivate();
        ctx.request(HostCommand::HideOverlay);
    }
}

impl Plugin for CallTranscriptPlugin {
    fn id(&self) -> &PluginId {
        &self.id
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Transcript
    }

    fn name(&self) -> &str {
        "Call transcript"
    }

    fn description(&self) -> &str {
        "Live transcription of the current call"
    }

    fn state(&self) -> &PluginState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PluginState {
        &mut self.state
    }

    fn can_expand(&self) -> bool {
        !self.log.is_empty() || !self.partial_text.is_empty() || self.is_transcribing
    }

    fn on_create(&mut self, ctx: &mut PluginContext) {
        let Some(source) = self.source.take() else {
            return;
        };
        match source.subscribe() {
            Ok(rx) => {
                let handle = forward(rx, ctx.host().clone(), ctx.address().clone(), PluginEvent::Transcript);
                self.forwarder = Some(handle);
            }
            Err(SourceError::PermissionDenied(permission)) => {
                tracing::warn!(%permission, "Transcription permission denied, transcript plugin in demo mode");
                self.demo_mode = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transcript source unavailable");
            }
        }
    }

    fn on_event(&mut self, event: PluginEvent, ctx: &mut PluginContext) {
        match event {
            PluginEvent::Transcript(_) if self.demo_mode => {}
            PluginEvent::Transcript(TranscriptFeed::Started) => self.start_transcript(),
            PluginEvent::Transcript(TranscriptFeed::Stopped) => self.stop_transcript(ctx),
            PluginEvent::Transcript(TranscriptFeed::Chunk {
                text,
                is_partial,
                speaker,
            }) => {
                self.add_message(&text, speaker, is_partial);
            }
            PluginEvent::Timer(tag) if tag.name == TRANSCRIPT_HIDE_TIMER => self.on_hide_check(tag, ctx),
            _ => {}
        }
    }

    fn on_destroy(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "messages": self.log.iter().collect::<Vec<_>>(),
            "partialText": self.partial_text,
            "partialSpeaker": self.partial_speaker(),
            "isTranscribing": self.is_transcribing,
            "demo": self.demo_mode,
        })
    }
}
