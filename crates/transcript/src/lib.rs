use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use uuid::Uuid;

/// Number of final messages a call transcript keeps.
pub const TRANSCRIPT_CAPACITY: usize = 50;

#[derive(Debug, thiserror::Error)]
#[error("unknown speaker type: {0}")]
pub struct ParseSpeakerTypeError(String);

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeakerType {
    /// The remote party.
    Incoming,
    /// The device owner.
    Outgoing,
    /// Status lines ("call connected", ...).
    System,
}

impl SpeakerType {
    /// Display label shown next to a line.
    pub fn label(&self) -> &'static str {
        match self {
            SpeakerType::Incoming => "Caller",
            SpeakerType::Outgoing => "You",
            SpeakerType::System => "System",
        }
    }
}

impl FromStr for SpeakerType {
    type Err = ParseSpeakerTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOMING" => Ok(SpeakerType::Incoming),
            "OUTGOING" => Ok(SpeakerType::Outgoing),
            "SYSTEM" => Ok(SpeakerType::System),
            _ => Err(ParseSpeakerTypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: Uuid,
    pub text: String,
    pub speaker: String,
    pub speaker_type: SpeakerType,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptMessage {
    pub fn new(text: impl Into<String>, speaker_type: SpeakerType) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            speaker: speaker_type.label().to_string(),
            speaker_type,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded, oldest-first history of final transcript messages.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    messages: VecDeque<TranscriptMessage>,
    capacity: usize,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::with_capacity(TRANSCRIPT_CAPACITY)
    }

    /// A capacity of zero is bumped to one so the last line is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, returning the evicted oldest message if the log was full.
    pub fn push(&mut self, message: TranscriptMessage) -> Option<TranscriptMessage> {
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        evicted
    }

    /// True when `text` from `speaker_type` repeats the newest final message.
    pub fn repeats_last(&self, text: &str, speaker_type: SpeakerType) -> bool {
        self.messages
            .back()
            .is_some_and(|m| m.speaker_type == speaker_type && m.text == text)
    }

    pub fn last(&self) -> Option<&TranscriptMessage> {
        self.messages.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// "Speaker: text" lines joined by newlines.
    pub fn full_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.speaker, m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TranscriptLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_beyond_capacity() {
        let mut log = TranscriptLog::with_capacity(3);
        for i in 0..3 {
            assert!(log.push(TranscriptMessage::new(format!("line {i}"), SpeakerType::Incoming)).is_none());
        }

        let evicted = log.push(TranscriptMessage::new("line 3", SpeakerType::Outgoing));
        assert_eq!(evicted.map(|m| m.text), Some("line 0".to_string()));
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().next().map(|m| m.text.as_str()), Some("line 1"));
        assert_eq!(log.last().map(|m| m.text.as_str()), Some("line 3"));
    }

    #[test]
    fn test_default_capacity_bounds_history() {
        let mut log = TranscriptLog::new();
        for i in 0..(TRANSCRIPT_CAPACITY * 3) {
            log.push(TranscriptMessage::new(i.to_string(), SpeakerType::System));
        }
        assert_eq!(log.len(), TRANSCRIPT_CAPACITY);
        assert_eq!(log.last().map(|m| m.text.clone()), Some("149".to_string()));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut log = TranscriptLog::with_capacity(0);
        log.push(TranscriptMessage::new("a", SpeakerType::System));
        log.push(TranscriptMessage::new("b", SpeakerType::System));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_repeats_last_checks_text_and_speaker() {
        let mut log = TranscriptLog::new();
        assert!(!log.repeats_last("Hello", SpeakerType::Outgoing));

        log.push(TranscriptMessage::new("Hello", SpeakerType::Outgoing));
        assert!(log.repeats_last("Hello", SpeakerType::Outgoing));
        assert!(!log.repeats_last("Hello", SpeakerType::Incoming));
        assert!(!log.repeats_last("Hello there", SpeakerType::Outgoing));
    }

    #[test]
    fn test_speaker_type_parse_and_labels() {
        assert_eq!("OUTGOING".parse::<SpeakerType>().unwrap(), SpeakerType::Outgoing);
        assert_eq!(" incoming ".parse::<SpeakerType>().unwrap(), SpeakerType::Incoming);
        assert!("caller".parse::<SpeakerType>().is_err());

        assert_eq!(SpeakerType::Incoming.label(), "Caller");
        assert_eq!(
            serde_json::to_string(&SpeakerType::System).unwrap(),
            "\"SYSTEM\""
        );
    }

    #[test]
    fn test_full_text_uses_speaker_labels() {
        let mut log = TranscriptLog::new();
        log.push(TranscriptMessage::new("Hi", SpeakerType::Incoming));
        log.push(TranscriptMessage::new("Hello", SpeakerType::Outgoing));
        assert_eq!(log.full_text(), "Caller: Hi\nYou: Hello");
    }
}
