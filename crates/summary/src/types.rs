//! Request and response shapes exchanged with the summarization backend.

use serde::{Deserialize, Serialize};

/// What a notification summary is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub title: String,
    pub body: String,
    pub app_name: String,
}

impl SummaryRequest {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            app_name: app_name.into(),
        }
    }
}

/// Priority level shared by summaries and scheduled items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Lenient parse used for backend payloads that send free-form strings.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "urgent" | "important" | "critical" => Priority::High,
            "low" | "minor" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

/// Kind of item a summary proposes to put on a calendar or task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledItemType {
    Meeting,
    Deadline,
    Task,
    Payment,
    Event,
}

impl ScheduledItemType {
    /// Unknown kinds become `Event`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "meeting" => ScheduledItemType::Meeting,
            "deadline" => ScheduledItemType::Deadline,
            "task" | "todo" => ScheduledItemType::Task,
            "payment" | "bill" => ScheduledItemType::Payment,
            _ => ScheduledItemType::Event,
        }
    }
}

fn lenient_item_type<'de, D>(deserializer: D) -> Result<ScheduledItemType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(ScheduledItemType::parse(&raw))
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Priority::parse(&raw))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    #[serde(rename = "type", deserialize_with = "lenient_item_type")]
    pub item_type: ScheduledItemType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form date/time as extracted (e.g., "tomorrow 3pm").
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
}

/// Where a summary came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    #[default]
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub summary: String,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub scheduled_items: Vec<ScheduledItem>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub source: SummarySource,
}

impl Summary {
    pub fn is_ai(&self) -> bool {
        self.source == SummarySource::Ai
    }
}
