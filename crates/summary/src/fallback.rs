//! Local, deterministic notification summaries.
//!
//! Used whenever the backend fails or times out. Everything here is pure
//! string processing so it can be tested without a network.

use crate::types::{Priority, ScheduledItem, ScheduledItemType, Summary, SummaryRequest, SummarySource};
use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of the one-line summary text.
pub const MAX_SUMMARY_LEN: usize = 120;

const MEETING_KEYWORDS: &[&str] = &[
    "meeting", "meet", "call", "conference", "standup", "stand-up", "sync", "appointment", "zoom",
    "interview",
];
const DEADLINE_KEYWORDS: &[&str] = &[
    "deadline", "due", "submit", "expires", "expiring", "overdue", "eod", "asap",
];
const TASK_KEYWORDS: &[&str] = &[
    "todo", "to-do", "task", "remember", "reminder", "please", "need to", "don't forget",
    "follow up",
];
const PAYMENT_KEYWORDS: &[&str] = &[
    "payment", "pay", "invoice", "bill", "transfer", "refund", "paid", "owe", "charge",
];
const URGENT_KEYWORDS: &[&str] = &["urgent", "asap", "important", "immediately", "critical"];

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid iso date regex"));

static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}/\d{1,2}(?:/\d{2,4})?)\b").expect("valid slash date regex")
});

static MONTH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b((?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .expect("valid month date regex")
});

static MERIDIEM_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?::[0-5]\d)?\s?(?:am|pm))\b").expect("valid meridiem regex")
});

static CLOCK_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:[01]?\d|2[0-3]):[0-5]\d)\b").expect("valid clock regex")
});

static DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(today|tonight|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("valid day regex")
});

/// Date, time and day phrases found in a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedWhen {
    pub date: Option<String>,
    pub time: Option<String>,
    pub day: Option<String>,
}

impl ExtractedWhen {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none() && self.day.is_none()
    }

    /// Day, date and time joined by spaces (e.g., "friday May 3 3pm").
    pub fn to_date_time(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.day, &self.date, &self.time]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Find the first date, time and weekday mention in `text`.
pub fn extract_when(text: &str) -> ExtractedWhen {
    let date = first_capture(&ISO_DATE_RE, text)
        .or_else(|| first_capture(&MONTH_DATE_RE, text))
        .or_else(|| first_capture(&SLASH_DATE_RE, text));
    let time =
        first_capture(&MERIDIEM_TIME_RE, text).or_else(|| first_capture(&CLOCK_TIME_RE, text));
    let day = first_capture(&DAY_RE, text).map(|d| d.to_lowercase());

    ExtractedWhen { date, time, day }
}

fn contains_keyword(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| {
        if kw.contains(' ') || kw.contains('-') || kw.contains('\'') {
            haystack.contains(kw)
        } else {
            haystack
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *kw)
        }
    })
}

/// Categories whose keywords appear in `text`, in a fixed order.
pub fn detect_categories(text: &str) -> Vec<ScheduledItemType> {
    let lower = text.to_lowercase();
    let mut categories = Vec::new();
    if contains_keyword(&lower, MEETING_KEYWORDS) {
        categories.push(ScheduledItemType::Meeting);
    }
    if contains_keyword(&lower, DEADLINE_KEYWORDS) {
        categories.push(ScheduledItemType::Deadline);
    }
    if contains_keyword(&lower, TASK_KEYWORDS) {
        categories.push(ScheduledItemType::Task);
    }
    if contains_keyword(&lower, PAYMENT_KEYWORDS) {
        categories.push(ScheduledItemType::Payment);
    }
    categories
}

fn action_for(category: ScheduledItemType, title: &str) -> String {
    match category {
        ScheduledItemType::Meeting => format!("Attend: {}", title),
        ScheduledItemType::Deadline => format!("Finish before deadline: {}", title),
        ScheduledItemType::Task => format!("Follow up: {}", title),
        ScheduledItemType::Payment => format!("Review payment: {}", title),
        ScheduledItemType::Event => format!("Note: {}", title),
    }
}

fn priority_for(text: &str, categories: &[ScheduledItemType]) -> Priority {
    let lower = text.to_lowercase();
    if contains_keyword(&lower, URGENT_KEYWORDS)
        || categories.contains(&ScheduledItemType::Deadline)
        || categories.contains(&ScheduledItemType::Payment)
    {
        Priority::High
    } else if categories.is_empty() {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Up to and including the first terminator. Punctuation only ends a
/// sentence when followed by whitespace, so "$40.50" and "v1.2" stay whole.
fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let ends = match c {
            '\n' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |&(_, next)| next.is_whitespace()),
            _ => false,
        };
        if ends {
            return text[..idx + c.len_utf8()].trim_end();
        }
    }
    text
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Build a summary from keyword and date heuristics alone.
pub fn local_summary(request: &SummaryRequest) -> Summary {
    let title = request.title.trim();
    let display_title = if title.is_empty() {
        request.app_name.trim()
    } else {
        title
    };
    let combined = format!("{} {}", request.title, request.body);

    let categories = detect_categories(&combined);
    let when = extract_when(&combined);
    let priority = priority_for(&combined, &categories);

    let action_items = categories
        .iter()
        .map(|c| action_for(*c, display_title))
        .collect();

    let scheduled_items = if when.is_empty() {
        Vec::new()
    } else {
        categories
            .iter()
            .map(|c| ScheduledItem {
                item_type: *c,
                title: display_title.to_string(),
                description: truncate(first_sentence(&request.body), MAX_SUMMARY_LEN),
                date_time: when.to_date_time(),
                priority,
            })
            .collect()
    };

    let sentence = first_sentence(&request.body);
    let text = if sentence.is_empty() {
        display_title.to_string()
    } else if display_title.is_empty() {
        sentence.to_string()
    } else {
        format!("{}: {}", display_title, sentence)
    };

    Summary {
        summary: truncate(&text, MAX_SUMMARY_LEN),
        action_items,
        scheduled_items,
        priority,
        source: SummarySource::Fallback,
    }
}
