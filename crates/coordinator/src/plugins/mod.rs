//! Built-in plugins.

mod call;
mod demo;
mod notification;
mod transcript;

pub use call::{CallPlugin, CALL_PLUGIN_ID};
pub use demo::{DemoPlugin, DEMO_DEACTIVATE_TIMER};
pub use notification::{
    NotificationInfo, NotificationOptions, NotificationPlugin, PendingAnalysis, NOTIFICATION_CHECK_TIMER,
};
pub use transcript::{CallTranscriptPlugin, TRANSCRIPT_HIDE_TIMER, TRANSCRIPT_PLUGIN_ID};
