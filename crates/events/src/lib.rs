//! Shared event contracts for overlay observers.
//!
//! The coordinator emits these DTOs whenever the surface changes. Keeping the
//! payload shapes in one crate means renderers and tests deserialize the same
//! field names the coordinator serializes.
//!
//! Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{
    emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus,
    TracingEventBus,
};

use serde::{Deserialize, Serialize};

/// Current wall clock in milliseconds, used to stamp events.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Emitted when the overlay moves between Closed, Opened and Expanded.
///
/// Producers: coordinator
/// Consumers: renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangedEvent {
    pub state: String,
    pub previous: String,
    /// Snapshot revision that carries the new state.
    pub revision: u64,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Emitted when a plugin joins the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginAddedEvent {
    pub id: String,
    pub kind: String,
    pub name: String,
}

/// Emitted when a plugin is removed and destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRemovedEvent {
    pub id: String,
}

/// Emitted when any of a plugin's observable fields change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginUpdatedEvent {
    pub id: String,
    pub is_active: bool,
    pub is_pulsing: bool,
    pub pulse_color: u32,
    pub auto_close_after_secs: u32,
    pub has_ai_content: bool,
}

/// Emitted when the overlay collapses fully (all plugins deactivated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedEvent {
    /// Why the collapse happened (e.g., "auto_close", "host").
    pub reason: String,
    /// Plugins that were active when the collapse happened.
    #[serde(default)]
    pub deactivated: Vec<String>,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Overlay state transition.
    pub const STATE_CHANGED: &str = "island:state_changed";
    /// Plugin registered.
    pub const PLUGIN_ADDED: &str = "island:plugin_added";
    /// Plugin removed.
    pub const PLUGIN_REMOVED: &str = "island:plugin_removed";
    /// Plugin fields changed.
    pub const PLUGIN_UPDATED: &str = "island:plugin_updated";
    /// Full collapse.
    pub const COLLAPSED: &str = "island:collapsed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_changed_deserialize_without_timestamp() {
        let json = r#"{"state": "opened", "previous": "closed", "revision": 4}"#;
        let event: StateChangedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.state, "opened");
        assert_eq!(event.previous, "closed");
        assert_eq!(event.revision, 4);
        assert_eq!(event.timestamp_ms, 0);
    }

    #[test]
    fn test_collapsed_deserialize_minimal() {
        let json = r#"{"reason": "auto_close"}"#;
        let event: CollapsedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.reason, "auto_close");
        assert!(event.deactivated.is_empty());
    }
}
