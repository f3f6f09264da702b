//! The plugin contract.
//!
//! A plugin is one source of overlay content (a call, a transcript, a
//! notification). Plugins never touch the overlay directly: they mutate their
//! own [`PluginState`] inside callbacks and ask for host actions through the
//! [`PluginContext`]. Every callback runs on the coordinator task.

mod context;
mod event;
mod state;

pub use context::{HostCommand, PluginContext};
pub use event::{CallState, CallStateEvent, PluginEvent, TimerTag, TranscriptFeed};
pub use state::{PluginState, PulseColor};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable plugin identity. Two plugins with the same id are the same plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Registration number assigned by the registry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

/// Addresses one registration of a plugin.
///
/// Asynchronous results carry the address they were started for, so a result
/// for a removed (or removed and re-added) plugin is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginAddress {
    pub id: PluginId,
    pub instance: InstanceId,
}

impl fmt::Display for PluginAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, self.instance.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Call,
    Transcript,
    Notification,
    Demo,
}

impl PluginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Call => "call",
            PluginKind::Transcript => "transcript",
            PluginKind::Notification => "notification",
            PluginKind::Demo => "demo",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque payload the renderer attaches to a long-press, handed back in the
/// snapshot while the overlay is expanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderContext(pub serde_json::Value);

/// One source of overlay content.
pub trait Plugin: Send {
    fn id(&self) -> &PluginId;

    fn kind(&self) -> PluginKind;

    /// Human-readable name.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn state(&self) -> &PluginState;

    fn state_mut(&mut self) -> &mut PluginState;

    /// Whether a long-press may expand the overlay for this plugin.
    fn can_expand(&self) -> bool;

    /// Wire the plugin to its live sources. Called once per registration.
    fn on_create(&mut self, ctx: &mut PluginContext);

    fn on_event(&mut self, _event: PluginEvent, _ctx: &mut PluginContext) {}

    fn on_click(&mut self, _ctx: &mut PluginContext) {}

    /// Release sources and spawned work. The instance is dropped afterwards.
    fn on_destroy(&mut self) {}

    /// Render payload for snapshots.
    fn content(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", self.id())
            .field("kind", &self.kind())
            .field("state", self.state())
            .finish()
    }
}
