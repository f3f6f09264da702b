//! Immutable view of the overlay published after every applied command.

use crate::overlay::OverlayState;
use crate::plugin::{PluginId, PluginKind, PluginState, RenderContext};
use crate::slots::SlotAssignment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginView {
    pub id: PluginId,
    pub name: String,
    pub kind: PluginKind,
    pub state: PluginState,
    pub can_expand: bool,
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    /// Increases by one per applied command or timer.
    pub revision: u64,
    pub state: OverlayState,
    /// Expanded → Opened fade in progress.
    pub closing: bool,
    pub active_ids: Vec<PluginId>,
    pub slots: SlotAssignment,
    /// Every registered plugin, active or not, in registration order.
    pub plugins: Vec<PluginView>,
    pub expanded_context: Option<RenderContext>,
}

impl OverlaySnapshot {
    pub fn plugin(&self, id: &str) -> Option<&PluginView> {
        self.plugins.iter().find(|p| p.id.as_str() == id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active_ids.iter().any(|a| a.as_str() == id)
    }

    pub fn bound(&self) -> Option<&PluginView> {
        self.slots.bound.as_ref().and_then(|id| self.plugin(id.as_str()))
    }
}
