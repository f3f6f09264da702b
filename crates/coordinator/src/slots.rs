//! Which plugin owns which part of the surface.

use crate::plugin::{PluginId, PluginKind};
use serde::{Deserialize, Serialize};

/// The slice of a plugin the selector looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub id: PluginId,
    pub kind: PluginKind,
    pub is_pulsing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    /// Owner of the expanded view and the auto-close timer.
    pub bound: Option<PluginId>,
    pub left: Option<PluginId>,
    pub right: Option<PluginId>,
    /// Plugin whose colour drives the pulse halo.
    pub pulse: Option<PluginId>,
}

/// Assign slots for the active set, in active-set order.
///
/// Transcript wins the bound and right slots, call wins the left slot, and the
/// first member fills whatever is left.
pub fn select_slots(active: &[SlotEntry]) -> SlotAssignment {
    let call = active.iter().find(|e| e.kind == PluginKind::Call);
    let transcript = active.iter().find(|e| e.kind == PluginKind::Transcript);
    let bound = transcript.or_else(|| active.first());

    let left = call.or(bound);
    let right = transcript.or(bound);

    let pulse = [bound, call, transcript, active.iter().find(|e| e.is_pulsing)]
        .into_iter()
        .flatten()
        .find(|e| e.is_pulsing);

    SlotAssignment {
        bound: bound.map(|e| e.id.clone()),
        left: left.map(|e| e.id.clone()),
        right: right.map(|e| e.id.clone()),
        pulse: pulse.map(|e| e.id.clone()),
    }
}
