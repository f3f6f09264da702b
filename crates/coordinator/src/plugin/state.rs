//! Mutable fields shared by every plugin variant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ARGB colour used by the renderer for the pulse halo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PulseColor(pub u32);

impl PulseColor {
    pub const GREEN: PulseColor = PulseColor(0xFF34_C759);
    pub const BLUE: PulseColor = PulseColor(0xFF0A_84FF);
    pub const ORANGE: PulseColor = PulseColor(0xFFFF_9F0A);

    pub fn argb(self) -> u32 {
        self.0
    }
}

impl Default for PulseColor {
    fn default() -> Self {
        PulseColor::BLUE
    }
}

impl fmt::Display for PulseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Activity, pulse and auto-close bookkeeping.
///
/// The coordinator snapshots this before and after every plugin callback and
/// emits an update event when the two differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginState {
    pub is_active: bool,
    pub is_pulsing: bool,
    pub pulse_color: PulseColor,
    /// Seconds before the overlay collapses while this plugin is bound.
    /// Zero disables auto-close.
    pub auto_close_after_secs: u32,
    pub has_ai_content: bool,
}

impl PluginState {
    pub fn new(pulse_color: PulseColor) -> Self {
        Self {
            pulse_color,
            ..Self::default()
        }
    }

    pub fn with_auto_close(mut self, secs: u32) -> Self {
        self.auto_close_after_secs = secs;
        self
    }

    pub fn activate(&mut self, pulsing: bool) {
        self.is_active = true;
        self.is_pulsing = pulsing;
    }

    /// Inactive plugins never pulse.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.is_pulsing = false;
    }

    pub fn set_pulse(&mut self, pulsing: bool, color: Option<PulseColor>) {
        self.is_pulsing = pulsing && self.is_active;
        if let Some(color) = color {
            self.pulse_color = color;
        }
    }
}
