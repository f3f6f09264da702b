//! Minimal plugin used as a contract reference and in tests.

use crate::plugin::{Plugin, PluginContext, PluginEvent, PluginId, PluginKind, PluginState, PulseColor, TimerTag};
use serde_json::json;
use std::time::Duration;

/// Timer name that makes a [`DemoPlugin`] deactivate itself.
pub const DEMO_DEACTIVATE_TIMER: &str = "demo_deactivate";

/// A plugin that only counts its callbacks.
///
/// It can impersonate any kind, which makes it handy for exercising slot and
/// registry rules without real sources.
pub struct DemoPlugin {
    id: PluginId,
    kind: PluginKind,
    name: String,
    state: PluginState,
    expandable: bool,
    deactivate_after: Option<Duration>,
    created: u32,
    clicks: u32,
    events: u32,
}

impl DemoPlugin {
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            kind: PluginKind::Demo,
            name: "Demo".to_string(),
            state: PluginState::new(PulseColor::default()),
            expandable: true,
            deactivate_after: None,
            created: 0,
            clicks: 0,
            events: 0,
        }
    }

    pub fn with_kind(mut self, kind: PluginKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Start active (and optionally pulsing) instead of inactive.
    pub fn active(mut self, pulsing: bool) -> Self {
        self.state.activate(pulsing);
        self
    }

    pub fn expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    pub fn with_auto_close(mut self, secs: u32) -> Self {
        self.state.auto_close_after_secs = secs;
        self
    }

    /// Deactivate on its own once `delay` has passed since registration.
    pub fn deactivate_after(mut self, delay: Duration) -> Self {
        self.deactivate_after = Some(delay);
        self
    }
}

impl Plugin for DemoPlugin {
    fn id(&self) -> &PluginId {
        &self.id
    }

    fn kind(&self) -> PluginKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Counts callbacks"
    }

    fn state(&self) -> &PluginState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PluginState {
        &mut self.state
    }

    fn can_expand(&self) -> bool {
        self.expandable
    }

    fn on_create(&mut self, ctx: &mut PluginContext) {
        self.created += 1;
        if let Some(delay) = self.deactivate_after {
            ctx.schedule(delay, TimerTag::new(DEMO_DEACTIVATE_TIMER, 0));
        }
    }

    fn on_event(&mut self, event: PluginEvent, _ctx: &mut PluginContext) {
        self.events += 1;
        if let PluginEvent::Timer(tag) = event {
            if tag.name == DEMO_DEACTIVATE_TIMER {
                self.state.deactivate();
            }
        }
    }

    fn on_click(&mut self, _ctx: &mut PluginContext) {
        self.clicks += 1;
        let pulsing = !self.state.is_pulsing;
        self.state.set_pulse(pulsing, None);
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "created": self.created,
            "clicks": self.clicks,
            "events": self.events,
        })
    }
}
