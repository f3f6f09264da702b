//! Incoming and ongoing phone calls.

use crate::error::SourceError;
use crate::plugin::{
    CallState, CallStateEvent, Plugin, PluginContext, PluginEvent, PluginId, PluginKind, PluginState,
    PulseColor,
};
use crate::sources::{forward, CallStateSource};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const CALL_PLUGIN_ID: &str = "call";

/// Claims the left slot while the phone rings or a call is in progress.
pub struct CallPlugin {
    id: PluginId,
    state: PluginState,
    source: Option<Arc<dyn CallStateSource>>,
    forwarder: Option<JoinHandle<()>>,
    call_state: CallState,
    phone_number: Option<String>,
    /// Set when the call-state permission was denied. The plugin stays inert.
    demo_mode: bool,
}

impl CallPlugin {
    pub fn new(source: Arc<dyn CallStateSource>) -> Self {
        Self::with_source(Some(source))
    }

    /// A call plugin fed only through `deliver` (no platform source).
    pub fn detached() -> Self {
        Self::with_source(None)
    }

    fn with_source(source: Option<Arc<dyn CallStateSource>>) -> Self {
        Self {
            id: PluginId::new(CALL_PLUGIN_ID),
            state: PluginState::new(PulseColor::GREEN),
            source,
            forwarder: None,
            call_state: CallState::Idle,
            phone_number: None,
            demo_mode: false,
        }
    }

    pub fn call_state(&self) -> CallState {
        self.call_state
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn is_demo_mode(&self) -> bool {
        self.demo_mode
    }

    fn apply_call_state(&mut self, event: CallStateEvent) {
        tracing::debug!(state = ?event.state, "Call state changed");
        self.call_state = event.state;
        match event.state {
            CallState::Ringing => {
                if event.phone_number.is_some() {
                    self.phone_number = event.phone_number;
                }
                self.state.activate(true);
            }
            CallState::Offhook => {
                if event.phone_number.is_some() {
                    self.phone_number = event.phone_number;
                }
                self.state.activate(false);
            }
            CallState::Idle => {
                self.phone_number = None;
                self.state.deactivate();
            }
        }
    }
}

impl Plugin for CallPlugin {
    fn id(&self) -> &PluginId {
        &self.id
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Call
    }

    fn name(&self) -> &str {
        "Call"
    }

    fn description(&self) -> &str {
        "Incoming and ongoing calls"
    }

    fn state(&self) -> &PluginState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PluginState {
        &mut self.state
    }

    fn can_expand(&self) -> bool {
        self.call_state != CallState::Idle
    }

    fn on_create(&mut self, ctx: &mut PluginContext) {
        let Some(source) = self.source.take() else {
            return;
        };
        match source.subscribe() {
            Ok(rx) => {
                let handle = forward(rx, ctx.host().clone(), ctx.address().clone(), PluginEvent::CallState);
                self.forwarder = Some(handle);
            }
            Err(SourceError::PermissionDenied(permission)) => {
                tracing::warn!(%permission, "Call state permission denied, call plugin in demo mode");
                self.demo_mode = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Call state source unavailable");
            }
        }
    }

    fn on_event(&mut self, event: PluginEvent, _ctx: &mut PluginContext) {
        if self.demo_mode {
            return;
        }
        if let PluginEvent::CallState(call) = event {
            self.apply_call_state(call);
        }
    }

    fn on_destroy(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "callState": self.call_state,
            "phoneNumber": self.phone_number,
            "demo": self.demo_mode,
        })
    }
}
