//! What a plugin callback may see and ask for.

use super::event::TimerTag;
use super::PluginAddress;
use crate::handle::CoordinatorHandle;
use crate::overlay::OverlayState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overlay commands a plugin (or the host app) may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostCommand {
    ShowOverlay,
    HideOverlay,
    Expand,
    Shrink,
    CollapseToClosed,
}

/// Handed to every plugin callback.
///
/// Timers and host commands are collected here and applied by the coordinator
/// after the callback returns, so a callback never re-enters the coordinator.
pub struct PluginContext {
    address: PluginAddress,
    overlay: OverlayState,
    host: CoordinatorHandle,
    timers: Vec<(Duration, TimerTag)>,
    requests: Vec<HostCommand>,
}

impl PluginContext {
    pub(crate) fn new(address: PluginAddress, overlay: OverlayState, host: CoordinatorHandle) -> Self {
        Self {
            address,
            overlay,
            host,
            timers: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// The registration this callback runs for.
    pub fn address(&self) -> &PluginAddress {
        &self.address
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay
    }

    /// Handle for spawned work that needs to post back later.
    pub fn host(&self) -> &CoordinatorHandle {
        &self.host
    }

    /// Deliver `PluginEvent::Timer(tag)` to this registration after `delay`.
    pub fn schedule(&mut self, delay: Duration, tag: TimerTag) {
        self.timers.push((delay, tag));
    }

    pub fn request(&mut self, command: HostCommand) {
        self.requests.push(command);
    }

    pub(crate) fn into_parts(self) -> (Vec<(Duration, TimerTag)>, Vec<HostCommand>) {
        (self.timers, self.requests)
    }
}

#[cfg(test)]
impl PluginContext {
    /// Context wired to a detached mailbox, for plugin unit tests.
    pub(crate) fn for_test(
        id: &str,
        overlay: OverlayState,
    ) -> (Self, tokio::sync::mpsc::UnboundedReceiver<crate::coordinator::Command>) {
        use crate::plugin::{InstanceId, PluginId};
        use crate::snapshot::OverlaySnapshot;
        use tokio::sync::{mpsc, watch};

        let (tx, rx) = mpsc::unbounded_channel();
        let (_snapshots, snapshot_rx) = watch::channel(OverlaySnapshot::default());
        let address = PluginAddress {
            id: PluginId::new(id),
            instance: InstanceId(1),
        };
        (Self::new(address, overlay, CoordinatorHandle::new(tx, snapshot_rx)), rx)
    }

    pub(crate) fn scheduled(&self) -> &[(Duration, TimerTag)] {
        &self.timers
    }

    pub(crate) fn requested(&self) -> &[HostCommand] {
        &self.requests
    }
}
