//! Single-shot timers for the coordinator loop.
//!
//! Timers are never cancelled. Each key carries a generation, and whoever
//! handles the fire checks that generation is still current.

use crate::plugin::{InstanceId, PluginAddress, PluginId, TimerTag};
use futures::StreamExt;
use std::time::Duration;
use tokio_util::time::DelayQueue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKey {
    AutoClose { plugin: PluginId, generation: u64 },
    CloseAnimation { generation: u64 },
    Plugin { address: PluginAddress, tag: TimerTag },
}

/// Delay queue polled by the coordinator's select loop.
#[derive(Default)]
pub struct TimerQueue {
    queue: DelayQueue<TimerKey>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: Duration, key: TimerKey) {
        tracing::trace!(?key, delay_ms = delay.as_millis() as u64, "Timer armed");
        self.queue.insert(key, delay);
    }

    /// An empty queue resolves to `None` immediately, so callers guard on this.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub async fn next_expired(&mut self) -> Option<TimerKey> {
        self.queue.next().await.map(|expired| expired.into_inner())
    }
}

/// What the auto-close timer is armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmKey {
    pub plugin: PluginId,
    pub instance: InstanceId,
    pub secs: u32,
    pub is_active: bool,
    pub expanded: bool,
}

impl ArmKey {
    fn delay(&self) -> Option<Duration> {
        (self.secs > 0 && self.is_active).then(|| Duration::from_secs(self.secs as u64))
    }
}

/// Debounced auto-close bookkeeping.
///
/// Any change to the bound plugin or its relevant fields bumps the generation,
/// which turns every timer armed before it into a no-op.
#[derive(Debug, Default)]
pub struct AutoCloseScheduler {
    armed_for: Option<ArmKey>,
    generation: u64,
}

impl AutoCloseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Re-evaluate against the current bound plugin. Returns the timer to arm,
    /// if the key changed and the plugin wants one.
    pub fn rearm(&mut self, candidate: Option<ArmKey>) -> Option<(TimerKey, Duration)> {
        if candidate == self.armed_for {
            return None;
        }
        self.generation += 1;
        self.armed_for = candidate;

        let key = self.armed_for.as_ref()?;
        let delay = key.delay()?;
        Some((
            TimerKey::AutoClose {
                plugin: key.plugin.clone(),
                generation: self.generation,
            },
            delay,
        ))
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
