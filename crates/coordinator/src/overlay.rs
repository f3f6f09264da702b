//! Overlay state machine: Closed, Opened, Expanded.
//!
//! Pure state. The coordinator feeds it refresh results and user input and
//! turns the returned transitions into events and timers.

use crate::plugin::{PluginId, RenderContext};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    #[default]
    Closed,
    Opened,
    Expanded,
}

impl OverlayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayState::Closed => "closed",
            OverlayState::Opened => "opened",
            OverlayState::Expanded => "expanded",
        }
    }
}

impl fmt::Display for OverlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OverlayState,
    pub to: OverlayState,
}

/// Result of a user tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Ignored,
    Changed(Transition),
    /// Expanded tap: the close animation started. The coordinator arms a timer
    /// carrying this generation and calls `finish_closing` when it fires.
    ClosingStarted(u64),
}

#[derive(Debug, Default)]
pub struct OverlayStateMachine {
    state: OverlayState,
    closing: bool,
    close_generation: u64,
    expanded_for: Option<PluginId>,
    render_context: Option<RenderContext>,
}

impl OverlayStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Plugin that was long-pressed into Expanded.
    pub fn expanded_for(&self) -> Option<&PluginId> {
        self.expanded_for.as_ref()
    }

    pub fn render_context(&self) -> Option<&RenderContext> {
        self.render_context.as_ref()
    }

    fn set(&mut self, to: OverlayState) -> Option<Transition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;
        if to != OverlayState::Expanded {
            self.closing = false;
            self.expanded_for = None;
            self.render_context = None;
        }
        Some(Transition { from, to })
    }

    /// Apply the outcome of an active-set refresh.
    ///
    /// `gained` is true when the set has a member it did not have before.
    pub fn on_refresh(&mut self, active: &[PluginId], gained: bool) -> Option<Transition> {
        if active.is_empty() {
            return self.set(OverlayState::Closed);
        }
        match self.state {
            OverlayState::Closed if gained => self.set(OverlayState::Opened),
            OverlayState::Expanded => {
                let still_there = self
                    .expanded_for
                    .as_ref()
                    .is_some_and(|id| active.contains(id));
                if still_there {
                    None
                } else {
                    self.set(OverlayState::Opened)
                }
            }
            _ => None,
        }
    }

    pub fn tap(&mut self, has_active: bool) -> TapOutcome {
        let changed = match self.state {
            OverlayState::Closed if has_active => self.set(OverlayState::Opened),
            OverlayState::Closed => None,
            OverlayState::Opened => self.set(OverlayState::Closed),
            OverlayState::Expanded => {
                return match self.begin_closing() {
                    Some(generation) => TapOutcome::ClosingStarted(generation),
                    None => TapOutcome::Ignored,
                };
            }
        };
        changed.map_or(TapOutcome::Ignored, TapOutcome::Changed)
    }

    /// Start the Expanded → Opened fade. Ignored while a fade is running.
    pub fn begin_closing(&mut self) -> Option<u64> {
        if self.state != OverlayState::Expanded || self.closing {
            return None;
        }
        self.closing = true;
        self.close_generation += 1;
        Some(self.close_generation)
    }

    /// Finish the fade started with `generation`. Stale generations, or a
    /// machine that already left Expanded, do nothing.
    pub fn finish_closing(&mut self, generation: u64) -> Option<Transition> {
        if !self.closing || generation != self.close_generation || self.state != OverlayState::Expanded {
            return None;
        }
        self.set(OverlayState::Opened)
    }

    /// Long-press or host expand. Only valid from Opened.
    pub fn expand(&mut self, plugin: PluginId, context: RenderContext) -> Option<Transition> {
        if self.state != OverlayState::Opened {
            return None;
        }
        let transition = self.set(OverlayState::Expanded);
        self.expanded_for = Some(plugin);
        self.render_context = Some(context);
        transition
    }

    pub fn show(&mut self, has_active: bool) -> Option<Transition> {
        if self.state == OverlayState::Closed && has_active {
            self.set(OverlayState::Opened)
        } else {
            None
        }
    }

    pub fn hide(&mut self) -> Option<Transition> {
        self.set(OverlayState::Closed)
    }
}
