//! Dynamic island coordinator.
//!
//! Several independent sources (telephony, notifications, live call
//! transcription, user taps and timers) compete for one small overlay. This
//! crate decides which plugin owns which part of it and when it opens,
//! expands and collapses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  plugin/     - Plugin trait, PluginState, events, context    │
//! │  slots.rs    - Slot selection (pure)                         │
//! │  overlay.rs  - Closed / Opened / Expanded state machine      │
//! │  registry.rs - Master list plus ordered active set           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  plugins/    - Call, transcript, notification, demo          │
//! │  sources.rs  - Call-state / transcript sources, adapters     │
//! │  scheduler.rs - DelayQueue timers, auto-close generations    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  coordinator.rs - Single-writer task, snapshot publishing    │
//! │  handle.rs      - Cloneable command front door               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use island_coordinator::{CallPlugin, Coordinator, CoordinatorConfig, ChannelSource};
//! use island_events::TracingEventBus;
//! use std::sync::Arc;
//!
//! let (call_tx, call_source) = ChannelSource::channel();
//! let (mut coordinator, handle) = Coordinator::new(CoordinatorConfig::default(), Arc::new(TracingEventBus));
//! coordinator.register(CallPlugin::new(Arc::new(call_source)));
//! coordinator.spawn();
//!
//! let mut snapshots = handle.subscribe();
//! while snapshots.changed().await.is_ok() {
//!     println!("{:?}", snapshots.borrow().state);
//! }
//! ```

mod config;
mod coordinator;
mod error;
mod handle;
mod overlay;
mod plugin;
pub mod plugins;
mod registry;
mod scheduler;
mod slots;
mod snapshot;
mod sources;

pub use config::{CoordinatorConfig, SummarizerConfig, CONFIG_ENV};
pub use coordinator::Coordinator;
pub use error::{ConfigError, ConfigResult, CoordinatorError, Result, SourceError};
pub use handle::CoordinatorHandle;
pub use overlay::{OverlayState, OverlayStateMachine, TapOutcome, Transition};
pub use plugin::{
    CallState, CallStateEvent, HostCommand, InstanceId, Plugin, PluginAddress, PluginContext, PluginEvent,
    PluginId, PluginKind, PluginState, PulseColor, RenderContext, TimerTag, TranscriptFeed,
};
pub use plugins::{
    CallPlugin, CallTranscriptPlugin, DemoPlugin, NotificationInfo, NotificationOptions, NotificationPlugin,
};
pub use registry::{AddOutcome, PluginRegistry};
pub use scheduler::{ArmKey, AutoCloseScheduler, TimerKey, TimerQueue};
pub use slots::{select_slots, SlotAssignment, SlotEntry};
pub use snapshot::{OverlaySnapshot, PluginView};
pub use sources::{
    CallStateSource, ChannelSource, DeniedSource, NotificationAdapter, TranscriptSource, SOURCE_BUFFER,
};
