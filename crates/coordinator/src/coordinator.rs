//! The coordinator task.
//!
//! One tokio task owns every piece of overlay state. Adapters, plugins and the
//! renderer talk to it through a [`CoordinatorHandle`]; the task applies their
//! commands one at a time, in arrival order, together with fired timers.
//!
//! After each command the task refreshes the active set, re-evaluates the
//! state machine, re-arms auto-close and publishes a new [`OverlaySnapshot`].

use crate::config::CoordinatorConfig;
use crate::handle::CoordinatorHandle;
use crate::overlay::{OverlayState, OverlayStateMachine, TapOutcome, Transition};
use crate::plugin::{
    HostCommand, Plugin, PluginAddress, PluginContext, PluginEvent, PluginId, PluginKind, PluginState,
    RenderContext, TimerTag,
};
use crate::registry::{AddOutcome, PluginRegistry};
use crate::scheduler::{ArmKey, AutoCloseScheduler, TimerKey, TimerQueue};
use crate::slots::{select_slots, SlotAssignment};
use crate::snapshot::{OverlaySnapshot, PluginView};
use island_events::{
    emit_event, event_names, now_ms, CollapsedEvent, EventBusRef, PluginAddedEvent, PluginRemovedEvent,
    PluginUpdatedEvent, StateChangedEvent,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Who an event is for.
#[derive(Debug, Clone)]
pub(crate) enum PluginTarget {
    Id(PluginId),
    Address(PluginAddress),
    Kind(PluginKind),
}

pub(crate) enum Command {
    AddPlugin(Box<dyn Plugin>),
    RemovePlugin(PluginId),
    Deliver {
        target: PluginTarget,
        event: PluginEvent,
    },
    Tap,
    LongPress {
        id: PluginId,
        context: RenderContext,
    },
    Click(PluginId),
    Host(HostCommand),
    Flush(oneshot::Sender<OverlaySnapshot>),
    Shutdown,
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Command::AddPlugin(_) => "add_plugin",
            Command::RemovePlugin(_) => "remove_plugin",
            Command::Deliver { .. } => "deliver",
            Command::Tap => "tap",
            Command::LongPress { .. } => "long_press",
            Command::Click(_) => "click",
            Command::Host(_) => "host",
            Command::Flush(_) => "flush",
            Command::Shutdown => "shutdown",
        }
    }
}

type CallbackOutput = (Vec<(Duration, TimerTag)>, Vec<HostCommand>);

enum Next {
    Command(Command),
    Timer(TimerKey),
    Closed,
}

/// Composition root. Build it, register static plugins, then `spawn` it.
pub struct Coordinator {
    core: CoordinatorCore,
    mailbox: mpsc::UnboundedReceiver<Command>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig, bus: EventBusRef) -> (Self, CoordinatorHandle) {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(OverlaySnapshot::default());
        let handle = CoordinatorHandle::new(tx, snapshot_rx);
        let core = CoordinatorCore::new(config, bus, handle.clone(), snapshots);
        (Self { core, mailbox }, handle)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.core.config
    }

    /// Register a static plugin. It is created when the task starts.
    pub fn register(&mut self, plugin: impl Plugin + 'static) -> &mut Self {
        if let Some(address) = self.core.registry.register(Box::new(plugin)) {
            tracing::debug!(plugin = %address, "Static plugin registered");
        }
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until `shutdown` is requested. Plugins are torn down on exit.
    pub async fn run(mut self) {
        self.core.initialize();
        tracing::info!(plugins = self.core.registry.len(), "Coordinator started");

        loop {
            let next = tokio::select! {
                command = self.mailbox.recv() => match command {
                    Some(command) => Next::Command(command),
                    None => Next::Closed,
                },
                Some(key) = self.core.timers.next_expired(), if !self.core.timers.is_empty() => Next::Timer(key),
            };

            match next {
                Next::Command(Command::Shutdown) | Next::Closed => break,
                Next::Command(command) => self.core.apply(command),
                Next::Timer(key) => self.core.on_timer(key),
            }
        }

        self.core.shutdown();
    }
}

struct CoordinatorCore {
    config: CoordinatorConfig,
    bus: EventBusRef,
    handle: CoordinatorHandle,
    snapshots: watch::Sender<OverlaySnapshot>,
    registry: PluginRegistry,
    overlay: OverlayStateMachine,
    auto_close: AutoCloseScheduler,
    timers: TimerQueue,
    last_active: Vec<PluginId>,
    revision: u64,
    applying: bool,
}

impl CoordinatorCore {
    fn new(
        config: CoordinatorConfig,
        bus: EventBusRef,
        handle: CoordinatorHandle,
        snapshots: watch::Sender<OverlaySnapshot>,
    ) -> Self {
        Self {
            config,
            bus,
            handle,
            snapshots,
            registry: PluginRegistry::new(),
            overlay: OverlayStateMachine::new(),
            auto_close: AutoCloseScheduler::new(),
            timers: TimerQueue::new(),
            last_active: Vec::new(),
            revision: 0,
            applying: false,
        }
    }

    fn begin(&mut self) {
        debug_assert!(!self.applying, "coordinator state mutated re-entrantly");
        self.applying = true;
        self.revision += 1;
    }

    fn end(&mut self) {
        self.settle();
        self.applying = false;
    }

    fn initialize(&mut self) {
        self.begin();
        self.create_plugins(true);
        self.end();
    }

    fn apply(&mut self, command: Command) {
        if let Command::Flush(reply) = command {
            let _ = reply.send(self.snapshots.borrow().clone());
            return;
        }

        self.begin();
        tracing::trace!(command = command.label(), "Applying command");
        match command {
            Command::AddPlugin(plugin) => self.add_plugin(plugin),
            Command::RemovePlugin(id) => self.remove_plugin(&id),
            Command::Deliver { target, event } => self.deliver(target, event),
            Command::Tap => self.tap(),
            Command::LongPress { id, context } => self.long_press(id, context),
            Command::Click(id) => self.click(&id),
            Command::Host(command) => self.host_command(command),
            Command::Flush(_) | Command::Shutdown => {}
        }
        self.end();
    }

    fn on_timer(&mut self, key: TimerKey) {
        self.begin();
        match key {
            TimerKey::AutoClose { plugin, generation } => self.auto_close_fired(&plugin, generation),
            TimerKey::CloseAnimation { generation } => match self.overlay.finish_closing(generation) {
                Some(transition) => self.emit_transition(transition),
                None => tracing::trace!(generation, "Stale close animation ignored"),
            },
            TimerKey::Plugin { address, tag } => {
                let delivered = self.run_callback(&address, |plugin, ctx| {
                    plugin.on_event(PluginEvent::Timer(tag), ctx)
                });
                if !delivered {
                    tracing::trace!(plugin = %address, timer = tag.name, "Timer for removed plugin dropped");
                }
            }
        }
        self.end();
    }

    fn shutdown(&mut self) {
        self.begin();
        let destroyed = self.registry.teardown();
        self.end();
        tracing::info!(plugins = destroyed, "Coordinator stopped");
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn add_plugin(&mut self, plugin: Box<dyn Plugin>) {
        let kind = plugin.kind();
        let name = plugin.name().to_string();
        if let AddOutcome::Added(address) = self.registry.add_plugin(plugin) {
            tracing::debug!(plugin = %address, %kind, "Plugin added");
            emit_event(
                self.bus.as_ref(),
                event_names::PLUGIN_ADDED,
                &PluginAddedEvent {
                    id: address.id.to_string(),
                    kind: kind.to_string(),
                    name,
                },
            );
            self.create_plugins(false);
        }
    }

    fn remove_plugin(&mut self, id: &PluginId) {
        if self.registry.remove_plugin(id).is_some() {
            tracing::debug!(plugin_id = %id, "Plugin removed");
            emit_event(
                self.bus.as_ref(),
                event_names::PLUGIN_REMOVED,
                &PluginRemovedEvent { id: id.to_string() },
            );
        }
    }

    fn deliver(&mut self, target: PluginTarget, event: PluginEvent) {
        let address = match &target {
            PluginTarget::Address(address) => Some(address.clone()),
            PluginTarget::Id(id) => self.registry.address_of(id),
            PluginTarget::Kind(kind) => self.registry.find_address_by_kind(*kind),
        };
        let Some(address) = address else {
            tracing::debug!(?target, event = event.label(), "No plugin for event");
            return;
        };

        let label = event.label();
        if !self.run_callback(&address, |plugin, ctx| plugin.on_event(event, ctx)) {
            tracing::trace!(plugin = %address, event = label, "Event for removed plugin dropped");
        }
    }

    fn tap(&mut self) {
        let has_active = !self.registry.active_ids().is_empty();
        match self.overlay.tap(has_active) {
            TapOutcome::Ignored => tracing::debug!(state = %self.overlay.state(), "Tap ignored"),
            TapOutcome::Changed(transition) => self.emit_transition(transition),
            TapOutcome::ClosingStarted(generation) => self.arm_close_animation(generation),
        }
    }

    fn long_press(&mut self, id: PluginId, context: RenderContext) {
        let expandable = self.registry.is_in_active_set(&id)
            && self.registry.get(&id).is_some_and(|p| p.can_expand());
        if !expandable {
            tracing::debug!(plugin_id = %id, "Long-press ignored");
            return;
        }
        if let Some(transition) = self.overlay.expand(id, context) {
            self.emit_transition(transition);
        }
    }

    fn click(&mut self, id: &PluginId) {
        let Some(address) = self.registry.address_of(id) else {
            tracing::debug!(plugin_id = %id, "Click on unknown plugin ignored");
            return;
        };
        self.run_callback(&address, |plugin, ctx| plugin.on_click(ctx));
    }

    fn host_command(&mut self, command: HostCommand) {
        tracing::debug!(?command, state = %self.overlay.state(), "Host command");
        let transition = match command {
            HostCommand::ShowOverlay => self.overlay.show(!self.registry.active_ids().is_empty()),
            HostCommand::HideOverlay => self.overlay.hide(),
            HostCommand::Expand => {
                let bound = select_slots(&self.registry.slot_entries()).bound;
                let expandable = bound
                    .as_ref()
                    .and_then(|id| self.registry.get(id))
                    .is_some_and(|p| p.can_expand());
                match bound {
                    Some(id) if expandable => self.overlay.expand(id, RenderContext::default()),
                    _ => None,
                }
            }
            HostCommand::Shrink => {
                if let Some(generation) = self.overlay.begin_closing() {
                    self.arm_close_animation(generation);
                }
                None
            }
            HostCommand::CollapseToClosed => {
                self.collapse("host");
                None
            }
        };
        if let Some(transition) = transition {
            self.emit_transition(transition);
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    fn arm_close_animation(&mut self, generation: u64) {
        self.timers
            .schedule(self.config.close_animation(), TimerKey::CloseAnimation { generation });
    }

    fn auto_close_fired(&mut self, plugin: &PluginId, generation: u64) {
        if !self.auto_close.is_current(generation) {
            tracing::trace!(plugin_id = %plugin, generation, "Stale auto-close ignored");
            return;
        }
        let still_active = self.registry.get(plugin).is_some_and(|p| p.state().is_active);
        if !still_active {
            tracing::debug!(plugin_id = %plugin, "Auto-close skipped");
            return;
        }
        if self.overlay.state() == OverlayState::Expanded {
            // Expanded only fades back to Opened, the same way a tap does.
            match self.overlay.begin_closing() {
                Some(fade) => {
                    tracing::debug!(plugin_id = %plugin, "Auto-close fading expanded overlay");
                    self.arm_close_animation(fade);
                }
                None => tracing::debug!(plugin_id = %plugin, "Auto-close skipped, already closing"),
            }
            return;
        }
        self.collapse("auto_close");
    }

    fn rearm_auto_close(&mut self, slots: &SlotAssignment) {
        let expanded = self.overlay.state() == OverlayState::Expanded;
        let candidate = slots.bound.as_ref().and_then(|id| {
            let address = self.registry.address_of(id)?;
            let state = self.registry.get(id)?.state();
            Some(ArmKey {
                plugin: address.id,
                instance: address.instance,
                secs: state.auto_close_after_secs,
                is_active: state.is_active,
                expanded,
            })
        });
        if let Some((key, delay)) = self.auto_close.rearm(candidate) {
            self.timers.schedule(delay, key);
        }
    }

    // ------------------------------------------------------------------
    // Plugin callbacks
    // ------------------------------------------------------------------

    /// Run `f` against one registration, then apply what it asked for.
    /// Returns false if the registration no longer exists.
    fn run_callback<F>(&mut self, address: &PluginAddress, f: F) -> bool
    where
        F: FnOnce(&mut dyn Plugin, &mut PluginContext),
    {
        let mut ctx = PluginContext::new(address.clone(), self.overlay.state(), self.handle.clone());
        let Some(plugin) = self.registry.resolve_mut(address) else {
            return false;
        };

        let before = plugin.state().clone();
        f(plugin, &mut ctx);
        let after = plugin.state().clone();

        if before != after {
            self.emit_updated(&address.id, &after);
        }
        self.absorb(address, ctx.into_parts());
        true
    }

    /// Call `on_create` on every plugin not created yet. `initial` also admits
    /// static plugins that came up active.
    fn create_plugins(&mut self, initial: bool) {
        let overlay = self.overlay.state();
        let handle = self.handle.clone();
        let mut created: Vec<(PluginAddress, Option<PluginState>, CallbackOutput)> = Vec::new();

        let on_create = |address: &PluginAddress, plugin: &mut dyn Plugin| {
            let mut ctx = PluginContext::new(address.clone(), overlay, handle.clone());
            let before = plugin.state().clone();
            plugin.on_create(&mut ctx);
            let changed = (plugin.state() != &before).then(|| plugin.state().clone());
            created.push((address.clone(), changed, ctx.into_parts()));
        };
        if initial {
            self.registry.initialize(on_create);
        } else {
            self.registry.create_pending(on_create);
        }

        for (address, changed, output) in created {
            if let Some(state) = changed {
                self.emit_updated(&address.id, &state);
            }
            self.absorb(&address, output);
        }
    }

    fn absorb(&mut self, address: &PluginAddress, (timers, requests): CallbackOutput) {
        for (delay, tag) in timers {
            self.timers.schedule(
                delay,
                TimerKey::Plugin {
                    address: address.clone(),
                    tag,
                },
            );
        }
        for command in requests {
            tracing::debug!(plugin = %address, ?command, "Plugin requested host command");
            self.host_command(command);
        }
    }

    // ------------------------------------------------------------------
    // Collapse, refresh and publish
    // ------------------------------------------------------------------

    fn collapse(&mut self, reason: &str) {
        let deactivated = self.registry.deactivate_all();
        for id in &deactivated {
            if let Some(plugin) = self.registry.get(id) {
                self.emit_updated(id, plugin.state());
            }
        }
        if let Some(transition) = self.overlay.hide() {
            self.emit_transition(transition);
        }

        tracing::info!(reason, plugins = deactivated.len(), "Overlay collapsed");
        emit_event(
            self.bus.as_ref(),
            event_names::COLLAPSED,
            &CollapsedEvent {
                reason: reason.to_string(),
                deactivated: deactivated.iter().map(|id| id.to_string()).collect(),
            },
        );
    }

    fn settle(&mut self) {
        self.registry.refresh_active_plugins();
        let active = self.registry.active_ids().to_vec();
        let gained = active.iter().any(|id| !self.last_active.contains(id));
        let transition = self.overlay.on_refresh(&active, gained);
        self.last_active = active;
        if let Some(transition) = transition {
            self.emit_transition(transition);
        }

        let slots = select_slots(&self.registry.slot_entries());
        self.rearm_auto_close(&slots);
        self.publish(slots);
    }

    fn publish(&self, slots: SlotAssignment) {
        let plugins = self
            .registry
            .plugins()
            .map(|p| PluginView {
                id: p.id().clone(),
                name: p.name().to_string(),
                kind: p.kind(),
                state: p.state().clone(),
                can_expand: p.can_expand(),
                content: p.content(),
            })
            .collect();

        self.snapshots.send_replace(OverlaySnapshot {
            revision: self.revision,
            state: self.overlay.state(),
            closing: self.overlay.is_closing(),
            active_ids: self.last_active.clone(),
            slots,
            plugins,
            expanded_context: self.overlay.render_context().cloned(),
        });
    }

    fn emit_transition(&self, transition: Transition) {
        tracing::debug!(
            from = %transition.from,
            to = %transition.to,
            revision = self.revision,
            "Overlay state changed"
        );
        emit_event(
            self.bus.as_ref(),
            event_names::STATE_CHANGED,
            &StateChangedEvent {
                state: transition.to.as_str().to_string(),
                previous: transition.from.as_str().to_string(),
                revision: self.revision,
                timestamp_ms: now_ms(),
            },
        );
    }

    fn emit_updated(&self, id: &PluginId, state: &PluginState) {
        tracing::debug!(
            plugin_id = %id,
            active = state.is_active,
            pulsing = state.is_pulsing,
            "Plugin updated"
        );
        emit_event(
            self.bus.as_ref(),
            event_names::PLUGIN_UPDATED,
            &PluginUpdatedEvent {
                id: id.to_string(),
                is_active: state.is_active,
                is_pulsing: state.is_pulsing,
                pulse_color: state.pulse_color.argb(),
                auto_close_after_secs: state.auto_close_after_secs,
                has_ai_content: state.has_ai_content,
            },
        );
    }
}
