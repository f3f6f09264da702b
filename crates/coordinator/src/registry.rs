//! Plugin registry: every known plugin plus the ordered active subset.
//!
//! The registry is plain data owned by the coordinator task. None of its
//! operations fail; duplicates and unknown ids are no-ops.

use crate::plugin::{InstanceId, Plugin, PluginAddress, PluginId, PluginKind};
use crate::slots::SlotEntry;

struct Entry {
    plugin: Box<dyn Plugin>,
    instance: InstanceId,
    created: bool,
}

impl Entry {
    fn address(&self) -> PluginAddress {
        PluginAddress {
            id: self.plugin.id().clone(),
            instance: self.instance,
        }
    }
}

/// Result of [`PluginRegistry::add_plugin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(PluginAddress),
    /// A plugin with this id was already registered; the new one was dropped.
    AlreadyPresent(PluginAddress),
}

impl AddOutcome {
    pub fn address(&self) -> &PluginAddress {
        match self {
            AddOutcome::Added(a) | AddOutcome::AlreadyPresent(a) => a,
        }
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    master: Vec<Entry>,
    active: Vec<PluginId>,
    next_instance: u64,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_instance(&mut self) -> InstanceId {
        self.next_instance += 1;
        InstanceId(self.next_instance)
    }

    fn position(&self, id: &PluginId) -> Option<usize> {
        self.master.iter().position(|e| e.plugin.id() == id)
    }

    /// Call-type plugins always go first.
    fn insert_active(&mut self, id: PluginId, kind: PluginKind) {
        if self.active.contains(&id) {
            return;
        }
        if kind == PluginKind::Call {
            self.active.insert(0, id);
        } else {
            self.active.push(id);
        }
    }

    /// Register a static plugin without touching the active set. It is
    /// created by [`initialize`](Self::initialize).
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Option<PluginAddress> {
        if self.contains(plugin.id()) {
            tracing::debug!(plugin_id = %plugin.id(), "Plugin already registered");
            return None;
        }
        let instance = self.next_instance();
        let entry = Entry {
            plugin,
            instance,
            created: false,
        };
        let address = entry.address();
        self.master.push(entry);
        Some(address)
    }

    /// Create every registered plugin, then admit the ones that came up active.
    pub fn initialize<F>(&mut self, on_create: F)
    where
        F: FnMut(&PluginAddress, &mut dyn Plugin),
    {
        self.create_pending(on_create);
        let ready: Vec<(PluginId, PluginKind)> = self
            .master
            .iter()
            .filter(|e| e.plugin.state().is_active)
            .map(|e| (e.plugin.id().clone(), e.plugin.kind()))
            .collect();
        for (id, kind) in ready {
            self.insert_active(id, kind);
        }
    }

    /// Run `on_create` for every plugin that has not been created yet.
    /// Each registration is created exactly once.
    pub fn create_pending<F>(&mut self, mut on_create: F) -> usize
    where
        F: FnMut(&PluginAddress, &mut dyn Plugin),
    {
        let mut count = 0;
        for entry in self.master.iter_mut().filter(|e| !e.created) {
            entry.created = true;
            let address = entry.address();
            on_create(&address, entry.plugin.as_mut());
            count += 1;
        }
        count
    }

    /// Idempotent insert into the master list and the active set.
    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) -> AddOutcome {
        let id = plugin.id().clone();
        let kind = plugin.kind();

        let outcome = match self.address_of(&id) {
            Some(existing) => {
                tracing::debug!(plugin_id = %id, "Duplicate add ignored");
                AddOutcome::AlreadyPresent(existing)
            }
            None => {
                let instance = self.next_instance();
                let address = PluginAddress {
                    id: id.clone(),
                    instance,
                };
                self.master.push(Entry {
                    plugin,
                    instance,
                    created: false,
                });
                AddOutcome::Added(address)
            }
        };

        self.insert_active(id, kind);
        outcome
    }

    /// Remove from both lists and destroy. Unknown ids return `None`.
    pub fn remove_plugin(&mut self, id: &PluginId) -> Option<Box<dyn Plugin>> {
        let Some(pos) = self.position(id) else {
            tracing::debug!(plugin_id = %id, "Remove of unknown plugin ignored");
            return None;
        };
        self.active.retain(|a| a != id);
        let mut entry = self.master.remove(pos);
        entry.plugin.on_destroy();
        Some(entry.plugin)
    }

    /// Rebuild the active set from the master list. Returns true when empty.
    pub fn refresh_active_plugins(&mut self) -> bool {
        let mut active = Vec::with_capacity(self.master.len());
        for entry in self.master.iter().filter(|e| e.plugin.state().is_active) {
            let id = entry.plugin.id().clone();
            if entry.plugin.kind() == PluginKind::Call {
                active.insert(0, id);
            } else {
                active.push(id);
            }
        }
        self.active = active;
        self.active.is_empty()
    }

    pub fn first_active(&self) -> Option<&dyn Plugin> {
        self.active.first().and_then(|id| self.get(id))
    }

    /// First registered plugin of `kind`, active or not.
    pub fn find_by_kind(&self, kind: PluginKind) -> Option<&dyn Plugin> {
        self.master
            .iter()
            .find(|e| e.plugin.kind() == kind)
            .map(|e| e.plugin.as_ref())
    }

    pub fn find_address_by_kind(&self, kind: PluginKind) -> Option<PluginAddress> {
        self.master
            .iter()
            .find(|e| e.plugin.kind() == kind)
            .map(Entry::address)
    }

    pub fn get(&self, id: &PluginId) -> Option<&dyn Plugin> {
        self.master
            .iter()
            .find(|e| e.plugin.id() == id)
            .map(|e| e.plugin.as_ref())
    }

    pub fn get_mut(&mut self, id: &PluginId) -> Option<&mut (dyn Plugin + 'static)> {
        self.master
            .iter_mut()
            .find(|e| e.plugin.id() == id)
            .map(|e| e.plugin.as_mut())
    }

    /// Like [`get_mut`](Self::get_mut) but only for the exact registration.
    pub fn resolve_mut(&mut self, address: &PluginAddress) -> Option<&mut (dyn Plugin + 'static)> {
        self.master
            .iter_mut()
            .find(|e| e.instance == address.instance && e.plugin.id() == &address.id)
            .map(|e| e.plugin.as_mut())
    }

    pub fn address_of(&self, id: &PluginId) -> Option<PluginAddress> {
        self.master.iter().find(|e| e.plugin.id() == id).map(Entry::address)
    }

    pub fn contains(&self, id: &PluginId) -> bool {
        self.position(id).is_some()
    }

    pub fn is_in_active_set(&self, id: &PluginId) -> bool {
        self.active.contains(id)
    }

    pub fn active_ids(&self) -> &[PluginId] {
        &self.active
    }

    /// Active set in order, reduced to what slot selection needs.
    pub fn slot_entries(&self) -> Vec<SlotEntry> {
        self.active
            .iter()
            .filter_map(|id| self.get(id))
            .map(|p| SlotEntry {
                id: p.id().clone(),
                kind: p.kind(),
                is_pulsing: p.state().is_pulsing,
            })
            .collect()
    }

    /// All registered plugins in registration order.
    pub fn plugins(&self) -> impl Iterator<Item = &(dyn Plugin + 'static)> {
        self.master.iter().map(|e| e.plugin.as_ref())
    }

    /// Deactivate every active plugin and clear the active set.
    /// Returns the ids that were active.
    pub fn deactivate_all(&mut self) -> Vec<PluginId> {
        let ids = std::mem::take(&mut self.active);
        for id in &ids {
            if let Some(plugin) = self.get_mut(id) {
                plugin.state_mut().deactivate();
            }
        }
        ids
    }

    /// Destroy and drop every plugin. Returns how many were destroyed.
    pub fn teardown(&mut self) -> usize {
        self.active.clear();
        let count = self.master.len();
        for mut entry in self.master.drain(..) {
            entry.plugin.on_destroy();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.master.len()
    }

    pub fn is_empty(&self) -> bool {
        self.master.is_empty()
    }
}
