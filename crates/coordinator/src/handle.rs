//! Cloneable front door to a running coordinator.

use crate::coordinator::{Command, PluginTarget};
use crate::error::{CoordinatorError, Result};
use crate::plugin::{HostCommand, Plugin, PluginAddress, PluginEvent, PluginId, PluginKind, RenderContext};
use crate::snapshot::OverlaySnapshot;
use tokio::sync::{mpsc, oneshot, watch};

/// Posts commands to the coordinator task and reads its snapshots.
///
/// Every method only enqueues; effects become visible in a later snapshot.
/// Use [`flush`](Self::flush) to wait until everything sent so far is applied.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<OverlaySnapshot>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        snapshots: watch::Receiver<OverlaySnapshot>,
    ) -> Self {
        Self { tx, snapshots }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| CoordinatorError::MailboxClosed)
    }

    pub fn add_plugin(&self, plugin: impl Plugin + 'static) -> Result<()> {
        self.add_boxed(Box::new(plugin))
    }

    pub fn add_boxed(&self, plugin: Box<dyn Plugin>) -> Result<()> {
        self.send(Command::AddPlugin(plugin))
    }

    pub fn remove_plugin(&self, id: impl Into<PluginId>) -> Result<()> {
        self.send(Command::RemovePlugin(id.into()))
    }

    /// Deliver to whatever registration currently holds `id`.
    pub fn deliver(&self, id: impl Into<PluginId>, event: PluginEvent) -> Result<()> {
        self.send(Command::Deliver {
            target: PluginTarget::Id(id.into()),
            event,
        })
    }

    /// Deliver only to this exact registration; dropped if it is gone.
    pub fn deliver_to(&self, address: &PluginAddress, event: PluginEvent) -> Result<()> {
        self.send(Command::Deliver {
            target: PluginTarget::Address(address.clone()),
            event,
        })
    }

    /// Deliver to the first registered plugin of `kind`.
    pub fn deliver_to_kind(&self, kind: PluginKind, event: PluginEvent) -> Result<()> {
        self.send(Command::Deliver {
            target: PluginTarget::Kind(kind),
            event,
        })
    }

    pub fn tap(&self) -> Result<()> {
        self.send(Command::Tap)
    }

    pub fn long_press(&self, id: impl Into<PluginId>, context: RenderContext) -> Result<()> {
        self.send(Command::LongPress {
            id: id.into(),
            context,
        })
    }

    pub fn click(&self, id: impl Into<PluginId>) -> Result<()> {
        self.send(Command::Click(id.into()))
    }

    pub fn host(&self, command: HostCommand) -> Result<()> {
        self.send(Command::Host(command))
    }

    pub fn show_overlay(&self) -> Result<()> {
        self.host(HostCommand::ShowOverlay)
    }

    pub fn hide_overlay(&self) -> Result<()> {
        self.host(HostCommand::HideOverlay)
    }

    pub fn expand(&self) -> Result<()> {
        self.host(HostCommand::Expand)
    }

    pub fn shrink(&self) -> Result<()> {
        self.host(HostCommand::Shrink)
    }

    pub fn collapse_to_closed(&self) -> Result<()> {
        self.host(HostCommand::CollapseToClosed)
    }

    /// Stop the coordinator after the commands already queued.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Wait until every command sent before this call has been applied and
    /// return the resulting snapshot.
    pub async fn flush(&self) -> Result<OverlaySnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush(reply))?;
        rx.await.map_err(|_| CoordinatorError::MailboxClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> OverlaySnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.snapshots.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
