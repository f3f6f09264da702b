//! Adapters between platform event sources and the coordinator.
//!
//! Call state and transcripts are pulled by the plugins that own them (they
//! subscribe in `on_create`). Notifications are pushed by the host through
//! [`NotificationAdapter`].

use crate::error::{Result, SourceError};
use crate::handle::CoordinatorHandle;
use crate::plugin::{CallStateEvent, PluginAddress, PluginEvent, PluginId, TranscriptFeed};
use crate::plugins::{NotificationInfo, NotificationOptions, NotificationPlugin};
use island_summary::SummarizerRef;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffer size for channel-backed sources.
pub const SOURCE_BUFFER: usize = 64;

/// Telephony state feed.
pub trait CallStateSource: Send + Sync {
    fn subscribe(&self) -> std::result::Result<mpsc::Receiver<CallStateEvent>, SourceError>;
}

/// Speech-to-text feed for the current call.
pub trait TranscriptSource: Send + Sync {
    fn subscribe(&self) -> std::result::Result<mpsc::Receiver<TranscriptFeed>, SourceError>;
}

/// Source backed by an in-process channel. Supports a single subscriber.
pub struct ChannelSource<T> {
    rx: Mutex<Option<mpsc::Receiver<T>>>,
}

impl<T> ChannelSource<T> {
    /// Create the source together with the sender that feeds it.
    pub fn channel() -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(SOURCE_BUFFER);
        (
            tx,
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }

    fn take(&self) -> std::result::Result<mpsc::Receiver<T>, SourceError> {
        self.rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| SourceError::Unavailable("already subscribed".to_string()))
    }
}

impl CallStateSource for ChannelSource<CallStateEvent> {
    fn subscribe(&self) -> std::result::Result<mpsc::Receiver<CallStateEvent>, SourceError> {
        self.take()
    }
}

impl TranscriptSource for ChannelSource<TranscriptFeed> {
    fn subscribe(&self) -> std::result::Result<mpsc::Receiver<TranscriptFeed>, SourceError> {
        self.take()
    }
}

/// Source whose permission was not granted.
#[derive(Debug, Clone)]
pub struct DeniedSource {
    permission: String,
}

impl DeniedSource {
    pub fn new(permission: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
        }
    }
}

impl CallStateSource for DeniedSource {
    fn subscribe(&self) -> std::result::Result<mpsc::Receiver<CallStateEvent>, SourceError> {
        Err(SourceError::PermissionDenied(self.permission.clone()))
    }
}

impl TranscriptSource for DeniedSource {
    fn subscribe(&self) -> std::result::Result<mpsc::Receiver<TranscriptFeed>, SourceError> {
        Err(SourceError::PermissionDenied(self.permission.clone()))
    }
}

/// Pump `rx` into the coordinator, addressed to one registration.
///
/// Stops when the source closes or the coordinator is gone.
pub(crate) fn forward<T, F>(
    mut rx: mpsc::Receiver<T>,
    host: CoordinatorHandle,
    address: PluginAddress,
    wrap: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(T) -> PluginEvent + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            if host.deliver_to(&address, wrap(item)).is_err() {
                break;
            }
        }
        tracing::debug!(plugin = %address, "Source forwarder finished");
    })
}

/// Turns posted and dismissed notifications into plugin add/remove commands.
#[derive(Clone)]
pub struct NotificationAdapter {
    handle: CoordinatorHandle,
    summarizer: SummarizerRef,
    options: NotificationOptions,
}

impl NotificationAdapter {
    pub fn new(handle: CoordinatorHandle, summarizer: SummarizerRef, options: NotificationOptions) -> Self {
        Self {
            handle,
            summarizer,
            options,
        }
    }

    /// Register a plugin for a newly posted notification. Re-posting the same
    /// notification id is a no-op.
    pub fn posted(&self, info: NotificationInfo) -> Result<PluginId> {
        let id = NotificationPlugin::plugin_id(&info.id);
        tracing::debug!(notification_id = %info.id, app = %info.source_app, "Notification posted");
        let plugin = NotificationPlugin::new(info, self.summarizer.clone(), self.options.clone());
        self.handle.add_plugin(plugin)?;
        Ok(id)
    }

    pub fn dismissed(&self, notification_id: &str) -> Result<()> {
        tracing::debug!(notification_id, "Notification dismissed");
        self.handle
            .remove_plugin(NotificationPlugin::plugin_id(notification_id))
    }
}
