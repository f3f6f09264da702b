//! One plugin per posted notification, with an AI (or heuristic) summary.

use crate::config::CoordinatorConfig;
use crate::overlay::OverlayState;
use crate::plugin::{
    Plugin, PluginContext, PluginEvent, PluginId, PluginKind, PluginState, PulseColor, TimerTag,
};
use island_summary::{summarize_or_fallback, Summary, SummarizerRef, SummaryRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Timer armed in `on_create`; deactivates the plugin unless expanded.
pub const NOTIFICATION_CHECK_TIMER: &str = "notification_check";

/// A notification as posted by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInfo {
    pub id: String,
    pub title: String,
    pub body: String,
    pub source_app: String,
}

impl NotificationInfo {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        source_app: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            source_app: source_app.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationOptions {
    pub summary_timeout: Duration,
    pub check_delay: Duration,
    pub auto_close_secs: u32,
    pub pulse_color: PulseColor,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

impl NotificationOptions {
    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self {
            summary_timeout: config.summary_timeout(),
            check_delay: config.notification_check_delay(),
            auto_close_secs: config.notification_auto_close_secs,
            pulse_color: config.default_pulse_color,
        }
    }
}

/// Summary request state. Goes from loading to a result exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingAnalysis {
    pub loading: bool,
    pub result: Option<Summary>,
}

pub struct NotificationPlugin {
    id: PluginId,
    info: NotificationInfo,
    state: PluginState,
    summarizer: SummarizerRef,
    options: NotificationOptions,
    analysis: PendingAnalysis,
    task: Option<JoinHandle<()>>,
}

impl NotificationPlugin {
    pub fn new(info: NotificationInfo, summarizer: SummarizerRef, options: NotificationOptions) -> Self {
        Self {
            id: Self::plugin_id(&info.id),
            state: PluginState::new(options.pulse_color).with_auto_close(options.auto_close_secs),
            info,
            summarizer,
            options,
            analysis: PendingAnalysis::default(),
            task: None,
        }
    }

    /// Plugin id used for a platform notification id.
    pub fn plugin_id(notification_id: &str) -> PluginId {
        PluginId::new(format!("notification:{}", notification_id))
    }

    pub fn info(&self) -> &NotificationInfo {
        &self.info
    }

    pub fn analysis(&self) -> &PendingAnalysis {
        &self.analysis
    }

    pub fn action_items_count(&self) -> usize {
        self.analysis
            .result
            .as_ref()
            .map_or(0, |s| s.action_items.len())
    }

    pub fn scheduled_items_count(&self) -> usize {
        self.analysis
            .result
            .as_ref()
            .map_or(0, |s| s.scheduled_items.len())
    }

    fn store_summary(&mut self, summary: Summary) {
        if self.analysis.result.is_some() {
            tracing::trace!(plugin_id = %self.id, "Summary already stored, ignoring");
            return;
        }
        tracing::debug!(
            plugin_id = %self.id,
            source = ?summary.source,
            actions = summary.action_items.len(),
            "Notification summary ready"
        );
        self.analysis.loading = false;
        self.analysis.result = Some(summary);
        self.state.has_ai_content = true;
    }

    fn spawn_summary(&mut self, ctx: &PluginContext) {
        let summarizer = self.summarizer.clone();
        let request = SummaryRequest::new(
            self.info.title.clone(),
            self.info.body.clone(),
            self.info.source_app.clone(),
        );
        let timeout = self.options.summary_timeout;
        let host = ctx.host().clone();
        let address = ctx.address().clone();

        self.analysis.loading = true;
        self.task = Some(tokio::spawn(async move {
            let summary = summarize_or_fallback(summarizer.as_ref(), &request, timeout).await;
            if host.deliver_to(&address, PluginEvent::SummaryReady(summary)).is_err() {
                tracing::debug!(plugin = %address, "Coordinator gone before summary arrived");
            }
        }));
    }
}

impl Plugin for NotificationPlugin {
    fn id(&self) -> &PluginId {
        &self.id
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Notification
    }

    fn name(&self) -> &str {
        &self.info.source_app
    }

    fn description(&self) -> &str {
        &self.info.title
    }

    fn state(&self) -> &PluginState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PluginState {
        &mut self.state
    }

    fn can_expand(&self) -> bool {
        true
    }

    fn on_create(&mut self, ctx: &mut PluginContext) {
        self.state.activate(true);
        self.spawn_summary(ctx);
        ctx.schedule(self.options.check_delay, TimerTag::new(NOTIFICATION_CHECK_TIMER, 0));
    }

    fn on_event(&mut self, event: PluginEvent, ctx: &mut PluginContext) {
        match event {
            PluginEvent::SummaryReady(summary) => self.store_summary(summary),
            PluginEvent::Timer(tag) if tag.name == NOTIFICATION_CHECK_TIMER => {
                if ctx.overlay_state() != OverlayState::Expanded {
                    self.state.deactivate();
                }
            }
            _ => {}
        }
    }

    fn on_click(&mut self, _ctx: &mut PluginContext) {
        self.state.set_pulse(false, None);
    }

    fn on_destroy(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "notificationId": self.info.id,
            "title": self.info.title,
            "body": self.info.body,
            "sourceApp": self.info.source_app,
            "loading": self.analysis.loading,
            "summary": self.analysis.result,
            "actionItemsCount": self.action_items_count(),
            "scheduledItemsCount": self.scheduled_items_count(),
        })
    }
}
