//! End-to-end tests for the coordinator task.
//!
//! Every test runs on a paused clock, so timer-driven behaviour (auto-close,
//! the close fade, transcript and notification checks) is deterministic.

use island_coordinator::plugins::{CALL_PLUGIN_ID, TRANSCRIPT_PLUGIN_ID};
use island_coordinator::{
    CallPlugin, CallStateEvent, CallTranscriptPlugin, ChannelSource, Coordinator, CoordinatorConfig,
    CoordinatorError, CoordinatorHandle, DeniedSource, DemoPlugin, InstanceId, NotificationAdapter,
    NotificationInfo, NotificationOptions, NotificationPlugin, OverlaySnapshot, OverlayState, PluginAddress,
    PluginEvent, PluginKind, RenderContext, TranscriptFeed,
};
use island_events::{event_names, InMemoryEventBus};
use island_summary::{NullSummarizer, Summarizer, SummarizerRef, Summary, SummaryRequest, SummarySource};
use island_transcript::SpeakerType;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Harness {
    handle: CoordinatorHandle,
    bus: Arc<InMemoryEventBus>,
    task: JoinHandle<()>,
    config: CoordinatorConfig,
}

impl Harness {
    fn start(config: CoordinatorConfig, setup: impl FnOnce(&mut Coordinator)) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let (mut coordinator, handle) = Coordinator::new(config.clone(), bus.clone());
        setup(&mut coordinator);
        let task = coordinator.spawn();
        Self {
            handle,
            bus,
            task,
            config,
        }
    }

    fn with_call_and_transcript() -> Self {
        Self::start(CoordinatorConfig::default(), |c| {
            c.register(CallPlugin::detached());
            c.register(CallTranscriptPlugin::new(Duration::from_secs(3)));
        })
    }

    fn notifications(&self, summarizer: SummarizerRef) -> NotificationAdapter {
        NotificationAdapter::new(
            self.handle.clone(),
            summarizer,
            NotificationOptions::from_config(&self.config),
        )
    }

    async fn flush(&self) -> OverlaySnapshot {
        self.handle.flush().await.expect("coordinator running")
    }

    fn call(&self, event: CallStateEvent) {
        self.handle
            .deliver(CALL_PLUGIN_ID, PluginEvent::CallState(event))
            .unwrap();
    }

    fn transcript(&self, feed: TranscriptFeed) {
        self.handle
            .deliver_to_kind(PluginKind::Transcript, PluginEvent::Transcript(feed))
            .unwrap();
    }
}

async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

fn notification(id: &str) -> NotificationInfo {
    NotificationInfo::new(id, "Standup", "Meeting moved to 10:30 tomorrow", "Calendar")
}

struct SlowSummarizer;

#[async_trait::async_trait]
impl Summarizer for SlowSummarizer {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn summarize(&self, request: &SummaryRequest) -> island_summary::Result<Summary> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Summary {
            summary: format!("AI: {}", request.title),
            action_items: Vec::new(),
            scheduled_items: Vec::new(),
            priority: Default::default(),
            source: SummarySource::Ai,
        })
    }
}

// =============================================================================
// Reference Scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_a_empty_registry_is_closed() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        let snapshot = harness.flush().await;

        assert_eq!(snapshot.state, OverlayState::Closed);
        assert!(snapshot.active_ids.is_empty());
        assert!(snapshot.plugins.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_b_ringing_opens_overlay() {
        let harness = Harness::with_call_and_transcript();
        harness.call(CallStateEvent::ringing("+34 600 111 222"));
        let snapshot = harness.flush().await;

        let call = snapshot.plugin(CALL_PLUGIN_ID).unwrap();
        assert!(call.state.is_active);
        assert!(call.state.is_pulsing);
        assert_eq!(snapshot.state, OverlayState::Opened);
        assert_eq!(snapshot.slots.left.as_ref().unwrap().as_str(), CALL_PLUGIN_ID);
        assert_eq!(snapshot.slots.pulse.as_ref().unwrap().as_str(), CALL_PLUGIN_ID);
    }

    #[tokio::test(start_paused = true)]
    async fn test_c_idle_closes_overlay() {
        let harness = Harness::with_call_and_transcript();
        harness.call(CallStateEvent::ringing("123"));
        harness.call(CallStateEvent::idle());
        let snapshot = harness.flush().await;

        assert!(!snapshot.plugin(CALL_PLUGIN_ID).unwrap().state.is_active);
        assert!(snapshot.active_ids.is_empty());
        assert_eq!(snapshot.state, OverlayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_d_notification_gone_after_ten_seconds() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        let adapter = harness.notifications(Arc::new(NullSummarizer));
        adapter.posted(notification("n1")).unwrap();

        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Opened);
        assert_eq!(snapshot.plugin("notification:n1").unwrap().state.auto_close_after_secs, 10);

        sleep(Duration::from_millis(10_500)).await;
        let snapshot = harness.flush().await;
        assert!(snapshot.active_ids.is_empty());
        assert_eq!(snapshot.state, OverlayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_d_auto_close_collapses_bound_plugin() {
        let config = CoordinatorConfig {
            notification_check_delay_secs: 60,
            ..CoordinatorConfig::default()
        };
        let harness = Harness::start(config, |_| {});
        harness.notifications(Arc::new(NullSummarizer)).posted(notification("n1")).unwrap();
        harness.flush().await;

        sleep(Duration::from_millis(9_900)).await;
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        sleep(Duration::from_millis(200)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Closed);
        assert!(snapshot.active_ids.is_empty());

        let collapsed = harness.bus.last_for(event_names::COLLAPSED).unwrap();
        assert_eq!(collapsed["reason"], "auto_close");
        assert_eq!(collapsed["deactivated"][0], "notification:n1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_e_duplicate_final_suppressed() {
        let harness = Harness::with_call_and_transcript();
        harness.transcript(TranscriptFeed::Started);
        harness.transcript(TranscriptFeed::final_text("Hello", SpeakerType::Outgoing));
        harness.transcript(TranscriptFeed::final_text("Hello", SpeakerType::Outgoing));
        let snapshot = harness.flush().await;

        let content = &snapshot.plugin(TRANSCRIPT_PLUGIN_ID).unwrap().content;
        assert_eq!(content["messages"].as_array().unwrap().len(), 1);
        assert_eq!(content["messages"][0]["speaker"], "You");
    }
}

// =============================================================================
// Invariants
// =============================================================================

mod properties {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_uniqueness_across_add_and_remove() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        for round in 0..3 {
            for _ in 0..3 {
                harness.handle.add_plugin(DemoPlugin::new("a").active(false)).unwrap();
                harness.handle.add_plugin(DemoPlugin::new("b").active(false)).unwrap();
            }
            let snapshot = harness.flush().await;
            let mut ids: Vec<&str> = snapshot.active_ids.iter().map(|id| id.as_str()).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec!["a", "b"], "round {}", round);
            assert_eq!(snapshot.plugins.len(), 2);

            harness.handle.remove_plugin("a").unwrap();
            harness.handle.remove_plugin("a").unwrap();
            let snapshot = harness.flush().await;
            assert_eq!(snapshot.active_ids.len(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_liveness_every_published_snapshot() {
        let harness = Harness::with_call_and_transcript();
        let mut rx = harness.handle.subscribe();
        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                seen.push(rx.borrow_and_update().clone());
            }
            seen
        });

        harness.call(CallStateEvent::ringing("1"));
        harness.transcript(TranscriptFeed::Started);
        harness.call(CallStateEvent::idle());
        harness.transcript(TranscriptFeed::Stopped);
        sleep(Duration::from_secs(4)).await;
        harness.handle.add_plugin(DemoPlugin::new("d").active(false)).unwrap();
        harness.handle.remove_plugin("d").unwrap();
        harness.flush().await;

        harness.handle.shutdown().unwrap();
        harness.task.await.unwrap();
        let seen = watcher.await.unwrap();

        assert!(!seen.is_empty());
        for snapshot in &seen {
            if snapshot.active_ids.is_empty() {
                assert_eq!(snapshot.state, OverlayState::Closed, "revision {}", snapshot.revision);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expanded_immunity() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        harness
            .handle
            .add_plugin(DemoPlugin::new("d").active(false).with_auto_close(2))
            .unwrap();
        harness.handle.long_press("d", RenderContext::default()).unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Expanded);

        sleep(Duration::from_millis(1_900)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Expanded);
        assert!(!snapshot.closing);

        // The timer only fades Expanded back to Opened.
        sleep(Duration::from_millis(150)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Expanded);
        assert!(snapshot.closing);
        assert!(snapshot.is_active("d"));
        assert!(harness.bus.events_for(event_names::COLLAPSED).is_empty());

        // Mid-fade taps are ignored.
        harness.handle.tap().unwrap();
        sleep(Duration::from_millis(200)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Opened);
        assert!(!snapshot.closing);
        assert!(snapshot.is_active("d"));
        assert!(harness.bus.events_for(event_names::COLLAPSED).is_empty());

        // Leaving Expanded re-arms the full auto-close duration.
        sleep(Duration::from_millis(1_800)).await;
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        sleep(Duration::from_millis(200)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Closed);
        assert!(!snapshot.plugin("d").unwrap().state.is_active);
        let collapsed = harness.bus.last_for(event_names::COLLAPSED).unwrap();
        assert_eq!(collapsed["reason"], "auto_close");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_history() {
        let harness = Harness::with_call_and_transcript();
        harness.transcript(TranscriptFeed::Started);
        for i in 0..75 {
            harness.transcript(TranscriptFeed::final_text(format!("line {}", i), SpeakerType::Incoming));
        }
        let snapshot = harness.flush().await;

        let messages = snapshot.plugin(TRANSCRIPT_PLUGIN_ID).unwrap().content["messages"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(messages.len(), 50);
        assert_eq!(messages[0]["text"], "line 25");
        assert_eq!(messages[49]["text"], "line 74");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_precedence_call_wins_left() {
        let harness = Harness::with_call_and_transcript();
        harness.notifications(Arc::new(NullSummarizer)).posted(notification("n1")).unwrap();
        harness.call(CallStateEvent::ringing("1"));
        let snapshot = harness.flush().await;

        assert_eq!(snapshot.active_ids[0].as_str(), CALL_PLUGIN_ID);
        assert_eq!(snapshot.slots.left.as_ref().unwrap().as_str(), CALL_PLUGIN_ID);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_precedence_transcript_bound() {
        let harness = Harness::with_call_and_transcript();
        harness.notifications(Arc::new(NullSummarizer)).posted(notification("n1")).unwrap();
        harness.transcript(TranscriptFeed::Started);
        let snapshot = harness.flush().await;

        assert_eq!(snapshot.active_ids.len(), 2);
        assert_eq!(snapshot.slots.bound.as_ref().unwrap().as_str(), TRANSCRIPT_PLUGIN_ID);
        assert_eq!(snapshot.slots.right, snapshot.slots.bound);
        assert_eq!(snapshot.bound().unwrap().kind, PluginKind::Transcript);
    }
}

// =============================================================================
// Overlay Interaction
// =============================================================================

mod overlay {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tap_cycle() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(DemoPlugin::new("d").active(false));
        });
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        harness.handle.tap().unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Closed);
        harness.handle.tap().unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        let states: Vec<String> = harness
            .bus
            .events_for(event_names::STATE_CHANGED)
            .iter()
            .map(|e| e.payload["state"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(states, vec!["opened", "closed", "opened"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_during_close_fade_is_ignored() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(DemoPlugin::new("d").active(false));
        });
        harness.handle.long_press("d", RenderContext(serde_json::json!({"w": 320}))).unwrap();
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Expanded);
        assert_eq!(snapshot.expanded_context, Some(RenderContext(serde_json::json!({"w": 320}))));

        harness.handle.tap().unwrap();
        harness.handle.tap().unwrap();
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Expanded);
        assert!(snapshot.closing);

        sleep(Duration::from_millis(150)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Opened);
        assert!(!snapshot.closing);
        assert_eq!(snapshot.expanded_context, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_press_requires_can_expand() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(DemoPlugin::new("d").active(false).expandable(false));
        });
        harness.handle.long_press("d", RenderContext::default()).unwrap();
        harness.handle.long_press("missing", RenderContext::default()).unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Opened);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_keeps_plugins_until_new_member() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(DemoPlugin::new("a").active(false));
        });
        harness.handle.hide_overlay().unwrap();
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Closed);
        assert!(snapshot.is_active("a"));

        harness.handle.show_overlay().unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        harness.handle.hide_overlay().unwrap();
        harness.handle.add_plugin(DemoPlugin::new("b").active(false)).unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Opened);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collapse_to_closed_deactivates_all() {
        let harness = Harness::with_call_and_transcript();
        harness.call(CallStateEvent::ringing("1"));
        harness.transcript(TranscriptFeed::Started);
        harness.handle.collapse_to_closed().unwrap();
        let snapshot = harness.flush().await;

        assert_eq!(snapshot.state, OverlayState::Closed);
        assert!(snapshot.active_ids.is_empty());
        assert!(snapshot.plugins.iter().all(|p| !p.state.is_active && !p.state.is_pulsing));

        let collapsed = harness.bus.last_for(event_names::COLLAPSED).unwrap();
        assert_eq!(collapsed["reason"], "host");
        assert_eq!(collapsed["deactivated"].as_array().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_expand_and_shrink() {
        let harness = Harness::with_call_and_transcript();
        harness.call(CallStateEvent::ringing("1"));
        harness.transcript(TranscriptFeed::Started);
        harness.handle.expand().unwrap();
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Expanded);

        harness.handle.shrink().unwrap();
        sleep(Duration::from_millis(130)).await;
        assert_eq!(harness.flush().await.state, OverlayState::Opened);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_reaches_plugin() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(DemoPlugin::new("d").active(false));
        });
        harness.handle.click("d").unwrap();
        harness.handle.click("missing").unwrap();
        let snapshot = harness.flush().await;

        let demo = snapshot.plugin("d").unwrap();
        assert_eq!(demo.content["clicks"], 1);
        assert_eq!(demo.content["created"], 1);
        assert!(demo.state.is_pulsing);
        assert!(harness.bus.last_for(event_names::PLUGIN_UPDATED).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_plugin_timer_deactivates_demo() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(DemoPlugin::new("d").active(false).deactivate_after(Duration::from_secs(1)));
        });
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        sleep(Duration::from_millis(1_100)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Closed);
        assert!(!snapshot.is_active("d"));
        assert_eq!(snapshot.plugin("d").unwrap().content["events"], 1);
    }
}

// =============================================================================
// Plugins and Sources
// =============================================================================

mod plugins {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_call_source_is_forwarded() {
        let (tx, source) = ChannelSource::<CallStateEvent>::channel();
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(CallPlugin::new(Arc::new(source)));
        });
        harness.flush().await;

        tx.send(CallStateEvent::ringing("555")).await.unwrap();
        let mut rx = harness.handle.subscribe();
        let snapshot = tokio::time::timeout(
            Duration::from_secs(1),
            rx.wait_for(|s| s.is_active(CALL_PLUGIN_ID)),
        )
        .await
        .expect("ringing forwarded")
        .unwrap()
        .clone();

        assert_eq!(snapshot.state, OverlayState::Opened);
        assert_eq!(snapshot.plugin(CALL_PLUGIN_ID).unwrap().content["phoneNumber"], "555");
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_is_inert() {
        let harness = Harness::start(CoordinatorConfig::default(), |c| {
            c.register(CallPlugin::new(Arc::new(DeniedSource::new("READ_PHONE_STATE"))));
        });
        harness.call(CallStateEvent::ringing("1"));
        let snapshot = harness.flush().await;

        let call = snapshot.plugin(CALL_PLUGIN_ID).unwrap();
        assert_eq!(call.content["demo"], true);
        assert!(!call.state.is_active);
        assert_eq!(snapshot.state, OverlayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_stop_hides_after_delay() {
        let harness = Harness::with_call_and_transcript();
        harness.transcript(TranscriptFeed::Started);
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        harness.transcript(TranscriptFeed::Stopped);
        sleep(Duration::from_millis(2_900)).await;
        let snapshot = harness.flush().await;
        assert!(snapshot.is_active(TRANSCRIPT_PLUGIN_ID));

        sleep(Duration::from_millis(200)).await;
        let snapshot = harness.flush().await;
        assert!(!snapshot.is_active(TRANSCRIPT_PLUGIN_ID));
        assert_eq!(snapshot.state, OverlayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_restart_cancels_hide() {
        let harness = Harness::with_call_and_transcript();
        harness.transcript(TranscriptFeed::Started);
        harness.transcript(TranscriptFeed::Stopped);
        harness.flush().await;

        sleep(Duration::from_secs(1)).await;
        harness.transcript(TranscriptFeed::Started);
        sleep(Duration::from_secs(5)).await;

        let snapshot = harness.flush().await;
        assert!(snapshot.is_active(TRANSCRIPT_PLUGIN_ID));
        assert_eq!(snapshot.state, OverlayState::Opened);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_summary_fallback() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        harness.notifications(Arc::new(NullSummarizer)).posted(notification("n1")).unwrap();
        sleep(Duration::from_millis(10)).await;
        let snapshot = harness.flush().await;

        let view = snapshot.plugin("notification:n1").unwrap();
        assert!(view.state.has_ai_content);
        assert_eq!(view.content["loading"], false);
        assert_eq!(view.content["summary"]["source"], "fallback");
        assert_eq!(view.content["actionItemsCount"], 1);
        assert_eq!(view.content["scheduledItemsCount"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_survives_check_while_expanded() {
        let config = CoordinatorConfig {
            notification_auto_close_secs: 0,
            ..CoordinatorConfig::default()
        };
        let harness = Harness::start(config, |_| {});
        harness.notifications(Arc::new(NullSummarizer)).posted(notification("n1")).unwrap();
        harness.handle.long_press("notification:n1", RenderContext::default()).unwrap();
        assert_eq!(harness.flush().await.state, OverlayState::Expanded);

        sleep(Duration::from_secs(9)).await;
        let snapshot = harness.flush().await;
        assert_eq!(snapshot.state, OverlayState::Expanded);
        assert!(snapshot.is_active("notification:n1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_notification_removed() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        let adapter = harness.notifications(Arc::new(SlowSummarizer));
        adapter.posted(notification("n1")).unwrap();
        adapter.dismissed("n1").unwrap();
        let snapshot = harness.flush().await;

        assert!(snapshot.plugin("notification:n1").is_none());
        assert_eq!(snapshot.state, OverlayState::Closed);
        assert_eq!(harness.bus.events_for(event_names::PLUGIN_REMOVED).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_for_old_instance_discarded() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        let adapter = harness.notifications(Arc::new(SlowSummarizer));
        adapter.posted(notification("n1")).unwrap();
        adapter.dismissed("n1").unwrap();
        adapter.posted(notification("n1")).unwrap();
        harness.flush().await;

        let stale = PluginAddress {
            id: NotificationPlugin::plugin_id("n1"),
            instance: InstanceId(1),
        };
        let late = Summary {
            summary: "stale".to_string(),
            action_items: Vec::new(),
            scheduled_items: Vec::new(),
            priority: Default::default(),
            source: SummarySource::Ai,
        };
        harness
            .handle
            .deliver_to(&stale, PluginEvent::SummaryReady(late))
            .unwrap();
        let snapshot = harness.flush().await;
        let view = snapshot.plugin("notification:n1").unwrap();
        assert_eq!(view.content["loading"], true);
        assert!(!view.state.has_ai_content);

        // The live instance still gets its own result.
        sleep(Duration::from_millis(5_100)).await;
        let snapshot = harness.flush().await;
        let view = snapshot.plugin("notification:n1").unwrap();
        assert_eq!(view.content["summary"]["summary"], "AI: Standup");
        assert!(view.state.has_ai_content);
    }

    #[tokio::test(start_paused = true)]
    async fn test_added_events_carry_kind() {
        let harness = Harness::with_call_and_transcript();
        harness.notifications(Arc::new(NullSummarizer)).posted(notification("n1")).unwrap();
        harness.flush().await;

        let kinds: Vec<String> = harness
            .bus
            .events_for(event_names::PLUGIN_ADDED)
            .iter()
            .map(|e| e.payload["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["notification"]);
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_tears_down_and_closes_mailbox() {
        let harness = Harness::with_call_and_transcript();
        harness.call(CallStateEvent::ringing("1"));
        assert_eq!(harness.flush().await.state, OverlayState::Opened);

        harness.handle.shutdown().unwrap();
        harness.task.await.unwrap();

        let last = harness.handle.snapshot();
        assert!(last.plugins.is_empty());
        assert_eq!(last.state, OverlayState::Closed);
        assert!(matches!(harness.handle.tap(), Err(CoordinatorError::MailboxClosed)));
        assert!(matches!(harness.handle.flush().await, Err(CoordinatorError::MailboxClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revision_increases_per_command() {
        let harness = Harness::start(CoordinatorConfig::default(), |_| {});
        let first = harness.flush().await.revision;
        harness.handle.tap().unwrap();
        harness.handle.tap().unwrap();
        let second = harness.flush().await.revision;
        assert_eq!(second, first + 2);
    }
}
