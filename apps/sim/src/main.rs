//! Drives the coordinator through a scripted phone call and a notification,
//! logging every published snapshot.
//!
//! Configuration is read from the file named by `ISLAND_CONFIG` when set.

use anyhow::Context;
use island_coordinator::plugins::TRANSCRIPT_PLUGIN_ID;
use island_coordinator::{
    CallPlugin, CallStateEvent, CallTranscriptPlugin, ChannelSource, Coordinator, CoordinatorConfig,
    CoordinatorHandle, NotificationAdapter, NotificationInfo, NotificationOptions, OverlaySnapshot,
    RenderContext, TranscriptFeed,
};
use island_events::TracingEventBus;
use island_transcript::SpeakerType;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const STEP: Duration = Duration::from_millis(400);

fn log_snapshot(snapshot: &OverlaySnapshot) {
    let active: Vec<&str> = snapshot.active_ids.iter().map(|id| id.as_str()).collect();
    tracing::info!(
        revision = snapshot.revision,
        state = %snapshot.state,
        closing = snapshot.closing,
        active = ?active,
        bound = ?snapshot.slots.bound.as_ref().map(|id| id.as_str()),
        left = ?snapshot.slots.left.as_ref().map(|id| id.as_str()),
        pulse = ?snapshot.slots.pulse.as_ref().map(|id| id.as_str()),
        "Snapshot"
    );
}

async fn step() {
    tokio::time::sleep(STEP).await;
}

async fn run_call(
    handle: &CoordinatorHandle,
    calls: &mpsc::Sender<CallStateEvent>,
    transcript: &mpsc::Sender<TranscriptFeed>,
) -> anyhow::Result<()> {
    tracing::info!("Incoming call");
    calls.send(CallStateEvent::ringing("+1 555 0100")).await?;
    step().await;

    calls.send(CallStateEvent::offhook()).await?;
    transcript.send(TranscriptFeed::Started).await?;
    step().await;

    let lines = [
        ("Hi, is this a good time?", SpeakerType::Incoming),
        ("Sure, go ahead.", SpeakerType::Outgoing),
        ("Sure, go ahead.", SpeakerType::Outgoing),
        ("Can we move the review to Friday?", SpeakerType::Incoming),
    ];
    for (text, speaker) in lines {
        transcript.send(TranscriptFeed::partial(text, speaker)).await?;
        transcript.send(TranscriptFeed::final_text(text, speaker)).await?;
        step().await;
    }

    handle.long_press(TRANSCRIPT_PLUGIN_ID, RenderContext(serde_json::json!({"source": "sim"})))?;
    step().await;
    handle.tap()?;
    step().await;

    tracing::info!("Call ended");
    transcript.send(TranscriptFeed::Stopped).await?;
    calls.send(CallStateEvent::idle()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,island=debug")),
        )
        .init();

    let config = CoordinatorConfig::from_env_or_default().context("loading coordinator config")?;
    let summarizer = config.build_summarizer();
    tracing::info!(backend = summarizer.name(), "Starting island simulator");

    let (call_tx, call_source) = ChannelSource::<CallStateEvent>::channel();
    let (transcript_tx, transcript_source) = ChannelSource::<TranscriptFeed>::channel();

    let (mut coordinator, handle) = Coordinator::new(config.clone(), Arc::new(TracingEventBus));
    coordinator
        .register(CallPlugin::new(Arc::new(call_source)))
        .register(
            CallTranscriptPlugin::new(config.transcript_hide_delay())
                .with_capacity(config.transcript_capacity)
                .with_source(Arc::new(transcript_source)),
        );
    let task = coordinator.spawn();

    let mut snapshots = handle.subscribe();
    let watcher = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            log_snapshot(&snapshots.borrow_and_update());
        }
    });

    run_call(&handle, &call_tx, &transcript_tx).await?;
    tokio::time::sleep(config.transcript_hide_delay() + STEP).await;

    let notifications = NotificationAdapter::new(
        handle.clone(),
        summarizer,
        NotificationOptions::from_config(&config),
    );
    let id = notifications.posted(NotificationInfo::new(
        "sim-1",
        "Design review",
        "Meeting moved to Friday at 10:30. Bring the mockups.",
        "Calendar",
    ))?;
    step().await;

    let snapshot = handle.flush().await?;
    if let Some(view) = snapshot.plugin(id.as_str()) {
        tracing::info!(content = %view.content, "Notification plugin");
    }

    tokio::time::sleep(config.notification_check_delay() + STEP).await;
    let snapshot = handle.flush().await?;
    tracing::info!(state = %snapshot.state, active = snapshot.active_ids.len(), "Settled");

    handle.shutdown()?;
    task.await.context("coordinator task panicked")?;
    watcher.await.context("snapshot watcher panicked")?;
    Ok(())
}
