//! Fire-and-forget analytics.
//!
//! `Analytics::track` hands events to a background task over an unbounded channel, so tracking
//! never blocks or fails the caller. The task forwards every event to the primary data-layer
//! queue and mirrors it to up to `MAX_MIRRORS` additional sinks.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AnalyticsError;

pub const MAX_MIRRORS: usize = 2;

/// One analytics event: a name plus flat properties, serialized as `{"event": name, ...data}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub event: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl AnalyticsEvent {
    pub fn new(event: &str, data: Map<String, Value>) -> Self {
        Self {
            event: event.to_owned(),
            data,
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// The page's process-wide event queue. Tag managers drain it; tests read it back.
#[derive(Default)]
pub struct DataLayer {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl DataLayer {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for DataLayer {
    fn name(&self) -> &'static str {
        "data_layer"
    }

    async fn send(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events
            .lock()
            .map_err(|_| AnalyticsError::SinkClosed(self.name()))?
            .push(event);

        Ok(())
    }
}

/// Writes every event to the log. Useful as a mirror while debugging a landing page.
pub struct LogSink {}

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        info!("event tracked: {} {:?}", event.event, event.data);

        Ok(())
    }
}

/// Handle used by the pipeline to emit analytics events.
#[derive(Clone)]
pub struct Analytics {
    sender: mpsc::UnboundedSender<AnalyticsEvent>,
}

impl Analytics {
    /// Start the forwarding task. Mirrors beyond `MAX_MIRRORS` are dropped with a warning.
    pub fn spawn(
        primary: Arc<dyn EventSink>,
        mut mirrors: Vec<Arc<dyn EventSink>>,
    ) -> (Self, JoinHandle<()>) {
        if mirrors.len() > MAX_MIRRORS {
            warn!(
                "{} analytics mirrors configured, only the first {} will receive events",
                mirrors.len(),
                MAX_MIRRORS
            );
            mirrors.truncate(MAX_MIRRORS);
        }

        let (sender, mut receiver) = mpsc::unbounded_channel::<AnalyticsEvent>();
        let sinks: Vec<Arc<dyn EventSink>> = std::iter::once(primary).chain(mirrors).collect();

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                metrics::counter!("lead_analytics_events_total").increment(1);

                for sink in &sinks {
                    if let Err(error) = sink.send(event.clone()).await {
                        debug!("dropping analytics event {}: {}", event.event, error);
                    }
                }
            }
        });

        (Self { sender }, handle)
    }

    /// An `Analytics` whose events go nowhere.
    pub fn disabled() -> Self {
        let (sender, _) = mpsc::unbounded_channel();

        Self { sender }
    }

    /// Queue an event for delivery. Never blocks and never fails.
    pub fn track(&self, event: &str, data: Map<String, Value>) {
        if self.sender.send(AnalyticsEvent::new(event, data)).is_err() {
            debug!("analytics is shut down, dropping event {}", event);
        }
    }
}
