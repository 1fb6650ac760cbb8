// Event types and payload structures for real-time updates
// These are broadcast via WebSocket to connected clients

use crate::models::{IdeaStatus, Notification};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

// Event name constants
pub const EVENT_BATCH_REPLACED: &str = "batch:replaced";
pub const EVENT_IDEA_STATUS_CHANGED: &str = "idea:status_changed";
pub const EVENT_CONTENT_GENERATED: &str = "content:generated";
pub const EVENT_CONTENT_FAILED: &str = "content:failed";
pub const EVENT_NOTIFICATION: &str = "notification";

/// Payload for batch replaced events.
///
/// Sent when a submission resolves; `error` is set when it failed and the
/// batch is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReplacedPayload {
    pub batch_token: u64,
    pub idea_count: usize,
    pub error: Option<String>,
}

/// Payload for idea status change events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaStatusChangedPayload {
    pub index: usize,
    pub batch_token: u64,
    pub old_status: IdeaStatus,
    pub new_status: IdeaStatus,
}

/// Payload for content generated events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentGeneratedPayload {
    pub index: usize,
    pub idea_title: String,
    pub endpoint: String,
    pub markup: String,
}

/// Payload for content failed events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFailedPayload {
    pub index: usize,
    pub idea_title: String,
    pub reason: String,
    pub attempts: usize,
}

/// Receiver of workflow events.
///
/// The server forwards them to WebSocket clients; the CLI only logs them.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Serialize `payload` and hand it to `sink`
pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, value),
        Err(e) => log::warn!("Failed to serialize {} payload: {}", event, e),
    }
}

pub fn emit_notification(sink: &dyn EventSink, notification: &Notification) {
    emit_event(sink, EVENT_NOTIFICATION, notification);
}

/// Writes every event to the log at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &str, payload: Value) {
        log::debug!("event {}: {}", event, payload);
    }
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        crate::utils::lock_mutex_recover(&self.events).clone()
    }

    /// Names of recorded events, in order
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &str, payload: Value) {
        crate::utils::lock_mutex_recover(&self.events).push((event.to_string(), payload));
    }
}
