//! WebSocket event broadcaster for real-time updates
//!
//! Bridges workflow events to WebSocket clients.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use super::ServerAppState;
use crate::events::EventSink;

const CHANNEL_CAPACITY: usize = 256;

/// A server event that can be broadcast to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    /// Event type (e.g., "idea:status_changed", "notification")
    pub event: String,
    pub payload: Value,
}

/// Broadcasts events to all connected WebSocket clients
pub struct EventBroadcaster {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event_type: &str, payload: Value) {
        let event = ServerEvent {
            event: event_type.to_string(),
            payload,
        };

        // No receivers is fine: nobody is watching
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBroadcaster {
    fn emit(&self, event: &str, payload: Value) {
        log::debug!(
            "Broadcasting {} to {} clients",
            event,
            self.receiver_count()
        );
        self.broadcast(event, payload);
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ServerAppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(socket: WebSocket, state: ServerAppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.broadcaster.subscribe();

    log::info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("Failed to serialize event: {}", e),
                },
                // A slow client only misses events; it can resync with get_session
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("WebSocket client lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Clients never send commands over the socket; only watch for close
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                log::info!("WebSocket client disconnected");
                break;
            }
            Ok(Message::Text(text)) => log::debug!("Ignoring client message: {}", text),
            Ok(_) => {}
            Err(e) => {
                log::warn!("WebSocket error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    log::info!("WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_broadcaster_delivers_to_subscribers() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.emit("idea:status_changed", json!({ "index": 1 }));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "idea:status_changed");
        assert_eq!(event.payload["index"], 1);
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(broadcaster.receiver_count(), 0);
        broadcaster.broadcast("notification", json!(null));
    }

    #[test]
    fn test_server_event_serialization() {
        let event = ServerEvent {
            event: "content:failed".to_string(),
            payload: json!({ "reason": "HTTP 500: Internal Server Error" }),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("content:failed"));
        assert!(json.contains("HTTP 500"));
    }
}
