// Clients for the two remote generation services
//
// The HTTP layer sits behind the `Transport` trait so the request pipeline
// can be exercised without a network.

pub mod content;
pub mod ideas;

use async_trait::async_trait;
use serde_json::Value;

pub use content::{deliver, AttemptOutcome, AttemptRecord, Delivery, DeliveryResult};
pub use ideas::request_ideas;

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a JSON body with `POST`.
///
/// `Err` means the exchange itself failed (connection refused, DNS, reset);
/// any HTTP status, including 4xx/5xx, is a successful exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, String>;
}

/// reqwest-backed transport.
///
/// Built without a request timeout: a hung endpoint keeps its idea
/// `Generating` until the connection is closed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("idea-forge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: text,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays canned replies per URL and records every request
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<HashMap<String, VecDeque<Result<TransportResponse, String>>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, url: &str, reply: Result<TransportResponse, String>) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        pub fn ok(self, url: &str, body: &str) -> Self {
            self.reply(url, Ok(response(200, "OK", body)))
        }

        pub fn status(self, url: &str, status: u16, text: &str) -> Self {
            self.reply(url, Ok(response(status, text, "")))
        }

        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub fn response(status: u16, status_text: &str, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, String> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.replies
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Err(format!("no scripted reply for {}", url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::response;

    #[test]
    fn test_is_success_range() {
        assert!(response(200, "OK", "").is_success());
        assert!(response(204, "No Content", "").is_success());
        assert!(!response(199, "", "").is_success());
        assert!(!response(301, "Moved Permanently", "").is_success());
        assert!(!response(500, "Internal Server Error", "").is_success());
    }
}
