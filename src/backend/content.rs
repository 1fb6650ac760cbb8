// Content delivery with ordered endpoint fallback
//
// Every candidate endpoint is tried in order until one answers 2xx with a
// non-blank body. Network failures, non-2xx statuses and blank 2xx bodies
// all fall through to the next candidate; the reason of the last failure is
// what the caller reports on exhaustion.

use super::{Transport, TransportResponse};
use crate::error::WorkflowError;
use crate::models::GenerationRequest;
use crate::utils::preview;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Classification of a single endpoint attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    NetworkError { message: String },
    HttpStatus { status: u16, status_text: String },
    EmptyBody,
}

impl AttemptOutcome {
    pub fn classify(response: &TransportResponse) -> Self {
        if !response.is_success() {
            return AttemptOutcome::HttpStatus {
                status: response.status,
                status_text: response.status_text.clone(),
            };
        }
        if response.body.trim().is_empty() {
            return AttemptOutcome::EmptyBody;
        }
        AttemptOutcome::Success
    }

    /// Human-readable failure reason; `None` for a success
    pub fn reason(&self) -> Option<String> {
        match self {
            AttemptOutcome::Success => None,
            AttemptOutcome::NetworkError { message } => Some(message.clone()),
            AttemptOutcome::HttpStatus {
                status,
                status_text,
            } => Some(format!("HTTP {}: {}", status, status_text)),
            AttemptOutcome::EmptyBody => Some(WorkflowError::EmptyContent.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub endpoint: String,
    pub outcome: AttemptOutcome,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered { endpoint: String, body: String },
    Exhausted { reason: String },
}

/// Result of walking the endpoint list, with one record per attempt
#[derive(Debug, Clone)]
pub struct Delivery {
    pub result: DeliveryResult,
    pub attempts: Vec<AttemptRecord>,
}

/// Request content from `endpoints` in order, stopping at the first success
pub async fn deliver(
    transport: &dyn Transport,
    endpoints: &[String],
    request: &GenerationRequest<'_>,
) -> Delivery {
    let mut attempts = Vec::with_capacity(endpoints.len());

    let body = match serde_json::to_value(request) {
        Ok(body) => body,
        Err(e) => {
            return Delivery {
                result: DeliveryResult::Exhausted {
                    reason: format!("Failed to encode generation request: {}", e),
                },
                attempts,
            }
        }
    };

    let mut last_reason: Option<String> = None;

    for (i, endpoint) in endpoints.iter().enumerate() {
        log::info!(
            "Requesting content for \"{}\" from {} ({}/{})",
            request.idea_title,
            endpoint,
            i + 1,
            endpoints.len()
        );

        let (outcome, response_body) = match transport.post_json(endpoint, &body).await {
            Ok(response) => {
                let outcome = AttemptOutcome::classify(&response);
                (outcome, Some(response.body))
            }
            Err(message) => (AttemptOutcome::NetworkError { message }, None),
        };

        attempts.push(AttemptRecord {
            endpoint: endpoint.clone(),
            outcome: outcome.clone(),
            finished_at: Utc::now(),
        });

        match outcome.reason() {
            None => {
                let body = response_body.unwrap_or_default();
                log::info!(
                    "Content received from {}, length: {} ({})",
                    endpoint,
                    body.len(),
                    preview(&body, 60)
                );
                return Delivery {
                    result: DeliveryResult::Delivered {
                        endpoint: endpoint.clone(),
                        body,
                    },
                    attempts,
                };
            }
            Some(reason) => {
                log::warn!("Content endpoint {} failed: {}", endpoint, reason);
                last_reason = Some(reason);
            }
        }
    }

    let reason = last_reason.unwrap_or_else(|| "No content endpoints configured".to_string());
    log::warn!(
        "All {} content endpoints failed for \"{}\": {}",
        endpoints.len(),
        request.idea_title,
        reason
    );
    Delivery {
        result: DeliveryResult::Exhausted { reason },
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{response, ScriptedTransport};
    use serde_json::{json, Value};

    fn endpoints(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("http://content.test/{}", i)).collect()
    }

    async fn run(transport: &ScriptedTransport, endpoints: &[String]) -> Delivery {
        let config = json!({ "brand": "acme" });
        let idea = json!({ "title": "Rust" });
        let request = GenerationRequest {
            configuration: &config,
            idea: &idea,
            idea_title: "Rust",
        };
        deliver(transport, endpoints, &request).await
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            AttemptOutcome::classify(&response(200, "OK", "text")),
            AttemptOutcome::Success
        );
        assert_eq!(
            AttemptOutcome::classify(&response(200, "OK", " \n\t ")),
            AttemptOutcome::EmptyBody
        );
        assert_eq!(
            AttemptOutcome::classify(&response(404, "Not Found", "gone")),
            AttemptOutcome::HttpStatus {
                status: 404,
                status_text: "Not Found".to_string()
            }
        );
    }

    #[test]
    fn test_reasons() {
        let http = AttemptOutcome::HttpStatus {
            status: 502,
            status_text: "Bad Gateway".to_string(),
        };
        assert_eq!(http.reason().unwrap(), "HTTP 502: Bad Gateway");
        assert_eq!(
            AttemptOutcome::EmptyBody.reason().unwrap(),
            "Backend returned empty content"
        );
        assert_eq!(AttemptOutcome::Success.reason(), None);
    }

    #[tokio::test]
    async fn test_falls_back_to_third_endpoint() {
        let urls = endpoints(3);
        let transport = ScriptedTransport::new()
            .status(&urls[0], 500, "Internal Server Error")
            .status(&urls[1], 404, "Not Found")
            .ok(&urls[2], "# Article");

        let delivery = run(&transport, &urls).await;
        assert_eq!(
            delivery.result,
            DeliveryResult::Delivered {
                endpoint: urls[2].clone(),
                body: "# Article".to_string()
            }
        );
        assert_eq!(delivery.attempts.len(), 3);
        assert_eq!(delivery.attempts[2].outcome, AttemptOutcome::Success);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let urls = endpoints(2);
        let transport = ScriptedTransport::new().ok(&urls[0], "done").ok(&urls[1], "unused");

        let delivery = run(&transport, &urls).await;
        assert!(matches!(delivery.result, DeliveryResult::Delivered { .. }));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_reason() {
        let urls = endpoints(2);
        let transport = ScriptedTransport::new()
            .reply(&urls[0], Err("connection refused".to_string()))
            .ok(&urls[1], "   ");

        let delivery = run(&transport, &urls).await;
        assert_eq!(
            delivery.result,
            DeliveryResult::Exhausted {
                reason: "Backend returned empty content".to_string()
            }
        );
        assert_eq!(
            delivery.attempts[0].outcome,
            AttemptOutcome::NetworkError {
                message: "connection refused".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_all_blank_bodies() {
        let urls = endpoints(3);
        let transport = ScriptedTransport::new()
            .ok(&urls[0], "")
            .ok(&urls[1], "\n")
            .ok(&urls[2], "  ");

        let delivery = run(&transport, &urls).await;
        assert!(matches!(delivery.result, DeliveryResult::Exhausted { .. }));
        assert!(delivery
            .attempts
            .iter()
            .all(|a| a.outcome == AttemptOutcome::EmptyBody));
    }

    #[tokio::test]
    async fn test_request_body_wire_names() {
        let urls = endpoints(1);
        let transport = ScriptedTransport::new().ok(&urls[0], "ok");
        run(&transport, &urls).await;

        let (_, body): (String, Value) = transport.calls().remove(0);
        assert_eq!(body["config"]["brand"], "acme");
        assert_eq!(body["ideas"]["title"], "Rust");
        assert_eq!(body["idea_title"], "Rust");
    }

    #[tokio::test]
    async fn test_no_endpoints() {
        let transport = ScriptedTransport::new();
        let delivery = run(&transport, &[]).await;
        assert!(delivery.attempts.is_empty());
        assert!(matches!(delivery.result, DeliveryResult::Exhausted { .. }));
    }
}
