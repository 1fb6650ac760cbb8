// Configuration submission to the idea-generation service

use super::Transport;
use crate::error::WorkflowError;
use crate::parsers::{flatten_envelope, EnvelopeIdeas};
use serde_json::Value;

/// POST the configuration and flatten the ideas out of the reply.
///
/// Non-2xx and network failures are transport errors; a 2xx reply that is
/// not JSON or not a well-formed envelope is a schema error carrying the
/// raw body.
pub async fn request_ideas(
    transport: &dyn Transport,
    endpoint: &str,
    configuration: &Value,
) -> Result<EnvelopeIdeas, WorkflowError> {
    log::info!("Sending configuration to idea endpoint {}", endpoint);

    let response = transport
        .post_json(endpoint, configuration)
        .await
        .map_err(|e| {
            log::warn!("Idea endpoint {} unreachable: {}", endpoint, e);
            WorkflowError::transport_message(e)
        })?;

    if !response.is_success() {
        log::warn!(
            "Idea endpoint {} returned HTTP {} {}",
            endpoint,
            response.status,
            response.status_text
        );
        return Err(WorkflowError::transport_status(response.status));
    }

    let payload: Value =
        serde_json::from_str(&response.body).map_err(|e| WorkflowError::Schema {
            reason: format!("response is not valid JSON: {}", e),
            raw: response.body.clone(),
        })?;

    let ideas = flatten_envelope(&payload)?;
    log::info!(
        "Received {} ideas from {} of {} entries",
        ideas.ideas.len(),
        ideas.contributing_entries,
        ideas.entries
    );
    Ok(ideas)
}
