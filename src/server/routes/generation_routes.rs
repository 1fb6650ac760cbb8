//! Generation command routing
//!
//! Handles: generate_content, retry_generation, render_preview
//!
//! Generation replies as soon as the idea is `Generating`; the request
//! itself runs on its own task and reports through events.

use serde::Serialize;
use serde_json::Value;

use super::{get_arg, route_sync, ServerAppState};
use crate::session::GenerationTicket;
use crate::transform::render_content;
use crate::workflow::GenerationOutcome;

/// Reply to an accepted generation command
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAccepted {
    pub index: usize,
    pub batch_token: u64,
    pub idea_title: String,
}

/// Route generation commands
pub async fn route_generation_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, String> {
    match cmd {
        "generate_content" => {
            let index: usize = get_arg(&args, "index")?;
            let ticket = state
                .workflow
                .start_generation(index)
                .map_err(|e| e.to_string())?;
            route_sync!(spawn_generation(state, ticket))
        }

        "retry_generation" => {
            let index: usize = get_arg(&args, "index")?;
            let ticket = state
                .workflow
                .start_retry(index)
                .map_err(|e| e.to_string())?;
            route_sync!(spawn_generation(state, ticket))
        }

        "render_preview" => {
            let text: String = get_arg(&args, "text")?;
            route_sync!(render_content(&text))
        }

        _ => Err(format!("Unknown generation command: {}", cmd)),
    }
}

/// Check if a command is a generation command
pub fn is_generation_command(cmd: &str) -> bool {
    matches!(
        cmd,
        "generate_content" | "retry_generation" | "render_preview"
    )
}

fn spawn_generation(state: &ServerAppState, ticket: GenerationTicket) -> GenerationAccepted {
    let accepted = GenerationAccepted {
        index: ticket.index,
        batch_token: ticket.token,
        idea_title: ticket.title().to_string(),
    };

    let workflow = state.workflow.clone();
    tokio::spawn(async move {
        match workflow.run_generation(ticket).await {
            GenerationOutcome::Completed { index, endpoint, .. } => {
                log::debug!("Background generation for idea {} done via {}", index, endpoint)
            }
            GenerationOutcome::Failed { index, reason, .. } => {
                log::debug!("Background generation for idea {} failed: {}", index, reason)
            }
            GenerationOutcome::Stale { index } => {
                log::debug!("Background generation for idea {} was stale", index)
            }
        }
    });

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedTransport;
    use crate::config::Settings;
    use crate::models::IdeaStatus;
    use crate::shutdown::ShutdownState;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    const IDEAS: &str = "http://ideas.test/set";
    const CONTENT: &str = "http://content.test/1";

    async fn submitted_state(transport: ScriptedTransport) -> ServerAppState {
        let envelope = json!({
            "data": [ { "output": [ { "output": { "ideas": [ { "title": "One" } ] } } ] } ]
        });
        let settings = Settings {
            idea_endpoint: IDEAS.to_string(),
            content_endpoints: vec![CONTENT.to_string()],
            ..Default::default()
        };
        let transport = transport.ok(IDEAS, &envelope.to_string());
        let state = ServerAppState::new(settings, Arc::new(transport), ShutdownState::new());
        state
            .workflow
            .submit_configuration(json!({}))
            .await
            .unwrap();
        state
    }

    async fn wait_for_status(state: &ServerAppState, index: usize, status: IdeaStatus) {
        for _ in 0..100 {
            if state.workflow.ideas()[index].status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("idea {} never reached {}", index, status);
    }

    #[test]
    fn test_is_generation_command() {
        assert!(is_generation_command("generate_content"));
        assert!(is_generation_command("render_preview"));
        assert!(!is_generation_command("get_session"));
    }

    #[tokio::test]
    async fn test_render_preview() {
        let state = submitted_state(ScriptedTransport::new()).await;
        let result = route_generation_command("render_preview", json!({ "text": "*hi*" }), &state)
            .await
            .unwrap();
        assert_eq!(result, json!("<p><em>hi</em></p>"));
    }

    #[tokio::test]
    async fn test_generate_content_runs_in_background() {
        let state = submitted_state(ScriptedTransport::new().ok(CONTENT, "Body")).await;

        let result = route_generation_command("generate_content", json!({ "index": 0 }), &state)
            .await
            .unwrap();
        assert_eq!(result["index"], 0);
        assert_eq!(result["ideaTitle"], "One");

        wait_for_status(&state, 0, IdeaStatus::Completed).await;
        let rendered = state.workflow.rendered_content().unwrap();
        assert_eq!(rendered.markup, "<p>Body</p>");
    }

    #[tokio::test]
    async fn test_generate_content_without_configuration() {
        let state = ServerAppState::new(
            Settings::default(),
            Arc::new(ScriptedTransport::new()),
            ShutdownState::new(),
        );
        let err = route_generation_command("generate_content", json!({ "index": 0 }), &state)
            .await
            .unwrap_err();
        assert_eq!(err, "Please upload a configuration file first.");
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let transport = ScriptedTransport::new()
            .status(CONTENT, 500, "Internal Server Error")
            .ok(CONTENT, "Second try");
        let state = submitted_state(transport).await;

        route_generation_command("generate_content", json!({ "index": 0 }), &state)
            .await
            .unwrap();
        wait_for_status(&state, 0, IdeaStatus::Error).await;
        let note = state.workflow.snapshot().notification.unwrap();
        assert_eq!(note.retry_idea, Some(0));
        assert!(note.message.contains("HTTP 500: Internal Server Error"));

        route_generation_command("retry_generation", json!({ "index": 0 }), &state)
            .await
            .unwrap();
        wait_for_status(&state, 0, IdeaStatus::Completed).await;
    }
}
