//! Workflow command routing
//!
//! Handles: submit_config, get_session, get_ideas, get_rendered_content,
//! close_article, dismiss_notification, get_settings

use serde_json::Value;

use super::{get_arg, route_async, route_sync, route_unit, ServerAppState};

/// Route workflow commands
pub async fn route_workflow_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, String> {
    match cmd {
        "submit_config" => {
            let file_name: String = get_arg(&args, "fileName")?;
            let contents: String = get_arg(&args, "contents")?;
            route_async!(state.workflow.submit_file(&file_name, &contents))
        }

        "get_session" => route_sync!(state.workflow.snapshot()),

        "get_ideas" => route_sync!(state.workflow.ideas()),

        "get_rendered_content" => route_sync!(state.workflow.rendered_content()),

        "close_article" => route_unit!(state.workflow.close_article()),

        "dismiss_notification" => route_unit!(state.workflow.dismiss_notification()),

        "get_settings" => route_sync!(state.settings.as_ref()),

        _ => Err(format!("Unknown workflow command: {}", cmd)),
    }
}

/// Check if a command is a workflow command
pub fn is_workflow_command(cmd: &str) -> bool {
    matches!(
        cmd,
        "submit_config"
            | "get_session"
            | "get_ideas"
            | "get_rendered_content"
            | "close_article"
            | "dismiss_notification"
            | "get_settings"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedTransport;
    use crate::config::Settings;
    use crate::shutdown::ShutdownState;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(transport: ScriptedTransport) -> ServerAppState {
        let settings = Settings {
            idea_endpoint: "http://ideas.test/set".to_string(),
            ..Default::default()
        };
        ServerAppState::new(settings, Arc::new(transport), ShutdownState::new())
    }

    #[test]
    fn test_is_workflow_command() {
        assert!(is_workflow_command("submit_config"));
        assert!(is_workflow_command("get_settings"));
        assert!(!is_workflow_command("generate_content"));
    }

    #[tokio::test]
    async fn test_submit_config_and_read_back() {
        let envelope = json!({
            "data": [ { "output": [ { "output": { "ideas": [ { "title": "One" } ] } } ] } ]
        });
        let state = state_with(
            ScriptedTransport::new().ok("http://ideas.test/set", &envelope.to_string()),
        );

        let args = json!({ "fileName": "brand.json", "contents": "{\"brand\": \"acme\"}" });
        let result = route_workflow_command("submit_config", args, &state)
            .await
            .unwrap();
        assert_eq!(result["outcome"], "applied");
        assert_eq!(result["ideaCount"], 1);

        let ideas = route_workflow_command("get_ideas", Value::Null, &state)
            .await
            .unwrap();
        assert_eq!(ideas[0]["title"], "One");
        assert_eq!(ideas[0]["status"], "pending");
        assert_eq!(ideas[0]["canGenerate"], true);

        let session = route_workflow_command("get_session", Value::Null, &state)
            .await
            .unwrap();
        assert_eq!(
            session["resultStatus"]["message"],
            "Successfully displayed 1 ideas."
        );
    }

    #[tokio::test]
    async fn test_submit_config_rejects_non_json_name() {
        let state = state_with(ScriptedTransport::new());
        let args = json!({ "fileName": "brand.txt", "contents": "{}" });
        let err = route_workflow_command("submit_config", args, &state)
            .await
            .unwrap_err();
        assert_eq!(err, "Please select a JSON file.");
    }

    #[tokio::test]
    async fn test_rendered_content_empty_by_default() {
        let state = state_with(ScriptedTransport::new());
        let result = route_workflow_command("get_rendered_content", Value::Null, &state)
            .await
            .unwrap();
        assert!(result.is_null());

        let unit = route_workflow_command("close_article", Value::Null, &state)
            .await
            .unwrap();
        assert!(unit.is_null());
    }

    #[tokio::test]
    async fn test_get_settings() {
        let state = state_with(ScriptedTransport::new());
        let result = route_workflow_command("get_settings", Value::Null, &state)
            .await
            .unwrap();
        assert_eq!(result["ideaEndpoint"], "http://ideas.test/set");
        assert!(result["contentEndpoints"].is_array());
    }
}
