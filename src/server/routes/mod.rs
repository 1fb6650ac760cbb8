//! Command routing modules
//!
//! - workflow_routes: configuration submission, session views, settings
//! - generation_routes: content generation, retry and preview

pub mod generation_routes;
pub mod workflow_routes;

use serde_json::Value;

use super::ServerAppState;
use crate::utils::ResultExt;

/// Extract a required argument from JSON args
pub fn get_arg<T: serde::de::DeserializeOwned>(args: &Value, name: &str) -> Result<T, String> {
    serde_json::from_value(
        args.get(name)
            .ok_or_else(|| format!("Missing argument: {}", name))?
            .clone(),
    )
    .with_context(&format!("Invalid argument {}", name))
}

// =============================================================================
// Command Routing Macros
// =============================================================================

/// Routes an async workflow call: awaits it, stringifies the error,
/// serializes the result
#[macro_export]
macro_rules! route_async {
    ($handler:expr) => {{
        let result = $handler.await.map_err(|e| e.to_string())?;
        serde_json::to_value(result).map_err(|e| e.to_string())
    }};
}

/// Routes a sync command
#[macro_export]
macro_rules! route_sync {
    ($handler:expr) => {{
        let result = $handler;
        serde_json::to_value(result).map_err(|e| e.to_string())
    }};
}

/// Routes a command that returns ()
#[macro_export]
macro_rules! route_unit {
    ($handler:expr) => {{
        $handler;
        Ok(serde_json::Value::Null)
    }};
}

pub use route_async;
pub use route_sync;
pub use route_unit;

/// Route a command to its implementation by dispatching to the appropriate sub-router
pub async fn route_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, String> {
    if workflow_routes::is_workflow_command(cmd) {
        return workflow_routes::route_workflow_command(cmd, args, state).await;
    }

    if generation_routes::is_generation_command(cmd) {
        return generation_routes::route_generation_command(cmd, args, state).await;
    }

    Err(format!("Unknown command: {}", cmd))
}
