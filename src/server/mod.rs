//! HTTP/WebSocket server for the idea and content workflow
//!
//! Clients drive the single in-memory session through the command proxy
//! and follow progress on the event socket.

mod events;
mod proxy;
pub mod routes;
pub mod state;

pub use events::{EventBroadcaster, ServerEvent};
pub use proxy::{invoke_handler, InvokeRequest, InvokeResponse};
pub use state::ServerAppState;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Version information for the server
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    version: String,
    content_endpoints: usize,
}

/// Build the router with all endpoints and the CORS layer
pub fn build_router(state: ServerAppState) -> Router {
    let origins = &state.settings.cors_origins;
    let cors = if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE, ACCEPT])
    } else {
        let allowed_origins: Vec<HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE, ACCEPT])
    };

    Router::new()
        .route("/api/invoke", post(proxy::invoke_handler))
        .route("/ws/events", get(events::ws_handler))
        .route("/health", get(health_handler))
        .route("/api/version", get(version_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener until shutdown is requested
pub async fn serve(listener: TcpListener, state: ServerAppState) -> Result<(), String> {
    let shutdown_state = state.shutdown_state.clone();
    let shutdown_signal = async move {
        shutdown_state.wait_for_shutdown().await;
        log::info!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Run the HTTP/WebSocket server on the configured address
pub async fn run_server(state: ServerAppState) -> Result<(), String> {
    let settings = state.settings.clone();
    let addr: SocketAddr = format!("{}:{}", settings.bind, settings.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let cors_display = if settings.cors_origins.is_empty() {
        "*".to_string()
    } else {
        settings.cors_origins.join(", ")
    };

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Idea Forge Server                        ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║                                                               ║");
    println!("║  Server URL: http://{:<42}║", addr);
    println!("║  Idea endpoint: {:<46}║", settings.idea_endpoint);
    println!("║  Content endpoints: {:<42}║", settings.content_endpoints.len());
    println!("║  CORS Origins: {:<47}║", cors_display);
    println!("║                                                               ║");
    println!("║  Endpoints:                                                   ║");
    println!("║    POST /api/invoke      - Command proxy                     ║");
    println!("║    GET  /api/version     - Server version info               ║");
    println!("║    GET  /ws/events       - WebSocket events                  ║");
    println!("║    GET  /health          - Health check                      ║");
    println!("║                                                               ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    serve(listener, state).await
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn version_handler(
    axum::extract::State(state): axum::extract::State<ServerAppState>,
) -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        content_endpoints: state.settings.content_endpoints.len(),
    })
}
