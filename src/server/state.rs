//! Server application state shared across handlers

use super::events::EventBroadcaster;
use crate::backend::Transport;
use crate::config::Settings;
use crate::shutdown::ShutdownState;
use crate::workflow::Workflow;
use std::sync::Arc;

/// Shared state for the server: the single in-memory session and the
/// channels around it
#[derive(Clone)]
pub struct ServerAppState {
    pub workflow: Arc<Workflow>,

    /// Event broadcaster for WebSocket clients
    pub broadcaster: Arc<EventBroadcaster>,

    pub shutdown_state: ShutdownState,

    /// Effective settings the server was started with
    pub settings: Arc<Settings>,
}

impl ServerAppState {
    /// Wire a workflow whose events go to the WebSocket broadcaster
    pub fn new(
        settings: Settings,
        transport: Arc<dyn Transport>,
        shutdown_state: ShutdownState,
    ) -> Self {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let workflow = Arc::new(Workflow::new(&settings, transport, broadcaster.clone()));

        Self {
            workflow,
            broadcaster,
            shutdown_state,
            settings: Arc::new(settings),
        }
    }
}
