// Graceful shutdown handling for signal trapping

use crate::models::IdeaStatus;
use crate::session::SessionSnapshot;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared shutdown state across the application
#[derive(Clone)]
pub struct ShutdownState {
    shutdown_requested: Arc<AtomicBool>,
    cleanup_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            cleanup_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        log::info!("Shutdown requested");
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn mark_cleanup_complete(&self) {
        self.cleanup_complete.store(true, Ordering::SeqCst);
        log::info!("Cleanup complete");
    }

    pub fn is_cleanup_complete(&self) -> bool {
        self.cleanup_complete.load(Ordering::SeqCst)
    }

    /// Resolve once a shutdown has been requested
    pub async fn wait_for_shutdown(&self) {
        while !self.is_shutdown_requested() {
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

/// What was left behind when the server stopped.
///
/// Nothing is persisted, so in-flight generations are simply abandoned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub batch_token: u64,
    pub idea_count: usize,
    /// Indices of ideas whose request was still in flight
    pub abandoned: Vec<usize>,
}

impl ShutdownReport {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            batch_token: snapshot.batch_token,
            idea_count: snapshot.ideas.len(),
            abandoned: snapshot
                .ideas
                .iter()
                .filter(|idea| idea.status == IdeaStatus::Generating)
                .map(|idea| idea.index)
                .collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.abandoned.is_empty()
    }
}

/// Log the final session state and mark cleanup as done
pub fn finish_shutdown(state: &ShutdownState, snapshot: &SessionSnapshot) -> ShutdownReport {
    let report = ShutdownReport::from_snapshot(snapshot);

    log::info!(
        "Shutdown complete: batch {} with {} ideas",
        report.batch_token,
        report.idea_count
    );
    for index in &report.abandoned {
        log::warn!("Abandoned in-flight generation for idea {}", index);
    }

    state.mark_cleanup_complete();
    report
}

/// Register signal handlers for graceful shutdown
/// This sets up handlers for SIGINT (Ctrl+C), SIGTERM, and SIGHUP
#[cfg(unix)]
pub fn register_signal_handlers(state: ShutdownState) -> Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .map_err(|e| anyhow::anyhow!("Failed to register signal handlers: {}", e))?;

    thread::spawn(move || {
        for signal in signals.forever() {
            let name = match signal {
                SIGINT => "SIGINT (Ctrl+C)",
                SIGTERM => "SIGTERM",
                SIGHUP => "SIGHUP",
                _ => continue,
            };
            log::info!("Received {}", name);
            state.request_shutdown();
        }
    });

    log::info!("Signal handlers registered (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

/// Register signal handlers for Windows
#[cfg(windows)]
pub fn register_signal_handlers(state: ShutdownState) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C");
        state.request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("Failed to register Ctrl+C handler: {}", e))?;

    log::info!("Signal handler registered (Ctrl+C)");
    Ok(())
}
