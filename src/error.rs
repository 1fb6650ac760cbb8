// Error taxonomy of the generation workflow

use crate::models::state_machine::StateTransitionError;
use thiserror::Error;

/// Every failure the workflow can surface.
///
/// None of these terminate the process: callers convert them into a status
/// line and, for idea-scoped failures, an `Error` transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Missing file or a file that is not JSON
    #[error("{0}")]
    Input(String),

    /// The configuration document is not valid JSON
    #[error("Configuration file parsing failed: {0}")]
    Parse(String),

    /// The request could not be completed or returned a non-2xx status
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// A 2xx response did not match the expected envelope; `raw` keeps the
    /// payload for diagnostic display
    #[error("Backend returned incorrect or empty data format: {reason}")]
    Schema { reason: String, raw: String },

    /// Every content endpoint answered 2xx with a blank body
    #[error("Backend returned empty content")]
    EmptyContent,

    /// Content generation attempted before any configuration was submitted
    #[error("Please upload a configuration file first.")]
    Precondition,

    #[error("Idea data not found for index: {0}")]
    IdeaNotFound(usize),

    #[error(transparent)]
    Transition(#[from] StateTransitionError),
}

impl WorkflowError {
    pub fn transport_status(status: u16) -> Self {
        WorkflowError::Transport {
            status: Some(status),
            message: format!("HTTP error! status: {}", status),
        }
    }

    pub fn transport_message(message: impl Into<String>) -> Self {
        WorkflowError::Transport {
            status: None,
            message: message.into(),
        }
    }
}
