// Idea status state machine with validation

use super::IdeaStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTransitionError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: IdeaStatus, to: IdeaStatus },

    #[error("Idea is already generating")]
    AlreadyGenerating,
}

/// Validates if an idea can transition from one status to another
pub fn can_transition(from: IdeaStatus, to: IdeaStatus) -> bool {
    match (from, to) {
        // Generation requested
        (IdeaStatus::Pending, IdeaStatus::Generating) => true,

        // Only the completion of the in-flight request leaves Generating
        (IdeaStatus::Generating, IdeaStatus::Completed) => true,
        (IdeaStatus::Generating, IdeaStatus::Error) => true,

        // User-initiated retry from either terminal state
        (IdeaStatus::Completed, IdeaStatus::Generating) => true,
        (IdeaStatus::Error, IdeaStatus::Generating) => true,

        _ => false,
    }
}

/// Validates and performs a state transition
pub fn transition_state(
    current: IdeaStatus,
    target: IdeaStatus,
) -> Result<IdeaStatus, StateTransitionError> {
    if current == IdeaStatus::Generating && target == IdeaStatus::Generating {
        return Err(StateTransitionError::AlreadyGenerating);
    }

    if !can_transition(current, target) {
        return Err(StateTransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(target)
}

/// A new generation may be started from every state except Generating
pub fn can_start_generation(status: IdeaStatus) -> bool {
    can_transition(status, IdeaStatus::Generating)
}

/// Check if a status indicates an in-flight request
pub fn is_active_state(status: IdeaStatus) -> bool {
    matches!(status, IdeaStatus::Generating)
}
