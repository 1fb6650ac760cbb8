// Clippy allows for reasonable defaults
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer
#![allow(clippy::single_char_add_str)] // push_str("\n") reads better than push('\n')
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f

// Module declarations
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod parsers;
pub mod session;
pub mod shutdown;
pub mod transform;
mod utils;
pub mod workflow;

// Server module (HTTP/WebSocket API)
pub mod server;

pub use error::WorkflowError;
pub use models::*;
pub use workflow::{GenerationOutcome, SubmissionOutcome, Workflow};
