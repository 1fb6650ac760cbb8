// Parsers for the uploaded configuration document and the idea-generation reply

pub mod envelope;

use crate::error::WorkflowError;
use serde_json::Value;
use std::path::Path;

pub use envelope::{flatten_envelope, validate_envelope, EnvelopeIdeas};

/// Supported configuration document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from file name or path
    pub fn from_path(path: &str) -> Option<Self> {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Validate an uploaded document by name and parse its contents.
///
/// Rejects before any network call: a non-JSON name is an input error,
/// malformed contents a parse error.
pub fn parse_configuration(file_name: &str, contents: &str) -> Result<Value, WorkflowError> {
    if file_name.trim().is_empty() {
        return Err(WorkflowError::Input(
            "Please select a configuration file.".to_string(),
        ));
    }

    match ConfigFormat::from_path(file_name) {
        Some(ConfigFormat::Json) => {}
        None => {
            return Err(WorkflowError::Input(
                "Please select a JSON file.".to_string(),
            ))
        }
    }

    serde_json::from_str(contents).map_err(|e| WorkflowError::Parse(e.to_string()))
}

/// Read and parse a configuration document from local storage
pub fn load_configuration(path: &Path) -> Result<Value, WorkflowError> {
    let name = path.to_string_lossy();
    if ConfigFormat::from_path(&name).is_none() {
        return Err(WorkflowError::Input(
            "Please select a JSON file.".to_string(),
        ));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        WorkflowError::Input(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_configuration(&name, &contents)
}
