// Batch response envelope returned by the idea-generation service
//
// Shape: { "data": [ { "output": [ { "output": { "ideas": [ ... ] } }, ... ] }, ... ] }
// Only the first output of each entry is consulted.

use crate::error::WorkflowError;
use serde_json::Value;

/// Ideas flattened out of one envelope, in encounter order
#[derive(Debug, Clone, Default)]
pub struct EnvelopeIdeas {
    /// Raw idea objects, entry order then within-entry order
    pub ideas: Vec<Value>,
    /// Number of top-level entries in the envelope
    pub entries: usize,
    /// Entries whose first output carried an ideas list
    pub contributing_entries: usize,
}

/// Ideas list of an entry's first output, if the path down to it exists
fn first_output_ideas(entry: &Value) -> Option<&Vec<Value>> {
    entry
        .get("output")?
        .as_array()?
        .first()?
        .get("output")?
        .get("ideas")?
        .as_array()
}

/// Pretty-printed payload for diagnostic display
pub fn raw_display(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

/// Check the envelope shape, returning the reason it is malformed
pub fn validate_envelope(payload: &Value) -> Result<(), String> {
    if !payload.is_object() {
        return Err("response is not an object".to_string());
    }

    let entries = match payload.get("data").and_then(|d| d.as_array()) {
        Some(entries) => entries,
        None => return Err("missing data list".to_string()),
    };

    if entries.is_empty() {
        return Err("data list is empty".to_string());
    }

    if !entries.iter().any(|entry| first_output_ideas(entry).is_some()) {
        return Err("no entry carries an ideas list in its first output".to_string());
    }

    Ok(())
}

/// Validate the envelope and concatenate every entry's first-output ideas.
///
/// Entries without the expected path are skipped; a malformed envelope
/// yields a schema error carrying the raw payload.
pub fn flatten_envelope(payload: &Value) -> Result<EnvelopeIdeas, WorkflowError> {
    if let Err(reason) = validate_envelope(payload) {
        return Err(WorkflowError::Schema {
            reason,
            raw: raw_display(payload),
        });
    }

    let entries = payload["data"].as_array().cloned().unwrap_or_default();
    let mut result = EnvelopeIdeas {
        entries: entries.len(),
        ..Default::default()
    };

    for (i, entry) in entries.iter().enumerate() {
        match first_output_ideas(entry) {
            Some(ideas) => {
                result.contributing_entries += 1;
                result.ideas.extend(ideas.iter().cloned());
            }
            None => log::debug!("Skipping envelope entry {} without ideas", i),
        }
    }

    Ok(result)
}
