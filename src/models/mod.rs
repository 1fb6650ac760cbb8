// Data models shared by the workflow, the session and the server API

pub mod state_machine;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a single idea
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    Pending,
    Generating,
    Completed,
    Error,
}

impl IdeaStatus {
    /// Returns the string representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Pending => "pending",
            IdeaStatus::Generating => "generating",
            IdeaStatus::Completed => "completed",
            IdeaStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for IdeaStatus {
    fn default() -> Self {
        IdeaStatus::Pending
    }
}

/// SEO keywords attached to an idea
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    pub primary: String,
    #[serde(default)]
    pub secondary: Vec<String>,
}

/// One proposed content topic returned by the idea-generation service.
///
/// Built leniently from the service payload: missing or mistyped fields
/// become empty values instead of rejecting the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub title: String,
    pub thesis: String,
    pub why_now: String,
    pub audience: String,
    pub goal: String,
    #[serde(default)]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub outline: Vec<String>,
    pub seo: Option<Seo>,
    pub tone: String,
    pub cta: String,
}

impl Idea {
    /// Extract an idea from the service's snake_case JSON object
    pub fn from_value(value: &Value) -> Self {
        let seo = value.get("seo").filter(|s| s.is_object()).map(|s| Seo {
            primary: text_field(s, "primary"),
            secondary: list_field(s, "secondary"),
        });

        Idea {
            title: text_field(value, "title"),
            thesis: text_field(value, "thesis"),
            why_now: text_field(value, "why_now"),
            audience: text_field(value, "audience"),
            goal: text_field(value, "goal"),
            key_messages: list_field(value, "key_messages"),
            outline: list_field(value, "outline"),
            seo,
            tone: text_field(value, "tone"),
            cta: text_field(value, "cta"),
        }
    }

    /// Title used in notifications and requests
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "No Title"
        } else {
            &self.title
        }
    }
}

fn text_field(value: &Value, name: &str) -> String {
    match value.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn list_field(value: &Value, name: &str) -> Vec<String> {
    value[name]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn or_na(s: &str) -> String {
    if s.trim().is_empty() {
        "N/A".to_string()
    } else {
        s.to_string()
    }
}

/// Read-only projection of an idea for clients.
///
/// `can_generate` and `action_label` are derived from the status only;
/// they are never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaView {
    pub index: usize,
    pub title: String,
    pub thesis: String,
    pub why_now: String,
    pub audience: String,
    pub goal: String,
    pub key_messages: Vec<String>,
    pub outline: Vec<String>,
    pub seo_primary: String,
    pub seo_secondary: Vec<String>,
    pub tone: String,
    pub cta: String,
    pub status: IdeaStatus,
    pub can_generate: bool,
    pub action_label: String,
}

impl IdeaView {
    pub fn new(index: usize, idea: &Idea, status: IdeaStatus) -> Self {
        let (seo_primary, seo_secondary) = match &idea.seo {
            Some(seo) => (or_na(&seo.primary), seo.secondary.clone()),
            None => ("N/A".to_string(), Vec::new()),
        };
        let cta = if idea.cta.trim().is_empty() {
            "Learn More".to_string()
        } else {
            idea.cta.clone()
        };
        let can_generate = state_machine::can_start_generation(status);

        Self {
            index,
            title: idea.display_title().to_string(),
            thesis: or_na(&idea.thesis),
            why_now: or_na(&idea.why_now),
            audience: or_na(&idea.audience),
            goal: or_na(&idea.goal),
            key_messages: idea.key_messages.clone(),
            outline: idea.outline.clone(),
            seo_primary,
            seo_secondary,
            tone: or_na(&idea.tone),
            cta,
            status,
            can_generate,
            action_label: if state_machine::is_active_state(status) {
                "Generating...".to_string()
            } else {
                "Retry".to_string()
            },
        }
    }
}

/// Severity of a status line or notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// A human-readable status message shown next to one workflow stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Error,
        }
    }
}

/// Outcome notification of a generation, optionally offering a retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: StatusKind,
    /// Idea index the retry action is bound to
    pub retry_idea: Option<usize>,
}

/// Body sent to a content-generation endpoint.
///
/// Field names follow the content service's contract. Built per attempt,
/// borrowing the shared configuration and the idea's raw object.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationRequest<'a> {
    #[serde(rename = "config")]
    pub configuration: &'a Value,
    #[serde(rename = "ideas")]
    pub idea: &'a Value,
    pub idea_title: &'a str,
}
