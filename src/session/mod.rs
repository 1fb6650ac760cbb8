// Session context: the single owner of all workflow state
//
// Every mutation happens through `SessionContext` methods while the caller
// holds the session lock; none of them block or await.

pub mod idea_store;

use crate::error::WorkflowError;
use crate::models::{GenerationRequest, IdeaView, Notification, StatusKind, StatusLine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use idea_store::{IdeaEntry, IdeaStore, StatusCounts};

pub const MSG_SENDING: &str = "Sending configuration file to backend...";
pub const MSG_SENT: &str = "Configuration file successfully sent to backend.";
pub const MSG_RAW_DISPLAYED: &str = "Incorrect data format, raw data displayed.";
pub const MSG_GENERATING: &str = "Generating content...";
pub const MSG_GENERATED: &str = "Content generated successfully!";

/// Markup of the most recently completed generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedContent {
    pub index: usize,
    pub idea_title: String,
    pub markup: String,
    /// Body exactly as the content service returned it
    pub raw: String,
    pub generated_at: DateTime<Utc>,
}

/// Everything needed to run one generation outside the session lock
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub index: usize,
    /// Batch token captured when the request started
    pub token: u64,
    pub configuration: Arc<Value>,
    pub entry: Arc<IdeaEntry>,
}

impl GenerationTicket {
    pub fn title(&self) -> &str {
        self.entry.idea.display_title()
    }

    pub fn request(&self) -> GenerationRequest<'_> {
        GenerationRequest {
            configuration: &self.configuration,
            idea: &self.entry.raw,
            idea_title: &self.entry.idea.title,
        }
    }
}

/// Serializable view of the whole session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub has_configuration: bool,
    pub batch_token: u64,
    pub ideas: Vec<IdeaView>,
    pub counts: StatusCounts,
    pub rendered: Option<RenderedContent>,
    /// Pretty-printed reply shown when the idea envelope was malformed
    pub raw_payload: Option<String>,
    pub upload_status: Option<StatusLine>,
    pub result_status: Option<StatusLine>,
    pub article_status: Option<StatusLine>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Default)]
pub struct SessionContext {
    configuration: Option<Arc<Value>>,
    store: IdeaStore,
    rendered: Option<RenderedContent>,
    raw_payload: Option<String>,
    upload_status: Option<StatusLine>,
    result_status: Option<StatusLine>,
    article_status: Option<StatusLine>,
    notification: Option<Notification>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configuration(&self) -> Option<Arc<Value>> {
        self.configuration.clone()
    }

    pub fn store(&self) -> &IdeaStore {
        &self.store
    }

    pub fn rendered(&self) -> Option<&RenderedContent> {
        self.rendered.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Whether `token` still identifies the current batch
    pub fn is_current(&self, token: u64) -> bool {
        self.store.token() == token
    }

    // Submission ----------------------------------------------------------

    /// Record a local rejection of the uploaded file (no reset happens)
    pub fn reject_upload(&mut self, err: &WorkflowError) {
        self.upload_status = Some(StatusLine::error(err.to_string()));
    }

    /// Hard reset at submission start.
    ///
    /// Returns the token a later response must present to be applied.
    pub fn begin_submission(&mut self, configuration: Value) -> u64 {
        self.configuration = Some(Arc::new(configuration));
        self.rendered = None;
        self.raw_payload = None;
        self.result_status = None;
        self.article_status = None;
        self.notification = None;
        self.upload_status = Some(StatusLine::info(MSG_SENDING));
        self.store.clear()
    }

    /// Install a flattened batch; `None` when a newer submission started
    pub fn apply_ideas(&mut self, token: u64, ideas: Vec<Value>) -> Option<usize> {
        if !self.is_current(token) {
            log::info!("Discarding stale submission response (token {})", token);
            return None;
        }

        let count = ideas.len();
        self.store.replace_batch(ideas);
        self.upload_status = Some(StatusLine::success(MSG_SENT));
        self.result_status = Some(StatusLine::success(format!(
            "Successfully displayed {} ideas.",
            count
        )));
        Some(count)
    }

    /// Record a failed submission; false when a newer submission started
    pub fn apply_submission_error(&mut self, token: u64, err: &WorkflowError) -> bool {
        if !self.is_current(token) {
            log::info!("Discarding stale submission failure (token {})", token);
            return false;
        }

        match err {
            WorkflowError::Schema { raw, .. } => {
                self.raw_payload = Some(raw.clone());
                self.upload_status = Some(StatusLine::success(MSG_SENT));
                self.result_status = Some(StatusLine::error(MSG_RAW_DISPLAYED));
            }
            other => {
                self.upload_status = Some(StatusLine::error(format!(
                    "Error sending to backend: {}",
                    other
                )));
            }
        }
        true
    }

    // Generation ----------------------------------------------------------

    /// Check preconditions and move the idea to `Generating`
    pub fn begin_generation(&mut self, index: usize) -> Result<GenerationTicket, WorkflowError> {
        let Some(configuration) = self.configuration.clone() else {
            self.article_status = Some(StatusLine::error(WorkflowError::Precondition.to_string()));
            return Err(WorkflowError::Precondition);
        };

        match self.store.begin_generation(index) {
            Ok((token, entry)) => {
                self.article_status = Some(StatusLine::info(MSG_GENERATING));
                Ok(GenerationTicket {
                    index,
                    token,
                    configuration,
                    entry,
                })
            }
            Err(e @ WorkflowError::IdeaNotFound(_)) => {
                self.article_status = Some(StatusLine::error(format!(
                    "Error processing idea data: {}",
                    e
                )));
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply a successful generation; false when the result is stale
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        raw: String,
        markup: String,
    ) -> bool {
        if !self.store.complete(ticket.index, ticket.token) {
            return false;
        }

        self.rendered = Some(RenderedContent {
            index: ticket.index,
            idea_title: ticket.title().to_string(),
            markup,
            raw,
            generated_at: Utc::now(),
        });
        self.article_status = Some(StatusLine::success(MSG_GENERATED));
        self.notification = Some(Notification {
            title: "Generation succeeded".to_string(),
            message: format!("Idea \"{}\" content generated successfully.", ticket.title()),
            kind: StatusKind::Success,
            retry_idea: None,
        });
        true
    }

    /// Apply an exhausted generation; false when the result is stale
    pub fn fail_generation(&mut self, ticket: &GenerationTicket, reason: &str) -> bool {
        if !self.store.fail(ticket.index, ticket.token) {
            return false;
        }

        self.article_status = Some(StatusLine::error(format!(
            "Failed to generate content: {}",
            reason
        )));
        self.notification = Some(Notification {
            title: "Generation failed".to_string(),
            message: format!(
                "Idea \"{}\" content generation failed: {}",
                ticket.title(),
                reason
            ),
            kind: StatusKind::Error,
            retry_idea: Some(ticket.index),
        });
        true
    }

    // Presentation --------------------------------------------------------

    pub fn close_article(&mut self) {
        self.rendered = None;
        self.article_status = None;
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            has_configuration: self.configuration.is_some(),
            batch_token: self.store.token(),
            ideas: self.store.views(),
            counts: self.store.status_counts(),
            rendered: self.rendered.clone(),
            raw_payload: self.raw_payload.clone(),
            upload_status: self.upload_status.clone(),
            result_status: self.result_status.clone(),
            article_status: self.article_status.clone(),
            notification: self.notification.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state_machine::StateTransitionError;
    use crate::models::IdeaStatus;
    use serde_json::json;

    fn submitted(titles: &[&str]) -> SessionContext {
        let mut session = SessionContext::new();
        let token = session.begin_submission(json!({ "brand": "acme" }));
        let ideas = titles.iter().map(|t| json!({ "title": t })).collect();
        session.apply_ideas(token, ideas).unwrap();
        session
    }

    #[test]
    fn test_submission_success_statuses() {
        let session = submitted(&["a", "b"]);
        let snap = session.snapshot();
        assert!(snap.has_configuration);
        assert_eq!(snap.ideas.len(), 2);
        assert_eq!(snap.upload_status, Some(StatusLine::success(MSG_SENT)));
        assert_eq!(
            snap.result_status,
            Some(StatusLine::success("Successfully displayed 2 ideas."))
        );
    }

    #[test]
    fn test_begin_submission_hard_resets() {
        let mut session = submitted(&["a"]);
        let ticket = session.begin_generation(0).unwrap();
        session.complete_generation(&ticket, "raw".into(), "<p>raw</p>".into());
        assert!(session.rendered().is_some());

        session.begin_submission(json!({}));
        let snap = session.snapshot();
        assert!(snap.ideas.is_empty());
        assert!(snap.rendered.is_none());
        assert!(snap.notification.is_none());
        assert_eq!(snap.upload_status, Some(StatusLine::info(MSG_SENDING)));
    }

    #[test]
    fn test_stale_submission_response_discarded() {
        let mut session = SessionContext::new();
        let first = session.begin_submission(json!({ "n": 1 }));
        let second = session.begin_submission(json!({ "n": 2 }));

        assert_eq!(session.apply_ideas(first, vec![json!({ "title": "old" })]), None);
        assert!(session.store().is_empty());
        assert_eq!(session.apply_ideas(second, vec![json!({ "title": "new" })]), Some(1));
        assert_eq!(session.store().get(0).unwrap().idea.title, "new");
    }

    #[test]
    fn test_schema_error_shows_raw_payload() {
        let mut session = SessionContext::new();
        let token = session.begin_submission(json!({}));
        let err = WorkflowError::Schema {
            reason: "data list is empty".into(),
            raw: "{\n  \"data\": []\n}".into(),
        };
        assert!(session.apply_submission_error(token, &err));

        let snap = session.snapshot();
        assert!(snap.ideas.is_empty());
        assert_eq!(snap.raw_payload.as_deref(), Some("{\n  \"data\": []\n}"));
        assert_eq!(snap.result_status, Some(StatusLine::error(MSG_RAW_DISPLAYED)));
    }

    #[test]
    fn test_transport_error_sets_upload_status() {
        let mut session = SessionContext::new();
        let token = session.begin_submission(json!({}));
        session.apply_submission_error(token, &WorkflowError::transport_status(500));
        assert_eq!(
            session.snapshot().upload_status,
            Some(StatusLine::error(
                "Error sending to backend: HTTP error! status: 500"
            ))
        );
    }

    #[test]
    fn test_generation_requires_configuration() {
        let mut session = SessionContext::new();
        assert_eq!(
            session.begin_generation(0).unwrap_err(),
            WorkflowError::Precondition
        );
        assert_eq!(
            session.snapshot().article_status,
            Some(StatusLine::error("Please upload a configuration file first."))
        );
    }

    #[test]
    fn test_generation_unknown_index() {
        let mut session = submitted(&["a"]);
        assert_eq!(
            session.begin_generation(4).unwrap_err(),
            WorkflowError::IdeaNotFound(4)
        );
        let status = session.snapshot().article_status.unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.message.starts_with("Error processing idea data:"));
    }

    #[test]
    fn test_ticket_request_uses_raw_idea() {
        let mut session = SessionContext::new();
        let token = session.begin_submission(json!({ "brand": "acme" }));
        session.apply_ideas(token, vec![json!({ "title": "T", "why_now": "now" })]);

        let ticket = session.begin_generation(0).unwrap();
        let body = serde_json::to_value(ticket.request()).unwrap();
        assert_eq!(body["config"]["brand"], "acme");
        assert_eq!(body["ideas"]["why_now"], "now");
        assert_eq!(body["idea_title"], "T");
    }

    #[test]
    fn test_complete_generation_notifies() {
        let mut session = submitted(&["Alpha"]);
        let ticket = session.begin_generation(0).unwrap();
        assert!(session.complete_generation(&ticket, "# A".into(), "<h1>A</h1>".into()));

        let snap = session.snapshot();
        assert_eq!(snap.ideas[0].status, IdeaStatus::Completed);
        assert_eq!(snap.rendered.unwrap().markup, "<h1>A</h1>");
        let note = snap.notification.unwrap();
        assert_eq!(note.message, "Idea \"Alpha\" content generated successfully.");
        assert_eq!(note.retry_idea, None);
        assert_eq!(snap.article_status, Some(StatusLine::success(MSG_GENERATED)));
    }

    #[test]
    fn test_fail_generation_offers_retry() {
        let mut session = submitted(&["a", "Beta"]);
        let ticket = session.begin_generation(1).unwrap();
        assert!(session.fail_generation(&ticket, "Backend returned empty content"));

        let snap = session.snapshot();
        assert_eq!(snap.ideas[1].status, IdeaStatus::Error);
        let note = snap.notification.unwrap();
        assert_eq!(note.kind, StatusKind::Error);
        assert_eq!(note.retry_idea, Some(1));
        assert!(note.message.contains("Beta"));
        assert!(note.message.contains("Backend returned empty content"));
        assert_eq!(
            snap.article_status,
            Some(StatusLine::error(
                "Failed to generate content: Backend returned empty content"
            ))
        );
    }

    #[test]
    fn test_already_generating_keeps_article_status() {
        let mut session = submitted(&["a"]);
        session.begin_generation(0).unwrap();
        let err = session.begin_generation(0).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Transition(StateTransitionError::AlreadyGenerating)
        );
        assert_eq!(
            session.snapshot().article_status,
            Some(StatusLine::info(MSG_GENERATING))
        );
    }

    #[test]
    fn test_stale_generation_result_ignored() {
        let mut session = submitted(&["a"]);
        let ticket = session.begin_generation(0).unwrap();
        let token = session.begin_submission(json!({}));
        session.apply_ideas(token, vec![json!({ "title": "fresh" })]);

        assert!(!session.complete_generation(&ticket, "x".into(), "<p>x</p>".into()));
        let snap = session.snapshot();
        assert!(snap.rendered.is_none());
        assert!(snap.notification.is_none());
        assert_eq!(snap.ideas[0].status, IdeaStatus::Pending);
    }

    #[test]
    fn test_close_and_dismiss() {
        let mut session = submitted(&["a"]);
        let ticket = session.begin_generation(0).unwrap();
        session.complete_generation(&ticket, "x".into(), "<p>x</p>".into());

        session.close_article();
        session.dismiss_notification();
        let snap = session.snapshot();
        assert!(snap.rendered.is_none());
        assert!(snap.article_status.is_none());
        assert!(snap.notification.is_none());
    }
}
