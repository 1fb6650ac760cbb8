//! Generation workflow
//!
//! Ties the session, the two remote services and the content transformer
//! together. The session lock is only taken between suspension points:
//! every network call happens with the lock released, and results are
//! applied afterwards under the batch-token guard.

use crate::backend::{deliver, request_ideas, AttemptRecord, DeliveryResult, Transport};
use crate::config::Settings;
use crate::error::WorkflowError;
use crate::events::{
    emit_event, emit_notification, BatchReplacedPayload, ContentFailedPayload,
    ContentGeneratedPayload, EventSink, IdeaStatusChangedPayload, EVENT_BATCH_REPLACED,
    EVENT_CONTENT_FAILED, EVENT_CONTENT_GENERATED, EVENT_IDEA_STATUS_CHANGED,
};
use crate::models::{IdeaStatus, IdeaView};
use crate::parsers::parse_configuration;
use crate::session::{GenerationTicket, RenderedContent, SessionContext, SessionSnapshot};
use crate::transform::render_content;
use crate::utils::lock_mutex_recover;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Result of a configuration submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    #[serde(rename_all = "camelCase")]
    Applied {
        batch_token: u64,
        idea_count: usize,
        entries: usize,
    },
    /// A newer submission started before the reply arrived
    Superseded,
}

/// Result of one generation run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome {
    #[serde(rename_all = "camelCase")]
    Completed {
        index: usize,
        endpoint: String,
        markup: String,
        attempts: Vec<AttemptRecord>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        index: usize,
        reason: String,
        attempts: Vec<AttemptRecord>,
    },
    /// The batch was replaced while the request was in flight
    #[serde(rename_all = "camelCase")]
    Stale { index: usize },
}

pub struct Workflow {
    session: Mutex<SessionContext>,
    transport: Arc<dyn Transport>,
    idea_endpoint: String,
    content_endpoints: Vec<String>,
    events: Arc<dyn EventSink>,
}

impl Workflow {
    pub fn new(settings: &Settings, transport: Arc<dyn Transport>, events: Arc<dyn EventSink>) -> Self {
        Self {
            session: Mutex::new(SessionContext::new()),
            transport,
            idea_endpoint: settings.idea_endpoint.clone(),
            content_endpoints: settings.content_endpoints.clone(),
            events,
        }
    }

    pub fn content_endpoints(&self) -> &[String] {
        &self.content_endpoints
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock_mutex_recover(&self.session).snapshot()
    }

    pub fn ideas(&self) -> Vec<IdeaView> {
        lock_mutex_recover(&self.session).store().views()
    }

    pub fn rendered_content(&self) -> Option<RenderedContent> {
        lock_mutex_recover(&self.session).rendered().cloned()
    }

    pub fn close_article(&self) {
        lock_mutex_recover(&self.session).close_article();
    }

    pub fn dismiss_notification(&self) {
        lock_mutex_recover(&self.session).dismiss_notification();
    }

    // Submission ----------------------------------------------------------

    /// Validate an uploaded file and submit it.
    ///
    /// Name and syntax errors are recorded in the upload status and returned
    /// without any network call or session reset.
    pub async fn submit_file(
        &self,
        file_name: &str,
        contents: &str,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        match parse_configuration(file_name, contents) {
            Ok(configuration) => self.submit_configuration(configuration).await,
            Err(e) => {
                log::warn!("Rejected configuration file '{}': {}", file_name, e);
                lock_mutex_recover(&self.session).reject_upload(&e);
                Err(e)
            }
        }
    }

    /// Submit a parsed configuration and install the returned batch
    pub async fn submit_configuration(
        &self,
        configuration: Value,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        let (token, configuration) = {
            let mut session = lock_mutex_recover(&self.session);
            let token = session.begin_submission(configuration);
            (token, session.configuration())
        };
        let Some(configuration) = configuration else {
            return Err(WorkflowError::Precondition);
        };

        let result = request_ideas(self.transport.as_ref(), &self.idea_endpoint, &configuration).await;

        let mut session = lock_mutex_recover(&self.session);
        match result {
            Ok(flat) => {
                let entries = flat.entries;
                let Some(idea_count) = session.apply_ideas(token, flat.ideas) else {
                    return Ok(SubmissionOutcome::Superseded);
                };
                let batch_token = session.store().token();
                drop(session);

                emit_event(
                    self.events.as_ref(),
                    EVENT_BATCH_REPLACED,
                    &BatchReplacedPayload {
                        batch_token,
                        idea_count,
                        error: None,
                    },
                );
                Ok(SubmissionOutcome::Applied {
                    batch_token,
                    idea_count,
                    entries,
                })
            }
            Err(e) => {
                if !session.apply_submission_error(token, &e) {
                    return Ok(SubmissionOutcome::Superseded);
                }
                drop(session);

                log::warn!("Configuration submission failed: {}", e);
                emit_event(
                    self.events.as_ref(),
                    EVENT_BATCH_REPLACED,
                    &BatchReplacedPayload {
                        batch_token: token,
                        idea_count: 0,
                        error: Some(e.to_string()),
                    },
                );
                Err(e)
            }
        }
    }

    // Generation ----------------------------------------------------------

    /// Check preconditions and move the idea to `Generating`.
    ///
    /// Fails without touching the network when no configuration was
    /// submitted, the index is unknown, or the idea is already generating.
    pub fn start_generation(&self, index: usize) -> Result<GenerationTicket, WorkflowError> {
        let (ticket, old_status) = {
            let mut session = lock_mutex_recover(&self.session);
            let old_status = session
                .store()
                .get(index)
                .map(|e| e.status)
                .unwrap_or_default();
            (session.begin_generation(index)?, old_status)
        };

        self.emit_status(&ticket, old_status, IdeaStatus::Generating);
        Ok(ticket)
    }

    /// Like [`Workflow::start_generation`], closing any open notification
    /// first
    pub fn start_retry(&self, index: usize) -> Result<GenerationTicket, WorkflowError> {
        self.dismiss_notification();
        self.start_generation(index)
    }

    /// Walk the content endpoints for a started generation and apply the
    /// result
    pub async fn run_generation(&self, ticket: GenerationTicket) -> GenerationOutcome {
        let delivery = deliver(
            self.transport.as_ref(),
            &self.content_endpoints,
            &ticket.request(),
        )
        .await;

        match delivery.result {
            DeliveryResult::Delivered { endpoint, body } => {
                let markup = render_content(&body);
                let notification = {
                    let mut session = lock_mutex_recover(&self.session);
                    if !session.complete_generation(&ticket, body, markup.clone()) {
                        return GenerationOutcome::Stale {
                            index: ticket.index,
                        };
                    }
                    session.notification().cloned()
                };

                log::info!("Idea {} completed via {}", ticket.index, endpoint);
                self.emit_status(&ticket, IdeaStatus::Generating, IdeaStatus::Completed);
                emit_event(
                    self.events.as_ref(),
                    EVENT_CONTENT_GENERATED,
                    &ContentGeneratedPayload {
                        index: ticket.index,
                        idea_title: ticket.title().to_string(),
                        endpoint: endpoint.clone(),
                        markup: markup.clone(),
                    },
                );
                if let Some(notification) = notification {
                    emit_notification(self.events.as_ref(), &notification);
                }

                GenerationOutcome::Completed {
                    index: ticket.index,
                    endpoint,
                    markup,
                    attempts: delivery.attempts,
                }
            }
            DeliveryResult::Exhausted { reason } => {
                let notification = {
                    let mut session = lock_mutex_recover(&self.session);
                    if !session.fail_generation(&ticket, &reason) {
                        return GenerationOutcome::Stale {
                            index: ticket.index,
                        };
                    }
                    session.notification().cloned()
                };

                log::warn!("Idea {} failed: {}", ticket.index, reason);
                self.emit_status(&ticket, IdeaStatus::Generating, IdeaStatus::Error);
                emit_event(
                    self.events.as_ref(),
                    EVENT_CONTENT_FAILED,
                    &ContentFailedPayload {
                        index: ticket.index,
                        idea_title: ticket.title().to_string(),
                        reason: reason.clone(),
                        attempts: delivery.attempts.len(),
                    },
                );
                if let Some(notification) = notification {
                    emit_notification(self.events.as_ref(), &notification);
                }

                GenerationOutcome::Failed {
                    index: ticket.index,
                    reason,
                    attempts: delivery.attempts,
                }
            }
        }
    }

    /// Start and run a generation to completion
    pub async fn generate(&self, index: usize) -> Result<GenerationOutcome, WorkflowError> {
        let ticket = self.start_generation(index)?;
        Ok(self.run_generation(ticket).await)
    }

    fn emit_status(&self, ticket: &GenerationTicket, old_status: IdeaStatus, new_status: IdeaStatus) {
        emit_event(
            self.events.as_ref(),
            EVENT_IDEA_STATUS_CHANGED,
            &IdeaStatusChangedPayload {
                index: ticket.index,
                batch_token: ticket.token,
                old_status,
                new_status,
            },
        );
    }
}
