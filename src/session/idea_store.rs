// Ordered idea collection of the current batch and each idea's lifecycle state

use crate::error::WorkflowError;
use crate::models::state_machine::transition_state;
use crate::models::{Idea, IdeaStatus, IdeaView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One idea of the batch together with its state.
///
/// Entries are immutable once built; a state change swaps in a new `Arc`.
#[derive(Debug, Clone)]
pub struct IdeaEntry {
    pub idea: Idea,
    /// Idea object exactly as the service returned it, echoed back in
    /// generation requests
    pub raw: Value,
    pub status: IdeaStatus,
    pub updated_at: DateTime<Utc>,
}

impl IdeaEntry {
    fn new(raw: Value) -> Self {
        Self {
            idea: Idea::from_value(&raw),
            raw,
            status: IdeaStatus::Pending,
            updated_at: Utc::now(),
        }
    }

    fn with_status(&self, status: IdeaStatus) -> Self {
        Self {
            idea: self.idea.clone(),
            raw: self.raw.clone(),
            status,
            updated_at: Utc::now(),
        }
    }
}

/// Number of ideas per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub generating: usize,
    pub completed: usize,
    pub error: usize,
}

impl StatusCounts {
    fn record(&mut self, status: IdeaStatus) {
        match status {
            IdeaStatus::Pending => self.pending += 1,
            IdeaStatus::Generating => self.generating += 1,
            IdeaStatus::Completed => self.completed += 1,
            IdeaStatus::Error => self.error += 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct IdeaStore {
    entries: Vec<Arc<IdeaEntry>>,
    token: u64,
}

impl IdeaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current batch token
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every idea and start a new (empty) batch
    pub fn clear(&mut self) -> u64 {
        self.entries.clear();
        self.token += 1;
        self.token
    }

    /// Discard the current batch and install `ideas`, all `Pending`.
    ///
    /// Returns the new batch token; any request still in flight for the
    /// previous batch becomes stale.
    pub fn replace_batch(&mut self, ideas: Vec<Value>) -> u64 {
        self.entries = ideas
            .into_iter()
            .map(|raw| Arc::new(IdeaEntry::new(raw)))
            .collect();
        self.token += 1;
        log::info!(
            "Idea batch replaced: {} ideas (token {})",
            self.entries.len(),
            self.token
        );
        self.token
    }

    pub fn get(&self, index: usize) -> Option<Arc<IdeaEntry>> {
        self.entries.get(index).cloned()
    }

    /// Consistent view of every entry at this instant
    pub fn snapshot(&self) -> Vec<Arc<IdeaEntry>> {
        self.entries.clone()
    }

    pub fn views(&self) -> Vec<IdeaView> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| IdeaView::new(i, &entry.idea, entry.status))
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in &self.entries {
            counts.record(entry.status);
        }
        counts
    }

    /// Move an idea to `Generating`.
    ///
    /// Returns the batch token the request must present on completion and
    /// the entry as it was when the request started.
    pub fn begin_generation(
        &mut self,
        index: usize,
    ) -> Result<(u64, Arc<IdeaEntry>), WorkflowError> {
        let current = self
            .entries
            .get(index)
            .cloned()
            .ok_or(WorkflowError::IdeaNotFound(index))?;

        let next = transition_state(current.status, IdeaStatus::Generating)?;
        let entry = Arc::new(current.with_status(next));
        self.entries[index] = entry.clone();
        Ok((self.token, entry))
    }

    /// Resolve a generation as `Completed`; false when the result is stale
    pub fn complete(&mut self, index: usize, token: u64) -> bool {
        self.resolve(index, token, IdeaStatus::Completed)
    }

    /// Resolve a generation as `Error`; false when the result is stale
    pub fn fail(&mut self, index: usize, token: u64) -> bool {
        self.resolve(index, token, IdeaStatus::Error)
    }

    fn resolve(&mut self, index: usize, token: u64, target: IdeaStatus) -> bool {
        if token != self.token {
            log::info!(
                "Discarding stale result for idea {} (token {}, current {})",
                index,
                token,
                self.token
            );
            return false;
        }

        let Some(current) = self.entries.get(index).cloned() else {
            log::warn!("Result for unknown idea index {}", index);
            return false;
        };

        match transition_state(current.status, target) {
            Ok(next) => {
                self.entries[index] = Arc::new(current.with_status(next));
                true
            }
            Err(e) => {
                log::warn!("Ignoring result for idea {}: {}", index, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state_machine::StateTransitionError;
    use serde_json::json;

    fn store_with(n: usize) -> IdeaStore {
        let mut store = IdeaStore::new();
        let ideas = (0..n).map(|i| json!({ "title": format!("idea {}", i) })).collect();
        store.replace_batch(ideas);
        store
    }

    #[test]
    fn test_replace_batch_starts_pending() {
        let store = store_with(3);
        assert_eq!(store.len(), 3);
        assert!(store
            .snapshot()
            .iter()
            .all(|e| e.status == IdeaStatus::Pending));
        assert_eq!(store.get(1).unwrap().idea.title, "idea 1");
    }

    #[test]
    fn test_replace_batch_discards_previous_states() {
        let mut store = store_with(2);
        let (token, _) = store.begin_generation(0).unwrap();
        assert!(store.complete(0, token));

        let new_token = store.replace_batch(vec![json!({ "title": "fresh" })]);
        assert!(new_token > token);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().status, IdeaStatus::Pending);
    }

    #[test]
    fn test_generation_lifecycle() {
        let mut store = store_with(1);
        let (token, entry) = store.begin_generation(0).unwrap();
        assert_eq!(entry.status, IdeaStatus::Generating);

        assert!(store.fail(0, token));
        assert_eq!(store.get(0).unwrap().status, IdeaStatus::Error);

        let (token, _) = store.begin_generation(0).unwrap();
        assert!(store.complete(0, token));
        assert_eq!(store.get(0).unwrap().status, IdeaStatus::Completed);

        // retry is allowed from Completed as well
        assert!(store.begin_generation(0).is_ok());
    }

    #[test]
    fn test_second_begin_rejected_while_generating() {
        let mut store = store_with(1);
        store.begin_generation(0).unwrap();
        let err = store.begin_generation(0).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Transition(StateTransitionError::AlreadyGenerating)
        );
    }

    #[test]
    fn test_begin_out_of_range() {
        let mut store = store_with(1);
        assert_eq!(
            store.begin_generation(5).unwrap_err(),
            WorkflowError::IdeaNotFound(5)
        );
    }

    #[test]
    fn test_stale_token_is_discarded() {
        let mut store = store_with(2);
        let (old_token, _) = store.begin_generation(0).unwrap();
        store.replace_batch(vec![json!({ "title": "a" }), json!({ "title": "b" })]);

        assert!(!store.complete(0, old_token));
        assert!(!store.fail(0, old_token));
        assert_eq!(store.get(0).unwrap().status, IdeaStatus::Pending);
    }

    #[test]
    fn test_resolve_without_generation_is_ignored() {
        let mut store = store_with(1);
        let token = store.token();
        assert!(!store.complete(0, token));
        assert_eq!(store.get(0).unwrap().status, IdeaStatus::Pending);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_updates() {
        let mut store = store_with(1);
        let before = store.snapshot();
        store.begin_generation(0).unwrap();
        assert_eq!(before[0].status, IdeaStatus::Pending);
        assert_eq!(store.get(0).unwrap().status, IdeaStatus::Generating);
    }

    #[test]
    fn test_status_counts_and_views() {
        let mut store = store_with(3);
        let (token, _) = store.begin_generation(0).unwrap();
        store.fail(0, token);
        store.begin_generation(1).unwrap();

        let counts = store.status_counts();
        assert_eq!(
            counts,
            StatusCounts {
                pending: 1,
                generating: 1,
                completed: 0,
                error: 1
            }
        );

        let views = store.views();
        assert_eq!(views.len(), 3);
        assert!(!views[1].can_generate);
        assert_eq!(views[2].title, "idea 2");
    }

    #[test]
    fn test_clear_bumps_token() {
        let mut store = store_with(2);
        let before = store.token();
        assert_eq!(store.clear(), before + 1);
        assert!(store.is_empty());
    }
}
