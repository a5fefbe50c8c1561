//! Field-level update for an issue or pull request
//!
//! The issues API replaces the whole label set on update, so an `IssueUpdate`
//! is seeded with the entity's current labels and every rule edits that set.
//! Edits are additive: adding one label never drops another rule's addition.

use super::models::{ItemState, Label};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueUpdate {
    labels: Vec<String>,
    labels_changed: bool,
    state: Option<ItemState>,
}

/// Request body for `PATCH /repositories/{id}/issues/{number}`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateIssueRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ItemState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl IssueUpdate {
    pub fn from_labels(labels: &[Label]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.name.clone()).collect(),
            ..Default::default()
        }
    }

    pub fn add_label(&mut self, name: &str) {
        if !self.has_label(name) {
            self.labels.push(name.to_string());
            self.labels_changed = true;
        }
    }

    pub fn remove_label(&mut self, name: &str) {
        let before = self.labels.len();
        self.labels.retain(|l| !l.eq_ignore_ascii_case(name));
        if self.labels.len() != before {
            self.labels_changed = true;
        }
    }

    pub fn set_state(&mut self, state: ItemState) {
        self.state = Some(state);
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(name))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn state(&self) -> Option<ItemState> {
        self.state
    }

    /// True when applying the update would change nothing
    pub fn is_noop(&self) -> bool {
        !self.labels_changed && self.state.is_none()
    }

    /// Labels are only sent when touched, so an untouched set is never rewritten
    pub fn to_request(&self) -> UpdateIssueRequest {
        UpdateIssueRequest {
            state: self.state,
            labels: self.labels_changed.then(|| self.labels.clone()),
        }
    }
}
