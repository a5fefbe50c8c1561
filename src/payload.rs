//! Webhook payloads
//!
//! Only the fields the rules read are modeled; everything else in the payload
//! is ignored by serde.

use crate::github::{Comment, Issue, Label, PullRequest, Repository, Review, User};
use crate::{Result, TriageError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// The `action` field shared by every webhook payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Opened,
    Edited,
    Closed,
    Reopened,
    Labeled,
    Unlabeled,
    Created,
    Synchronize,
    ReviewRequested,
    Submitted,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueEvent {
    pub action: Action,
    pub issue: Issue,
    /// The label just added or removed, for `labeled`/`unlabeled`
    #[serde(default)]
    pub label: Option<Label>,
    pub sender: User,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: Action,
    pub issue: Issue,
    pub comment: Comment,
    pub sender: User,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: Action,
    pub pull_request: PullRequest,
    #[serde(default)]
    pub label: Option<Label>,
    pub sender: User,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: Action,
    pub review: Review,
    pub pull_request: PullRequest,
    pub sender: User,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledEvent {
    /// The cron expression that fired
    #[serde(default)]
    pub schedule: Option<String>,
    pub repository: Repository,
}

/// Event name as passed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Issues,
    IssueComment,
    PullRequestTarget,
    PullRequestReview,
    Schedule,
    Unsupported(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "issues" => EventKind::Issues,
            "issue_comment" => EventKind::IssueComment,
            "pull_request_target" => EventKind::PullRequestTarget,
            "pull_request_review" => EventKind::PullRequestReview,
            "schedule" => EventKind::Schedule,
            other => EventKind::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Issues => "issues",
            EventKind::IssueComment => "issue_comment",
            EventKind::PullRequestTarget => "pull_request_target",
            EventKind::PullRequestReview => "pull_request_review",
            EventKind::Schedule => "schedule",
            EventKind::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed event ready for the rule engine
#[derive(Debug, Clone)]
pub enum GitHubEvent {
    Issue(IssueEvent),
    IssueComment(IssueCommentEvent),
    /// An `issue_comment` whose issue is a pull request
    PullRequestComment(IssueCommentEvent),
    PullRequest(PullRequestEvent),
    PullRequestReview(PullRequestReviewEvent),
    Scheduled(ScheduledEvent),
}

impl GitHubEvent {
    /// Parse a payload for `kind`; unsupported kinds yield `None`
    pub fn parse(kind: &EventKind, payload: &str) -> Result<Option<Self>> {
        let event = match kind {
            EventKind::Issues => GitHubEvent::Issue(deserialize(kind, payload)?),
            EventKind::IssueComment => {
                let event: IssueCommentEvent = deserialize(kind, payload)?;
                if event.issue.is_pull_request() {
                    GitHubEvent::PullRequestComment(event)
                } else {
                    GitHubEvent::IssueComment(event)
                }
            }
            EventKind::PullRequestTarget => GitHubEvent::PullRequest(deserialize(kind, payload)?),
            EventKind::PullRequestReview => {
                GitHubEvent::PullRequestReview(deserialize(kind, payload)?)
            }
            EventKind::Schedule => GitHubEvent::Scheduled(deserialize(kind, payload)?),
            EventKind::Unsupported(_) => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Read and parse a payload file; a missing file is an error for every kind
    pub fn from_file(kind: &EventKind, path: &Path) -> Result<Option<Self>> {
        let payload = std::fs::read_to_string(path).map_err(|e| {
            TriageError::Payload(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(kind, &payload)
    }

    pub fn repository(&self) -> &Repository {
        match self {
            GitHubEvent::Issue(e) => &e.repository,
            GitHubEvent::IssueComment(e) | GitHubEvent::PullRequestComment(e) => &e.repository,
            GitHubEvent::PullRequest(e) => &e.repository,
            GitHubEvent::PullRequestReview(e) => &e.repository,
            GitHubEvent::Scheduled(e) => &e.repository,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GitHubEvent::Issue(_) => "issues",
            GitHubEvent::IssueComment(_) => "issue_comment",
            GitHubEvent::PullRequestComment(_) => "pull_request_comment",
            GitHubEvent::PullRequest(_) => "pull_request_target",
            GitHubEvent::PullRequestReview(_) => "pull_request_review",
            GitHubEvent::Scheduled(_) => "schedule",
        }
    }
}

fn deserialize<T: DeserializeOwned>(kind: &EventKind, payload: &str) -> Result<T> {
    serde_json::from_str(payload)
        .map_err(|e| TriageError::Payload(format!("Invalid {} payload: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ItemState;

    const REPOSITORY: &str =
        r#""repository": {"id": 1000, "name": "sdk", "owner": {"login": "octo-org", "id": 9}}"#;

    fn issue_comment_payload(pull_request: bool) -> String {
        let link = if pull_request {
            r#", "pull_request": {"url": "https://api.github.com/repos/octo-org/sdk/pulls/3"}"#
        } else {
            ""
        };
        format!(
            r#"{{
                "action": "created",
                "issue": {{"number": 3, "state": "open", "labels": [], "user": {{"login": "author"}}, "updated_at": "2026-10-01T00:00:00Z"{link}}},
                "comment": {{"id": 11, "body": "/unresolve", "user": {{"login": "author"}}}},
                "sender": {{"login": "author"}},
                {REPOSITORY}
            }}"#
        )
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::from_name("issues"), EventKind::Issues);
        assert_eq!(EventKind::from_name("schedule"), EventKind::Schedule);
        assert_eq!(
            EventKind::from_name("push"),
            EventKind::Unsupported("push".to_string())
        );
        assert_eq!(EventKind::from_name("pull_request_target").to_string(), "pull_request_target");
    }

    #[test]
    fn test_issue_event() {
        let payload = format!(
            r#"{{
                "action": "labeled",
                "label": {{"name": "issue-addressed"}},
                "issue": {{"number": 5, "title": "Bug", "state": "open", "labels": [{{"name": "issue-addressed"}}], "user": {{"login": "author", "type": "User"}}, "updated_at": "2026-10-01T00:00:00Z"}},
                "sender": {{"login": "maintainer"}},
                {REPOSITORY}
            }}"#
        );
        let event = GitHubEvent::parse(&EventKind::Issues, &payload).unwrap().unwrap();
        let GitHubEvent::Issue(event) = event else {
            panic!("expected issue event");
        };
        assert_eq!(event.action, Action::Labeled);
        assert_eq!(event.label.unwrap().name, "issue-addressed");
        assert_eq!(event.issue.state, ItemState::Open);
        assert_eq!(event.repository.owner.login, "octo-org");
    }

    #[test]
    fn test_issue_comment_routing() {
        let on_issue =
            GitHubEvent::parse(&EventKind::IssueComment, &issue_comment_payload(false)).unwrap();
        assert!(matches!(on_issue, Some(GitHubEvent::IssueComment(_))));

        let on_pr =
            GitHubEvent::parse(&EventKind::IssueComment, &issue_comment_payload(true)).unwrap();
        assert!(matches!(on_pr, Some(GitHubEvent::PullRequestComment(_))));
    }

    #[test]
    fn test_unknown_action_is_tolerated() {
        let payload = format!(
            r#"{{
                "action": "converted_to_draft",
                "pull_request": {{"number": 8, "state": "open", "user": {{"login": "author"}}}},
                "sender": {{"login": "author"}},
                {REPOSITORY}
            }}"#
        );
        let event = GitHubEvent::parse(&EventKind::PullRequestTarget, &payload)
            .unwrap()
            .unwrap();
        let GitHubEvent::PullRequest(event) = event else {
            panic!("expected pull request event");
        };
        assert_eq!(event.action, Action::Other);
    }

    #[test]
    fn test_scheduled_event() {
        let payload = format!(r#"{{"schedule": "0 */6 * * *", {REPOSITORY}}}"#);
        let event = GitHubEvent::parse(&EventKind::Schedule, &payload).unwrap().unwrap();
        assert_eq!(event.repository().id, 1000);
        assert_eq!(event.name(), "schedule");
    }

    #[test]
    fn test_unsupported_kind_yields_none() {
        let kind = EventKind::from_name("workflow_dispatch");
        assert!(GitHubEvent::parse(&kind, "{}").unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_payload_error() {
        let result = GitHubEvent::parse(&EventKind::Issues, r#"{"action": "opened"}"#);
        assert!(matches!(result, Err(TriageError::Payload(msg)) if msg.contains("issues")));
    }

    #[test]
    fn test_missing_file_is_payload_error() {
        let result = GitHubEvent::from_file(&EventKind::Issues, Path::new("/nonexistent/event.json"));
        assert!(matches!(result, Err(TriageError::Payload(_))));
    }
}
