//! GitHub object shapes shared by payloads, search results and the gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an issue or pull request: (repository id, number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub repository_id: u64,
    pub number: u64,
}

impl EntityRef {
    pub fn new(repository_id: u64, number: u64) -> Self {
        Self {
            repository_id,
            number,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository_id, self.number)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    #[default]
    Open,
    Closed,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Open => "open",
            ItemState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Default::default()
        }
    }

    /// App and bot accounts never count as human activity
    pub fn is_bot(&self) -> bool {
        self.account_type.as_deref() == Some("Bot") || self.login.ends_with("[bot]")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Label lookup; GitHub label names are case-insensitive
pub fn has_label(labels: &[Label], name: &str) -> bool {
    labels.iter().any(|l| l.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub owner: User,
}

/// Marker present on issue payloads that are really pull requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestLink {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

/// An issue, or a pull request seen through the issues API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: ItemState,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<User>,
    pub user: User,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pull_request: Option<PullRequestLink>,
}

impl Issue {
    pub fn has_label(&self, name: &str) -> bool {
        has_label(&self.labels, name)
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn is_merged(&self) -> bool {
        self.pull_request
            .as_ref()
            .is_some_and(|link| link.merged_at.is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: ItemState,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub user: User,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub draft: bool,
}

impl PullRequest {
    pub fn has_label(&self, name: &str) -> bool {
        has_label(&self.labels, name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    // webhook payloads use lowercase, the REST API uppercase
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "changes_requested")]
    ChangesRequested,
    #[serde(alias = "commented")]
    Commented,
    #[serde(alias = "dismissed")]
    Dismissed,
    #[serde(alias = "pending")]
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    #[serde(default)]
    pub user: Option<User>,
    pub state: ReviewState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: User,
}

/// Collaborator permission level as reported by the permission endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Admin,
    Write,
    Read,
    None,
}

/// Admin or Write; there is no hierarchy so "can write" means either one
pub const ADMIN_OR_WRITE: &[PermissionLevel] = &[PermissionLevel::Admin, PermissionLevel::Write];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockReason {
    #[serde(rename = "off-topic")]
    OffTopic,
    #[serde(rename = "too heated")]
    TooHeated,
    #[serde(rename = "resolved")]
    Resolved,
    #[serde(rename = "spam")]
    Spam,
}

impl LockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockReason::OffTopic => "off-topic",
            LockReason::TooHeated => "too heated",
            LockReason::Resolved => "resolved",
            LockReason::Spam => "spam",
        }
    }
}

/// Core API quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    pub reset: DateTime<Utc>,
}

impl RateLimitStatus {
    pub fn minutes_until_reset(&self, now: DateTime<Utc>) -> i64 {
        (self.reset - now).num_minutes()
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchPage {
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<Issue>,
}
