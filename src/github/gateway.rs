//! The platform boundary
//!
//! Rules only talk to GitHub through `PlatformGateway`, which keeps evaluation
//! testable against an in-memory implementation.

use super::models::{EntityRef, LockReason, PermissionLevel, RateLimitStatus, Review, SearchPage};
use super::retry::{RetryDecision, RetryableError};
use super::update::IssueUpdate;
use crate::search::SearchSpec;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Classified platform failure
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The login is a bot, an app, or a deleted account
    #[error("{login} is not a user")]
    NotAUser { login: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("GitHub API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RetryableError for GatewayError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            GatewayError::RateLimited(secs) => RetryDecision::RetryAfter(Duration::from_secs(*secs)),
            GatewayError::Api { status, .. } if *status >= 500 => RetryDecision::Retry,
            GatewayError::Http(e) if e.is_connect() || e.is_timeout() => RetryDecision::Retry,
            _ => RetryDecision::NoRetry,
        }
    }
}

#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// One page (1-based) of issue/PR search results plus the total match count
    async fn search_entities(&self, spec: &SearchSpec, page: u32) -> GatewayResult<SearchPage>;

    async fn update_entity(&self, target: EntityRef, update: &IssueUpdate) -> GatewayResult<()>;

    async fn create_comment(&self, target: EntityRef, body: &str) -> GatewayResult<()>;

    async fn dismiss_review(
        &self,
        target: EntityRef,
        review_id: u64,
        message: &str,
    ) -> GatewayResult<()>;

    async fn lock_entity(&self, target: EntityRef, reason: LockReason) -> GatewayResult<()>;

    /// Fails with `GatewayError::NotAUser` for bots and missing accounts
    async fn collaborator_permission(
        &self,
        repository_id: u64,
        login: &str,
    ) -> GatewayResult<PermissionLevel>;

    async fn is_org_member(&self, org: &str, login: &str) -> GatewayResult<bool>;

    async fn list_reviews(&self, target: EntityRef) -> GatewayResult<Vec<Review>>;

    async fn rate_limit(&self) -> GatewayResult<RateLimitStatus>;
}
