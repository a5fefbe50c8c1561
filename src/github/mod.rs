//! GitHub collaborator
//!
//! - **models**: issue, pull request, review and permission shapes
//! - **update**: the field-level delta applied to an issue or pull request
//! - **gateway**: the `PlatformGateway` trait and its classified errors
//! - **client**: reqwest implementation against the REST API
//! - **retry**: backoff for read-only calls

pub mod client;
pub mod gateway;
pub mod models;
pub mod retry;
pub mod update;

pub use client::GitHubGateway;
pub use gateway::{GatewayError, GatewayResult, PlatformGateway};
pub use models::{
    has_label, Comment, EntityRef, Issue, ItemState, Label, LockReason, PermissionLevel,
    PullRequest, PullRequestLink, RateLimitStatus, Repository, Review, ReviewState, SearchPage,
    User, ADMIN_OR_WRITE,
};
pub use update::{IssueUpdate, UpdateIssueRequest};

use chrono::Utc;
use tracing::{info, warn};

/// Log the core quota. Failures are logged and otherwise ignored.
pub async fn log_rate_limit(gateway: &dyn PlatformGateway, when: &str) {
    match gateway.rate_limit().await {
        Ok(status) => info!(
            when,
            limit = status.limit,
            remaining = status.remaining,
            reset_in_minutes = status.minutes_until_reset(Utc::now()),
            "Rate limit"
        ),
        Err(e) => warn!(when, error = %e, "Could not read rate limit"),
    }
}
