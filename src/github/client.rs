//! REST implementation of the platform gateway
//!
//! Entity routes use the `/repositories/{id}` form so that the numeric id
//! from the event payload is enough to address an issue or pull request.

use super::gateway::{GatewayError, GatewayResult, PlatformGateway};
use super::models::{EntityRef, LockReason, PermissionLevel, RateLimitStatus, Review, SearchPage};
use super::retry::{with_retry, RetryConfig};
use super::update::IssueUpdate;
use crate::search::{SearchSpec, PAGE_SIZE};
use crate::{Result, TriageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// Message fragment GitHub returns when a permission lookup targets a bot or
/// a deleted account. Matching on text is brittle, so it is confined here and
/// surfaced to callers as `GatewayError::NotAUser`.
const NOT_A_USER_PARTIAL: &str = "is not a user";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

pub struct GitHubGateway {
    client: Client,
    api_url: String,
    token: String,
    retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: PermissionLevel,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: CoreRateLimit,
}

#[derive(Debug, Deserialize)]
struct CoreRateLimit {
    limit: u64,
    remaining: u64,
    reset: i64,
}

impl GitHubGateway {
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(concat!(
                        "ghtriage/",
                        env!("CARGO_PKG_VERSION")
                    )),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github+json"),
                );
                headers.insert(
                    header::HeaderName::from_static("x-github-api-version"),
                    header::HeaderValue::from_static("2022-11-28"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            retry: RetryConfig::default(),
        })
    }

    /// Build from `GITHUB_TOKEN` (required) and `GITHUB_API_URL` (optional)
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TriageError::Auth(format!("{} cannot be null or empty", TOKEN_ENV)))?;

        let gateway = Self::new(token)?;
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Ok(gateway.with_api_url(url)),
            _ => Ok(gateway),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn entity_url(&self, target: EntityRef, suffix: &str) -> String {
        self.url(&format!(
            "/repositories/{}/issues/{}{}",
            target.repository_id, target.number, suffix
        ))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        context: &'static str,
    ) -> GatewayResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .timeout(timeout)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_response(response, context).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        context: &'static str,
    ) -> GatewayResult<T> {
        let response = self.send(request, timeout, context).await?;
        Ok(response.json().await?)
    }
}

async fn classify_response(response: Response, context: &'static str) -> GatewayError {
    let status = response.status();
    let path = response.url().path().to_string();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    classify_failure(status, retry_after, &format!("{} ({}): {}", context, path, message))
}

fn classify_failure(status: StatusCode, retry_after: Option<u64>, message: &str) -> GatewayError {
    let rate_limited = message.to_lowercase().contains("rate limit");
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            GatewayError::RateLimited(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS))
        }
        StatusCode::FORBIDDEN if rate_limited => {
            GatewayError::RateLimited(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS))
        }
        StatusCode::UNAUTHORIZED => GatewayError::Unauthorized(message.to_string()),
        StatusCode::NOT_FOUND => GatewayError::NotFound(message.to_string()),
        status => GatewayError::Api {
            status: status.as_u16(),
            message: message.to_string(),
        },
    }
}

fn is_not_a_user(err: &GatewayError) -> bool {
    let message = match err {
        GatewayError::NotFound(message) => message,
        GatewayError::Api { message, .. } => message,
        _ => return false,
    };
    message.to_lowercase().contains(NOT_A_USER_PARTIAL)
}

#[async_trait]
impl PlatformGateway for GitHubGateway {
    async fn search_entities(&self, spec: &SearchSpec, page: u32) -> GatewayResult<SearchPage> {
        let query = spec.to_query();
        let url = self.url("/search/issues");
        let per_page = PAGE_SIZE.to_string();
        let page_param = page.to_string();

        debug!(query = %query, page, "Searching issues");

        with_retry(&self.retry, "search issues", move || {
            let request = self.client.get(&url).query(&[
                ("q", query.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ]);
            self.get_json(request, SEARCH_TIMEOUT, "search issues")
        })
        .await
    }

    async fn update_entity(&self, target: EntityRef, update: &IssueUpdate) -> GatewayResult<()> {
        let request = self
            .client
            .patch(self.entity_url(target, ""))
            .json(&update.to_request());
        self.send(request, WRITE_TIMEOUT, "update issue").await?;
        Ok(())
    }

    async fn create_comment(&self, target: EntityRef, body: &str) -> GatewayResult<()> {
        let request = self
            .client
            .post(self.entity_url(target, "/comments"))
            .json(&serde_json::json!({ "body": body }));
        self.send(request, WRITE_TIMEOUT, "create comment").await?;
        Ok(())
    }

    async fn dismiss_review(
        &self,
        target: EntityRef,
        review_id: u64,
        message: &str,
    ) -> GatewayResult<()> {
        let url = self.url(&format!(
            "/repositories/{}/pulls/{}/reviews/{}/dismissals",
            target.repository_id, target.number, review_id
        ));
        let request = self
            .client
            .put(url)
            .json(&serde_json::json!({ "message": message, "event": "DISMISS" }));
        self.send(request, WRITE_TIMEOUT, "dismiss review").await?;
        Ok(())
    }

    async fn lock_entity(&self, target: EntityRef, reason: LockReason) -> GatewayResult<()> {
        let request = self
            .client
            .put(self.entity_url(target, "/lock"))
            .json(&serde_json::json!({ "lock_reason": reason }));
        self.send(request, WRITE_TIMEOUT, "lock issue").await?;
        Ok(())
    }

    async fn collaborator_permission(
        &self,
        repository_id: u64,
        login: &str,
    ) -> GatewayResult<PermissionLevel> {
        let url = self.url(&format!(
            "/repositories/{}/collaborators/{}/permission",
            repository_id,
            urlencoding::encode(login)
        ));

        let result: GatewayResult<PermissionResponse> =
            with_retry(&self.retry, "collaborator permission", move || {
                self.get_json(self.client.get(&url), READ_TIMEOUT, "collaborator permission")
            })
            .await;

        match result {
            Ok(response) => Ok(response.permission),
            Err(e) if is_not_a_user(&e) => Err(GatewayError::NotAUser {
                login: login.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn is_org_member(&self, org: &str, login: &str) -> GatewayResult<bool> {
        let url = self.url(&format!(
            "/orgs/{}/members/{}",
            urlencoding::encode(org),
            urlencoding::encode(login)
        ));

        let result = with_retry(&self.retry, "org membership", move || {
            self.send(self.client.get(&url), READ_TIMEOUT, "org membership")
        })
        .await;

        match result {
            Ok(response) => Ok(response.status() == StatusCode::NO_CONTENT),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_reviews(&self, target: EntityRef) -> GatewayResult<Vec<Review>> {
        let url = self.url(&format!(
            "/repositories/{}/pulls/{}/reviews",
            target.repository_id, target.number
        ));
        let per_page = PAGE_SIZE.to_string();

        with_retry(&self.retry, "list reviews", move || {
            let request = self
                .client
                .get(&url)
                .query(&[("per_page", per_page.as_str())]);
            self.get_json(request, READ_TIMEOUT, "list reviews")
        })
        .await
    }

    async fn rate_limit(&self) -> GatewayResult<RateLimitStatus> {
        let response: RateLimitResponse = self
            .get_json(
                self.client.get(self.url("/rate_limit")),
                READ_TIMEOUT,
                "rate limit",
            )
            .await?;

        let core = response.resources.core;
        Ok(RateLimitStatus {
            limit: core.limit,
            remaining: core.remaining,
            reset: DateTime::from_timestamp(core.reset, 0).unwrap_or_else(Utc::now),
        })
    }
}
