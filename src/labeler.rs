//! Label suggestions for newly opened issues
//!
//! Suggestions come from an external classification service. The service is
//! optional: without an API key, or when a call fails for any reason, the
//! suggester returns no labels and triage continues without them.

use crate::github::{Issue, Repository};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const API_KEY_ENV: &str = "LABEL_SERVICE_API_KEY";
pub const DEFAULT_SERVICE_URL: &str =
    "https://issuelabeler.azurewebsites.net/api/AzureSdkIssueLabelerService";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait LabelSuggester: Send + Sync {
    /// Never fails; an empty list means no suggestion
    async fn suggest_labels(&self, repository: &Repository, issue: &Issue) -> Vec<String>;
}

/// Suggests nothing
pub struct NoSuggestions;

#[async_trait]
impl LabelSuggester for NoSuggestions {
    async fn suggest_labels(&self, _repository: &Repository, _issue: &Issue) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LabelRequest<'a> {
    issue_number: u64,
    title: &'a str,
    body: &'a str,
    issue_user_login: &'a str,
    repository_name: &'a str,
    repository_owner_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    #[serde(alias = "Labels", default)]
    labels: Vec<String>,
}

pub struct LabelServiceClient {
    client: Client,
    url: String,
    api_key: String,
}

impl LabelServiceClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: DEFAULT_SERVICE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// `None` when `LABEL_SERVICE_API_KEY` is unset or empty
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Errors never carry the request URL, which holds the API key
    async fn request(
        &self,
        repository: &Repository,
        issue: &Issue,
    ) -> Result<Vec<String>, reqwest::Error> {
        self.send(repository, issue)
            .await
            .map(|response| response.labels)
            .map_err(reqwest::Error::without_url)
    }

    async fn send(&self, repository: &Repository, issue: &Issue) -> Result<LabelResponse, reqwest::Error> {
        let body = LabelRequest {
            issue_number: issue.number,
            title: &issue.title,
            body: issue.body.as_deref().unwrap_or_default(),
            issue_user_login: &issue.user.login,
            repository_name: &repository.name,
            repository_owner_name: &repository.owner.login,
        };

        self.client
            .post(&self.url)
            .query(&[("code", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl LabelSuggester for LabelServiceClient {
    async fn suggest_labels(&self, repository: &Repository, issue: &Issue) -> Vec<String> {
        match self.request(repository, issue).await {
            Ok(labels) => {
                debug!(issue = issue.number, labels = ?labels, "Label suggestions received");
                labels
            }
            Err(e) => {
                warn!(issue = issue.number, error = %e, "Label service unavailable; continuing without suggestions");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::User;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fixtures() -> (Repository, Issue) {
        let repository = Repository {
            id: 1,
            name: "sdk".to_string(),
            owner: User::new("octo-org"),
        };
        let issue = Issue {
            number: 17,
            title: "Blob upload hangs".to_string(),
            body: Some("Steps to reproduce".to_string()),
            user: User::new("author"),
            ..Default::default()
        };
        (repository, issue)
    }

    #[tokio::test]
    async fn test_suggestions_are_returned() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/labeler")
                .query_param("code", "secret")
                .json_body(json!({
                    "IssueNumber": 17,
                    "Title": "Blob upload hangs",
                    "Body": "Steps to reproduce",
                    "IssueUserLogin": "author",
                    "RepositoryName": "sdk",
                    "RepositoryOwnerName": "octo-org"
                }));
            then.status(200)
                .json_body(json!({ "labels": ["Storage", "Client"] }));
        });

        let (repository, issue) = fixtures();
        let client = LabelServiceClient::new("secret").with_url(server.url("/labeler"));
        let labels = client.suggest_labels(&repository, &issue).await;

        mock.assert_calls(1);
        assert_eq!(labels, vec!["Storage", "Client"]);
    }

    #[tokio::test]
    async fn test_failure_yields_no_labels() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/labeler");
            then.status(500);
        });

        let (repository, issue) = fixtures();
        let client = LabelServiceClient::new("secret").with_url(server.url("/labeler"));
        assert!(client.suggest_labels(&repository, &issue).await.is_empty());
    }

    #[tokio::test]
    async fn test_api_key_is_not_exposed_in_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/labeler");
            then.status(500);
        });

        let (repository, issue) = fixtures();
        let client = LabelServiceClient::new("SUPERSECRETKEY").with_url(server.url("/labeler"));
        let err = client.request(&repository, &issue).await.unwrap_err();

        assert!(err.is_status());
        assert!(err.url().is_none());
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{:?}", err).contains("SUPERSECRETKEY"));
    }

    #[test]
    fn test_response_accepts_pascal_case() {
        let response: LabelResponse = serde_json::from_str(r#"{"Labels": ["Storage"]}"#).unwrap();
        assert_eq!(response.labels, vec!["Storage"]);
    }

    #[tokio::test]
    async fn test_no_suggestions() {
        let (repository, issue) = fixtures();
        assert!(NoSuggestions.suggest_labels(&repository, &issue).await.is_empty());
    }
}
