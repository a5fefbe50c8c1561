//! Error types for ghtriage
//!
//! Startup failures (arguments, payload, credentials, rules configuration) and
//! unclassified permission lookups surface as `TriageError`. Failures while
//! applying queued mutations never do; the batch executor logs and counts them.

use crate::github::GatewayError;
use thiserror::Error;

/// Result type alias for ghtriage operations
pub type Result<T> = std::result::Result<T, TriageError>;

#[derive(Error, Debug)]
pub enum TriageError {
    /// Rules configuration could not be found or understood
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event payload could not be read or deserialized
    #[error("Payload error: {0}")]
    Payload(String),

    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A write was queued into the batch in a shape it cannot hold
    #[error("Mutation batch error: {0}")]
    Batch(String),

    /// A platform call failed in a way the engine cannot recover from
    #[error("Platform error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}
