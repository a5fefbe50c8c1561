//! ghtriage - rule-driven issue and pull request lifecycle automation for GitHub
//!
//! Runs once per workflow event. Every enabled rule is evaluated against the
//! event (or, for scheduled runs, against search results), writes are queued
//! into a single batch, and the batch is applied at the end of the run.
//!
//! # Architecture
//!
//! - **config**: per-repository rules file switching each rule on or off
//! - **payload**: webhook payload shapes and event routing
//! - **search**: search specifications for scheduled rules
//! - **github**: the `PlatformGateway` boundary and its REST implementation
//! - **batch**: the mutation batch and its executor
//! - **engine**: event-driven and scheduled rules
//! - **rules**: rule names, labels, thresholds and comment text
//! - **labeler**: optional label suggestions for new issues

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod github;
pub mod labeler;
pub mod logging;
pub mod payload;
pub mod rules;
pub mod search;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Result, TriageError};
