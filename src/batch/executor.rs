//! Applies a `MutationBatch` through the platform gateway
//!
//! Order is fixed: the consolidated update, comments, review dismissals,
//! locks, then independent updates, each in insertion order. Every queued
//! write gets exactly one attempt; a failure is logged and the flush moves on.

use super::{MutationBatch, UpdateSlot};
use crate::github::{EntityRef, GatewayResult, PlatformGateway};
use tracing::{debug, error, info};

/// Outcome of a flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Successes plus failures
    pub attempted: usize,
    pub failed: usize,
}

impl FlushReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, kind: &'static str, target: EntityRef, result: GatewayResult<()>) {
        self.attempted += 1;
        match result {
            Ok(()) => debug!(kind, entity = %target, "Applied"),
            Err(e) => {
                self.failed += 1;
                error!(kind, entity = %target, error = %e, "Failed to apply");
            }
        }
    }
}

pub struct BatchExecutor<'a> {
    gateway: &'a dyn PlatformGateway,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(gateway: &'a dyn PlatformGateway) -> Self {
        Self { gateway }
    }

    /// Apply every queued write; the batch is consumed
    pub async fn flush(&self, batch: MutationBatch) -> FlushReport {
        let MutationBatch {
            updates,
            comments,
            dismissals,
            locks,
        } = batch;

        let (consolidated, independent) = match updates {
            UpdateSlot::Empty => (None, Vec::new()),
            UpdateSlot::Consolidated(pending) => (Some(pending), Vec::new()),
            UpdateSlot::Independent(updates) => (None, updates),
        };

        let mut report = FlushReport::default();

        if let Some(pending) = consolidated {
            let result = self
                .gateway
                .update_entity(pending.target, &pending.update)
                .await;
            report.record("update", pending.target, result);
        }

        for comment in comments {
            let result = self
                .gateway
                .create_comment(comment.target, &comment.body)
                .await;
            report.record("comment", comment.target, result);
        }

        for dismissal in dismissals {
            let result = self
                .gateway
                .dismiss_review(dismissal.target, dismissal.review_id, &dismissal.message)
                .await;
            report.record("review dismissal", dismissal.target, result);
        }

        for lock in locks {
            let result = self.gateway.lock_entity(lock.target, lock.reason).await;
            report.record("lock", lock.target, result);
        }

        for pending in independent {
            let result = self
                .gateway
                .update_entity(pending.target, &pending.update)
                .await;
            report.record("update", pending.target, result);
        }

        info!(
            attempted = report.attempted,
            failed = report.failed,
            "Pending updates processed"
        );
        report
    }
}
