//! Per-run accumulator of pending GitHub writes
//!
//! Rules never call the platform to mutate anything. They queue writes here,
//! and `BatchExecutor` applies everything once at the end of the run.
//!
//! Updates come in two shapes that never mix within a run:
//! - **consolidated**: one shared update for the entity that triggered the
//!   event; every event rule edits the same instance
//! - **independent**: one update per matched entity from a scheduled search

mod executor;

pub use executor::{BatchExecutor, FlushReport};

use crate::github::{EntityRef, IssueUpdate, Label, LockReason};
use crate::{Result, TriageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub target: EntityRef,
    pub update: IssueUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingComment {
    pub target: EntityRef,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDismissal {
    pub target: EntityRef,
    pub review_id: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLock {
    pub target: EntityRef,
    pub reason: LockReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum UpdateSlot {
    #[default]
    Empty,
    Consolidated(PendingUpdate),
    Independent(Vec<PendingUpdate>),
}

impl UpdateSlot {
    fn describe(&self) -> String {
        match self {
            UpdateSlot::Empty => "no updates".to_string(),
            UpdateSlot::Consolidated(pending) => {
                format!("a consolidated update for {}", pending.target)
            }
            UpdateSlot::Independent(updates) => {
                format!("{} independent update(s)", updates.len())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MutationBatch {
    updates: UpdateSlot,
    comments: Vec<PendingComment>,
    dismissals: Vec<PendingDismissal>,
    locks: Vec<PendingLock>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared update for the triggering entity
    ///
    /// Created from `current_labels` on first use; later calls return the same
    /// instance so edits from different rules land in one API call. Fails if
    /// the batch already holds independent updates or a shared update for a
    /// different entity.
    pub fn shared_update(
        &mut self,
        target: EntityRef,
        current_labels: &[Label],
    ) -> Result<&mut IssueUpdate> {
        if matches!(self.updates, UpdateSlot::Empty) {
            self.updates = UpdateSlot::Consolidated(PendingUpdate {
                target,
                update: IssueUpdate::from_labels(current_labels),
            });
        }

        if !matches!(&self.updates, UpdateSlot::Consolidated(pending) if pending.target == target) {
            return Err(TriageError::Batch(format!(
                "cannot share an update for {} with {}",
                target,
                self.updates.describe()
            )));
        }

        match &mut self.updates {
            UpdateSlot::Consolidated(pending) => Ok(&mut pending.update),
            _ => Err(TriageError::Batch(format!(
                "no shared update for {}",
                target
            ))),
        }
    }

    /// Drop the shared update if the rules that touched it changed nothing
    ///
    /// Returns true when an update was dropped.
    pub fn discard_unchanged_update(&mut self) -> bool {
        if matches!(&self.updates, UpdateSlot::Consolidated(pending) if pending.update.is_noop()) {
            self.updates = UpdateSlot::Empty;
            return true;
        }
        false
    }

    /// Queue an update owned by a single matched entity
    pub fn queue_update(&mut self, target: EntityRef, update: IssueUpdate) -> Result<()> {
        let pending = PendingUpdate { target, update };
        match &mut self.updates {
            UpdateSlot::Independent(updates) => {
                updates.push(pending);
                return Ok(());
            }
            consolidated @ UpdateSlot::Consolidated(_) => {
                return Err(TriageError::Batch(format!(
                    "cannot queue an independent update for {} alongside {}",
                    target,
                    consolidated.describe()
                )));
            }
            UpdateSlot::Empty => {}
        }
        self.updates = UpdateSlot::Independent(vec![pending]);
        Ok(())
    }

    pub fn comment(&mut self, target: EntityRef, body: impl Into<String>) {
        self.comments.push(PendingComment {
            target,
            body: body.into(),
        });
    }

    pub fn dismiss_review(&mut self, target: EntityRef, review_id: u64, message: impl Into<String>) {
        self.dismissals.push(PendingDismissal {
            target,
            review_id,
            message: message.into(),
        });
    }

    pub fn lock(&mut self, target: EntityRef, reason: LockReason) {
        self.locks.push(PendingLock { target, reason });
    }

    pub fn consolidated_update(&self) -> Option<&PendingUpdate> {
        match &self.updates {
            UpdateSlot::Consolidated(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn independent_updates(&self) -> &[PendingUpdate] {
        match &self.updates {
            UpdateSlot::Independent(updates) => updates,
            _ => &[],
        }
    }

    pub fn comments(&self) -> &[PendingComment] {
        &self.comments
    }

    pub fn dismissals(&self) -> &[PendingDismissal] {
        &self.dismissals
    }

    pub fn locks(&self) -> &[PendingLock] {
        &self.locks
    }

    /// Number of platform calls a flush will make
    pub fn len(&self) -> usize {
        let updates = match &self.updates {
            UpdateSlot::Empty => 0,
            UpdateSlot::Consolidated(_) => 1,
            UpdateSlot::Independent(updates) => updates.len(),
        };
        updates + self.comments.len() + self.dismissals.len() + self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
