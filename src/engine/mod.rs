//! Rule engine
//!
//! Evaluates one event against the enabled rules and collects every resulting
//! write into a `MutationBatch`. Nothing is written to GitHub until the batch
//! is flushed at the end of the run.
//!
//! Event-driven rules share a single consolidated update for the triggering
//! issue or pull request. Scheduled rules search for matching entities and
//! queue one independent update per match.

mod issue_comments;
mod issues;
pub mod permissions;
mod pull_request_comments;
mod pull_requests;
mod reviews;
mod scheduled;

pub use permissions::{has_any_permission, is_maintainer_or_member};

use crate::batch::{BatchExecutor, FlushReport, MutationBatch};
use crate::config::RulesConfiguration;
use crate::github::{EntityRef, IssueUpdate, Label, PlatformGateway, Repository, ADMIN_OR_WRITE};
use crate::labeler::{LabelSuggester, NoSuggestions};
use crate::payload::GitHubEvent;
use crate::rules::RuleName;
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub struct RuleEngine<'a> {
    gateway: &'a dyn PlatformGateway,
    rules: &'a RulesConfiguration,
    labeler: &'a dyn LabelSuggester,
}

impl<'a> RuleEngine<'a> {
    pub fn new(gateway: &'a dyn PlatformGateway, rules: &'a RulesConfiguration) -> Self {
        Self {
            gateway,
            rules,
            labeler: &NoSuggestions,
        }
    }

    pub fn with_labeler(mut self, labeler: &'a dyn LabelSuggester) -> Self {
        self.labeler = labeler;
        self
    }

    /// Evaluate `event` and return the queued writes without applying them
    pub async fn evaluate(&self, event: &GitHubEvent) -> Result<MutationBatch> {
        self.evaluate_at(event, Utc::now()).await
    }

    /// Evaluate against an explicit clock
    pub async fn evaluate_at(&self, event: &GitHubEvent, now: DateTime<Utc>) -> Result<MutationBatch> {
        let mut ctx = RuleContext {
            gateway: self.gateway,
            rules: self.rules,
            labeler: self.labeler,
            batch: MutationBatch::new(),
            now,
        };

        debug!(event = event.name(), repository = %event.repository().name, "Evaluating rules");

        match event {
            GitHubEvent::Issue(e) => issues::process(&mut ctx, e).await?,
            GitHubEvent::IssueComment(e) => issue_comments::process(&mut ctx, e).await?,
            GitHubEvent::PullRequestComment(e) => {
                pull_request_comments::process(&mut ctx, e).await?
            }
            GitHubEvent::PullRequest(e) => pull_requests::process(&mut ctx, e).await?,
            GitHubEvent::PullRequestReview(e) => reviews::process(&mut ctx, e).await?,
            GitHubEvent::Scheduled(e) => scheduled::process(&mut ctx, e).await?,
        }

        if ctx.batch.discard_unchanged_update() {
            debug!(event = event.name(), "Shared update changes nothing; not queued");
        }

        info!(
            event = event.name(),
            queued = ctx.batch.len(),
            "Rule evaluation complete"
        );
        Ok(ctx.batch)
    }

    /// Evaluate `event` and flush the resulting batch
    pub async fn run(&self, event: &GitHubEvent) -> Result<FlushReport> {
        let batch = self.evaluate(event).await?;
        Ok(BatchExecutor::new(self.gateway).flush(batch).await)
    }
}

/// Everything a rule can see and touch during one run
pub(crate) struct RuleContext<'a> {
    pub gateway: &'a dyn PlatformGateway,
    pub rules: &'a RulesConfiguration,
    pub labeler: &'a dyn LabelSuggester,
    pub batch: MutationBatch,
    pub now: DateTime<Utc>,
}

impl RuleContext<'_> {
    pub fn enabled(&self, rule: RuleName) -> bool {
        self.rules.is_enabled(rule)
    }

    /// The consolidated update for the triggering entity
    pub fn update(&mut self, target: EntityRef, current_labels: &[Label]) -> Result<&mut IssueUpdate> {
        self.batch.shared_update(target, current_labels)
    }

    pub async fn can_write(&self, repository_id: u64, login: &str) -> Result<bool> {
        has_any_permission(self.gateway, repository_id, login, ADMIN_OR_WRITE).await
    }

    pub async fn is_trusted(&self, repository: &Repository, login: &str) -> Result<bool> {
        is_maintainer_or_member(self.gateway, repository, login).await
    }
}

/// Case-insensitive label name comparison
fn is_label(label: Option<&Label>, name: &str) -> bool {
    label.is_some_and(|l| l.name.eq_ignore_ascii_case(name))
}

/// Comment bodies are commands when they start with the command word
fn is_command(body: &str, command: &str) -> bool {
    body.trim_start()
        .get(..command.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{ItemState, User};
    use crate::payload::{Action, IssueEvent, ScheduledEvent};
    use crate::rules::constants::labels;
    use crate::test_utils::{make_issue, repository, test_now, GatewayCall, RecordingGateway};

    fn labeled_event(current: &[&str], added: &str) -> GitHubEvent {
        let issue = make_issue(5, ItemState::Open, current, 0);
        GitHubEvent::Issue(IssueEvent {
            action: Action::Labeled,
            issue,
            label: Some(Label::new(added)),
            sender: User::new("maintainer"),
            repository: repository(),
        })
    }

    #[test]
    fn test_command_detection() {
        assert!(is_command("/unresolve", "/unresolve"));
        assert!(is_command("  /UNRESOLVE please", "/unresolve"));
        assert!(!is_command("please /unresolve", "/unresolve"));
        assert!(!is_command("/un", "/unresolve"));
    }

    #[tokio::test]
    async fn test_rules_share_one_update() {
        // needs-author-feedback added to a triaged, addressed issue: three rules fire
        let gateway = RecordingGateway::new();
        let rules = RulesConfiguration::all_enabled();
        let event = labeled_event(
            &[labels::NEEDS_TRIAGE, labels::ISSUE_ADDRESSED, labels::NEEDS_AUTHOR_FEEDBACK],
            labels::NEEDS_AUTHOR_FEEDBACK,
        );

        let batch = RuleEngine::new(&gateway, &rules)
            .evaluate_at(&event, test_now())
            .await
            .unwrap();

        let pending = batch.consolidated_update().unwrap();
        assert_eq!(pending.update.labels(), [labels::NEEDS_AUTHOR_FEEDBACK]);
        assert!(batch.independent_updates().is_empty());
        assert_eq!(batch.comments().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_rules_queue_nothing() {
        let gateway = RecordingGateway::new();
        let rules = RulesConfiguration::default();
        let event = labeled_event(&[labels::NEEDS_TRIAGE], labels::ISSUE_ADDRESSED);

        let batch = RuleEngine::new(&gateway, &rules)
            .evaluate_at(&event, test_now())
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_update_is_not_queued() {
        // feedback requested on an issue carrying neither label the rule removes
        let gateway = RecordingGateway::new();
        let rules = RulesConfiguration::from_rules([RuleName::AuthorFeedbackNeeded]);
        let event = labeled_event(&[labels::NEEDS_AUTHOR_FEEDBACK], labels::NEEDS_AUTHOR_FEEDBACK);

        let batch = RuleEngine::new(&gateway, &rules)
            .evaluate_at(&event, test_now())
            .await
            .unwrap();

        assert!(batch.consolidated_update().is_none());
        assert_eq!(batch.comments().len(), 1);
        assert_eq!(batch.len(), 1);

        let report = BatchExecutor::new(&gateway).flush(batch).await;
        assert_eq!(report.attempted, 1);
        assert!(matches!(gateway.calls()[..], [GatewayCall::Comment { .. }]));
    }

    #[tokio::test]
    async fn test_run_flushes_the_batch() {
        let gateway = RecordingGateway::new().with_issues(vec![make_issue(
            3,
            ItemState::Closed,
            &[],
            120,
        )]);
        let rules = RulesConfiguration::from_rules([RuleName::LockClosedIssues]);
        let event = GitHubEvent::Scheduled(ScheduledEvent {
            schedule: None,
            repository: repository(),
        });

        let report = RuleEngine::new(&gateway, &rules).run(&event).await.unwrap();

        assert_eq!(report.attempted, 1);
        assert!(gateway
            .calls()
            .iter()
            .any(|call| matches!(call, GatewayCall::Lock { .. })));
    }
}
