//! Rules for `pull_request_review` events

use super::RuleContext;
use crate::github::EntityRef;
use crate::payload::{Action, PullRequestReviewEvent};
use crate::rules::constants::labels;
use crate::rules::RuleName;
use crate::Result;
use tracing::info;

pub(super) async fn process(ctx: &mut RuleContext<'_>, event: &PullRequestReviewEvent) -> Result<()> {
    reset_pull_request_activity(ctx, event)
}

fn reset_pull_request_activity(
    ctx: &mut RuleContext<'_>,
    event: &PullRequestReviewEvent,
) -> Result<()> {
    let pr = &event.pull_request;
    let reviewer = event.review.user.as_ref().unwrap_or(&event.sender);
    if !ctx.enabled(RuleName::ResetPullRequestActivity)
        || event.action != Action::Submitted
        || !pr.has_label(labels::NO_RECENT_ACTIVITY)
        || reviewer.is_bot()
    {
        return Ok(());
    }

    ctx.update(EntityRef::new(event.repository.id, pr.number), &pr.labels)?
        .remove_label(labels::NO_RECENT_ACTIVITY);
    info!(rule = %RuleName::ResetPullRequestActivity, pull_request = pr.number, reviewer = %reviewer.login, "Activity reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfiguration;
    use crate::engine::RuleEngine;
    use crate::github::{PullRequest, Review, ReviewState, User};
    use crate::payload::GitHubEvent;
    use crate::test_utils::{labels as label_set, repository, test_now, RecordingGateway, AUTHOR};

    fn event(action: Action, reviewer: &str) -> GitHubEvent {
        GitHubEvent::PullRequestReview(PullRequestReviewEvent {
            action,
            review: Review {
                id: 77,
                user: Some(User::new(reviewer)),
                state: ReviewState::Commented,
            },
            pull_request: PullRequest {
                number: 50,
                labels: label_set(&[labels::NO_RECENT_ACTIVITY, "Storage"]),
                user: User::new(AUTHOR),
                ..Default::default()
            },
            sender: User::new(reviewer),
            repository: repository(),
        })
    }

    #[tokio::test]
    async fn test_review_resets_activity() {
        let gateway = RecordingGateway::new();
        let rules = RulesConfiguration::from_rules([RuleName::ResetPullRequestActivity]);
        let batch = RuleEngine::new(&gateway, &rules)
            .evaluate_at(&event(Action::Submitted, "reviewer"), test_now())
            .await
            .unwrap();
        assert_eq!(batch.consolidated_update().unwrap().update.labels(), ["Storage"]);
    }

    #[tokio::test]
    async fn test_bot_review_is_ignored() {
        let gateway = RecordingGateway::new();
        let rules = RulesConfiguration::from_rules([RuleName::ResetPullRequestActivity]);
        let batch = RuleEngine::new(&gateway, &rules)
            .evaluate_at(&event(Action::Submitted, "copilot[bot]"), test_now())
            .await
            .unwrap();
        assert!(batch.is_empty());
    }
}
