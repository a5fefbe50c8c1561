//! Rules for `pull_request_target` events

use super::RuleContext;
use crate::github::{EntityRef, ReviewState};
use crate::payload::{Action, PullRequestEvent};
use crate::rules::constants::{comments, labels};
use crate::rules::RuleName;
use crate::Result;
use tracing::info;

pub(super) async fn process(ctx: &mut RuleContext<'_>, event: &PullRequestEvent) -> Result<()> {
    pull_request_triage(ctx, event).await?;
    reset_pull_request_activity(ctx, event)?;
    reset_approvals_for_untrusted_changes(ctx, event).await?;
    Ok(())
}

fn target(event: &PullRequestEvent) -> EntityRef {
    EntityRef::new(event.repository.id, event.pull_request.number)
}

/// Outside contributions are labeled and welcomed
async fn pull_request_triage(ctx: &mut RuleContext<'_>, event: &PullRequestEvent) -> Result<()> {
    let pr = &event.pull_request;
    if !ctx.enabled(RuleName::PullRequestTriage) || event.action != Action::Opened {
        return Ok(());
    }
    if ctx.is_trusted(&event.repository, &pr.user.login).await? {
        return Ok(());
    }

    let update = ctx.update(target(event), &pr.labels)?;
    update.add_label(labels::CUSTOMER_REPORTED);
    update.add_label(labels::COMMUNITY_CONTRIBUTION);
    ctx.batch
        .comment(target(event), comments::pull_request_welcome(&pr.user.login));
    info!(rule = %RuleName::PullRequestTriage, pull_request = pr.number, "Community contribution");
    Ok(())
}

fn reset_pull_request_activity(ctx: &mut RuleContext<'_>, event: &PullRequestEvent) -> Result<()> {
    let pr = &event.pull_request;
    let activity = matches!(
        event.action,
        Action::Reopened | Action::Synchronize | Action::Edited | Action::ReviewRequested
    );
    if !ctx.enabled(RuleName::ResetPullRequestActivity)
        || !activity
        || !pr.has_label(labels::NO_RECENT_ACTIVITY)
        || event.sender.is_bot()
    {
        return Ok(());
    }

    ctx.update(target(event), &pr.labels)?
        .remove_label(labels::NO_RECENT_ACTIVITY);
    info!(rule = %RuleName::ResetPullRequestActivity, pull_request = pr.number, "Activity reset");
    Ok(())
}

/// Commits pushed by someone without write access invalidate prior approvals
async fn reset_approvals_for_untrusted_changes(
    ctx: &mut RuleContext<'_>,
    event: &PullRequestEvent,
) -> Result<()> {
    if !ctx.enabled(RuleName::ResetApprovalsForUntrustedChanges)
        || event.action != Action::Synchronize
    {
        return Ok(());
    }
    if ctx.can_write(event.repository.id, &event.sender.login).await? {
        return Ok(());
    }

    let reviews = ctx.gateway.list_reviews(target(event)).await?;
    let mut dismissed = 0;
    for review in reviews.iter().filter(|r| r.state == ReviewState::Approved) {
        ctx.batch
            .dismiss_review(target(event), review.id, comments::APPROVAL_DISMISSED);
        dismissed += 1;
    }

    if dismissed > 0 {
        info!(
            rule = %RuleName::ResetApprovalsForUntrustedChanges,
            pull_request = event.pull_request.number,
            sender = %event.sender.login,
            dismissed,
            "Approvals dismissed"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::MutationBatch;
    use crate::config::RulesConfiguration;
    use crate::engine::RuleEngine;
    use crate::github::{ItemState, PermissionLevel, PullRequest, Review, User};
    use crate::payload::GitHubEvent;
    use crate::test_utils::{labels as label_set, repository, test_now, RecordingGateway, AUTHOR};
    use crate::TriageError;

    fn event(action: Action, current: &[&str], sender: &str) -> GitHubEvent {
        GitHubEvent::PullRequest(PullRequestEvent {
            action,
            pull_request: PullRequest {
                number: 40,
                title: "Fix retry".to_string(),
                state: ItemState::Open,
                labels: label_set(current),
                user: User::new(AUTHOR),
                ..Default::default()
            },
            label: None,
            sender: User::new(sender),
            repository: repository(),
        })
    }

    fn review(id: u64, state: ReviewState) -> Review {
        Review {
            id,
            user: Some(User::new("reviewer")),
            state,
        }
    }

    async fn evaluate(gateway: &RecordingGateway, rule: RuleName, event: &GitHubEvent) -> crate::Result<MutationBatch> {
        let rules = RulesConfiguration::from_rules([rule]);
        RuleEngine::new(gateway, &rules)
            .evaluate_at(event, test_now())
            .await
    }

    #[tokio::test]
    async fn test_outside_contribution_is_labeled_and_welcomed() {
        let gateway = RecordingGateway::new();
        let batch = evaluate(&gateway, RuleName::PullRequestTriage, &event(Action::Opened, &[], AUTHOR))
            .await
            .unwrap();

        assert_eq!(
            batch.consolidated_update().unwrap().update.labels(),
            [labels::CUSTOMER_REPORTED, labels::COMMUNITY_CONTRIBUTION]
        );
        assert!(batch.comments()[0].body.contains(AUTHOR));
    }

    #[tokio::test]
    async fn test_org_member_contribution_is_left_alone() {
        let gateway = RecordingGateway::new().with_org_member(AUTHOR);
        let batch = evaluate(&gateway, RuleName::PullRequestTriage, &event(Action::Opened, &[], AUTHOR))
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_push_resets_activity() {
        let gateway = RecordingGateway::new();
        let batch = evaluate(
            &gateway,
            RuleName::ResetPullRequestActivity,
            &event(Action::Synchronize, &[labels::NO_RECENT_ACTIVITY], AUTHOR),
        )
        .await
        .unwrap();
        assert!(batch.consolidated_update().unwrap().update.labels().is_empty());
    }

    #[tokio::test]
    async fn test_untrusted_push_dismisses_approvals() {
        let gateway = RecordingGateway::new().with_reviews(
            40,
            vec![
                review(1, ReviewState::Approved),
                review(2, ReviewState::Commented),
                review(3, ReviewState::Approved),
            ],
        );
        let batch = evaluate(
            &gateway,
            RuleName::ResetApprovalsForUntrustedChanges,
            &event(Action::Synchronize, &[], "outsider"),
        )
        .await
        .unwrap();

        let ids: Vec<u64> = batch.dismissals().iter().map(|d| d.review_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(batch.consolidated_update().is_none());
    }

    #[tokio::test]
    async fn test_trusted_push_keeps_approvals() {
        let gateway = RecordingGateway::new()
            .with_permission("maintainer", PermissionLevel::Write)
            .with_reviews(40, vec![review(1, ReviewState::Approved)]);
        let batch = evaluate(
            &gateway,
            RuleName::ResetApprovalsForUntrustedChanges,
            &event(Action::Synchronize, &[], "maintainer"),
        )
        .await
        .unwrap();
        assert!(batch.dismissals().is_empty());
    }

    #[tokio::test]
    async fn test_permission_failure_aborts_evaluation() {
        let gateway = RecordingGateway::new().with_broken_permission("outsider");
        let result = evaluate(
            &gateway,
            RuleName::ResetApprovalsForUntrustedChanges,
            &event(Action::Synchronize, &[], "outsider"),
        )
        .await;
        assert!(matches!(result, Err(TriageError::Gateway(_))));
    }
}
