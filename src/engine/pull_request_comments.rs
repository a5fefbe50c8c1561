//! Rules for comments on pull requests
//!
//! GitHub delivers these as `issue_comment` events whose issue carries a
//! `pull_request` link.

use super::{is_command, RuleContext};
use crate::github::{EntityRef, ItemState};
use crate::payload::{Action, IssueCommentEvent};
use crate::rules::constants::{commands, comments, labels};
use crate::rules::RuleName;
use crate::Result;
use tracing::info;

pub(super) async fn process(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    if event.action != Action::Created {
        return Ok(());
    }
    reset_pull_request_activity(ctx, event)?;
    reopen_pull_request(ctx, event).await?;
    Ok(())
}

fn target(event: &IssueCommentEvent) -> EntityRef {
    EntityRef::new(event.repository.id, event.issue.number)
}

fn reset_pull_request_activity(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    let pr = &event.issue;
    if !ctx.enabled(RuleName::ResetPullRequestActivity)
        || pr.state != ItemState::Open
        || !pr.has_label(labels::NO_RECENT_ACTIVITY)
        || event.comment.user.is_bot()
    {
        return Ok(());
    }

    ctx.update(target(event), &pr.labels)?
        .remove_label(labels::NO_RECENT_ACTIVITY);
    info!(rule = %RuleName::ResetPullRequestActivity, pull_request = pr.number, "Activity reset");
    Ok(())
}

/// `/reopen` on a pull request closed for inactivity
async fn reopen_pull_request(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    let pr = &event.issue;
    if !ctx.enabled(RuleName::ReopenPullRequest)
        || !is_command(&event.comment.body, commands::REOPEN)
        || pr.state != ItemState::Closed
        || pr.is_merged()
        || !pr.has_label(labels::NO_RECENT_ACTIVITY)
    {
        return Ok(());
    }

    let commenter = &event.comment.user.login;
    let allowed = *commenter == pr.user.login
        || ctx.can_write(event.repository.id, commenter).await?;

    if !allowed {
        ctx.batch
            .comment(target(event), comments::reopen_not_allowed(commenter));
        info!(rule = %RuleName::ReopenPullRequest, pull_request = pr.number, commenter = %commenter, "Reopen refused");
        return Ok(());
    }

    let update = ctx.update(target(event), &pr.labels)?;
    update.set_state(ItemState::Open);
    update.remove_label(labels::NO_RECENT_ACTIVITY);
    info!(rule = %RuleName::ReopenPullRequest, pull_request = pr.number, "Pull request reopened");
    Ok(())
}
