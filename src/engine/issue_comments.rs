//! Rules for comments on issues

use super::{is_command, RuleContext};
use crate::github::{EntityRef, ItemState};
use crate::payload::{Action, IssueCommentEvent};
use crate::rules::constants::{commands, comments, labels, thresholds};
use crate::rules::RuleName;
use crate::Result;
use chrono::Duration;
use tracing::info;

pub(super) async fn process(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    if event.action != Action::Created {
        return Ok(());
    }
    author_feedback(ctx, event)?;
    reset_issue_activity(ctx, event)?;
    reopen_issue(ctx, event)?;
    issue_addressed_commands(ctx, event).await?;
    Ok(())
}

fn target(event: &IssueCommentEvent) -> EntityRef {
    EntityRef::new(event.repository.id, event.issue.number)
}

fn commenter_is_author(event: &IssueCommentEvent) -> bool {
    event.comment.user.login == event.issue.user.login
}

/// The author answered, so the team has the next move
fn author_feedback(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    if !ctx.enabled(RuleName::AuthorFeedback)
        || !commenter_is_author(event)
        || !event.issue.has_label(labels::NEEDS_AUTHOR_FEEDBACK)
    {
        return Ok(());
    }

    let update = ctx.update(target(event), &event.issue.labels)?;
    update.remove_label(labels::NEEDS_AUTHOR_FEEDBACK);
    update.add_label(labels::NEEDS_TEAM_ATTENTION);
    info!(rule = %RuleName::AuthorFeedback, issue = event.issue.number, "Author responded");
    Ok(())
}

fn reset_issue_activity(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    if !ctx.enabled(RuleName::ResetIssueActivity)
        || event.issue.state != ItemState::Open
        || !event.issue.has_label(labels::NO_RECENT_ACTIVITY)
        || event.comment.user.is_bot()
    {
        return Ok(());
    }

    ctx.update(target(event), &event.issue.labels)?
        .remove_label(labels::NO_RECENT_ACTIVITY);
    info!(rule = %RuleName::ResetIssueActivity, issue = event.issue.number, "Activity reset");
    Ok(())
}

/// An issue closed for lack of feedback reopens when the author comes back
/// within the reopen window
fn reopen_issue(ctx: &mut RuleContext<'_>, event: &IssueCommentEvent) -> Result<()> {
    let issue = &event.issue;
    let window = Duration::days(thresholds::REOPEN_ISSUE_WINDOW_DAYS);
    let recently_closed = issue
        .closed_at
        .is_some_and(|closed| ctx.now - closed < window);

    if !ctx.enabled(RuleName::ReopenIssue)
        || issue.state != ItemState::Closed
        || !issue.has_label(labels::NO_RECENT_ACTIVITY)
        || !issue.has_label(labels::NEEDS_AUTHOR_FEEDBACK)
        || !commenter_is_author(event)
        || !recently_closed
    {
        return Ok(());
    }

    let update = ctx.update(target(event), &issue.labels)?;
    update.set_state(ItemState::Open);
    update.remove_label(labels::NO_RECENT_ACTIVITY);
    update.remove_label(labels::NEEDS_AUTHOR_FEEDBACK);
    update.add_label(labels::NEEDS_TEAM_ATTENTION);
    info!(rule = %RuleName::ReopenIssue, issue = issue.number, "Issue reopened");
    Ok(())
}

/// `/unresolve` from the author or a maintainer undoes `issue-addressed`
async fn issue_addressed_commands(
    ctx: &mut RuleContext<'_>,
    event: &IssueCommentEvent,
) -> Result<()> {
    let issue = &event.issue;
    if !ctx.enabled(RuleName::IssueAddressedCommands)
        || !is_command(&event.comment.body, commands::UNRESOLVE)
        || !issue.has_label(labels::ISSUE_ADDRESSED)
    {
        return Ok(());
    }

    let commenter = &event.comment.user.login;
    let allowed =
        commenter_is_author(event) || ctx.can_write(event.repository.id, commenter).await?;

    if !allowed {
        ctx.batch
            .comment(target(event), comments::unresolve_not_allowed(commenter));
        info!(rule = %RuleName::IssueAddressedCommands, issue = issue.number, commenter = %commenter, "Unresolve refused");
        return Ok(());
    }

    let update = ctx.update(target(event), &issue.labels)?;
    if issue.state == ItemState::Closed {
        update.set_state(ItemState::Open);
    }
    update.remove_label(labels::ISSUE_ADDRESSED);
    update.add_label(labels::NEEDS_TEAM_ATTENTION);
    info!(rule = %RuleName::IssueAddressedCommands, issue = issue.number, "Issue unresolved");
    Ok(())
}
