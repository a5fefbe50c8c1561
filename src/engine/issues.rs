//! Rules for `issues` events

use super::{is_label, RuleContext};
use crate::github::{EntityRef, ItemState};
use crate::payload::{Action, IssueEvent};
use crate::rules::constants::{comments, labels};
use crate::rules::RuleName;
use crate::Result;
use tracing::info;

pub(super) async fn process(ctx: &mut RuleContext<'_>, event: &IssueEvent) -> Result<()> {
    initial_issue_triage(ctx, event).await?;
    manual_issue_triage(ctx, event)?;
    author_feedback_needed(ctx, event)?;
    issue_addressed(ctx, event)?;
    issue_addressed_reset(ctx, event)?;
    Ok(())
}

fn target(event: &IssueEvent) -> EntityRef {
    EntityRef::new(event.repository.id, event.issue.number)
}

/// A new issue with no labels and no assignees gets `needs-triage`, any
/// suggested labels, and is marked customer reported when the author is
/// neither a maintainer nor an org member.
async fn initial_issue_triage(ctx: &mut RuleContext<'_>, event: &IssueEvent) -> Result<()> {
    let issue = &event.issue;
    if !ctx.enabled(RuleName::InitialIssueTriage)
        || event.action != Action::Opened
        || !issue.labels.is_empty()
        || !issue.assignees.is_empty()
    {
        return Ok(());
    }

    let suggested = ctx.labeler.suggest_labels(&event.repository, issue).await;
    let trusted = ctx.is_trusted(&event.repository, &issue.user.login).await?;

    let update = ctx.update(target(event), &issue.labels)?;
    update.add_label(labels::NEEDS_TRIAGE);
    for label in &suggested {
        update.add_label(label);
    }
    if !trusted {
        update.add_label(labels::CUSTOMER_REPORTED);
        update.add_label(labels::QUESTION);
    }

    info!(
        rule = %RuleName::InitialIssueTriage,
        issue = issue.number,
        suggested = suggested.len(),
        customer_reported = !trusted,
        "Issue triaged"
    );
    Ok(())
}

/// A human adding any other label to an open issue counts as triage
fn manual_issue_triage(ctx: &mut RuleContext<'_>, event: &IssueEvent) -> Result<()> {
    let issue = &event.issue;
    if !ctx.enabled(RuleName::ManualIssueTriage)
        || event.action != Action::Labeled
        || issue.state != ItemState::Open
        || !issue.has_label(labels::NEEDS_TRIAGE)
        || event.label.is_none()
        || is_label(event.label.as_ref(), labels::NEEDS_TRIAGE)
        || event.sender.is_bot()
    {
        return Ok(());
    }

    ctx.update(target(event), &issue.labels)?
        .remove_label(labels::NEEDS_TRIAGE);
    info!(rule = %RuleName::ManualIssueTriage, issue = issue.number, "Triage label removed");
    Ok(())
}

fn author_feedback_needed(ctx: &mut RuleContext<'_>, event: &IssueEvent) -> Result<()> {
    if !ctx.enabled(RuleName::AuthorFeedbackNeeded)
        || event.action != Action::Labeled
        || !is_label(event.label.as_ref(), labels::NEEDS_AUTHOR_FEEDBACK)
    {
        return Ok(());
    }

    let update = ctx.update(target(event), &event.issue.labels)?;
    update.remove_label(labels::NEEDS_TRIAGE);
    update.remove_label(labels::NEEDS_TEAM_ATTENTION);
    ctx.batch.comment(
        target(event),
        comments::author_feedback_needed(&event.issue.user.login),
    );
    info!(rule = %RuleName::AuthorFeedbackNeeded, issue = event.issue.number, "Author feedback requested");
    Ok(())
}

fn issue_addressed(ctx: &mut RuleContext<'_>, event: &IssueEvent) -> Result<()> {
    if !ctx.enabled(RuleName::IssueAddressed)
        || event.action != Action::Labeled
        || !is_label(event.label.as_ref(), labels::ISSUE_ADDRESSED)
    {
        return Ok(());
    }

    let update = ctx.update(target(event), &event.issue.labels)?;
    for label in [
        labels::NEEDS_TRIAGE,
        labels::NEEDS_TEAM_ATTENTION,
        labels::NEEDS_AUTHOR_FEEDBACK,
        labels::NO_RECENT_ACTIVITY,
    ] {
        update.remove_label(label);
    }
    ctx.batch
        .comment(target(event), comments::issue_addressed(&event.issue.user.login));
    info!(rule = %RuleName::IssueAddressed, issue = event.issue.number, "Issue marked addressed");
    Ok(())
}

/// Asking for more work on an addressed issue un-addresses it
fn issue_addressed_reset(ctx: &mut RuleContext<'_>, event: &IssueEvent) -> Result<()> {
    let resets = [
        labels::NEEDS_TEAM_ATTENTION,
        labels::NEEDS_AUTHOR_FEEDBACK,
        labels::NEEDS_TRIAGE,
    ];
    if !ctx.enabled(RuleName::IssueAddressedReset)
        || event.action != Action::Labeled
        || !event.issue.has_label(labels::ISSUE_ADDRESSED)
        || !resets.iter().any(|l| is_label(event.label.as_ref(), l))
    {
        return Ok(());
    }

    ctx.update(target(event), &event.issue.labels)?
        .remove_label(labels::ISSUE_ADDRESSED);
    info!(rule = %RuleName::IssueAddressedReset, issue = event.issue.number, "Addressed label removed");
    Ok(())
}
