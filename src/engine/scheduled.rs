//! Scheduled (cron) rules
//!
//! Each rule is a search plus a per-match action. Matches are found through
//! the search API, paging until the reported total is exhausted, and every
//! matched entity gets its own independent writes in the batch.

use super::RuleContext;
use crate::batch::MutationBatch;
use crate::github::{EntityRef, Issue, IssueUpdate, ItemState, LockReason, Repository};
use crate::payload::ScheduledEvent;
use crate::rules::constants::{comments, labels, thresholds};
use crate::rules::RuleName;
use crate::search::{EntityType, IsQualifier, SearchQueryBuilder, SearchSpec, MAX_SEARCH_RESULTS, PAGE_SIZE};
use crate::Result;
use tracing::{debug, error, info};

struct ScheduledRule {
    name: RuleName,
    search: fn(&Repository) -> SearchQueryBuilder,
    apply: fn(&mut MutationBatch, EntityRef, &Issue) -> Result<()>,
}

/// Run order
const RULES: &[ScheduledRule] = &[
    ScheduledRule {
        name: RuleName::CloseStaleIssues,
        search: close_stale_issues_search,
        apply: close_entity,
    },
    ScheduledRule {
        name: RuleName::CloseStalePullRequests,
        search: close_stale_pull_requests_search,
        apply: close_stale_pull_request,
    },
    ScheduledRule {
        name: RuleName::IdentifyStalePullRequests,
        search: identify_stale_pull_requests_search,
        apply: mark_stale_pull_request,
    },
    ScheduledRule {
        name: RuleName::IdentifyStaleIssues,
        search: identify_stale_issues_search,
        apply: mark_stale_issue,
    },
    ScheduledRule {
        name: RuleName::CloseAddressedIssues,
        search: close_addressed_issues_search,
        apply: close_addressed_issue,
    },
    ScheduledRule {
        name: RuleName::LockClosedIssues,
        search: lock_closed_issues_search,
        apply: lock_issue,
    },
];

pub(super) async fn process(ctx: &mut RuleContext<'_>, event: &ScheduledEvent) -> Result<()> {
    for rule in RULES {
        if !ctx.enabled(rule.name) {
            continue;
        }

        let spec = (rule.search)(&event.repository).build_at(ctx.now);
        let matches = search_all(ctx, rule.name, &spec).await;
        for issue in &matches {
            let target = EntityRef::new(event.repository.id, issue.number);
            (rule.apply)(&mut ctx.batch, target, issue)?;
        }

        info!(rule = %rule.name, matched = matches.len(), "Scheduled rule evaluated");
    }
    Ok(())
}

/// Collect every page of results for `spec`
///
/// Paging stops once `page * PAGE_SIZE` covers the total (capped at what the
/// search API will serve) or a page comes back empty. A failed search ends
/// paging for this rule; matches already fetched are kept.
async fn search_all(ctx: &RuleContext<'_>, rule: RuleName, spec: &SearchSpec) -> Vec<Issue> {
    let mut items = Vec::new();
    let mut page = 1u32;

    loop {
        let result = match ctx.gateway.search_entities(spec, page).await {
            Ok(result) => result,
            Err(e) => {
                error!(rule = %rule, page, query = %spec.to_query(), error = %e, "Search failed");
                break;
            }
        };

        let reachable = result.total_count.min(MAX_SEARCH_RESULTS);
        debug!(rule = %rule, page, total = result.total_count, returned = result.items.len(), "Search page");

        let empty = result.items.is_empty();
        items.extend(result.items);
        if empty || u64::from(page) * u64::from(PAGE_SIZE) >= reachable {
            break;
        }
        page += 1;
    }

    items
}

fn builder(repository: &Repository, entity_type: EntityType, state: ItemState) -> SearchQueryBuilder {
    SearchQueryBuilder::new(&repository.owner.login, &repository.name, entity_type, state)
}

fn close_stale_issues_search(repository: &Repository) -> SearchQueryBuilder {
    builder(repository, EntityType::Issue, ItemState::Open)
        .updated_more_than_days_ago(thresholds::CLOSE_STALE_ISSUES_DAYS)
        .with_labels([labels::NEEDS_AUTHOR_FEEDBACK, labels::NO_RECENT_ACTIVITY])
}

fn close_stale_pull_requests_search(repository: &Repository) -> SearchQueryBuilder {
    builder(repository, EntityType::PullRequest, ItemState::Open)
        .updated_more_than_days_ago(thresholds::CLOSE_STALE_PULL_REQUESTS_DAYS)
        .with_labels([labels::NO_RECENT_ACTIVITY])
}

fn identify_stale_pull_requests_search(repository: &Repository) -> SearchQueryBuilder {
    builder(repository, EntityType::PullRequest, ItemState::Open)
        .updated_more_than_days_ago(thresholds::IDENTIFY_STALE_PULL_REQUESTS_DAYS)
        .without_labels([labels::NO_RECENT_ACTIVITY])
}

fn identify_stale_issues_search(repository: &Repository) -> SearchQueryBuilder {
    builder(repository, EntityType::Issue, ItemState::Open)
        .updated_more_than_days_ago(thresholds::IDENTIFY_STALE_ISSUES_DAYS)
        .with_labels([labels::NEEDS_AUTHOR_FEEDBACK])
        .without_labels([labels::NO_RECENT_ACTIVITY])
}

fn close_addressed_issues_search(repository: &Repository) -> SearchQueryBuilder {
    builder(repository, EntityType::Issue, ItemState::Open)
        .updated_more_than_days_ago(thresholds::CLOSE_ADDRESSED_ISSUES_DAYS)
        .with_labels([labels::ISSUE_ADDRESSED])
}

fn lock_closed_issues_search(repository: &Repository) -> SearchQueryBuilder {
    builder(repository, EntityType::Issue, ItemState::Closed)
        .updated_more_than_days_ago(thresholds::LOCK_CLOSED_ISSUES_DAYS)
        .with_is(IsQualifier::Unlocked)
}

fn closed(issue: &Issue) -> IssueUpdate {
    let mut update = IssueUpdate::from_labels(&issue.labels);
    update.set_state(ItemState::Closed);
    update
}

fn close_entity(batch: &mut MutationBatch, target: EntityRef, issue: &Issue) -> Result<()> {
    batch.queue_update(target, closed(issue))
}

fn close_stale_pull_request(batch: &mut MutationBatch, target: EntityRef, issue: &Issue) -> Result<()> {
    batch.queue_update(target, closed(issue))?;
    batch.comment(target, comments::stale_pull_request_closed(&issue.user.login));
    Ok(())
}

fn mark_stale_pull_request(batch: &mut MutationBatch, target: EntityRef, issue: &Issue) -> Result<()> {
    let mut update = IssueUpdate::from_labels(&issue.labels);
    update.add_label(labels::NO_RECENT_ACTIVITY);
    batch.queue_update(target, update)?;
    batch.comment(target, comments::stale_pull_request_reminder(&issue.user.login));
    Ok(())
}

fn mark_stale_issue(batch: &mut MutationBatch, target: EntityRef, issue: &Issue) -> Result<()> {
    let mut update = IssueUpdate::from_labels(&issue.labels);
    update.add_label(labels::NO_RECENT_ACTIVITY);
    batch.queue_update(target, update)?;
    batch.comment(target, comments::stale_issue_reminder());
    Ok(())
}

fn close_addressed_issue(batch: &mut MutationBatch, target: EntityRef, issue: &Issue) -> Result<()> {
    batch.queue_update(target, closed(issue))?;
    batch.comment(target, comments::addressed_issue_closed(&issue.user.login));
    Ok(())
}

fn lock_issue(batch: &mut MutationBatch, target: EntityRef, _issue: &Issue) -> Result<()> {
    batch.lock(target, LockReason::Resolved);
    Ok(())
}
