//! In-memory gateway and fixtures shared by unit tests

use crate::github::{
    EntityRef, GatewayError, GatewayResult, Issue, IssueUpdate, ItemState, Label, LockReason,
    PermissionLevel, PlatformGateway, PullRequestLink, RateLimitStatus, Repository, Review,
    SearchPage, User,
};
use crate::search::{EntityType, IsQualifier, SearchSpec, PAGE_SIZE};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Search { query: String, page: u32 },
    Update { target: EntityRef, update: IssueUpdate },
    Comment { target: EntityRef, body: String },
    DismissReview { target: EntityRef, review_id: u64, message: String },
    Lock { target: EntityRef, reason: LockReason },
    Permission { login: String },
    OrgMembership { org: String, login: String },
    ListReviews { target: EntityRef },
}

/// Records every call and answers searches from a fixed set of issues
#[derive(Default)]
pub struct RecordingGateway {
    corpus: Vec<Issue>,
    permissions: HashMap<String, PermissionLevel>,
    not_users: HashSet<String>,
    broken_logins: HashSet<String>,
    org_members: HashSet<String>,
    reviews: HashMap<u64, Vec<Review>>,
    failing_numbers: HashSet<u64>,
    failing_search: bool,
    calls: Mutex<Vec<GatewayCall>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.corpus.extend(issues);
        self
    }

    pub fn with_permission(mut self, login: &str, level: PermissionLevel) -> Self {
        self.permissions.insert(login.to_string(), level);
        self
    }

    pub fn with_not_a_user(mut self, login: &str) -> Self {
        self.not_users.insert(login.to_string());
        self
    }

    /// Permission lookups for `login` fail with a server error
    pub fn with_broken_permission(mut self, login: &str) -> Self {
        self.broken_logins.insert(login.to_string());
        self
    }

    pub fn with_org_member(mut self, login: &str) -> Self {
        self.org_members.insert(login.to_string());
        self
    }

    pub fn with_reviews(mut self, number: u64, reviews: Vec<Review>) -> Self {
        self.reviews.insert(number, reviews);
        self
    }

    /// Every write targeting `number` fails
    pub fn failing_writes_for(mut self, number: u64) -> Self {
        self.failing_numbers.insert(number);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_pages(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Search { page, .. } => Some(page),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn write_result(&self, target: EntityRef) -> GatewayResult<()> {
        if self.failing_numbers.contains(&target.number) {
            Err(GatewayError::Api {
                status: 500,
                message: format!("write to {} failed", target),
            })
        } else {
            Ok(())
        }
    }
}

fn spec_matches(spec: &SearchSpec, issue: &Issue) -> bool {
    let type_matches = match spec.entity_type {
        EntityType::Issue => !issue.is_pull_request(),
        EntityType::PullRequest => issue.is_pull_request(),
    };
    type_matches
        && issue.state == spec.state
        && spec
            .updated_before
            .map_or(true, |cutoff| issue.updated_at < cutoff)
        && spec.include_labels.iter().all(|l| issue.has_label(l))
        && !spec.exclude_labels.iter().any(|l| issue.has_label(l))
        && spec.is_qualifiers.iter().all(|q| match q {
            IsQualifier::Locked => issue.locked,
            IsQualifier::Unlocked => !issue.locked,
            IsQualifier::Merged => issue.is_merged(),
            IsQualifier::Unmerged => !issue.is_merged(),
            IsQualifier::Draft => false,
        })
}

#[async_trait]
impl PlatformGateway for RecordingGateway {
    async fn search_entities(&self, spec: &SearchSpec, page: u32) -> GatewayResult<SearchPage> {
        self.record(GatewayCall::Search {
            query: spec.to_query(),
            page,
        });
        if self.failing_search {
            return Err(GatewayError::Api {
                status: 422,
                message: "Validation Failed".to_string(),
            });
        }

        let matching: Vec<&Issue> = self.corpus.iter().filter(|i| spec_matches(spec, i)).collect();
        let skip = (page.saturating_sub(1) * PAGE_SIZE) as usize;
        Ok(SearchPage {
            total_count: matching.len() as u64,
            items: matching
                .into_iter()
                .skip(skip)
                .take(PAGE_SIZE as usize)
                .cloned()
                .collect(),
        })
    }

    async fn update_entity(&self, target: EntityRef, update: &IssueUpdate) -> GatewayResult<()> {
        self.record(GatewayCall::Update {
            target,
            update: update.clone(),
        });
        self.write_result(target)
    }

    async fn create_comment(&self, target: EntityRef, body: &str) -> GatewayResult<()> {
        self.record(GatewayCall::Comment {
            target,
            body: body.to_string(),
        });
        self.write_result(target)
    }

    async fn dismiss_review(
        &self,
        target: EntityRef,
        review_id: u64,
        message: &str,
    ) -> GatewayResult<()> {
        self.record(GatewayCall::DismissReview {
            target,
            review_id,
            message: message.to_string(),
        });
        self.write_result(target)
    }

    async fn lock_entity(&self, target: EntityRef, reason: LockReason) -> GatewayResult<()> {
        self.record(GatewayCall::Lock { target, reason });
        self.write_result(target)
    }

    async fn collaborator_permission(
        &self,
        _repository_id: u64,
        login: &str,
    ) -> GatewayResult<PermissionLevel> {
        self.record(GatewayCall::Permission {
            login: login.to_string(),
        });
        if self.not_users.contains(login) {
            return Err(GatewayError::NotAUser {
                login: login.to_string(),
            });
        }
        if self.broken_logins.contains(login) {
            return Err(GatewayError::Api {
                status: 500,
                message: "Server Error".to_string(),
            });
        }
        Ok(self
            .permissions
            .get(login)
            .copied()
            .unwrap_or(PermissionLevel::Read))
    }

    async fn is_org_member(&self, org: &str, login: &str) -> GatewayResult<bool> {
        self.record(GatewayCall::OrgMembership {
            org: org.to_string(),
            login: login.to_string(),
        });
        Ok(self.org_members.contains(login))
    }

    async fn list_reviews(&self, target: EntityRef) -> GatewayResult<Vec<Review>> {
        self.record(GatewayCall::ListReviews { target });
        Ok(self.reviews.get(&target.number).cloned().unwrap_or_default())
    }

    async fn rate_limit(&self) -> GatewayResult<RateLimitStatus> {
        Ok(RateLimitStatus {
            limit: 5000,
            remaining: 5000,
            reset: test_now(),
        })
    }
}

pub const REPOSITORY_ID: u64 = 1000;
pub const AUTHOR: &str = "author";

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn repository() -> Repository {
    Repository {
        id: REPOSITORY_ID,
        name: "sdk".to_string(),
        owner: User::new("octo-org"),
    }
}

pub fn labels(names: &[&str]) -> Vec<Label> {
    names.iter().map(|n| Label::new(*n)).collect()
}

pub fn target(number: u64) -> EntityRef {
    EntityRef::new(REPOSITORY_ID, number)
}

/// An issue by `AUTHOR`, last updated `days_ago` days before `test_now()`
pub fn make_issue(number: u64, state: ItemState, label_names: &[&str], days_ago: i64) -> Issue {
    Issue {
        number,
        title: format!("Issue {}", number),
        state,
        labels: labels(label_names),
        user: User::new(AUTHOR),
        updated_at: test_now() - Duration::days(days_ago),
        closed_at: (state == ItemState::Closed).then(|| test_now() - Duration::days(days_ago)),
        ..Default::default()
    }
}

/// A pull request as returned by the issues search API
pub fn make_pull_request_item(
    number: u64,
    state: ItemState,
    label_names: &[&str],
    days_ago: i64,
) -> Issue {
    Issue {
        pull_request: Some(PullRequestLink::default()),
        ..make_issue(number, state, label_names, days_ago)
    }
}
