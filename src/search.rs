//! Search specifications for scheduled rules
//!
//! A `SearchSpec` is plain data; the gateway renders it into a search query.

use crate::github::ItemState;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Results per search page; the API maximum
pub const PAGE_SIZE: u32 = 100;

/// The search API stops serving results past this many matches
pub const MAX_SEARCH_RESULTS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Issue,
    PullRequest,
}

impl EntityType {
    fn qualifier(&self) -> &'static str {
        match self {
            EntityType::Issue => "issue",
            EntityType::PullRequest => "pr",
        }
    }
}

/// `is:` qualifiers beyond type and state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IsQualifier {
    Locked,
    Unlocked,
    Merged,
    Unmerged,
    Draft,
}

impl IsQualifier {
    fn as_str(&self) -> &'static str {
        match self {
            IsQualifier::Locked => "locked",
            IsQualifier::Unlocked => "unlocked",
            IsQualifier::Merged => "merged",
            IsQualifier::Unmerged => "unmerged",
            IsQualifier::Draft => "draft",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub owner: String,
    pub repo: String,
    pub entity_type: EntityType,
    pub state: ItemState,
    /// Only set when a positive day threshold was given
    pub updated_before: Option<DateTime<Utc>>,
    pub include_labels: BTreeSet<String>,
    pub exclude_labels: BTreeSet<String>,
    pub is_qualifiers: BTreeSet<IsQualifier>,
}

impl SearchSpec {
    /// Render as a search query string, e.g.
    /// `repo:o/r is:issue is:open updated:<2026-01-01T00:00:00Z label:"a" -label:"b"`
    pub fn to_query(&self) -> String {
        let mut parts = vec![
            format!("repo:{}/{}", self.owner, self.repo),
            format!("is:{}", self.entity_type.qualifier()),
            format!("is:{}", self.state.as_str()),
        ];
        parts.extend(self.is_qualifiers.iter().map(|q| format!("is:{}", q.as_str())));
        if let Some(before) = self.updated_before {
            parts.push(format!("updated:<{}", before.format("%Y-%m-%dT%H:%M:%SZ")));
        }
        parts.extend(self.include_labels.iter().map(|l| format!("label:\"{}\"", l)));
        parts.extend(self.exclude_labels.iter().map(|l| format!("-label:\"{}\"", l)));
        parts.join(" ")
    }
}

/// Assembles a `SearchSpec`
///
/// ```
/// use ghtriage::github::ItemState;
/// use ghtriage::search::{EntityType, SearchQueryBuilder};
///
/// let spec = SearchQueryBuilder::new("octo", "repo", EntityType::Issue, ItemState::Open)
///     .updated_more_than_days_ago(14)
///     .with_labels(["needs-author-feedback"])
///     .without_labels(["no-recent-activity"])
///     .build();
/// assert!(spec.updated_before.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    owner: String,
    repo: String,
    entity_type: EntityType,
    state: ItemState,
    days_since_update: u32,
    include_labels: BTreeSet<String>,
    exclude_labels: BTreeSet<String>,
    is_qualifiers: BTreeSet<IsQualifier>,
}

impl SearchQueryBuilder {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        entity_type: EntityType,
        state: ItemState,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            entity_type,
            state,
            days_since_update: 0,
            include_labels: BTreeSet::new(),
            exclude_labels: BTreeSet::new(),
            is_qualifiers: BTreeSet::new(),
        }
    }

    /// Zero means no time filter
    pub fn updated_more_than_days_ago(mut self, days: u32) -> Self {
        self.days_since_update = days;
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn without_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn with_is(mut self, qualifier: IsQualifier) -> Self {
        self.is_qualifiers.insert(qualifier);
        self
    }

    pub fn build(self) -> SearchSpec {
        self.build_at(Utc::now())
    }

    /// Build against an explicit clock
    pub fn build_at(self, now: DateTime<Utc>) -> SearchSpec {
        let updated_before = (self.days_since_update > 0)
            .then(|| now - Duration::days(i64::from(self.days_since_update)));

        SearchSpec {
            owner: self.owner,
            repo: self.repo,
            entity_type: self.entity_type,
            state: self.state,
            updated_before,
            include_labels: self.include_labels,
            exclude_labels: self.exclude_labels,
            is_qualifiers: self.is_qualifiers,
        }
    }
}
