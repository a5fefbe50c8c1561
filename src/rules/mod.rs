//! Rule identities
//!
//! Every rule the engine knows about has a stable name. The name is the key in
//! the rules configuration file and appears in every log line the rule emits.

pub mod constants;

use std::fmt;
use std::str::FromStr;

/// A named, independently toggleable rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleName {
    // Issue events
    InitialIssueTriage,
    ManualIssueTriage,
    AuthorFeedbackNeeded,
    IssueAddressed,
    IssueAddressedReset,

    // Issue comment events
    AuthorFeedback,
    ResetIssueActivity,
    ReopenIssue,
    IssueAddressedCommands,

    // Pull request, pull request comment and review events
    PullRequestTriage,
    ResetPullRequestActivity,
    ResetApprovalsForUntrustedChanges,
    ReopenPullRequest,

    // Scheduled
    CloseStaleIssues,
    IdentifyStalePullRequests,
    IdentifyStaleIssues,
    CloseStalePullRequests,
    CloseAddressedIssues,
    LockClosedIssues,
}

impl RuleName {
    pub const ALL: [RuleName; 19] = [
        RuleName::InitialIssueTriage,
        RuleName::ManualIssueTriage,
        RuleName::AuthorFeedbackNeeded,
        RuleName::IssueAddressed,
        RuleName::IssueAddressedReset,
        RuleName::AuthorFeedback,
        RuleName::ResetIssueActivity,
        RuleName::ReopenIssue,
        RuleName::IssueAddressedCommands,
        RuleName::PullRequestTriage,
        RuleName::ResetPullRequestActivity,
        RuleName::ResetApprovalsForUntrustedChanges,
        RuleName::ReopenPullRequest,
        RuleName::CloseStaleIssues,
        RuleName::IdentifyStalePullRequests,
        RuleName::IdentifyStaleIssues,
        RuleName::CloseStalePullRequests,
        RuleName::CloseAddressedIssues,
        RuleName::LockClosedIssues,
    ];

    /// Name as written in the rules configuration file
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleName::InitialIssueTriage => "InitialIssueTriage",
            RuleName::ManualIssueTriage => "ManualIssueTriage",
            RuleName::AuthorFeedbackNeeded => "AuthorFeedbackNeeded",
            RuleName::IssueAddressed => "IssueAddressed",
            RuleName::IssueAddressedReset => "IssueAddressedReset",
            RuleName::AuthorFeedback => "AuthorFeedback",
            RuleName::ResetIssueActivity => "ResetIssueActivity",
            RuleName::ReopenIssue => "ReopenIssue",
            RuleName::IssueAddressedCommands => "IssueAddressedCommands",
            RuleName::PullRequestTriage => "PullRequestTriage",
            RuleName::ResetPullRequestActivity => "ResetPullRequestActivity",
            RuleName::ResetApprovalsForUntrustedChanges => "ResetApprovalsForUntrustedChanges",
            RuleName::ReopenPullRequest => "ReopenPullRequest",
            RuleName::CloseStaleIssues => "CloseStaleIssues",
            RuleName::IdentifyStalePullRequests => "IdentifyStalePullRequests",
            RuleName::IdentifyStaleIssues => "IdentifyStaleIssues",
            RuleName::CloseStalePullRequests => "CloseStalePullRequests",
            RuleName::CloseAddressedIssues => "CloseAddressedIssues",
            RuleName::LockClosedIssues => "LockClosedIssues",
        }
    }

    /// Whether the rule runs from the cron trigger rather than a webhook event
    pub fn is_scheduled(&self) -> bool {
        matches!(
            self,
            RuleName::CloseStaleIssues
                | RuleName::IdentifyStalePullRequests
                | RuleName::IdentifyStaleIssues
                | RuleName::CloseStalePullRequests
                | RuleName::CloseAddressedIssues
                | RuleName::LockClosedIssues
        )
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleName::ALL
            .iter()
            .find(|rule| rule.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown rule: {}", s))
    }
}
