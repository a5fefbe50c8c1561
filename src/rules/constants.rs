//! Labels, thresholds and comment text used by the rules

pub mod labels {
    pub const NEEDS_TRIAGE: &str = "needs-triage";
    pub const NEEDS_TEAM_ATTENTION: &str = "needs-team-attention";
    pub const NEEDS_AUTHOR_FEEDBACK: &str = "needs-author-feedback";
    pub const NO_RECENT_ACTIVITY: &str = "no-recent-activity";
    pub const ISSUE_ADDRESSED: &str = "issue-addressed";
    pub const CUSTOMER_REPORTED: &str = "customer-reported";
    pub const QUESTION: &str = "question";
    pub const COMMUNITY_CONTRIBUTION: &str = "Community Contribution";
}

pub mod thresholds {
    pub const CLOSE_STALE_ISSUES_DAYS: u32 = 14;
    pub const IDENTIFY_STALE_PULL_REQUESTS_DAYS: u32 = 60;
    pub const IDENTIFY_STALE_ISSUES_DAYS: u32 = 7;
    pub const CLOSE_STALE_PULL_REQUESTS_DAYS: u32 = 7;
    pub const CLOSE_ADDRESSED_ISSUES_DAYS: u32 = 7;
    pub const LOCK_CLOSED_ISSUES_DAYS: u32 = 90;
    /// How long after closing an author comment still reopens a stale issue
    pub const REOPEN_ISSUE_WINDOW_DAYS: i64 = 7;
}

pub mod commands {
    pub const UNRESOLVE: &str = "/unresolve";
    pub const REOPEN: &str = "/reopen";
}

pub mod comments {
    pub fn author_feedback_needed(author: &str) -> String {
        format!(
            "Hi @{author}. Thank you for opening this issue and giving us the opportunity to assist. \
             To help our team better understand your issue and the details of your scenario please \
             provide a response to the question asked above or the information requested above. \
             This will help us more accurately address your issue."
        )
    }

    pub fn issue_addressed(author: &str) -> String {
        format!(
            "Hi @{author}. Thank you for opening this issue and giving us the opportunity to assist. \
             We believe that this has been addressed. If you feel that further discussion is needed, \
             please add a comment with the text \"`/unresolve`\" to remove the \"issue-addressed\" \
             label and continue the conversation."
        )
    }

    pub fn unresolve_not_allowed(commenter: &str) -> String {
        format!(
            "Hi @{commenter}, only the original author of the issue or a repository maintainer \
             can ask that it be unresolved."
        )
    }

    pub fn pull_request_welcome(author: &str) -> String {
        format!(
            "Thank you for your contribution @{author}! We will review the pull request and get \
             back to you soon."
        )
    }

    pub fn reopen_not_allowed(commenter: &str) -> String {
        format!(
            "Sorry, @{commenter}, only the original author or a repository maintainer can reopen \
             this pull request."
        )
    }

    pub fn stale_issue_reminder() -> String {
        "Hi, we're sending this friendly reminder because we haven't heard back from you in \
         **7 days**. We need more information about this issue to help address it. Please be sure \
         to give us your input. If we don't hear back from you within **14 days** of this comment \
         the issue will be automatically closed. Thank you!"
            .to_string()
    }

    pub fn stale_pull_request_reminder(author: &str) -> String {
        format!(
            "Hi @{author}.  Thank you for your interest in helping to improve the SDK experience and \
             for your contribution.  We've noticed that there hasn't been recent engagement on this \
             pull request.  If this is still an active work stream, please let us know by pushing \
             some changes or leaving a comment.  Otherwise, we'll close this out in 7 days."
        )
    }

    pub fn stale_pull_request_closed(author: &str) -> String {
        format!(
            "Hi @{author}.  Thank you for your contribution.  Since there hasn't been recent \
             engagement, we're going to close this out.  Feel free to respond with a comment \
             containing \"/reopen\" if you'd like to continue working on these changes.  Please be \
             sure to use the command to reopen or remove the \"no-recent-activity\" label; \
             otherwise, this is likely to be closed again with the next cleanup pass."
        )
    }

    pub fn addressed_issue_closed(author: &str) -> String {
        format!(
            "Hi @{author}, since you haven't asked that we \"`/unresolve`\" the issue, we'll close \
             this out. If you believe further discussion is needed, please add a comment \
             \"`/unresolve`\" to reopen the issue."
        )
    }

    pub const APPROVAL_DISMISSED: &str =
        "Hi, new commits were pushed by a user without write access. Approvals have been dismissed \
         and the changes need a fresh review.";
}
