//! GitHub webhook event types.
//!
//! Only the deliveries the bot acts on have a variant here:
//!
//! - `pull_request` / `opened` - validate and open the vote, or route to review
//! - `pull_request` / `synchronize` - new commits move the PR to manual review
//! - `issue_comment` / `created` on a PR - the `reverify` command
//!
//! Everything else is dropped by the parser (`Ok(None)`).

use serde::{Deserialize, Serialize};

use crate::types::{GitHubUser, PrNumber, RepoId};

/// A parsed webhook delivery the bot handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEvent {
    /// A pull request was opened.
    PullRequestOpened(PullRequestEvent),

    /// New commits were pushed to a pull request.
    PullRequestSynchronized(PullRequestEvent),

    /// A comment was posted on a pull request's conversation tab.
    IssueCommentCreated(IssueCommentEvent),
}

impl WebhookEvent {
    /// Returns the repository this event belongs to.
    pub fn repo_id(&self) -> &RepoId {
        match self {
            WebhookEvent::PullRequestOpened(e) | WebhookEvent::PullRequestSynchronized(e) => {
                &e.repo
            }
            WebhookEvent::IssueCommentCreated(e) => &e.repo,
        }
    }

    /// Returns the PR this event concerns.
    pub fn pr_number(&self) -> PrNumber {
        match self {
            WebhookEvent::PullRequestOpened(e) | WebhookEvent::PullRequestSynchronized(e) => e.pr,
            WebhookEvent::IssueCommentCreated(e) => e.pr,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookEvent::PullRequestOpened(_) => "pull_request.opened",
            WebhookEvent::PullRequestSynchronized(_) => "pull_request.synchronize",
            WebhookEvent::IssueCommentCreated(_) => "issue_comment.created",
        }
    }
}

/// A `pull_request` delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub repo: RepoId,
    pub pr: PrNumber,
    pub title: String,
    pub author: GitHubUser,
    /// Labels on the PR at delivery time.
    pub labels: Vec<String>,
}

impl PullRequestEvent {
    /// Returns true if the title marks the PR as meta (case-insensitive `meta` prefix).
    pub fn is_meta_titled(&self) -> bool {
        self.title.to_lowercase().starts_with("meta")
    }
}

/// An `issue_comment` delivery on a pull request.
///
/// Comments on plain issues never produce one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub repo: RepoId,
    pub pr: PrNumber,
    /// Who wrote the comment.
    pub commenter: GitHubUser,
    pub body: String,
    /// Who opened the PR.
    pub pr_author: GitHubUser,
    /// Labels on the PR at delivery time.
    pub labels: Vec<String>,
}

impl IssueCommentEvent {
    /// Returns true if the comment is the `reverify` command.
    ///
    /// The whole body must be the keyword; case is not significant.
    pub fn is_reverify_command(&self) -> bool {
        self.body.eq_ignore_ascii_case("reverify")
    }

    /// Returns true if the PR's author wrote the comment (compared by user id).
    pub fn is_from_author(&self) -> bool {
        self.commenter.id == self.pr_author.id
    }
}
