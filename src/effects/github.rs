//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The octocrab interpreter in `crate::github` executes them against the real
//! API; tests use a recording interpreter instead.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, GitHubUser, PrData, PrNumber};

/// GitHub reaction types.
///
/// These correspond to the reactions available on GitHub issues and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    /// +1 / thumbs up
    ThumbsUp,
    /// -1 / thumbs down
    ThumbsDown,
    /// Laugh
    Laugh,
    /// Hooray / tada
    Hooray,
    /// Confused
    Confused,
    /// Heart
    Heart,
    /// Rocket
    Rocket,
    /// Eyes
    Eyes,
}

impl Reaction {
    /// Returns the GitHub API content string for this reaction.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Reaction::ThumbsUp => "+1",
            Reaction::ThumbsDown => "-1",
            Reaction::Laugh => "laugh",
            Reaction::Hooray => "hooray",
            Reaction::Confused => "confused",
            Reaction::Heart => "heart",
            Reaction::Rocket => "rocket",
            Reaction::Eyes => "eyes",
        }
    }

    /// Parses a GitHub API content string. Returns `None` for unknown content.
    pub fn from_api_str(s: &str) -> Option<Self> {
        Some(match s {
            "+1" => Reaction::ThumbsUp,
            "-1" => Reaction::ThumbsDown,
            "laugh" => Reaction::Laugh,
            "hooray" => Reaction::Hooray,
            "confused" => Reaction::Confused,
            "heart" => Reaction::Heart,
            "rocket" => Reaction::Rocket,
            "eyes" => Reaction::Eyes,
            _ => return None,
        })
    }
}

/// A GitHub API effect.
///
/// Each variant describes a GitHub API operation. Effects are repo-scoped:
/// the interpreter is constructed with a `RepoId`, so effects don't include it.
/// Issue-thread operations (comments, reactions, labels, lock) address the PR
/// by number, since every PR is also an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Queries ──────────────────────────────────────────────────────────────
    /// List all open PRs in the repository.
    ListOpenPrs,

    /// Fetch a single PR by number.
    GetPr { pr: PrNumber },

    /// List the paths of the files a PR changes.
    ListPrFiles { pr: PrNumber },

    /// List the reactions on a PR's issue thread.
    ListReactions { pr: PrNumber },

    /// List the names of every label defined in the repository.
    ListRepoLabels,

    /// Fetch the account the bot is authenticated as.
    GetAuthenticatedUser,

    // ─── PR Mutations ─────────────────────────────────────────────────────────
    /// Merge a PR, using `commit_message` as the merge commit message.
    MergePr { pr: PrNumber, commit_message: String },

    /// Close a PR without merging.
    ClosePr { pr: PrNumber },

    // ─── Issue Thread Mutations ───────────────────────────────────────────────
    /// Post a new comment on a PR.
    PostComment { pr: PrNumber, body: String },

    /// Add a reaction to a PR's issue thread.
    CreateReaction { pr: PrNumber, reaction: Reaction },

    /// Add labels to a PR, keeping the existing ones.
    AddLabels { pr: PrNumber, labels: Vec<String> },

    /// Remove one label from a PR.
    RemoveLabel { pr: PrNumber, label: String },

    /// Replace every label on a PR with `labels`.
    ReplaceLabels { pr: PrNumber, labels: Vec<String> },

    /// Assign users to a PR.
    AddAssignees { pr: PrNumber, assignees: Vec<String> },

    /// Lock a PR's conversation so no further comments can be posted.
    LockConversation { pr: PrNumber },
}

impl GitHubEffect {
    /// Returns true if this effect changes anything on GitHub.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            GitHubEffect::ListOpenPrs
                | GitHubEffect::GetPr { .. }
                | GitHubEffect::ListPrFiles { .. }
                | GitHubEffect::ListReactions { .. }
                | GitHubEffect::ListRepoLabels
                | GitHubEffect::GetAuthenticatedUser
        )
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// A reaction on an issue thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionData {
    /// The reaction content.
    pub content: Reaction,
    /// Who reacted.
    pub user: GitHubUser,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `ListOpenPrs`.
    PrList(Vec<PrData>),

    /// Response to `GetPr`.
    Pr(PrData),

    /// Response to `ListPrFiles`.
    Files(Vec<String>),

    /// Response to `ListReactions`.
    Reactions(Vec<ReactionData>),

    /// Response to `ListRepoLabels`.
    RepoLabels(Vec<String>),

    /// Response to `GetAuthenticatedUser`.
    User(GitHubUser),

    /// Response to `MergePr`.
    Merged,

    /// Response to `ClosePr`.
    Closed,

    /// Response to `PostComment`.
    CommentPosted { id: CommentId },

    /// Response to `CreateReaction`.
    ReactionCreated,

    /// Response to `AddLabels`, `RemoveLabel` and `ReplaceLabels`.
    LabelsUpdated,

    /// Response to `AddAssignees`.
    AssigneesAdded,

    /// Response to `LockConversation`.
    Locked,
}
