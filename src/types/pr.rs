//! Pull request types and state representations.
//!
//! The bot never stores PRs; these are transient views of GitHub's records,
//! valid for a single poll cycle or webhook invocation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PrNumber, UserId};

/// The state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    /// The PR is open.
    Open,

    /// The PR was merged.
    Merged,

    /// The PR was closed without merging.
    Closed,
}

impl PrState {
    /// Returns true if the PR is open.
    pub fn is_open(&self) -> bool {
        matches!(self, PrState::Open)
    }
}

/// A GitHub account as it appears on PRs, comments and reactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GitHubUser {
    pub id: UserId,
    pub login: String,
}

impl GitHubUser {
    pub fn new(id: u64, login: impl Into<String>) -> Self {
        GitHubUser {
            id: UserId(id),
            login: login.into(),
        }
    }
}

/// A pull request as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    /// The PR number.
    pub number: PrNumber,
    /// The PR title. Used as the merge commit message.
    pub title: String,
    /// When the PR was opened. Voting eligibility is measured from here.
    pub created_at: DateTime<Utc>,
    /// The PR author.
    pub author: GitHubUser,
    /// Names of the labels currently on the PR.
    pub labels: Vec<String>,
    /// Open, merged or closed.
    pub state: PrState,
}

impl PrData {
    /// Returns how long the PR has been open at `now`.
    ///
    /// Clamped to zero if GitHub's clock is ahead of ours.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).max(Duration::zero())
    }
}
