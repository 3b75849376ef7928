//! Turning a finished vote into GitHub effects.

use serde::{Deserialize, Serialize};

use crate::effects::GitHubEffect;
use crate::types::PrData;

use super::tally::{Tally, Verdict};

/// What to do with a PR whose vote ends in a genuine (non-zero) tie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Close the PR, like a rejected vote.
    #[default]
    Close,

    /// Leave the PR open; it is re-tallied on the next poll.
    KeepOpen,
}

/// How a PR leaves the vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Resolution {
    /// Announce and merge.
    Merge { comment: String },
    /// Announce and close.
    Close { comment: String },
    /// Do nothing this cycle.
    LeaveOpen,
}

/// Decides how to resolve a PR from its tally.
pub fn resolve(tally: Tally, tie_policy: TiePolicy) -> Resolution {
    let Tally { yes, no } = tally;
    match tally.verdict() {
        Verdict::Approved => Resolution::Merge {
            comment: format!("{}:{}, merging...", yes, no),
        },
        Verdict::Rejected => Resolution::Close {
            comment: format!("{}:{}, closing...", yes, no),
        },
        Verdict::NoVotes => Resolution::Close {
            comment: "No votes, closing...".to_string(),
        },
        Verdict::Tie => match tie_policy {
            TiePolicy::Close => Resolution::Close {
                comment: format!("Tie ({}:{}), closing...", yes, no),
            },
            TiePolicy::KeepOpen => Resolution::LeaveOpen,
        },
    }
}

/// Returns the effects that carry out `resolution` on `pr`, in order.
///
/// The comment always goes first so a failure mid-way leaves an explanation
/// on the PR.
pub fn resolution_effects(pr: &PrData, resolution: &Resolution) -> Vec<GitHubEffect> {
    match resolution {
        Resolution::Merge { comment } => vec![
            GitHubEffect::PostComment {
                pr: pr.number,
                body: comment.clone(),
            },
            GitHubEffect::MergePr {
                pr: pr.number,
                commit_message: pr.title.clone(),
            },
        ],
        Resolution::Close { comment } => vec![
            GitHubEffect::PostComment {
                pr: pr.number,
                body: comment.clone(),
            },
            GitHubEffect::ClosePr { pr: pr.number },
        ],
        Resolution::LeaveOpen => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GitHubUser, PrNumber, PrState};
    use chrono::Utc;

    fn make_pr() -> PrData {
        PrData {
            number: PrNumber(12),
            title: "Add dark mode".to_string(),
            created_at: Utc::now(),
            author: GitHubUser::new(1, "alice"),
            labels: vec![],
            state: PrState::Open,
        }
    }

    #[test]
    fn approved_vote_merges_with_title() {
        let resolution = resolve(Tally::new(3, 1), TiePolicy::Close);
        assert_eq!(
            resolution,
            Resolution::Merge {
                comment: "3:1, merging...".to_string()
            }
        );

        let effects = resolution_effects(&make_pr(), &resolution);
        assert_eq!(
            effects,
            vec![
                GitHubEffect::PostComment {
                    pr: PrNumber(12),
                    body: "3:1, merging...".to_string()
                },
                GitHubEffect::MergePr {
                    pr: PrNumber(12),
                    commit_message: "Add dark mode".to_string()
                },
            ]
        );
    }

    #[test]
    fn rejected_vote_closes_without_merge() {
        let resolution = resolve(Tally::new(1, 4), TiePolicy::Close);
        let effects = resolution_effects(&make_pr(), &resolution);
        assert_eq!(
            effects,
            vec![
                GitHubEffect::PostComment {
                    pr: PrNumber(12),
                    body: "1:4, closing...".to_string()
                },
                GitHubEffect::ClosePr { pr: PrNumber(12) },
            ]
        );
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, GitHubEffect::MergePr { .. }))
        );
    }

    #[test]
    fn tie_closes_with_tie_message() {
        assert_eq!(
            resolve(Tally::new(2, 2), TiePolicy::Close),
            Resolution::Close {
                comment: "Tie (2:2), closing...".to_string()
            }
        );
    }

    #[test]
    fn no_votes_closes_with_no_votes_message() {
        assert_eq!(
            resolve(Tally::new(0, 0), TiePolicy::Close),
            Resolution::Close {
                comment: "No votes, closing...".to_string()
            }
        );
    }

    #[test]
    fn keep_open_only_applies_to_genuine_ties() {
        assert_eq!(
            resolve(Tally::new(2, 2), TiePolicy::KeepOpen),
            Resolution::LeaveOpen
        );
        assert_eq!(
            resolve(Tally::new(0, 0), TiePolicy::KeepOpen),
            Resolution::Close {
                comment: "No votes, closing...".to_string()
            }
        );
        assert!(resolution_effects(&make_pr(), &Resolution::LeaveOpen).is_empty());
    }
}
