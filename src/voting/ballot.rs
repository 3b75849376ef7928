//! Opening the vote on a PR.

use chrono::{DateTime, Duration, Utc};

use crate::effects::{GitHubEffect, Reaction};
use crate::types::PrNumber;

/// Formats a timestamp the way the voting comment shows it (RFC 1123, UTC).
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
}

/// Returns the comment announcing when voting on a PR ends.
pub fn voting_open_comment(now: DateTime<Utc>, voting_period: Duration) -> String {
    let deadline = now.checked_add_signed(voting_period).unwrap_or(DateTime::<Utc>::MAX_UTC);
    format!(
        "This issue will be in voting until (roughly) ``{}``.",
        format_deadline(deadline)
    )
}

/// Returns the effects that open the vote: one `+1` and one `-1` seed
/// reaction, then the deadline comment.
pub fn open_ballot_effects(
    pr: PrNumber,
    now: DateTime<Utc>,
    voting_period: Duration,
) -> Vec<GitHubEffect> {
    vec![
        GitHubEffect::CreateReaction {
            pr,
            reaction: Reaction::ThumbsUp,
        },
        GitHubEffect::CreateReaction {
            pr,
            reaction: Reaction::ThumbsDown,
        },
        GitHubEffect::PostComment {
            pr,
            body: voting_open_comment(now, voting_period),
        },
    ]
}
