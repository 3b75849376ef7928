//! Counting reaction votes.

use serde::{Deserialize, Serialize};

use crate::effects::{Reaction, ReactionData};
use crate::types::UserId;

/// Vote counts for one PR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tally {
    /// Number of `+1` reactions.
    pub yes: u64,
    /// Number of `-1` reactions.
    pub no: u64,
}

/// The outcome a tally implies, before any policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// More `+1` than `-1`.
    Approved,
    /// More `-1` than `+1`.
    Rejected,
    /// Equal, non-zero counts.
    Tie,
    /// Nobody voted.
    NoVotes,
}

impl Tally {
    pub fn new(yes: u64, no: u64) -> Self {
        Tally { yes, no }
    }

    /// Classifies the tally.
    pub fn verdict(&self) -> Verdict {
        use std::cmp::Ordering;

        match self.yes.cmp(&self.no) {
            Ordering::Greater => Verdict::Approved,
            Ordering::Less => Verdict::Rejected,
            Ordering::Equal if self.yes == 0 => Verdict::NoVotes,
            Ordering::Equal => Verdict::Tie,
        }
    }
}

/// Counts `+1` and `-1` reactions, ignoring every reaction made by `bot`.
///
/// The bot seeds one of each on every PR it opens for voting; excluding by
/// account keeps the count right even if a seed is missing or duplicated.
///
/// Reaction sets are not deduplicated per user: someone who reacted with both
/// `+1` and `-1` counts on both sides.
pub fn tally_reactions(reactions: &[ReactionData], bot: UserId) -> Tally {
    reactions
        .iter()
        .filter(|r| r.user.id != bot)
        .fold(Tally::default(), |mut tally, r| {
            match r.content {
                Reaction::ThumbsUp => tally.yes += 1,
                Reaction::ThumbsDown => tally.no += 1,
                _ => {}
            }
            tally
        })
}
