//! Reaction voting.
//!
//! - [`ballot`] opens the vote (seed reactions and deadline comment)
//! - [`tally`] counts `+1` / `-1` reactions, excluding the bot's own
//! - [`resolution`] maps a tally to merge / close / leave open

pub mod ballot;
pub mod resolution;
pub mod tally;

pub use ballot::{format_deadline, open_ballot_effects, voting_open_comment};
pub use resolution::{Resolution, TiePolicy, resolution_effects, resolve};
pub use tally::{Tally, Verdict, tally_reactions};
