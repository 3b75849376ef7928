//! Ballot Bot - a GitHub bot that governs a repository by reaction voting.
//!
//! Pull requests that pass validation are put to a community vote (`+1` / `-1`
//! reactions on the PR). Once the voting period has elapsed a poller merges or
//! closes each PR by majority. Webhooks drive validation, routing of "meta"
//! PRs to maintainers, and the author-triggered `reverify` flow.

pub mod config;
pub mod effects;
pub mod gateway;
pub mod github;
pub mod server;
pub mod types;
pub mod validation;
pub mod voting;
pub mod webhooks;
pub mod worker;

#[cfg(test)]
pub mod test_utils;
