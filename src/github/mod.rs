//! GitHub API client and effect interpreter.
//!
//! This module executes `GitHubEffect`s via the octocrab library, implementing
//! the `GitHubInterpreter` trait defined in the effects module. Failures are
//! categorized as transient or permanent for logging; nothing here retries.

mod client;
mod error;
mod interpreter;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
