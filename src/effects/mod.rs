//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Pure decision logic that returns effects as data
//! - Testability via recording interpreters
//! - Logging/tracing of intended operations

pub mod github;
pub mod interpreter;

pub use github::{GitHubEffect, GitHubResponse, Reaction, ReactionData};
pub use interpreter::GitHubInterpreter;
