//! Core domain types for the ballot bot.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod ids;
pub mod pr;
pub mod workflow;

// Re-export commonly used types at the module level
pub use ids::{CommentId, DeliveryId, PrNumber, RepoId, UserId};
pub use pr::{GitHubUser, PrData, PrState};
pub use workflow::WorkflowState;
