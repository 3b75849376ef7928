//! Workflow state of a pull request, derived from its labels.
//!
//! Labels are the bot's only persisted state. Every handler and every poll
//! step computes a `WorkflowState` up front instead of checking individual
//! labels in each branch.

use serde::{Deserialize, Serialize};

use crate::config::LabelNames;

/// Where a pull request is in the voting workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Just opened; the bot has not acted on it yet.
    New,

    /// In the community vote. Resolved by the poller once old enough.
    AwaitingVotes,

    /// Failed validation; waiting for the author to comment `reverify`.
    PendingReverify,

    /// Routed to maintainers. Never touched by the vote.
    ManualReview,
}

impl WorkflowState {
    /// Computes the state of a PR that already went through the opened handler.
    ///
    /// Manual review wins over pending reverification.
    pub fn from_labels<S: AsRef<str>>(labels: &[S], names: &LabelNames) -> Self {
        let has = |name: &str| labels.iter().any(|l| l.as_ref() == name);

        if has(&names.manual_review) {
            WorkflowState::ManualReview
        } else if has(&names.pending_reverify) {
            WorkflowState::PendingReverify
        } else {
            WorkflowState::AwaitingVotes
        }
    }

    /// Computes the state of a PR from an `opened` delivery.
    ///
    /// A freshly opened PR is `New` unless it was created with workflow labels
    /// already applied.
    pub fn on_open<S: AsRef<str>>(labels: &[S], names: &LabelNames) -> Self {
        match Self::from_labels(labels, names) {
            WorkflowState::AwaitingVotes => WorkflowState::New,
            other => other,
        }
    }

    /// Returns true if the poller must leave this PR alone.
    pub fn is_excluded_from_vote(&self) -> bool {
        matches!(
            self,
            WorkflowState::PendingReverify | WorkflowState::ManualReview
        )
    }
}
