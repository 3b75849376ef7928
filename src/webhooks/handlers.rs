//! Event handlers for webhook deliveries.
//!
//! Each handler reads what it needs through the gateway, decides with pure
//! planning functions that return `Vec<GitHubEffect>`, then applies the plan.
//!
//! | Event | Behaviour |
//! |-------|-----------|
//! | `pull_request.opened` | meta title or meta files -> manual review; rejected -> comment + `pending-reverify`; otherwise open the vote |
//! | `pull_request.synchronize` | labels replaced with the manual-review label |
//! | `issue_comment.created` | author's `reverify` on a pending PR -> re-validate, then open the vote or close and lock |

use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use tracing::{debug, info};

use crate::config::{Config, LabelNames};
use crate::effects::{GitHubEffect, GitHubInterpreter};
use crate::gateway::{Gateway, GatewayError};
use crate::types::{PrNumber, WorkflowState};
use crate::validation::{ValidationOutcome, format_reasons, validate_files};
use crate::voting::open_ballot_effects;

use super::events::{IssueCommentEvent, PullRequestEvent, WebhookEvent};

/// Reason shown when reverification finds files that need a maintainer.
const MANUAL_REVIEW_REASON: &str = "- Changes files that need review by a maintainer";

/// What a handler did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Seed reactions and the deadline comment were posted.
    VotingOpened,
    /// Labelled for manual review and assigned to maintainers.
    RoutedToManualReview,
    /// Rejection comment posted and `pending-reverify` added.
    Rejected,
    /// New commits: labels replaced with the manual-review label.
    MovedToManualReview,
    /// Reverification passed; `pending-reverify` removed and the vote opened.
    Reverified,
    /// Reverification failed; the PR was closed and locked.
    ClosedAfterReverify,
    /// Nothing to do.
    Ignored(&'static str),
}

// ─── Planning ─────────────────────────────────────────────────────────────────

/// Comment posted when a freshly opened PR fails validation.
pub fn rejection_comment(reasons: &str) -> String {
    format!(
        "Hello!\n\nYour PR has failed verification for the following reasons:\n```\n{}\n```\nDon't worry though, if you fix the issue(s), you can make me reverify your PR by commenting ``reverify``.",
        reasons
    )
}

/// Comment posted when reverification fails.
pub fn reverify_failure_comment(reasons: &str) -> String {
    format!(
        "Hello!\n\nYour PR has failed reverification for the following reasons:\n```\n{}\n```\nDue to the fact that you've already opened a PR with issue(s), and issue(s) are still present, I have closed and locked this PR. Feel free to open another, though!",
        reasons
    )
}

pub fn manual_review_effects(
    pr: PrNumber,
    labels: &LabelNames,
    assignees: &[String],
) -> Vec<GitHubEffect> {
    let mut effects = vec![GitHubEffect::AddLabels {
        pr,
        labels: vec![labels.manual_review.clone()],
    }];
    if !assignees.is_empty() {
        effects.push(GitHubEffect::AddAssignees {
            pr,
            assignees: assignees.to_vec(),
        });
    }
    effects
}

pub fn rejection_effects(pr: PrNumber, reasons: &str, labels: &LabelNames) -> Vec<GitHubEffect> {
    vec![
        GitHubEffect::PostComment {
            pr,
            body: rejection_comment(reasons),
        },
        GitHubEffect::AddLabels {
            pr,
            labels: vec![labels.pending_reverify.clone()],
        },
    ]
}

pub fn synchronize_effects(pr: PrNumber, labels: &LabelNames) -> Vec<GitHubEffect> {
    vec![GitHubEffect::ReplaceLabels {
        pr,
        labels: vec![labels.manual_review.clone()],
    }]
}

/// Comment, drop the pending label, close, lock. The comment goes first so
/// the author can still read it once the conversation is locked.
pub fn reverify_failure_effects(
    pr: PrNumber,
    reasons: &str,
    labels: &LabelNames,
) -> Vec<GitHubEffect> {
    vec![
        GitHubEffect::PostComment {
            pr,
            body: reverify_failure_comment(reasons),
        },
        GitHubEffect::RemoveLabel {
            pr,
            label: labels.pending_reverify.clone(),
        },
        GitHubEffect::ClosePr { pr },
        GitHubEffect::LockConversation { pr },
    ]
}

/// Reasons text for a failed validation, or `None` if it passed.
fn failure_reasons(outcome: &ValidationOutcome) -> Option<String> {
    match outcome {
        ValidationOutcome::Accepted => None,
        ValidationOutcome::MetaRequired => Some(MANUAL_REVIEW_REASON.to_string()),
        ValidationOutcome::Rejected(reasons) => Some(format_reasons(reasons)),
    }
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// Handles one parsed delivery.
///
/// Events for a repository other than the configured one are ignored. API
/// failures stop the handler at the failing call; effects already applied
/// stay applied.
pub async fn handle_event<I>(
    gateway: &Gateway<I>,
    config: &Config,
    event: WebhookEvent,
    now: DateTime<Utc>,
) -> Result<HandlerOutcome, GatewayError>
where
    I: GitHubInterpreter + Sync,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    if !event.repo_id().matches(&config.repo_id()) {
        debug!(repo = %event.repo_id(), "event for another repository");
        return Ok(HandlerOutcome::Ignored("other repository"));
    }

    match event {
        WebhookEvent::PullRequestOpened(e) => handle_opened(gateway, config, e, now).await,
        WebhookEvent::PullRequestSynchronized(e) => handle_synchronize(gateway, config, e).await,
        WebhookEvent::IssueCommentCreated(e) => handle_comment(gateway, config, e, now).await,
    }
}

async fn handle_opened<I>(
    gateway: &Gateway<I>,
    config: &Config,
    event: PullRequestEvent,
    now: DateTime<Utc>,
) -> Result<HandlerOutcome, GatewayError>
where
    I: GitHubInterpreter + Sync,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let pr = event.pr;

    if WorkflowState::on_open(&event.labels, &config.labels) != WorkflowState::New {
        return Ok(HandlerOutcome::Ignored("already has a workflow label"));
    }

    if event.is_meta_titled() {
        info!(pr = %pr, "meta title, routing to manual review");
        gateway
            .apply(manual_review_effects(pr, &config.labels, &config.meta_assignees))
            .await?;
        return Ok(HandlerOutcome::RoutedToManualReview);
    }

    let files = gateway.list_pr_files(pr).await?;
    match validate_files(&files, &config.validation) {
        ValidationOutcome::Accepted => {
            info!(pr = %pr, files = files.len(), "opening vote");
            gateway
                .apply(open_ballot_effects(pr, now, config.voting_period()))
                .await?;
            Ok(HandlerOutcome::VotingOpened)
        }
        ValidationOutcome::MetaRequired => {
            info!(pr = %pr, "files need a maintainer, routing to manual review");
            gateway
                .apply(manual_review_effects(pr, &config.labels, &config.meta_assignees))
                .await?;
            Ok(HandlerOutcome::RoutedToManualReview)
        }
        ValidationOutcome::Rejected(reasons) => {
            info!(pr = %pr, reasons = reasons.len(), "rejected, awaiting reverify");
            gateway
                .apply(rejection_effects(pr, &format_reasons(&reasons), &config.labels))
                .await?;
            Ok(HandlerOutcome::Rejected)
        }
    }
}

async fn handle_synchronize<I>(
    gateway: &Gateway<I>,
    config: &Config,
    event: PullRequestEvent,
) -> Result<HandlerOutcome, GatewayError>
where
    I: GitHubInterpreter + Sync,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    info!(pr = %event.pr, "new commits, moving to manual review");
    gateway
        .apply(synchronize_effects(event.pr, &config.labels))
        .await?;
    Ok(HandlerOutcome::MovedToManualReview)
}

async fn handle_comment<I>(
    gateway: &Gateway<I>,
    config: &Config,
    event: IssueCommentEvent,
    now: DateTime<Utc>,
) -> Result<HandlerOutcome, GatewayError>
where
    I: GitHubInterpreter + Sync,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    if !event.is_reverify_command() {
        return Ok(HandlerOutcome::Ignored("not a reverify command"));
    }
    let state = WorkflowState::from_labels(&event.labels, &config.labels);
    if state != WorkflowState::PendingReverify {
        return Ok(HandlerOutcome::Ignored("not pending reverification"));
    }
    if !event.is_from_author() {
        debug!(pr = %event.pr, commenter = %event.commenter.login, "reverify from non-author");
        return Ok(HandlerOutcome::Ignored("commenter is not the PR author"));
    }

    let pr = gateway.get_pr(event.pr).await?;
    let files = gateway.list_pr_files(pr.number).await?;
    let outcome = validate_files(&files, &config.validation);

    match failure_reasons(&outcome) {
        None => {
            info!(pr = %pr.number, "reverification passed, opening vote");
            let mut effects = vec![GitHubEffect::RemoveLabel {
                pr: pr.number,
                label: config.labels.pending_reverify.clone(),
            }];
            effects.extend(open_ballot_effects(pr.number, now, config.voting_period()));
            gateway.apply(effects).await?;
            Ok(HandlerOutcome::Reverified)
        }
        Some(reasons) => {
            info!(pr = %pr.number, "reverification failed, closing and locking");
            gateway
                .apply(reverify_failure_effects(pr.number, &reasons, &config.labels))
                .await?;
            Ok(HandlerOutcome::ClosedAfterReverify)
        }
    }
}
