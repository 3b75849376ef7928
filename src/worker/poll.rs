//! The vote-resolution poller.
//!
//! Every `poll_interval` the poller lists the open PRs and resolves each one
//! whose voting period has elapsed:
//!
//! - PRs in manual review or pending reverification are skipped
//! - PRs younger than the voting period are left to wait
//! - Everything else is tallied and merged, closed, or (on a tie under
//!   `keep_open`) left for the next cycle
//!
//! Failures are per-PR: one PR's API error is logged and counted, and the
//! cycle moves on. A failure to list PRs ends only the current cycle.

use std::error::Error as StdError;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::effects::GitHubInterpreter;
use crate::gateway::{Gateway, GatewayError};
use crate::types::{GitHubUser, PrData, WorkflowState};
use crate::voting::{Resolution, resolution_effects, resolve, tally_reactions};

/// Per-cycle counters, logged at the end of each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Open PRs seen.
    pub examined: usize,
    /// PRs in manual review or pending reverification.
    pub skipped: usize,
    /// PRs still inside their voting period.
    pub waiting: usize,
    pub merged: usize,
    pub closed: usize,
    /// Ties kept open under `TiePolicy::KeepOpen`.
    pub left_open: usize,
    /// PRs whose processing hit an API error.
    pub failed: usize,
}

/// What happened to one PR in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Skipped,
    Waiting,
    Merged,
    Closed,
    LeftOpen,
}

impl PollSummary {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Skipped => self.skipped += 1,
            Disposition::Waiting => self.waiting += 1,
            Disposition::Merged => self.merged += 1,
            Disposition::Closed => self.closed += 1,
            Disposition::LeftOpen => self.left_open += 1,
        }
    }
}

/// Resolves votes on a fixed schedule.
pub struct Poller<I> {
    gateway: Arc<Gateway<I>>,
    config: Arc<Config>,
    /// The bot's own account; its seed reactions are not counted.
    bot: GitHubUser,
}

impl<I> Poller<I>
where
    I: GitHubInterpreter + Sync,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    pub fn new(gateway: Arc<Gateway<I>>, config: Arc<Config>, bot: GitHubUser) -> Self {
        Poller {
            gateway,
            config,
            bot,
        }
    }

    /// Runs one cycle over every open PR.
    #[instrument(skip(self), fields(repo = %self.config.repo_id()))]
    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<PollSummary, GatewayError> {
        let prs = self.gateway.list_open_prs().await?;
        let mut summary = PollSummary {
            examined: prs.len(),
            ..PollSummary::default()
        };

        for pr in &prs {
            match self.process_pr(pr, now).await {
                Ok(disposition) => summary.record(disposition),
                Err(e) => {
                    warn!(pr = %pr.number, error = %e, "failed to process PR, skipping");
                    summary.failed += 1;
                }
            }
        }

        info!(
            examined = summary.examined,
            skipped = summary.skipped,
            waiting = summary.waiting,
            merged = summary.merged,
            closed = summary.closed,
            left_open = summary.left_open,
            failed = summary.failed,
            "poll cycle complete"
        );
        Ok(summary)
    }

    async fn process_pr(&self, pr: &PrData, now: DateTime<Utc>) -> Result<Disposition, GatewayError> {
        if WorkflowState::from_labels(&pr.labels, &self.config.labels).is_excluded_from_vote() {
            return Ok(Disposition::Skipped);
        }

        if pr.age(now) < self.config.voting_period() {
            return Ok(Disposition::Waiting);
        }

        let reactions = self.gateway.list_reactions(pr.number).await?;
        let tally = tally_reactions(&reactions, self.bot.id);
        let resolution = resolve(tally, self.config.tie_policy);
        debug!(pr = %pr.number, yes = tally.yes, no = tally.no, ?resolution, "vote tallied");

        self.gateway
            .apply(resolution_effects(pr, &resolution))
            .await?;

        Ok(match resolution {
            Resolution::Merge { .. } => {
                info!(
                    pr = %pr.number,
                    author = %pr.author.login,
                    yes = tally.yes,
                    no = tally.no,
                    "merged"
                );
                Disposition::Merged
            }
            Resolution::Close { .. } => {
                info!(
                    pr = %pr.number,
                    author = %pr.author.login,
                    yes = tally.yes,
                    no = tally.no,
                    "closed"
                );
                Disposition::Closed
            }
            Resolution::LeaveOpen => Disposition::LeftOpen,
        })
    }

    /// Polls until `shutdown` fires: one cycle, then sleep for the poll interval.
    ///
    /// A cycle in progress runs to completion; the sleep is interrupted.
    pub async fn run(self, shutdown: CancellationToken) {
        let interval = self.config.poll_interval();
        info!(interval_secs = interval.as_secs(), "poller started");

        loop {
            if let Err(e) = self.poll_once(Utc::now()).await {
                error!(error = %e, "poll cycle aborted");
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown signal received, stopping poller");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::effects::{GitHubEffect, Reaction};
    use crate::test_utils::{BOT_ID, MockGitHub, epoch, make_pr, reaction};
    use crate::types::PrNumber;
    use crate::voting::TiePolicy;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn poller(mock: &MockGitHub, config: Config) -> Poller<MockGitHub> {
        Poller::new(
            Arc::new(Gateway::new(mock.clone())),
            Arc::new(config),
            mock.bot(),
        )
    }

    fn after_vote() -> DateTime<Utc> {
        epoch() + Duration::hours(25)
    }

    fn votes(yes: u64, no: u64) -> Vec<crate::effects::ReactionData> {
        let mut all = vec![
            reaction(Reaction::ThumbsUp, BOT_ID),
            reaction(Reaction::ThumbsDown, BOT_ID),
        ];
        all.extend((0..yes).map(|i| reaction(Reaction::ThumbsUp, 100 + i)));
        all.extend((0..no).map(|i| reaction(Reaction::ThumbsDown, 200 + i)));
        all
    }

    #[tokio::test]
    async fn approved_pr_is_merged_with_its_title() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(1, "Fix typo"), &[]);
        mock.set_reactions(PrNumber(1), votes(3, 1));

        let summary = poller(&mock, test_config())
            .poll_once(after_vote())
            .await
            .unwrap();

        assert_eq!(summary.merged, 1);
        assert_eq!(
            mock.mutations(),
            vec![
                GitHubEffect::PostComment {
                    pr: PrNumber(1),
                    body: "3:1, merging...".to_string()
                },
                GitHubEffect::MergePr {
                    pr: PrNumber(1),
                    commit_message: "Fix typo".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn rejected_and_unvoted_prs_are_closed() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(1, "a"), &[]);
        mock.add_pr(make_pr(2, "b"), &[]);
        mock.set_reactions(PrNumber(1), votes(0, 2));
        mock.set_reactions(PrNumber(2), votes(0, 0));

        let summary = poller(&mock, test_config())
            .poll_once(after_vote())
            .await
            .unwrap();

        assert_eq!(summary.closed, 2);
        let comments: Vec<String> = mock
            .mutations()
            .into_iter()
            .filter_map(|e| match e {
                GitHubEffect::PostComment { body, .. } => Some(body),
                _ => None,
            })
            .collect();
        assert_eq!(comments, vec!["0:2, closing...", "No votes, closing..."]);
    }

    #[tokio::test]
    async fn tie_closes_by_default() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(1, "a"), &[]);
        mock.set_reactions(PrNumber(1), votes(2, 2));

        poller(&mock, test_config())
            .poll_once(after_vote())
            .await
            .unwrap();

        assert_eq!(
            mock.mutations(),
            vec![
                GitHubEffect::PostComment {
                    pr: PrNumber(1),
                    body: "Tie (2:2), closing...".to_string()
                },
                GitHubEffect::ClosePr { pr: PrNumber(1) },
            ]
        );
    }

    #[tokio::test]
    async fn tie_kept_open_under_keep_open_policy() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(1, "a"), &[]);
        mock.set_reactions(PrNumber(1), votes(1, 1));
        let mut config = test_config();
        config.tie_policy = TiePolicy::KeepOpen;

        let summary = poller(&mock, config)
            .poll_once(after_vote())
            .await
            .unwrap();

        assert_eq!(summary.left_open, 1);
        assert!(mock.mutations().is_empty());
    }

    #[tokio::test]
    async fn young_and_labelled_prs_are_left_alone() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(1, "young"), &[]);
        let mut meta = make_pr(2, "meta");
        meta.labels = vec!["meta".to_string()];
        mock.add_pr(meta, &[]);
        let mut pending = make_pr(3, "pending");
        pending.labels = vec!["pending-reverify".to_string()];
        mock.add_pr(pending, &[]);

        let summary = poller(&mock, test_config())
            .poll_once(epoch() + Duration::hours(23))
            .await
            .unwrap();

        assert_eq!(
            summary,
            PollSummary {
                examined: 3,
                skipped: 2,
                waiting: 1,
                ..PollSummary::default()
            }
        );
        assert_eq!(mock.calls(), vec![GitHubEffect::ListOpenPrs]);
    }

    #[tokio::test]
    async fn one_failing_pr_does_not_stop_the_cycle() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(1, "broken"), &[]);
        mock.add_pr(make_pr(2, "fine"), &[]);
        mock.set_reactions(PrNumber(2), votes(1, 0));
        mock.fail_pr(PrNumber(1));

        let summary = poller(&mock, test_config())
            .poll_once(after_vote())
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.merged, 1);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_cycle() {
        let mock = MockGitHub::new();
        mock.fail_listing();

        let result = poller(&mock, test_config()).poll_once(after_vote()).await;

        assert!(matches!(result, Err(GatewayError::Api(_))));
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let mock = MockGitHub::new();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(
            StdDuration::from_secs(5),
            poller(&mock, test_config()).run(shutdown),
        )
        .await
        .expect("poller should stop once cancelled");

        assert_eq!(mock.calls(), vec![GitHubEffect::ListOpenPrs]);
    }
}
