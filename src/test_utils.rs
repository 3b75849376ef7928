//! Shared test utilities: a scripted GitHub double and proptest generators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, Reaction, ReactionData};
use crate::types::{CommentId, GitHubUser, PrData, PrNumber, PrState};

/// The account the mock reports as authenticated.
pub const BOT_ID: u64 = 999;

/// The author of PRs built by [`make_pr`].
pub const AUTHOR_ID: u64 = 1;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// An open PR by `alice`, created at [`epoch`], with no labels.
pub fn make_pr(number: u64, title: &str) -> PrData {
    PrData {
        number: PrNumber(number),
        title: title.to_string(),
        created_at: epoch(),
        author: GitHubUser::new(AUTHOR_ID, "alice"),
        labels: Vec::new(),
        state: PrState::Open,
    }
}

pub fn reaction(content: Reaction, user_id: u64) -> ReactionData {
    ReactionData {
        content,
        user: GitHubUser::new(user_id, format!("user{}", user_id)),
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<GitHubEffect>,
    prs: HashMap<PrNumber, PrData>,
    files: HashMap<PrNumber, Vec<String>>,
    reactions: HashMap<PrNumber, Vec<ReactionData>>,
    repo_labels: Vec<String>,
    failing_prs: HashSet<PrNumber>,
    fail_listing: bool,
    next_comment_id: u64,
}

/// A recording GitHub double backed by in-memory PRs.
///
/// Queries answer from the scripted data; mutations are recorded and applied
/// to that data (labels change, closed PRs stop being listed). Every effect
/// addressed to a PR marked with [`MockGitHub::fail_pr`] fails.
#[derive(Debug, Clone, Default)]
pub struct MockGitHub {
    state: Arc<Mutex<MockState>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.set_repo_labels(&["meta", "pending-reverify"]);
        mock
    }

    pub fn bot(&self) -> GitHubUser {
        GitHubUser::new(BOT_ID, "ballot-bot")
    }

    pub fn add_pr(&self, pr: PrData, files: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .insert(pr.number, files.iter().map(|f| f.to_string()).collect());
        state.prs.insert(pr.number, pr);
    }

    pub fn set_reactions(&self, pr: PrNumber, reactions: Vec<ReactionData>) {
        self.state.lock().unwrap().reactions.insert(pr, reactions);
    }

    pub fn set_repo_labels(&self, labels: &[&str]) {
        self.state.lock().unwrap().repo_labels = labels.iter().map(|l| l.to_string()).collect();
    }

    pub fn fail_pr(&self, pr: PrNumber) {
        self.state.lock().unwrap().failing_prs.insert(pr);
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }

    pub fn pr(&self, pr: PrNumber) -> Option<PrData> {
        self.state.lock().unwrap().prs.get(&pr).cloned()
    }

    /// Every effect received, in order, including failed ones.
    pub fn calls(&self) -> Vec<GitHubEffect> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Successfully executed mutations, in order.
    pub fn mutations(&self) -> Vec<GitHubEffect> {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter(|e| e.is_mutation() && !target(e).is_some_and(|pr| state.failing_prs.contains(&pr)))
            .cloned()
            .collect()
    }

    fn respond(&self, effect: GitHubEffect) -> Result<GitHubResponse, String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(effect.clone());

        if let Some(pr) = target(&effect) {
            if state.failing_prs.contains(&pr) {
                return Err(format!("scripted failure for PR {}", pr));
            }
        }

        let missing = |pr: PrNumber| format!("PR {} not found", pr);

        Ok(match effect {
            GitHubEffect::ListOpenPrs => {
                if state.fail_listing {
                    return Err("scripted listing failure".to_string());
                }
                let mut prs: Vec<PrData> = state
                    .prs
                    .values()
                    .filter(|p| p.state.is_open())
                    .cloned()
                    .collect();
                prs.sort_by_key(|p| p.number.0);
                GitHubResponse::PrList(prs)
            }
            GitHubEffect::GetPr { pr } => {
                GitHubResponse::Pr(state.prs.get(&pr).cloned().ok_or_else(|| missing(pr))?)
            }
            GitHubEffect::ListPrFiles { pr } => {
                GitHubResponse::Files(state.files.get(&pr).cloned().unwrap_or_default())
            }
            GitHubEffect::ListReactions { pr } => {
                GitHubResponse::Reactions(state.reactions.get(&pr).cloned().unwrap_or_default())
            }
            GitHubEffect::ListRepoLabels => GitHubResponse::RepoLabels(state.repo_labels.clone()),
            GitHubEffect::GetAuthenticatedUser => GitHubResponse::User(self.bot()),
            GitHubEffect::MergePr { pr, .. } => {
                state.prs.get_mut(&pr).ok_or_else(|| missing(pr))?.state = PrState::Merged;
                GitHubResponse::Merged
            }
            GitHubEffect::ClosePr { pr } => {
                state.prs.get_mut(&pr).ok_or_else(|| missing(pr))?.state = PrState::Closed;
                GitHubResponse::Closed
            }
            GitHubEffect::PostComment { .. } => {
                state.next_comment_id += 1;
                GitHubResponse::CommentPosted {
                    id: CommentId(state.next_comment_id),
                }
            }
            GitHubEffect::CreateReaction { pr, reaction } => {
                let bot = self.bot();
                state.reactions.entry(pr).or_default().push(ReactionData {
                    content: reaction,
                    user: bot,
                });
                GitHubResponse::ReactionCreated
            }
            GitHubEffect::AddLabels { pr, labels } => {
                if let Some(data) = state.prs.get_mut(&pr) {
                    for label in labels {
                        if !data.labels.contains(&label) {
                            data.labels.push(label);
                        }
                    }
                }
                GitHubResponse::LabelsUpdated
            }
            GitHubEffect::RemoveLabel { pr, label } => {
                if let Some(data) = state.prs.get_mut(&pr) {
                    data.labels.retain(|l| *l != label);
                }
                GitHubResponse::LabelsUpdated
            }
            GitHubEffect::ReplaceLabels { pr, labels } => {
                if let Some(data) = state.prs.get_mut(&pr) {
                    data.labels = labels;
                }
                GitHubResponse::LabelsUpdated
            }
            GitHubEffect::AddAssignees { .. } => GitHubResponse::AssigneesAdded,
            GitHubEffect::LockConversation { .. } => GitHubResponse::Locked,
        })
    }
}

/// The PR an effect addresses, if any.
fn target(effect: &GitHubEffect) -> Option<PrNumber> {
    match effect {
        GitHubEffect::ListOpenPrs
        | GitHubEffect::ListRepoLabels
        | GitHubEffect::GetAuthenticatedUser => None,
        GitHubEffect::GetPr { pr }
        | GitHubEffect::ListPrFiles { pr }
        | GitHubEffect::ListReactions { pr }
        | GitHubEffect::MergePr { pr, .. }
        | GitHubEffect::ClosePr { pr }
        | GitHubEffect::PostComment { pr, .. }
        | GitHubEffect::CreateReaction { pr, .. }
        | GitHubEffect::AddLabels { pr, .. }
        | GitHubEffect::RemoveLabel { pr, .. }
        | GitHubEffect::ReplaceLabels { pr, .. }
        | GitHubEffect::AddAssignees { pr, .. }
        | GitHubEffect::LockConversation { pr } => Some(*pr),
    }
}

impl GitHubInterpreter for MockGitHub {
    type Error = String;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl std::future::Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let result = self.respond(effect);
        async move { result }
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    any::<u64>().prop_map(PrNumber)
}

pub fn arb_file_path() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,8}(/[a-zA-Z0-9_]{1,8}){0,3}\\.(md|txt|go|rs|yml|MD)".prop_map(String::from)
}
