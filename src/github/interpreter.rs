//! GitHub effect interpreter using octocrab.
//!
//! Typed octocrab endpoints are used where they exist. Reactions, PR files,
//! merge and close go through the raw REST helpers (`get`/`post`/`put`/`patch`)
//! with small local serde types.

use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, Reaction, ReactionData};
use crate::types::{CommentId, GitHubUser, PrData, PrNumber, PrState};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

/// GitHub's maximum page size for list endpoints.
const PER_PAGE: u8 = 100;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Executes a GitHub effect against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    tracing::trace!(repo = %client.repo(), ?effect, "executing GitHub effect");

    match effect {
        GitHubEffect::ListOpenPrs => list_open_prs(client).await,
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::ListPrFiles { pr } => list_pr_files(client, pr).await,
        GitHubEffect::ListReactions { pr } => list_reactions(client, pr).await,
        GitHubEffect::ListRepoLabels => list_repo_labels(client).await,
        GitHubEffect::GetAuthenticatedUser => get_authenticated_user(client).await,
        GitHubEffect::MergePr { pr, commit_message } => merge_pr(client, pr, commit_message).await,
        GitHubEffect::ClosePr { pr } => close_pr(client, pr).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
        GitHubEffect::CreateReaction { pr, reaction } => {
            create_reaction(client, pr, reaction).await
        }
        GitHubEffect::AddLabels { pr, labels } => add_labels(client, pr, labels).await,
        GitHubEffect::RemoveLabel { pr, label } => remove_label(client, pr, label).await,
        GitHubEffect::ReplaceLabels { pr, labels } => replace_labels(client, pr, labels).await,
        GitHubEffect::AddAssignees { pr, assignees } => {
            add_assignees(client, pr, assignees).await
        }
        GitHubEffect::LockConversation { pr } => lock_conversation(client, pr).await,
    }
}

/// Query parameters for paginated raw REST requests.
#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

fn is_last_page(items: usize) -> bool {
    items < usize::from(PER_PAGE)
}

// ─── PR Operations ────────────────────────────────────────────────────────────

/// Converts an octocrab pull request into our domain type.
fn pr_data_from_pull(pull: octocrab::models::pulls::PullRequest) -> Result<PrData, GitHubApiError> {
    let number = PrNumber(pull.number);

    let author = pull.user.ok_or_else(|| {
        GitHubApiError::permanent_without_source(format!("PR {} has no author", number))
    })?;
    let created_at = pull.created_at.ok_or_else(|| {
        GitHubApiError::permanent_without_source(format!("PR {} has no creation time", number))
    })?;

    let state = if pull.merged_at.is_some() {
        PrState::Merged
    } else if pull.state == Some(octocrab::models::IssueState::Closed) {
        PrState::Closed
    } else {
        PrState::Open
    };

    Ok(PrData {
        number,
        title: pull.title.unwrap_or_default(),
        created_at,
        author: GitHubUser::new(author.id.into_inner(), author.login),
        labels: pull
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| label.name)
            .collect(),
        state,
    })
}

async fn list_open_prs(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut all_prs = Vec::new();

    loop {
        let page_result = client
            .inner()
            .pulls(client.owner(), client.repo_name())
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PER_PAGE)
            .page(page)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let items = page_result.items;
        let last = is_last_page(items.len());

        for pull in items {
            let number = pull.number;
            match pr_data_from_pull(pull) {
                Ok(pr) => all_prs.push(pr),
                Err(e) => {
                    tracing::warn!(pr = number, error = %e, "Skipping PR with incomplete data");
                }
            }
        }

        if last {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::PrList(all_prs))
}

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Pr(pr_data_from_pull(pull)?))
}

#[derive(Debug, Deserialize)]
struct RawPrFile {
    filename: String,
}

async fn list_pr_files(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = client.repo_path(&format!("pulls/{}/files", pr.0));
    let mut page = 1u32;
    let mut files = Vec::new();

    loop {
        let items: Vec<RawPrFile> = client
            .inner()
            .get(
                &url,
                Some(&PageParams {
                    per_page: PER_PAGE,
                    page,
                }),
            )
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let last = is_last_page(items.len());
        files.extend(items.into_iter().map(|f| f.filename));

        if last {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::Files(files))
}

#[derive(Debug, Serialize)]
struct MergeRequest {
    commit_message: String,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    merged: bool,
    message: Option<String>,
}

async fn merge_pr(
    client: &OctocrabClient,
    pr: PrNumber,
    commit_message: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = client.repo_path(&format!("pulls/{}/merge", pr.0));

    let response: MergeResponse = client
        .inner()
        .put(&url, Some(&MergeRequest { commit_message }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    if response.merged {
        Ok(GitHubResponse::Merged)
    } else {
        Err(GitHubApiError::permanent_without_source(format!(
            "Merge of PR {} returned merged=false: {}",
            pr,
            response.message.as_deref().unwrap_or("unknown reason")
        )))
    }
}

#[derive(Debug, Serialize)]
struct UpdateStateRequest {
    state: &'static str,
}

async fn close_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let url = client.repo_path(&format!("pulls/{}", pr.0));

    let _: serde_json::Value = client
        .inner()
        .patch(&url, Some(&UpdateStateRequest { state: "closed" }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Closed)
}

// ─── Issue Thread ─────────────────────────────────────────────────────────────

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let comment = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentPosted {
        id: CommentId(comment.id.into_inner()),
    })
}

#[derive(Debug, Deserialize)]
struct RawReactionUser {
    id: u64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawReaction {
    content: String,
    user: Option<RawReactionUser>,
}

/// Converts a raw reaction, dropping ones with unknown content or a deleted user.
fn reaction_from_raw(raw: RawReaction) -> Option<ReactionData> {
    let content = Reaction::from_api_str(&raw.content)?;
    let user = raw.user?;
    Some(ReactionData {
        content,
        user: GitHubUser::new(user.id, user.login),
    })
}

async fn list_reactions(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = client.repo_path(&format!("issues/{}/reactions", pr.0));
    let mut page = 1u32;
    let mut reactions = Vec::new();

    loop {
        let items: Vec<RawReaction> = client
            .inner()
            .get(
                &url,
                Some(&PageParams {
                    per_page: PER_PAGE,
                    page,
                }),
            )
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let last = is_last_page(items.len());
        reactions.extend(items.into_iter().filter_map(reaction_from_raw));

        if last {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::Reactions(reactions))
}

#[derive(Debug, Serialize)]
struct ReactionRequest {
    content: &'static str,
}

async fn create_reaction(
    client: &OctocrabClient,
    pr: PrNumber,
    reaction: Reaction,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = client.repo_path(&format!("issues/{}/reactions", pr.0));

    let _: serde_json::Value = client
        .inner()
        .post(
            &url,
            Some(&ReactionRequest {
                content: reaction.as_api_str(),
            }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::ReactionCreated)
}

async fn add_labels(
    client: &OctocrabClient,
    pr: PrNumber,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_labels(pr.0, &labels)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelsUpdated)
}

async fn remove_label(
    client: &OctocrabClient,
    pr: PrNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .remove_label(pr.0, &label)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelsUpdated)
}

async fn replace_labels(
    client: &OctocrabClient,
    pr: PrNumber,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .replace_all_labels(pr.0, &labels)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelsUpdated)
}

async fn add_assignees(
    client: &OctocrabClient,
    pr: PrNumber,
    assignees: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let logins: Vec<&str> = assignees.iter().map(String::as_str).collect();

    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_assignees(pr.0, &logins)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::AssigneesAdded)
}

async fn lock_conversation(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .lock(pr.0, None::<octocrab::params::LockReason>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Locked)
}

// ─── Repository / Account ─────────────────────────────────────────────────────

async fn list_repo_labels(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut names = Vec::new();

    loop {
        let page_result = client
            .inner()
            .issues(client.owner(), client.repo_name())
            .list_labels_for_repo()
            .per_page(PER_PAGE)
            .page(page)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let items = page_result.items;
        let last = is_last_page(items.len());
        names.extend(items.into_iter().map(|label| label.name));

        if last {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::RepoLabels(names))
}

async fn get_authenticated_user(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let author = client
        .inner()
        .current()
        .user()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::User(GitHubUser::new(
        author.id.into_inner(),
        author.login,
    )))
}
