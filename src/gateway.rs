//! Typed access to GitHub on top of a `GitHubInterpreter`.
//!
//! Decision logic returns `Vec<GitHubEffect>`; the gateway executes them in
//! order and unpacks query responses into domain types. One `Gateway` is built
//! at startup and shared (behind an `Arc`) by the poller and the webhook server.

use std::error::Error as StdError;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::LabelNames;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, ReactionData};
use crate::types::{GitHubUser, PrData, PrNumber};

/// Errors surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The interpreter failed to execute an effect.
    #[error("GitHub call failed: {0}")]
    Api(#[source] Box<dyn StdError + Send + Sync>),

    /// The interpreter answered with the wrong response variant.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse { effect: String, response: String },

    /// A workflow label does not exist in the repository.
    #[error("You don't have a label named `{name}` in your configured repo. Please create one.")]
    MissingLabel { name: String },
}

/// Executes effects through an interpreter and returns typed results.
#[derive(Debug, Clone)]
pub struct Gateway<I> {
    interpreter: I,
}

impl<I> Gateway<I>
where
    I: GitHubInterpreter + Sync,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    pub fn new(interpreter: I) -> Self {
        Gateway { interpreter }
    }

    /// Executes a single effect.
    pub async fn execute(&self, effect: GitHubEffect) -> Result<GitHubResponse, GatewayError> {
        self.interpreter
            .interpret(effect)
            .await
            .map_err(|e| GatewayError::Api(e.into()))
    }

    /// Executes effects in order, stopping at the first failure.
    ///
    /// Effects already executed are not rolled back.
    pub async fn apply(&self, effects: Vec<GitHubEffect>) -> Result<(), GatewayError> {
        for effect in effects {
            debug!(?effect, "applying effect");
            self.execute(effect).await?;
        }
        Ok(())
    }

    pub async fn list_open_prs(&self) -> Result<Vec<PrData>, GatewayError> {
        let effect = GitHubEffect::ListOpenPrs;
        match self.execute(effect.clone()).await? {
            GitHubResponse::PrList(prs) => Ok(prs),
            other => Err(unexpected(&effect, &other)),
        }
    }

    pub async fn get_pr(&self, pr: PrNumber) -> Result<PrData, GatewayError> {
        let effect = GitHubEffect::GetPr { pr };
        match self.execute(effect.clone()).await? {
            GitHubResponse::Pr(data) => Ok(data),
            other => Err(unexpected(&effect, &other)),
        }
    }

    /// Returns the paths of every file the PR changes.
    pub async fn list_pr_files(&self, pr: PrNumber) -> Result<Vec<String>, GatewayError> {
        let effect = GitHubEffect::ListPrFiles { pr };
        match self.execute(effect.clone()).await? {
            GitHubResponse::Files(files) => Ok(files),
            other => Err(unexpected(&effect, &other)),
        }
    }

    pub async fn list_reactions(&self, pr: PrNumber) -> Result<Vec<ReactionData>, GatewayError> {
        let effect = GitHubEffect::ListReactions { pr };
        match self.execute(effect.clone()).await? {
            GitHubResponse::Reactions(reactions) => Ok(reactions),
            other => Err(unexpected(&effect, &other)),
        }
    }

    pub async fn list_repo_labels(&self) -> Result<Vec<String>, GatewayError> {
        let effect = GitHubEffect::ListRepoLabels;
        match self.execute(effect.clone()).await? {
            GitHubResponse::RepoLabels(labels) => Ok(labels),
            other => Err(unexpected(&effect, &other)),
        }
    }

    /// Returns the account the bot acts as.
    pub async fn authenticated_user(&self) -> Result<GitHubUser, GatewayError> {
        let effect = GitHubEffect::GetAuthenticatedUser;
        match self.execute(effect.clone()).await? {
            GitHubResponse::User(user) => Ok(user),
            other => Err(unexpected(&effect, &other)),
        }
    }

    /// Checks that both workflow labels exist in the repository.
    ///
    /// Label names are compared exactly. Returns `MissingLabel` for the first
    /// one that is absent.
    pub async fn ensure_labels_exist(&self, names: &LabelNames) -> Result<(), GatewayError> {
        let existing = self.list_repo_labels().await?;
        for name in names.required() {
            if !existing.iter().any(|l| l == name) {
                return Err(GatewayError::MissingLabel {
                    name: name.to_string(),
                });
            }
        }
        info!(labels = ?names.required(), "workflow labels present");
        Ok(())
    }
}

fn unexpected(effect: &GitHubEffect, response: &GitHubResponse) -> GatewayError {
    GatewayError::UnexpectedResponse {
        effect: format!("{:?}", effect),
        response: format!("{:?}", response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Reaction;
    use crate::test_utils::{MockGitHub, make_pr};

    #[tokio::test]
    async fn apply_runs_effects_in_order() {
        let mock = MockGitHub::new();
        let gateway = Gateway::new(mock.clone());

        let effects = vec![
            GitHubEffect::CreateReaction {
                pr: PrNumber(1),
                reaction: Reaction::ThumbsUp,
            },
            GitHubEffect::PostComment {
                pr: PrNumber(1),
                body: "hi".to_string(),
            },
        ];
        gateway.apply(effects.clone()).await.unwrap();

        assert_eq!(mock.calls(), effects);
    }

    #[tokio::test]
    async fn apply_stops_at_first_failure() {
        let mock = MockGitHub::new();
        mock.fail_pr(PrNumber(2));
        let gateway = Gateway::new(mock.clone());

        let result = gateway
            .apply(vec![
                GitHubEffect::ClosePr { pr: PrNumber(2) },
                GitHubEffect::LockConversation { pr: PrNumber(2) },
            ])
            .await;

        assert!(matches!(result, Err(GatewayError::Api(_))));
        assert!(mock.mutations().is_empty());
    }

    #[tokio::test]
    async fn typed_queries_unpack_responses() {
        let mock = MockGitHub::new();
        mock.add_pr(make_pr(4, "Docs"), &["README.md"]);
        let gateway = Gateway::new(mock.clone());

        let pr = gateway.get_pr(PrNumber(4)).await.unwrap();
        assert_eq!(pr.title, "Docs");
        assert_eq!(
            gateway.list_pr_files(PrNumber(4)).await.unwrap(),
            vec!["README.md".to_string()]
        );
        assert_eq!(gateway.list_open_prs().await.unwrap().len(), 1);
        assert_eq!(gateway.authenticated_user().await.unwrap(), mock.bot());
    }

    #[tokio::test]
    async fn missing_label_is_reported_by_name() {
        let mock = MockGitHub::new();
        mock.set_repo_labels(&["meta", "bug"]);
        let gateway = Gateway::new(mock);

        let err = gateway
            .ensure_labels_exist(&LabelNames::default())
            .await
            .unwrap_err();

        assert!(matches!(&err, GatewayError::MissingLabel { name } if name == "pending-reverify"));
        assert_eq!(
            err.to_string(),
            "You don't have a label named `pending-reverify` in your configured repo. Please create one."
        );
    }

    #[tokio::test]
    async fn labels_present() {
        let mock = MockGitHub::new();
        mock.set_repo_labels(&["pending-reverify", "meta"]);
        let gateway = Gateway::new(mock);

        gateway
            .ensure_labels_exist(&LabelNames::default())
            .await
            .unwrap();
    }
}
