//! GitHub webhook payload parser.
//!
//! 1. The event type comes from the `X-GitHub-Event` header
//! 2. The payload is parsed according to the event type
//! 3. Unhandled event types and actions return `Ok(None)` (ignored, not error)
//! 4. Malformed payloads return `Err`
//!
//! Unknown JSON fields are ignored throughout.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{GitHubUser, PrNumber, RepoId};

use super::events::{IssueCommentEvent, PullRequestEvent, WebhookEvent};

/// Header carrying the event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Parses a webhook payload into a typed event.
///
/// * `Ok(Some(event))` - a delivery the bot acts on
/// * `Ok(None)` - any other event type or action
/// * `Err(e)` - malformed payload for a handled event type
///
/// ```
/// use ballot_bot::webhooks::{parse_webhook, WebhookEvent};
///
/// let payload = br#"{
///     "action": "opened",
///     "pull_request": {
///         "number": 7,
///         "title": "Fix typo",
///         "user": { "id": 1, "login": "alice" },
///         "labels": []
///     },
///     "repository": { "owner": { "login": "octocat" }, "name": "hello-world" }
/// }"#;
///
/// let event = parse_webhook("pull_request", payload).unwrap();
/// assert!(matches!(event, Some(WebhookEvent::PullRequestOpened(_))));
///
/// assert!(parse_webhook("star", b"{}").unwrap().is_none());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    match event_type {
        "pull_request" => parse_pull_request(payload),
        "issue_comment" => parse_issue_comment(payload),
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: u64,
    login: String,
}

impl From<RawUser> for GitHubUser {
    fn from(raw: RawUser) -> Self {
        GitHubUser::new(raw.id, raw.login)
    }
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

fn label_names(labels: Vec<RawLabel>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

// ============================================================================
// pull_request
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    #[serde(default)]
    title: String,
    user: RawUser,
    #[serde(default)]
    labels: Vec<RawLabel>,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let event = PullRequestEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        pr: PrNumber(raw.pull_request.number),
        title: raw.pull_request.title,
        author: raw.pull_request.user.into(),
        labels: label_names(raw.pull_request.labels),
    };

    Ok(match raw.action.as_str() {
        "opened" => Some(WebhookEvent::PullRequestOpened(event)),
        "synchronize" => Some(WebhookEvent::PullRequestSynchronized(event)),
        _ => None,
    })
}

// ============================================================================
// issue_comment
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    user: RawUser,
    #[serde(default)]
    labels: Vec<RawLabel>,
    // Present only when the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    if raw.action != "created" || raw.issue.pull_request.is_none() {
        return Ok(None);
    }

    Ok(Some(WebhookEvent::IssueCommentCreated(IssueCommentEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        pr: PrNumber(raw.issue.number),
        commenter: raw.comment.user.into(),
        body: raw.comment.body.unwrap_or_default(),
        pr_author: raw.issue.user.into(),
        labels: label_names(raw.issue.labels),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn pull_request_payload(action: &str) -> String {
        format!(
            r#"{{
                "action": "{action}",
                "number": 42,
                "pull_request": {{
                    "number": 42,
                    "title": "Fix typo in README.md",
                    "state": "open",
                    "user": {{ "id": 100, "login": "alice", "type": "User" }},
                    "labels": [{{ "id": 1, "name": "docs", "color": "ffffff" }}],
                    "head": {{ "ref": "fix", "sha": "abc" }}
                }},
                "repository": {{
                    "id": 5,
                    "owner": {{ "login": "octocat" }},
                    "name": "hello-world"
                }},
                "sender": {{ "id": 100, "login": "alice" }}
            }}"#
        )
    }

    fn comment_payload(action: &str, body: &str, is_pr: bool) -> String {
        let pull_request = if is_pr {
            r#", "pull_request": { "url": "https://api.github.com/repos/octocat/hello-world/pulls/42" }"#
        } else {
            ""
        };
        format!(
            r#"{{
                "action": "{action}",
                "comment": {{
                    "id": 9,
                    "body": "{body}",
                    "user": {{ "id": 200, "login": "bob" }}
                }},
                "issue": {{
                    "number": 42,
                    "user": {{ "id": 100, "login": "alice" }},
                    "labels": [{{ "name": "pending-reverify" }}]
                    {pull_request}
                }},
                "repository": {{ "owner": {{ "login": "octocat" }}, "name": "hello-world" }}
            }}"#
        )
    }

    #[test]
    fn pull_request_opened() {
        let event = parse_webhook("pull_request", pull_request_payload("opened").as_bytes())
            .unwrap()
            .expect("should parse");

        match event {
            WebhookEvent::PullRequestOpened(e) => {
                assert_eq!(e.repo, RepoId::new("octocat", "hello-world"));
                assert_eq!(e.pr, PrNumber(42));
                assert_eq!(e.title, "Fix typo in README.md");
                assert_eq!(e.author.id, UserId(100));
                assert_eq!(e.labels, vec!["docs".to_string()]);
            }
            other => panic!("expected PullRequestOpened, got {:?}", other),
        }
    }

    #[test]
    fn pull_request_synchronize() {
        let event = parse_webhook("pull_request", pull_request_payload("synchronize").as_bytes())
            .unwrap();
        assert!(matches!(
            event,
            Some(WebhookEvent::PullRequestSynchronized(e)) if e.pr == PrNumber(42)
        ));
    }

    #[test]
    fn other_pull_request_actions_are_ignored() {
        for action in ["closed", "edited", "labeled", "reopened", "assigned"] {
            let result = parse_webhook("pull_request", pull_request_payload(action).as_bytes());
            assert!(result.unwrap().is_none(), "action {action} should be ignored");
        }
    }

    #[test]
    fn comment_on_pr() {
        let event = parse_webhook(
            "issue_comment",
            comment_payload("created", "reverify", true).as_bytes(),
        )
        .unwrap()
        .expect("should parse");

        match event {
            WebhookEvent::IssueCommentCreated(e) => {
                assert_eq!(e.pr, PrNumber(42));
                assert_eq!(e.commenter.id, UserId(200));
                assert_eq!(e.pr_author.id, UserId(100));
                assert_eq!(e.body, "reverify");
                assert_eq!(e.labels, vec!["pending-reverify".to_string()]);
            }
            other => panic!("expected IssueCommentCreated, got {:?}", other),
        }
    }

    #[test]
    fn comment_on_plain_issue_is_ignored() {
        let result = parse_webhook(
            "issue_comment",
            comment_payload("created", "reverify", false).as_bytes(),
        );
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn edited_and_deleted_comments_are_ignored() {
        for action in ["edited", "deleted"] {
            let result = parse_webhook(
                "issue_comment",
                comment_payload(action, "reverify", true).as_bytes(),
            );
            assert!(result.unwrap().is_none());
        }
    }

    #[test]
    fn unknown_event_type_returns_none() {
        assert!(parse_webhook("push", b"not even json").unwrap().is_none());
        assert!(parse_webhook("ping", br#"{"zen":"hi"}"#).unwrap().is_none());
    }

    #[test]
    fn malformed_json_returns_error() {
        let result = parse_webhook("pull_request", b"{not json");
        assert!(matches!(result, Err(ParseError::JsonError(_))));
    }

    #[test]
    fn missing_required_field_returns_error() {
        let payload = br#"{
            "action": "opened",
            "pull_request": { "title": "no number", "user": { "id": 1, "login": "a" } },
            "repository": { "owner": { "login": "o" }, "name": "r" }
        }"#;
        assert!(parse_webhook("pull_request", payload).is_err());
    }
}
