//! Push event payloads.
//!
//! Only the handful of fields the synchronizer and its notifications use are
//! read; everything else in GitHub's push payload is ignored. Missing optional
//! pieces degrade to empty values rather than errors, so a push with zero
//! commits (e.g. a branch deletion or a force-push to an older tip) still
//! parses.

use serde::Deserialize;
use thiserror::Error;

/// The event type GitHub sends for branch pushes.
pub const PUSH_EVENT: &str = "push";

/// Error type for webhook payload parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not JSON, or a present field has the wrong type.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// One commit listed in a push payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCommit {
    pub message: String,
    pub author_name: Option<String>,
}

/// A parsed inbound webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Value of the `X-GitHub-Event` header.
    pub event_type: String,
    /// The pushed ref, e.g. `refs/heads/main`. Empty when absent.
    pub target_ref: String,
    /// Commits in payload order.
    pub commits: Vec<PushCommit>,
}

impl WebhookEvent {
    /// Returns true when this event pushed exactly `refs/heads/<branch>`.
    ///
    /// The comparison is exact: `refs/heads/Main` does not match `main`, and a
    /// bare `main` does not match either.
    pub fn targets_branch(&self, branch: &str) -> bool {
        self.target_ref
            .strip_prefix("refs/heads/")
            .is_some_and(|name| name == branch)
    }

    /// The first commit in the payload, if any.
    pub fn head_commit(&self) -> Option<&PushCommit> {
        self.commits.first()
    }
}

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref", default)]
    git_ref: String,
    #[serde(default)]
    commits: Option<Vec<RawCommit>>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    author: Option<RawAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: Option<String>,
}

/// Parses a delivery body into a [`WebhookEvent`].
///
/// # Examples
///
/// ```
/// use branch_sync::webhooks::parse_event;
///
/// let body = br#"{
///     "ref": "refs/heads/main",
///     "commits": [{ "message": "Fix typo", "author": { "name": "Mona" } }]
/// }"#;
///
/// let event = parse_event("push", body).unwrap();
/// assert!(event.targets_branch("main"));
/// assert_eq!(event.head_commit().unwrap().message, "Fix typo");
/// ```
pub fn parse_event(event_type: &str, body: &[u8]) -> Result<WebhookEvent, ParseError> {
    let raw: RawPushPayload = serde_json::from_slice(body)?;

    let commits = raw
        .commits
        .unwrap_or_default()
        .into_iter()
        .map(|commit| PushCommit {
            message: commit.message.unwrap_or_default(),
            author_name: commit.author.and_then(|a| a.name),
        })
        .collect();

    Ok(WebhookEvent {
        event_type: event_type.to_string(),
        target_ref: raw.git_ref,
        commits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> WebhookEvent {
        parse_event(PUSH_EVENT, &serde_json::to_vec(&value).unwrap()).unwrap()
    }

    #[test]
    fn parses_ref_and_commits_in_order() {
        let event = parse(json!({
            "ref": "refs/heads/main",
            "before": "abc123",
            "after": "def456",
            "repository": { "name": "hello", "owner": { "login": "octocat" } },
            "commits": [
                { "id": "1", "message": "first", "author": { "name": "Mona", "email": "m@x" } },
                { "id": "2", "message": "second", "author": { "name": "Hubot" } }
            ]
        }));

        assert_eq!(event.event_type, "push");
        assert_eq!(event.target_ref, "refs/heads/main");
        assert_eq!(event.commits.len(), 2);
        assert_eq!(event.head_commit().unwrap().message, "first");
        assert_eq!(event.commits[1].author_name.as_deref(), Some("Hubot"));
    }

    #[test]
    fn missing_commits_is_empty() {
        let event = parse(json!({ "ref": "refs/heads/main" }));
        assert!(event.commits.is_empty());
        assert!(event.head_commit().is_none());

        let event = parse(json!({ "ref": "refs/heads/main", "commits": null }));
        assert!(event.commits.is_empty());
    }

    #[test]
    fn missing_ref_is_empty_and_matches_nothing() {
        let event = parse(json!({ "commits": [] }));
        assert_eq!(event.target_ref, "");
        assert!(!event.targets_branch("main"));
        assert!(!event.targets_branch(""));
    }

    #[test]
    fn commit_without_author_or_message() {
        let event = parse(json!({ "ref": "refs/heads/main", "commits": [{}] }));
        let commit = event.head_commit().unwrap();
        assert_eq!(commit.message, "");
        assert_eq!(commit.author_name, None);
    }

    #[test]
    fn targets_branch_is_exact() {
        let event = parse(json!({ "ref": "refs/heads/main" }));
        assert!(event.targets_branch("main"));
        assert!(!event.targets_branch("Main"));
        assert!(!event.targets_branch("mai"));
        assert!(!event.targets_branch("refs/heads/main"));

        let tag = parse(json!({ "ref": "refs/tags/main" }));
        assert!(!tag.targets_branch("main"));

        let nested = parse(json!({ "ref": "refs/heads/release/main" }));
        assert!(!nested.targets_branch("main"));
        assert!(nested.targets_branch("release/main"));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            parse_event(PUSH_EVENT, b"not json"),
            Err(ParseError::Json(_))
        ));
        assert!(parse_event(PUSH_EVENT, br#"{"ref": 42}"#).is_err());
    }
}
