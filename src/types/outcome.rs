//! The result contract between the synchronizer and its callers.

use serde::Serialize;
use std::fmt;

use super::Sha;

/// Category of a failed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The configured path is not a git working copy.
    RepositoryInvalid,
    /// Fetch or another remote operation failed (including authentication).
    NetworkFailure,
    /// The local branch cannot be fast-forwarded to the remote tip.
    MergeConflict,
    /// The update did not finish within the configured bound.
    Timeout,
    /// A local filesystem or process error.
    Filesystem,
}

/// Why an update failed.
///
/// `reason` is already credential-redacted and safe to return to webhook
/// senders or forward in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl SyncFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        SyncFailure {
            kind,
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        SyncFailure::new(FailureKind::Timeout, "timeout")
    }

    pub fn invalid_repository() -> Self {
        SyncFailure::new(FailureKind::RepositoryInvalid, "invalid repository path")
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Outcome of one synchronization attempt.
///
/// Callers branch on this value only; they never inspect repository state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The working copy now sits at this revision.
    Updated(Sha),
    /// Local and remote tips already matched; nothing was changed.
    AlreadyCurrent,
    /// The update could not be applied.
    Failed(SyncFailure),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UpdateOutcome::Failed(_))
    }
}
