//! The repository synchronizer.
//!
//! Brings the working copy's tip into agreement with the remote branch tip,
//! or decides nothing needs doing:
//!
//! 1. Resolve the working copy (fails with `invalid repository path`).
//! 2. Fetch the branch using the credential's authenticated URL.
//! 3. Compare `HEAD` with the fetched tip; equal tips are `AlreadyCurrent`.
//! 4. Otherwise apply the configured [`UpdatePolicy`] and report `Updated`.
//!
//! All of this runs under the working copy's lock and inside a bounded
//! timeout. Every error becomes [`UpdateOutcome::Failed`] with the access
//! token scrubbed from the reason.

mod locks;


use std::time::Duration;

use tracing::{debug, info, warn};

use crate::git::{GitBackend, GitError, GitResult, UpdatePolicy};
use crate::types::{RemoteCredential, RepositoryHandle, SyncFailure, UpdateOutcome};

pub use locks::RepoLocks;

/// Default bound on one complete sync (fetch + update).
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(120);

/// Process-wide synchronizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub policy: UpdatePolicy,
    pub timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            policy: UpdatePolicy::default(),
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

/// Runs syncs through a [`GitBackend`], one at a time per working copy.
#[derive(Debug)]
pub struct Synchronizer<B> {
    backend: B,
    locks: RepoLocks,
    settings: SyncSettings,
}

impl<B: GitBackend> Synchronizer<B> {
    pub fn new(backend: B, settings: SyncSettings) -> Self {
        Synchronizer {
            backend,
            locks: RepoLocks::new(),
            settings,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Brings `handle` up to date with `branch` on the credential's remote.
    ///
    /// Concurrent calls for the same path queue behind each other; a caller
    /// that waited re-reads both tips and may find `AlreadyCurrent`.
    pub async fn sync(
        &self,
        handle: &RepositoryHandle,
        credential: &RemoteCredential,
        branch: &str,
    ) -> UpdateOutcome {
        let lock = self.locks.lock_for(handle.path()).await;
        let _guard = lock.lock().await;

        debug!(
            path = %handle.path().display(),
            branch,
            policy = %self.settings.policy,
            "starting sync"
        );

        let attempt = self.attempt(handle, credential, branch);
        let outcome = match tokio::time::timeout(self.settings.timeout, attempt).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => UpdateOutcome::Failed(failure_from(&err, credential)),
            Err(_) => UpdateOutcome::Failed(SyncFailure::timeout()),
        };

        match &outcome {
            UpdateOutcome::Updated(tip) => {
                info!(branch, tip = %tip.short(), "repository updated");
            }
            UpdateOutcome::AlreadyCurrent => {
                info!(branch, "repository is already up-to-date");
            }
            UpdateOutcome::Failed(failure) => {
                warn!(branch, kind = ?failure.kind, reason = %failure.reason, "sync failed");
            }
        }

        outcome
    }

    async fn attempt(
        &self,
        handle: &RepositoryHandle,
        credential: &RemoteCredential,
        branch: &str,
    ) -> GitResult<UpdateOutcome> {
        let path = handle.path();

        self.backend.resolve(path).await?;

        let remote_tip = self
            .backend
            .fetch_remote_tip(path, credential, branch)
            .await?;
        let local_tip = self.backend.local_tip(path).await?;

        if local_tip == remote_tip {
            return Ok(UpdateOutcome::AlreadyCurrent);
        }

        debug!(
            local = %local_tip.short(),
            remote = %remote_tip.short(),
            "tips differ"
        );

        let new_tip = self
            .backend
            .apply_update(path, branch, &remote_tip, self.settings.policy)
            .await?;

        Ok(UpdateOutcome::Updated(new_tip))
    }
}

/// Converts a git error into a failure whose reason is safe to show anywhere.
fn failure_from(err: &GitError, credential: &RemoteCredential) -> SyncFailure {
    match err {
        GitError::NotARepository { .. } => SyncFailure::invalid_repository(),
        other => SyncFailure::new(other.failure_kind(), credential.redact(&other.to_string())),
    }
}
