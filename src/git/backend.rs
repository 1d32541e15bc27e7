//! The capability interface between the synchronizer and version control.
//!
//! The trait-based design enables:
//! - Shelling out to the `git` CLI ([`super::CliGit`]) in production
//! - Scripted in-memory backends in tests, with call counting and delays
//! - Swapping in a library-backed implementation without touching the
//!   synchronizer's algorithm

use std::future::Future;
use std::path::Path;

use crate::types::{RemoteCredential, Sha};

use super::{GitResult, UpdatePolicy};

/// Version-control operations on one working copy, identified by path.
///
/// Implementations must not log argument lists or URLs: the credential's
/// token is embedded in the URL passed to the remote.
pub trait GitBackend: Send + Sync + 'static {
    /// Checks that `path` is an initialised working copy.
    fn resolve(&self, path: &Path) -> impl Future<Output = GitResult<()>> + Send;

    /// Points `origin` at the credential's public URL, fetches `branch` into
    /// `refs/remotes/origin/<branch>` without touching the working tree, and
    /// returns the fetched tip. The authenticated URL is never written to the
    /// repository's config.
    fn fetch_remote_tip(
        &self,
        path: &Path,
        credential: &RemoteCredential,
        branch: &str,
    ) -> impl Future<Output = GitResult<Sha>> + Send;

    /// The revision currently checked out (`HEAD`).
    fn local_tip(&self, path: &Path) -> impl Future<Output = GitResult<Sha>> + Send;

    /// Moves the working copy to the fetched tip of `branch` and returns the
    /// revision now checked out, which must equal `target`.
    fn apply_update(
        &self,
        path: &Path,
        branch: &str,
        target: &Sha,
        policy: UpdatePolicy,
    ) -> impl Future<Output = GitResult<Sha>> + Send;
}
