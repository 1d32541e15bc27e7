//! Handles to the local working copy and the credentials for its remote.

use std::fmt;
use std::path::{Path, PathBuf};

use super::RepoSlug;

/// Placeholder substituted for the access token in any text leaving the process.
pub const REDACTED: &str = "[REDACTED]";

/// Default host for remote URLs.
pub const DEFAULT_REMOTE_BASE: &str = "https://github.com";

/// A local working copy, identified by path.
///
/// Holding a handle says nothing about whether the path is a repository; that
/// is checked by the git backend at the start of every sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryHandle {
    path: PathBuf,
}

impl RepositoryHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RepositoryHandle { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Username, access token and repository slug used to reach the remote.
///
/// The token is only ever rendered through [`RemoteCredential::authenticated_url`],
/// which must not be logged. Everything else goes through [`RemoteCredential::redact`].
#[derive(Clone)]
pub struct RemoteCredential {
    username: String,
    token: String,
    slug: RepoSlug,
    remote_base: String,
}

impl RemoteCredential {
    pub fn new(username: impl Into<String>, token: impl Into<String>, slug: RepoSlug) -> Self {
        RemoteCredential {
            username: username.into(),
            token: token.into(),
            slug,
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
        }
    }

    /// Points the credential at another host or at a local mirror directory.
    pub fn with_remote_base(mut self, base: impl Into<String>) -> Self {
        self.remote_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn slug(&self) -> &RepoSlug {
        &self.slug
    }

    /// The remote URL without any userinfo. Safe to persist and log.
    pub fn public_url(&self) -> String {
        format!("{}/{}.git", self.remote_base, self.slug)
    }

    /// The remote URL with username and token embedded.
    ///
    /// Only HTTP(S) bases carry userinfo; local paths and `file://` URLs are
    /// returned as [`public_url`](Self::public_url).
    pub fn authenticated_url(&self) -> String {
        let Some((scheme, rest)) = self.remote_base.split_once("://") else {
            return self.public_url();
        };
        if scheme != "https" && scheme != "http" {
            return self.public_url();
        }
        format!(
            "{}://{}:{}@{}/{}.git",
            scheme, self.username, self.token, rest, self.slug
        )
    }

    /// Replaces every occurrence of the token in `text` with [`REDACTED`].
    pub fn redact(&self, text: &str) -> String {
        if self.token.is_empty() {
            return text.to_string();
        }
        text.replace(&self.token, REDACTED)
    }
}

impl fmt::Debug for RemoteCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredential")
            .field("username", &self.username)
            .field("slug", &self.slug)
            .field("remote_base", &self.remote_base)
            .finish_non_exhaustive()
    }
}
