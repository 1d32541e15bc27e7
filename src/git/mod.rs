//! Local git operations on the tracked working copy.
//!
//! The synchronizer talks to git only through the [`GitBackend`] capability
//! trait. [`CliGit`] implements it by shelling out to the `git` binary via
//! `tokio::process`, so fetches never block runtime threads and a timed-out
//! operation kills its child process when the future is dropped.

pub mod backend;
pub mod cli;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tokio::process::Command;

use crate::types::{FailureKind, InvalidSha, Sha};

pub use backend::GitBackend;
pub use cli::CliGit;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path does not exist or is not inside a git working tree.
    #[error("not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Fetching from the remote failed (network, authentication, missing repo).
    #[error("failed to fetch {refspec}: {details}")]
    FetchFailed { refspec: String, details: String },

    /// The tracked branch does not exist on the remote.
    #[error("remote branch not found: {branch}")]
    RemoteBranchNotFound { branch: String },

    /// The local branch cannot be moved to the remote tip without a merge.
    #[error("merge conflict: {details}")]
    MergeConflict { details: String },

    /// Git printed something that is not a revision id.
    #[error(transparent)]
    InvalidSha(#[from] InvalidSha),

    /// IO error (spawning git, missing directory, ...).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// The failure category reported to the dispatcher.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            GitError::NotARepository { .. } => FailureKind::RepositoryInvalid,
            GitError::FetchFailed { .. } | GitError::RemoteBranchNotFound { .. } => {
                FailureKind::NetworkFailure
            }
            GitError::MergeConflict { .. } => FailureKind::MergeConflict,
            GitError::CommandFailed { .. } | GitError::InvalidSha(_) | GitError::Io(_) => {
                FailureKind::Filesystem
            }
        }
    }
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// How a new remote tip is applied to the working copy.
///
/// Chosen once per process from configuration, never per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdatePolicy {
    /// `git merge --ff-only`: refuses to move a branch with local-only commits.
    #[default]
    FastForward,
    /// `git reset --hard`: always lands on the remote tip, discarding local
    /// commits and uncommitted changes to tracked files.
    HardReset,
}

/// Returned for unrecognised policy names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown update policy {0:?} (expected fast-forward or hard-reset)")]
pub struct UnknownPolicy(pub String);

impl FromStr for UpdatePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast-forward" | "ff" | "pull" => Ok(UpdatePolicy::FastForward),
            "hard-reset" | "reset" => Ok(UpdatePolicy::HardReset),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for UpdatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdatePolicy::FastForward => f.write_str("fast-forward"),
            UpdatePolicy::HardReset => f.write_str("hard-reset"),
        }
    }
}

/// Create a git Command with clean environment (no system/user config).
///
/// Ignoring global config also keeps user-level credential helpers from
/// storing the token embedded in the remote URL.
pub(crate) fn git_command(workdir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");

    // Fail instead of waiting for a password on stdin
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd.kill_on_drop(true);
    cmd
}

/// Run a git command, reporting `display` instead of the real arguments on failure.
///
/// Used for invocations whose arguments carry credentials.
pub(crate) async fn run_git_masked(
    workdir: &Path,
    args: &[&str],
    display: &str,
) -> GitResult<String> {
    let output = git_command(workdir).args(args).output().await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(GitError::CommandFailed {
            command: display.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run a git command and return its trimmed stdout.
pub(crate) async fn run_git(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let display = format!("git {}", args.join(" "));
    run_git_masked(workdir, args, &display).await
}

/// Get the SHA of a revision.
pub(crate) async fn rev_parse(workdir: &Path, rev: &str) -> GitResult<Sha> {
    let out = run_git(workdir, &["rev-parse", "--verify", rev]).await?;
    Ok(Sha::parse(out)?)
}
