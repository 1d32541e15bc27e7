//! [`GitBackend`] implementation that shells out to the `git` binary.

use std::path::Path;

use tracing::debug;

use crate::types::{RemoteCredential, Sha};

use super::{
    GitBackend, GitError, GitResult, UpdatePolicy, git_command, rev_parse, run_git, run_git_masked,
};

const REMOTE: &str = "origin";

/// Runs `git` in the working copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliGit;

impl CliGit {
    pub fn new() -> Self {
        CliGit
    }
}

/// The local ref that holds the fetched tip of `branch`.
fn tracking_ref(branch: &str) -> String {
    format!("refs/remotes/{}/{}", REMOTE, branch)
}

/// Sets `origin`'s URL, adding the remote if the working copy has none.
async fn point_origin(workdir: &Path, url: &str) -> GitResult<()> {
    let set = run_git_masked(
        workdir,
        &["remote", "set-url", REMOTE, url],
        "git remote set-url origin <url>",
    )
    .await;

    match set {
        Ok(_) => Ok(()),
        Err(GitError::CommandFailed { stderr, .. }) if stderr.contains("No such remote") => {
            run_git_masked(
                workdir,
                &["remote", "add", REMOTE, url],
                "git remote add origin <url>",
            )
            .await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

impl GitBackend for CliGit {
    async fn resolve(&self, path: &Path) -> GitResult<()> {
        let not_a_repo = || GitError::NotARepository {
            path: path.to_path_buf(),
        };

        if !path.is_dir() {
            return Err(not_a_repo());
        }

        let output = git_command(path)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .await?;

        if output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true" {
            Ok(())
        } else {
            Err(not_a_repo())
        }
    }

    async fn fetch_remote_tip(
        &self,
        path: &Path,
        credential: &RemoteCredential,
        branch: &str,
    ) -> GitResult<Sha> {
        let refspec = format!("+refs/heads/{}:{}", branch, tracking_ref(branch));

        // origin only ever holds the public URL. The token travels on the
        // fetch command line, so a fetch killed mid-flight leaves nothing
        // behind in .git/config.
        point_origin(path, &credential.public_url()).await?;
        debug!(branch, "fetching remote branch");
        run_git_masked(
            path,
            &[
                "fetch",
                "--no-tags",
                &credential.authenticated_url(),
                &refspec,
            ],
            &format!("git fetch --no-tags <url> {}", refspec),
        )
        .await
        .map_err(|e| match e {
            GitError::CommandFailed { stderr, .. } if stderr.contains("couldn't find remote ref") => {
                GitError::RemoteBranchNotFound {
                    branch: branch.to_string(),
                }
            }
            GitError::CommandFailed { stderr, .. } => GitError::FetchFailed {
                refspec: branch.to_string(),
                details: stderr,
            },
            other => other,
        })?;

        rev_parse(path, &tracking_ref(branch)).await
    }

    async fn local_tip(&self, path: &Path) -> GitResult<Sha> {
        rev_parse(path, "HEAD").await
    }

    async fn apply_update(
        &self,
        path: &Path,
        branch: &str,
        target: &Sha,
        policy: UpdatePolicy,
    ) -> GitResult<Sha> {
        let remote_ref = tracking_ref(branch);
        debug!(branch, %policy, "applying remote tip");

        match policy {
            UpdatePolicy::FastForward => {
                run_git(path, &["merge", "--ff-only", &remote_ref])
                    .await
                    .map_err(|e| match e {
                        GitError::CommandFailed { stderr, .. } => GitError::MergeConflict {
                            details: stderr,
                        },
                        other => other,
                    })?;
            }
            UpdatePolicy::HardReset => {
                run_git(path, &["reset", "--hard", &remote_ref]).await?;
            }
        }

        let head = rev_parse(path, "HEAD").await?;
        if head != *target {
            // --ff-only succeeds as a no-op when the local branch is ahead.
            return Err(GitError::MergeConflict {
                details: format!(
                    "local branch is at {} and has commits not on {}/{}",
                    head.short(),
                    REMOTE,
                    branch
                ),
            });
        }
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_ref_format() {
        assert_eq!(tracking_ref("main"), "refs/remotes/origin/main");
        assert_eq!(tracking_ref("release/v2"), "refs/remotes/origin/release/v2");
    }

    #[tokio::test]
    async fn resolve_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = CliGit.resolve(&missing).await.unwrap_err();
        assert!(matches!(err, GitError::NotARepository { .. }));
    }
}
