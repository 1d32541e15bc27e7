//! Shared test doubles for the git backend and the notifier.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::git::{GitBackend, GitError, GitResult, UpdatePolicy};
use crate::notify::Notify;
use crate::types::{RemoteCredential, Sha};

pub fn sha(s: &str) -> Sha {
    Sha::parse(s).unwrap()
}

/// In-memory stand-in for a working copy and its remote.
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub valid: bool,
    pub local: Sha,
    pub remote: Sha,
    /// When set, fetch fails with this stderr.
    pub fetch_error: Option<String>,
    /// When set, fast-forward updates fail as if the branch had diverged.
    pub diverged: bool,
}

impl FakeRepo {
    pub fn new(local: &str, remote: &str) -> Self {
        FakeRepo {
            valid: true,
            local: sha(local),
            remote: sha(remote),
            fetch_error: None,
            diverged: false,
        }
    }
}

#[derive(Debug)]
struct FakeState {
    repo: Mutex<FakeRepo>,
    delay: Duration,
    calls: AtomicUsize,
    updates: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Scripted [`GitBackend`] that counts calls and can sleep inside each one.
///
/// `max_in_flight` records the highest number of backend operations running at
/// once; with per-path locking it never exceeds one.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new(repo: FakeRepo) -> Self {
        Self::with_delay(repo, Duration::ZERO)
    }

    pub fn with_delay(repo: FakeRepo, delay: Duration) -> Self {
        FakeBackend {
            state: Arc::new(FakeState {
                repo: Mutex::new(repo),
                delay,
                calls: AtomicUsize::new(0),
                updates: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Total backend operations performed.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Number of `apply_update` calls.
    pub fn updates(&self) -> usize {
        self.state.updates.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn repo(&self) -> FakeRepo {
        self.state.repo.lock().unwrap().clone()
    }

    /// Simulates a push to the remote.
    pub fn push_remote(&self, tip: &str) {
        self.state.repo.lock().unwrap().remote = sha(tip);
    }

    async fn enter(&self) {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.state.delay.is_zero() {
            tokio::time::sleep(self.state.delay).await;
        }
    }

    fn exit(&self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GitBackend for FakeBackend {
    async fn resolve(&self, path: &Path) -> GitResult<()> {
        self.enter().await;
        let valid = self.repo().valid;
        self.exit();
        if valid {
            Ok(())
        } else {
            Err(GitError::NotARepository {
                path: path.to_path_buf(),
            })
        }
    }

    async fn fetch_remote_tip(
        &self,
        _path: &Path,
        credential: &RemoteCredential,
        branch: &str,
    ) -> GitResult<Sha> {
        self.enter().await;
        let repo = self.repo();
        self.exit();
        match repo.fetch_error {
            // Echo the authenticated URL the way git sometimes does.
            Some(stderr) => Err(GitError::FetchFailed {
                refspec: branch.to_string(),
                details: format!(
                    "fatal: unable to access '{}': {}",
                    credential.authenticated_url(),
                    stderr
                ),
            }),
            None => Ok(repo.remote),
        }
    }

    async fn local_tip(&self, _path: &Path) -> GitResult<Sha> {
        self.enter().await;
        let local = self.repo().local;
        self.exit();
        Ok(local)
    }

    async fn apply_update(
        &self,
        _path: &Path,
        _branch: &str,
        target: &Sha,
        policy: UpdatePolicy,
    ) -> GitResult<Sha> {
        self.enter().await;
        self.state.updates.fetch_add(1, Ordering::SeqCst);
        let result = {
            let mut repo = self.state.repo.lock().unwrap();
            if repo.diverged && policy == UpdatePolicy::FastForward {
                Err(GitError::MergeConflict {
                    details: "fatal: Not possible to fast-forward, aborting.".to_string(),
                })
            } else {
                repo.local = target.clone();
                repo.diverged = false;
                Ok(target.clone())
            }
        };
        self.exit();
        result
    }
}

/// [`Notify`] implementation that records every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, text: String) {
        self.messages.lock().unwrap().push(text);
    }
}
