//! Per-repository mutual exclusion.
//!
//! Every sync against one working copy holds that path's lock for its whole
//! duration (remote URL change, fetch, comparison, update). Different paths
//! get different locks, so one slow repository never delays another.
//! Symlinks are not resolved: two different spellings of one directory
//! through a symlink get different locks.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

/// Registry of lazily created per-path locks.
#[derive(Debug, Clone, Default)]
pub struct RepoLocks {
    inner: Arc<RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `path`, creating it on first use.
    ///
    /// Paths are made absolute and lexically cleaned so `repo/`, `./repo` and
    /// `x/../repo` share a lock. The key never depends on the filesystem, so a
    /// directory gets the same lock before and after it is created.
    pub async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let key = lock_key(path);

        if let Some(lock) = self.inner.read().await.get(&key) {
            return Arc::clone(lock);
        }

        let mut locks = self.inner.write().await;
        Arc::clone(locks.entry(key).or_default())
    }

    /// Number of distinct paths seen so far.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Absolute form of `path` with `.` and `..` resolved without touching disk.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut key = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                key.pop();
            }
            other => key.push(other),
        }
    }
    key
}
