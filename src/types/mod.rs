//! Core domain types for the synchronizer.

pub mod ids;
pub mod outcome;
pub mod repo;

pub use ids::{InvalidSha, InvalidSlug, RepoSlug, SHORT_SHA_LEN, Sha};
pub use outcome::{FailureKind, SyncFailure, UpdateOutcome};
pub use repo::{DEFAULT_REMOTE_BASE, REDACTED, RemoteCredential, RepositoryHandle};
