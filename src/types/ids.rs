//! Newtype wrappers for revision and repository identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of hex characters shown when a revision is displayed to people.
pub const SHORT_SHA_LEN: usize = 8;

/// Returned when a string is not a plausible git object id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SHA: {0:?}")]
pub struct InvalidSha(pub String);

/// A git revision identifier.
///
/// Full ids are 40 (SHA-1) or 64 (SHA-256) hex characters; `parse` accepts any
/// non-empty hex string so abbreviated ids from test doubles are representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(String);

impl Sha {
    /// Parses a hex revision id, normalising it to lowercase.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidSha> {
        let s = s.as_ref().trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidSha(s.to_string()));
        }
        Ok(Sha(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The abbreviated form used in messages and notifications.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_SHA_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hosted repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoSlug(String);

/// Returned for slugs that are not `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("repository slug must be owner/name, got {0:?}")]
pub struct InvalidSlug(pub String);

impl RepoSlug {
    pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidSlug> {
        let s = s.as_ref().trim().trim_end_matches(".git");
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoSlug(s.to_string()))
            }
            _ => Err(InvalidSlug(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
