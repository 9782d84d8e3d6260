//! Shared value types for the sync proxy domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the payloads that move between the HTTP surface and the storage backend:
//! file blobs, decoded documents, write requests and commit summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlobSha, BranchName, CommitSha, FilePath, RepositoryName, RepositoryOwner};

// ---------------------------------------------------------------------------
// Repository target
// ---------------------------------------------------------------------------

/// The fixed repository and branch every request is proxied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Account or organisation owning the repository.
    pub owner: RepositoryOwner,
    /// Repository name.
    pub repo: RepositoryName,
    /// Branch that reads resolve against and writes commit to.
    pub branch: BranchName,
}

impl std::fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Raw file contents as stored by the backend, together with its version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// Repository-relative path of the file.
    pub path: FilePath,
    /// Version token the next write to `path` must carry.
    pub sha: BlobSha,
    /// Decoded file bytes.
    pub content: Vec<u8>,
}

// ---------------------------------------------------------------------------

/// A JSON document stored at `path`, as seen by the browser client.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    /// Repository-relative path of the file.
    pub path: FilePath,
    /// The parsed JSON document.
    pub content: serde_json::Value,
    /// Version token of the blob the document was read from.
    pub sha: BlobSha,
}

impl RemoteFile {
    /// Parses the blob bytes as JSON.
    pub fn from_blob(blob: FileBlob) -> Result<Self, serde_json::Error> {
        let content = serde_json::from_slice(&blob.content)?;
        Ok(Self {
            path: blob.path,
            content,
            sha: blob.sha,
        })
    }
}

// ---------------------------------------------------------------------------

/// A conditional write of one file.
///
/// `sha` must be the version token last observed for `path`; it is `None`
/// only when the file does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFile {
    /// Repository-relative path of the file.
    pub path: FilePath,
    /// Bytes to store.
    pub content: Vec<u8>,
    /// Expected current version token, `None` for creation.
    pub sha: Option<BlobSha>,
    /// Commit message for the write.
    pub message: CommitMessage,
}

/// Serialises a document the way it is stored: pretty-printed, two-space
/// indentation.
pub fn encode_document(document: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(document)
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

/// Summary of the commit created by a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// SHA of the new commit.
    pub sha: CommitSha,
    /// Message the commit was created with.
    pub message: String,
    /// Browser URL of the commit, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

// ---------------------------------------------------------------------------

/// Message attached to each automatic commit: `"<prefix> - <timestamp>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage(String);

impl CommitMessage {
    /// Builds the message for a sync performed at `at`.
    pub fn automatic(prefix: &str, at: Timestamp) -> Self {
        Self(format!("{prefix} - {at}"))
    }

    /// Returns the message as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}
