//! Port trait implemented by storage backends.
//!
//! The [`crate::SyncProxy`] service depends only on [`ContentsStore`]; the
//! `github` crate supplies the production implementation over the GitHub
//! Contents API.

use async_trait::async_trait;

use crate::{AccessToken, BlobSha, CommitInfo, FileBlob, FilePath, PutFile, SyncError};

/// Versioned file storage addressed by repository-relative path.
///
/// Implementations must report every non-success backend answer as
/// [`SyncError::Backend`] with the backend's own status and message, in
/// particular 404 for a missing file and the backend's conflict status for a
/// stale [`PutFile::sha`].
#[async_trait]
pub trait ContentsStore: Send + Sync {
    /// Reads the current blob and version token stored at `path`.
    async fn get_file(&self, token: &AccessToken, path: &FilePath) -> Result<FileBlob, SyncError>;

    /// Returns the current version token of `path`, or `None` when no file
    /// exists there. Only the token is read; the content is not decoded.
    async fn get_sha(&self, token: &AccessToken, path: &FilePath)
        -> Result<Option<BlobSha>, SyncError>;

    /// Writes `request.content` to `request.path`, conditional on
    /// `request.sha` still being current.
    async fn put_file(&self, token: &AccessToken, request: &PutFile)
        -> Result<CommitInfo, SyncError>;
}
