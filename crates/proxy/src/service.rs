//! The sync proxy service: read and conditionally write one JSON document.
//!
//! A save is a two-step optimistic update. The current version token for the
//! path is read first (absent when the file does not exist yet), then the new
//! blob is written against that token. A writer that lost a race gets the
//! backend's conflict error back; nothing here retries or serialises writers.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    encode_document, AccessToken, CommitInfo, CommitMessage, ContentsStore, FilePath, PutFile,
    RemoteFile, SyncError, Timestamp,
};

/// Request-independent settings for [`SyncProxy`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Path used when a request does not name one.
    pub default_path: FilePath,
    /// Prefix of the automatic commit message.
    pub commit_message_prefix: String,
    /// Name of the setting the token comes from, reported when it is missing.
    pub token_setting: String,
}

/// Body of a save request as sent by the browser client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    /// Target path; the default path is used when absent or empty.
    #[serde(default)]
    pub path: Option<String>,
    /// Document to store. `null` counts as missing.
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

/// Reads and writes JSON documents through a [`ContentsStore`] using a
/// server-held credential.
#[derive(Clone)]
pub struct SyncProxy {
    store: Arc<dyn ContentsStore>,
    token: Option<AccessToken>,
    settings: SyncSettings,
}

impl std::fmt::Debug for SyncProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncProxy")
            .field("token", &self.token)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SyncProxy {
    /// Creates a proxy. A `None` token is accepted; every operation then fails
    /// with [`SyncError::ConfigurationMissing`].
    pub fn new(
        store: Arc<dyn ContentsStore>,
        token: Option<AccessToken>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            token,
            settings,
        }
    }

    /// Returns `true` if a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    /// Resolves a client-supplied path, falling back to the default path when
    /// it is absent or empty.
    pub fn resolve_path(&self, requested: Option<&str>) -> Result<FilePath, SyncError> {
        match requested {
            None | Some("") => Ok(self.settings.default_path.clone()),
            Some(raw) => FilePath::new(raw)
                .ok_or_else(|| SyncError::bad_request(format!("Invalid file path '{raw}'"))),
        }
    }

    /// Handles a read request: credential check, path resolution, fetch.
    pub async fn fetch(&self, requested_path: Option<&str>) -> Result<RemoteFile, SyncError> {
        self.credential()?;
        let path = self.resolve_path(requested_path)?;
        self.fetch_file(&path).await
    }

    /// Handles a write request: credential check, then content check, then
    /// path resolution and the conditional save.
    pub async fn save(&self, request: SaveRequest) -> Result<CommitInfo, SyncError> {
        self.credential()?;
        let document = match request.content {
            Some(serde_json::Value::Null) | None => {
                return Err(SyncError::bad_request("No content was provided"));
            }
            Some(document) => document,
        };
        let path = self.resolve_path(request.path.as_deref())?;
        self.save_file(&path, &document).await
    }

    /// Reads the JSON document stored at `path`.
    #[tracing::instrument(skip_all, fields(%path))]
    pub async fn fetch_file(&self, path: &FilePath) -> Result<RemoteFile, SyncError> {
        let token = self.credential()?;
        let blob = self.store.get_file(token, path).await?;
        let sha = blob.sha.clone();
        let file = RemoteFile::from_blob(blob).map_err(|e| {
            SyncError::internal(format!("stored file '{path}' is not valid JSON: {e}"))
        })?;
        debug!(%sha, "file fetched");
        Ok(file)
    }

    /// Stores `document` at `path`, conditional on the version token read
    /// immediately before the write.
    #[tracing::instrument(skip_all, fields(%path))]
    pub async fn save_file(
        &self,
        path: &FilePath,
        document: &serde_json::Value,
    ) -> Result<CommitInfo, SyncError> {
        let token = self.credential()?;
        let content = encode_document(document)
            .map_err(|e| SyncError::internal(format!("failed to encode document: {e}")))?;

        let sha = self.store.get_sha(token, path).await?;
        if sha.is_none() {
            debug!("file does not exist yet; creating");
        }

        let request = PutFile {
            path: path.clone(),
            content,
            sha,
            message: CommitMessage::automatic(&self.settings.commit_message_prefix, Timestamp::now()),
        };
        let commit = self.store.put_file(token, &request).await?;
        info!(commit = %commit.sha, "file saved");
        Ok(commit)
    }

    fn credential(&self) -> Result<&AccessToken, SyncError> {
        self.token
            .as_ref()
            .ok_or_else(|| SyncError::ConfigurationMissing {
                setting: self.settings.token_setting.clone(),
            })
    }
}
