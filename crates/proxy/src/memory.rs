//! In-memory [`ContentsStore`] used by tests across the workspace.
//!
//! Behaves like the Contents API where it matters to the proxy: every write
//! assigns a fresh version token, a write whose `sha` is not the current one
//! is rejected with 409, and a write without `sha` to an existing file is
//! rejected with 422. Calls are recorded for assertions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    AccessToken, BlobSha, CommitInfo, CommitSha, ContentsStore, FileBlob, FilePath, PutFile,
    SyncError,
};

/// Record of a call made against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    GetFile(FilePath),
    GetSha(FilePath),
    PutFile {
        path: FilePath,
        sha: Option<BlobSha>,
    },
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<FilePath, (BlobSha, Vec<u8>)>,
    next_version: u64,
    calls: Vec<StoreCall>,
}

/// Shared, cloneable in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `path` with `content` and returns the assigned version token.
    pub fn insert(&self, path: FilePath, content: impl Into<Vec<u8>>) -> BlobSha {
        let mut state = self.lock();
        let sha = next_sha(&mut state);
        state.files.insert(path, (sha.clone(), content.into()));
        sha
    }

    /// Returns the stored bytes at `path`, if any.
    pub fn contents(&self, path: &FilePath) -> Option<Vec<u8>> {
        self.lock().files.get(path).map(|(_, bytes)| bytes.clone())
    }

    /// Returns a copy of the call log.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn next_sha(state: &mut State) -> BlobSha {
    state.next_version += 1;
    BlobSha::new(format!("{:040x}", state.next_version))
        .unwrap_or_else(|| unreachable!("formatted token is never empty"))
}

#[async_trait]
impl ContentsStore for InMemoryStore {
    async fn get_file(&self, _token: &AccessToken, path: &FilePath) -> Result<FileBlob, SyncError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::GetFile(path.clone()));
        match state.files.get(path) {
            Some((sha, content)) => Ok(FileBlob {
                path: path.clone(),
                sha: sha.clone(),
                content: content.clone(),
            }),
            None => Err(SyncError::Backend {
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }

    async fn get_sha(
        &self,
        _token: &AccessToken,
        path: &FilePath,
    ) -> Result<Option<BlobSha>, SyncError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::GetSha(path.clone()));
        Ok(state.files.get(path).map(|(sha, _)| sha.clone()))
    }

    async fn put_file(
        &self,
        _token: &AccessToken,
        request: &PutFile,
    ) -> Result<CommitInfo, SyncError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::PutFile {
            path: request.path.clone(),
            sha: request.sha.clone(),
        });

        let current = state.files.get(&request.path).map(|(sha, _)| sha.clone());
        match (&current, &request.sha) {
            (Some(current), Some(expected)) if current != expected => {
                return Err(SyncError::Backend {
                    status: 409,
                    message: format!("{} does not match {}", request.path, expected),
                });
            }
            (Some(_), None) => {
                return Err(SyncError::Backend {
                    status: 422,
                    message: "Invalid request.\n\n\"sha\" wasn't supplied.".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(SyncError::Backend {
                    status: 404,
                    message: "Not Found".to_string(),
                });
            }
            _ => {}
        }

        let sha = next_sha(&mut state);
        state
            .files
            .insert(request.path.clone(), (sha.clone(), request.content.clone()));
        Ok(CommitInfo {
            sha: CommitSha::new(format!("c{}", &sha.as_str()[1..]))
                .unwrap_or_else(|| unreachable!("formatted token is never empty")),
            message: request.message.to_string(),
            html_url: None,
        })
    }
}
