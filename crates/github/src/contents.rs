//! [`ContentsStore`] implementation over the GitHub Contents API.

use std::time::Duration;

use async_trait::async_trait;
use proxy::{
    AccessToken, BlobSha, CommitInfo, CommitSha, ContentsStore, FileBlob, FilePath, PutFile,
    RepositoryTarget, SyncError,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, warn};

use crate::wire::{
    decode_content, encode_content, error_message, ContentsEntry, PutContentsBody,
    PutContentsResponse,
};
use crate::{GithubError, API_VERSION};

/// Settings for [`GithubContentsClient`].
#[derive(Debug, Clone)]
pub struct GithubClientConfig {
    /// REST API root, e.g. `https://api.github.com`.
    pub api_base: String,
    /// Value of the `User-Agent` header (GitHub rejects requests without one).
    pub user_agent: String,
    /// Per-request timeout covering connect, send and body download.
    pub timeout: Duration,
    /// Repository and branch all files live in.
    pub target: RepositoryTarget,
}

/// Reads and writes files of one repository branch through the Contents API.
#[derive(Debug, Clone)]
pub struct GithubContentsClient {
    http: reqwest::Client,
    api_base: String,
    target: RepositoryTarget,
}

impl GithubContentsClient {
    /// Builds the client and its connection pool.
    pub fn new(config: GithubClientConfig) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| GithubError::InvalidHeader { header: "user-agent" })?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(GithubError::ClientBuild)?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            target: config.target,
        })
    }

    /// Returns the repository this client targets.
    pub fn target(&self) -> &RepositoryTarget {
        &self.target
    }

    /// URL of the contents resource for `path`, with every segment
    /// percent-encoded.
    pub fn contents_url(&self, path: &FilePath) -> String {
        let encoded_path = path
            .segments()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            urlencoding::encode(self.target.owner.as_str()),
            urlencoding::encode(self.target.repo.as_str()),
            encoded_path
        )
    }
}

impl GithubContentsClient {
    /// Reads the metadata entry of `path`, rejecting anything but a file.
    async fn read_entry(
        &self,
        token: &AccessToken,
        path: &FilePath,
    ) -> Result<(ContentsEntry, BlobSha), SyncError> {
        let response = self
            .http
            .get(self.contents_url(path))
            .query(&[("ref", self.target.branch.as_str())])
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| transport_error("read", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(response).await);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SyncError::internal(format!("unreadable contents response: {e}")))?;
        if !body.is_object() {
            return Err(SyncError::bad_request(format!("'{path}' is a directory, not a file")));
        }
        let entry: ContentsEntry = serde_json::from_value(body)
            .map_err(|e| SyncError::internal(format!("unexpected contents response: {e}")))?;
        if entry.kind != "file" {
            return Err(SyncError::bad_request(format!(
                "'{path}' is a {}, not a file",
                entry.kind
            )));
        }
        let sha = BlobSha::new(entry.sha.as_str())
            .ok_or_else(|| SyncError::internal("contents response carried an empty sha"))?;
        Ok((entry, sha))
    }
}

#[async_trait]
impl ContentsStore for GithubContentsClient {
    #[tracing::instrument(skip_all, fields(%path, repo = %self.target))]
    async fn get_file(&self, token: &AccessToken, path: &FilePath) -> Result<FileBlob, SyncError> {
        let (entry, sha) = self.read_entry(token, path).await?;

        // Files over 1 MB come back with encoding "none" and no inline content.
        let content = match entry.encoding.as_deref() {
            Some("base64") => decode_content(entry.content.as_deref().unwrap_or_default())
                .map_err(|e| SyncError::internal(format!("invalid base64 content: {e}")))?,
            other => {
                return Err(SyncError::internal(format!(
                    "unsupported content encoding {other:?} for '{path}'"
                )));
            }
        };

        debug!(%sha, bytes = content.len(), "contents read");
        Ok(FileBlob {
            path: path.clone(),
            sha,
            content,
        })
    }

    #[tracing::instrument(skip_all, fields(%path, repo = %self.target))]
    async fn get_sha(
        &self,
        token: &AccessToken,
        path: &FilePath,
    ) -> Result<Option<BlobSha>, SyncError> {
        match self.read_entry(token, path).await {
            Ok((_, sha)) => {
                debug!(%sha, "current version read");
                Ok(Some(sha))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip_all, fields(path = %request.path, repo = %self.target, create = request.sha.is_none()))]
    async fn put_file(
        &self,
        token: &AccessToken,
        request: &PutFile,
    ) -> Result<CommitInfo, SyncError> {
        let body = PutContentsBody {
            message: request.message.as_str(),
            content: encode_content(&request.content),
            sha: request.sha.as_ref().map(BlobSha::as_str),
            branch: self.target.branch.as_str(),
        };

        let response = self
            .http
            .put(self.contents_url(&request.path))
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("write", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(response).await);
        }

        let parsed: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| SyncError::internal(format!("unreadable commit response: {e}")))?;
        let sha = CommitSha::new(parsed.commit.sha)
            .ok_or_else(|| SyncError::internal("commit response carried an empty sha"))?;

        debug!(commit = %sha, "contents written");
        Ok(CommitInfo {
            sha,
            message: parsed.commit.message,
            html_url: parsed.commit.html_url,
        })
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> SyncError {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "failed"
    };
    SyncError::internal(format!("GitHub {operation} {kind}: {error}"))
}

async fn backend_error(response: reqwest::Response) -> SyncError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "failed to read GitHub error body");
            String::new()
        }
    };
    SyncError::Backend {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}
