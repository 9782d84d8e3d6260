//! GitHub infrastructure adapter for the sync proxy.
//!
//! Implements [`proxy::ContentsStore`] over the GitHub REST Contents API
//! (`/repos/{owner}/{repo}/contents/{path}`) using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Every GitHub
//! detail (URL layout, headers, base64 transfer encoding, error bodies) is
//! handled here; the [`proxy`] crate never sees them.
//!
//! ## Error mapping
//!
//! | GitHub outcome | [`proxy::SyncError`] |
//! |----------------|----------------------|
//! | non-2xx status | `Backend { status, message }` with GitHub's `message` |
//! | directory or non-file entry | `BadRequest` |
//! | transport failure, undecodable body | `Internal` |

mod contents;
mod wire;

use thiserror::Error;

pub use contents::{GithubClientConfig, GithubContentsClient};

/// Default REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// REST API version requested on every call.
pub const API_VERSION: &str = "2022-11-28";

/// Errors raised while constructing the adapter.
///
/// Request-time failures are reported as [`proxy::SyncError`] instead.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// A configured header value is not valid in an HTTP header.
    #[error("Invalid header value for {header}")]
    InvalidHeader {
        /// Name of the offending header.
        header: &'static str,
    },
}
