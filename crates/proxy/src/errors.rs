//! Error taxonomy for the sync proxy.
//!
//! [`SyncError`] is the only error type that crosses the [`crate::ContentsStore`]
//! port. Each variant carries the HTTP status it is reported with, so the
//! listener never needs to inspect messages to decide on a response code.
//!
//! | Variant | Status |
//! |---------|--------|
//! | [`SyncError::ConfigurationMissing`] | 500 |
//! | [`SyncError::BadRequest`] | 400 |
//! | [`SyncError::Backend`] | passthrough |
//! | [`SyncError::Internal`] | 500 |
//!
//! None of these are retried by the proxy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status used when the backend reports something that is not an HTTP status.
pub const BAD_GATEWAY: u16 = 502;

const NOT_FOUND: u16 = 404;

/// Errors produced while fetching or saving a file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SyncError {
    /// A setting the proxy needs at request time is absent (the access token).
    ///
    /// Detected before any network call is made.
    #[error("Configuration missing: {setting}")]
    ConfigurationMissing {
        /// Name of the missing setting, e.g. the token environment variable.
        setting: String,
    },

    /// The client request is unusable (no `content`, invalid path, bad JSON).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Description returned to the client verbatim.
        message: String,
    },

    /// The storage backend answered with a non-success status.
    ///
    /// Status and message are passed through to the client unchanged. A stale
    /// version token on write surfaces here as the backend's conflict status.
    #[error("Backend returned {status}: {message}")]
    Backend {
        /// HTTP status reported by the backend.
        status: u16,
        /// Message reported by the backend.
        message: String,
    },

    /// Anything else: transport failures, undecodable responses, invalid
    /// stored documents.
    ///
    /// The detail is logged; the client only sees a generic message.
    #[error("Internal error: {message}")]
    Internal {
        /// Diagnostic detail, never shown to the client.
        message: String,
    },
}

impl SyncError {
    /// Shorthand for [`SyncError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Shorthand for [`SyncError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the backend reported that the file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Backend { status, .. } if *status == NOT_FOUND)
    }

    /// HTTP status the error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ConfigurationMissing { .. } | Self::Internal { .. } => 500,
            Self::BadRequest { .. } => 400,
            Self::Backend { status, .. } if (400..=599).contains(status) => *status,
            Self::Backend { .. } => BAD_GATEWAY,
        }
    }

    /// Message safe to show to the browser client.
    pub fn client_message(&self) -> String {
        match self {
            Self::ConfigurationMissing { .. } => {
                "GitHub token is not configured on the server".to_string()
            }
            Self::BadRequest { message } | Self::Backend { message, .. } => message.clone(),
            Self::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        let missing = SyncError::ConfigurationMissing {
            setting: "GITHUB_TOKEN".into(),
        };
        assert_eq!(missing.status_code(), 500);
        assert_eq!(SyncError::bad_request("x").status_code(), 400);
        assert_eq!(SyncError::internal("boom").status_code(), 500);
        let conflict = SyncError::Backend {
            status: 409,
            message: "sha does not match".into(),
        };
        assert_eq!(conflict.status_code(), 409);
    }

    #[test]
    fn backend_status_outside_error_range_becomes_bad_gateway() {
        for status in [0, 200, 302, 600] {
            let err = SyncError::Backend {
                status,
                message: "odd".into(),
            };
            assert_eq!(err.status_code(), BAD_GATEWAY);
        }
    }

    #[test]
    fn internal_detail_is_not_shown_to_client() {
        let err = SyncError::internal("connection reset by 10.0.0.3");
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn not_found_only_matches_backend_404() {
        let nf = SyncError::Backend {
            status: 404,
            message: "Not Found".into(),
        };
        assert!(nf.is_not_found());
        assert_eq!(nf.client_message(), "Not Found");
        assert!(!SyncError::bad_request("404").is_not_found());
    }
}
