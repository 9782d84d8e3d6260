//! Mapping of [`SyncError`] onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use proxy::SyncError;
use serde_json::json;
use tracing::{debug, error, warn};

/// Response body shape an error is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{"error": ".."}` — reads and unsupported methods.
    Read,
    /// `{"success": false, "error": ".."}` — writes.
    Write,
}

/// A [`SyncError`] on its way out to the client.
#[derive(Debug)]
pub struct ApiError {
    pub err: SyncError,
    pub envelope: Envelope,
    status: StatusCode,
}

impl ApiError {
    pub fn read(err: SyncError) -> Self {
        Self::new(err, Envelope::Read)
    }

    pub fn write(err: SyncError) -> Self {
        Self::new(err, Envelope::Write)
    }

    fn new(err: SyncError, envelope: Envelope) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        Self {
            err,
            envelope,
            status,
        }
    }

    /// Overrides the status derived from the error, for rejections raised by
    /// the HTTP layer itself (e.g. 413 from the body limit).
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.err {
            SyncError::ConfigurationMissing { setting } => {
                error!(%setting, "request rejected: credential not configured");
            }
            SyncError::Internal { message } => error!(%message, "request failed"),
            SyncError::Backend { status, message } => {
                warn!(status, %message, "backend error passed through");
            }
            SyncError::BadRequest { message } => debug!(%message, "bad request"),
        }

        let message = self.err.client_message();
        let body = match self.envelope {
            Envelope::Read => json!({ "error": message }),
            Envelope::Write => json!({ "success": false, "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
