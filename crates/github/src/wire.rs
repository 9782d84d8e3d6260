//! Request and response payloads of the Contents API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A single entry returned by `GET /contents/{path}` when the path is a file.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentsEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `PUT /contents/{path}`.
#[derive(Debug, Serialize)]
pub(crate) struct PutContentsBody<'a> {
    pub message: &'a str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

/// Response of a successful `PUT /contents/{path}`.
#[derive(Debug, Deserialize)]
pub(crate) struct PutContentsResponse {
    pub commit: CommitPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitPayload {
    pub sha: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Encodes file bytes for the `content` field of a write.
pub(crate) fn encode_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes the `content` field of a read. GitHub wraps the base64 text at 60
/// columns, so whitespace is dropped first.
pub(crate) fn decode_content(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Picks the message to pass through for an error response: GitHub's JSON
/// `message`, else the raw body, else the status reason phrase.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.message.is_empty() {
            return parsed.message;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}
